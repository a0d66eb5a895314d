//! Event types for editor state changes
//!
//! Events flow from the persistence and publish services to whatever
//! hosts the editor (a web bridge, a test harness). The sink trait
//! abstracts over the transport so the services stay host-agnostic.

use serde::{Deserialize, Serialize};

use crate::types::{ElementId, SaveStatus};
use crate::validation::Rule;

/// Trait for delivering diagram events to the host
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g. the
    /// host channel closed).
    fn send(&self, event: DiagramEvent) -> Result<(), EventError>;
}

/// Error when delivering events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Events emitted while a diagram is being edited
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramEvent {
    /// The autosave indicator changed
    #[serde(rename_all = "camelCase")]
    SaveStatusChanged { status: SaveStatus },

    /// A persistence or preview call failed (debounced)
    #[serde(rename_all = "camelCase")]
    SaveFailed {
        message: String,
        /// Unix milliseconds
        timestamp: i64,
    },

    /// A publish attempt was blocked; one message per attempt
    #[serde(rename_all = "camelCase")]
    ValidationFailed {
        rule: Rule,
        offenders: Vec<ElementId>,
        message: String,
    },

    /// The diagram was promoted to an executable workflow definition
    #[serde(rename_all = "camelCase")]
    Published { workflow_id: String },

    /// The diagram was replaced from the last persisted content
    #[serde(rename_all = "camelCase")]
    DiagramReloaded { workflow_id: String },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: DiagramEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<DiagramEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<DiagramEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: DiagramEvent) -> Result<(), EventError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
