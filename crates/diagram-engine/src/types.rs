//! Core types for workflow diagrams
//!
//! A diagram is made of stages (rectangular lanes), task nodes and
//! directed connections between task nodes. Stages never store the
//! nodes they own; ownership is recomputed from geometry after every
//! structural change (see the `containment` module).

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Unique identifier for a stage
pub type StageId = String;

/// Unique identifier for a task node
pub type NodeId = String;

/// Unique identifier for a connection
pub type ConnectionId = String;

/// Identifier for any diagram element (stage, task node or connection)
pub type ElementId = String;

/// How a task is started once its workflow is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    /// Started by an operator
    Manual,
    /// Started by the scheduler
    Scheduled,
}

/// How a task is marked complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    /// Completes when the executor reports success
    Auto,
    /// Requires an operator sign-off
    Manual,
}

/// The kind of work a task performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Pull data from a source system
    Ingest,
    /// Transform or cleanse data
    Transform,
    /// Run quality-check rules
    QualityCheck,
    /// Push results to a downstream system
    Export,
}

/// Routing style of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStyle {
    Straight,
    /// Manhattan routing
    #[default]
    Orthogonal,
}

/// Per-element validation tag, set by a publish attempt
///
/// Transient UI state: cleared by any structural mutation of the
/// element and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationState {
    #[default]
    Normal,
    MissingConfig,
    NoConnection,
    NoContainingStage,
    DuplicateName,
}

/// Session-wide persistence indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveStatus {
    #[default]
    Normal,
    Saving,
    Saved,
}

/// Executable configuration of a task node
///
/// `extra` keeps any fields this build does not recognize so that a
/// diagram written by a newer console round-trips without loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_mode: Option<StartMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_mode: Option<CompletionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// Id of the executor role assigned to run this task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_role: Option<String>,
    /// Unrecognized additive fields, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskConfig {
    /// Whether the fields required for publish are present
    ///
    /// The node name is checked separately by the validation engine.
    pub fn is_complete(&self) -> bool {
        self.start_mode.is_some()
    }
}

/// A rectangular lane grouping task nodes
///
/// Which nodes a stage owns is derived from geometry, so equality and
/// serialization only cover the stage's own attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub position: Point,
    pub size: Size,
    /// Transient validation tag, not persisted
    #[serde(skip)]
    pub validation_state: ValidationState,
}

impl Stage {
    /// Create a stage with a generated id
    pub fn new(name: impl Into<String>, position: Point, size: Size) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, position, size)
    }

    /// Create a stage with an explicit id (ids normally come from the canvas)
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Point,
        size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            size,
            validation_state: ValidationState::Normal,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }
}

impl PartialEq for Stage {
    fn eq(&self, other: &Self) -> bool {
        // Structural equality; the validation tag is transient
        self.id == other.id
            && self.name == other.name
            && self.position == other.position
            && self.size == other.size
    }
}

/// A unit of executable work
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    pub id: NodeId,
    pub name: String,
    pub position: Point,
    pub size: Size,
    pub config: TaskConfig,
    /// Transient validation tag, not persisted
    #[serde(skip)]
    pub validation_state: ValidationState,
    /// Transient selection highlight, not persisted
    #[serde(skip)]
    pub selected: bool,
    /// Whether connection ports are shown (hover state), not persisted
    #[serde(skip)]
    pub ports_visible: bool,
}

impl TaskNode {
    /// Create a task node with a generated id and empty configuration
    pub fn new(name: impl Into<String>, position: Point, size: Size) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, position, size)
    }

    /// Create a task node with an explicit id
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Point,
        size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            size,
            config: TaskConfig::default(),
            validation_state: ValidationState::Normal,
            selected: false,
            ports_visible: false,
        }
    }

    /// Set the configuration (builder style)
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }
}

impl PartialEq for TaskNode {
    fn eq(&self, other: &Self) -> bool {
        // Structural equality; validation/selection/port flags are transient
        self.id == other.id
            && self.name == other.name
            && self.position == other.position
            && self.size == other.size
            && self.config == other.config
    }
}

/// A directed edge between two task nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    /// Source task node id
    pub source: NodeId,
    /// Target task node id
    pub target: NodeId,
    pub style: ConnectionStyle,
}

impl Connection {
    /// Create a connection with a generated id and the default style
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), source, target)
    }

    /// Create a connection with an explicit id
    pub fn with_id(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            style: ConnectionStyle::default(),
        }
    }

    pub fn with_style(mut self, style: ConnectionStyle) -> Self {
        self.style = style;
        self
    }

    /// Whether this connection touches the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
