//! Flowboard Diagram Service - persistence and publish services
//!
//! Host-agnostic application services around the `diagram-engine`
//! core:
//!
//! - `WorkflowApi`: client for the external persistence backend
//! - `AutosaveScheduler`: trailing-edge throttled draft saves with an
//!   observable save-status
//! - `PublishOrchestrator`: validation-gated promotion to an
//!   executable workflow definition
//! - `EditorSession`: wires model, history, scheduler and publish
//!   together for one editor tab
//!
//! All async code of the editor lives here; the engine crate stays
//! pure and synchronous.

pub mod api;
pub mod autosave;
pub mod config;
pub mod error;
pub mod preview;
pub mod publish;
pub mod report;
pub mod session;

#[cfg(test)]
mod testing;

// Re-export key types
pub use api::{ExecutorRole, HttpWorkflowApi, SaveRequest, SaveType, WorkflowApi, WorkflowContent};
pub use autosave::{AutosaveScheduler, DraftSnapshot, SnapshotSource};
pub use config::AutosaveConfig;
pub use error::{Result, ServiceError};
pub use preview::{NullPreviewRenderer, PreviewRenderer, PREVIEW_HEIGHT, PREVIEW_WIDTH};
pub use publish::{PublishOrchestrator, PublishOutcome};
pub use report::ErrorReporter;
pub use session::EditorSession;
