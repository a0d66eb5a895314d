//! Diagram Engine - workflow diagram core for Flowboard
//!
//! This crate holds the pure, synchronous core of the workflow-diagram
//! editor: the mutable graph model of stages, task nodes and
//! connections, the geometric containment rules that bind them, the
//! snapshot-based undo/redo history, the publish-readiness validation
//! and the persisted cell schema.
//!
//! # Architecture
//!
//! - `Diagram`: single source of truth for one edit session; every
//!   mutation reports the elements whose derived state may have changed
//! - `compute_containment`: pure node-to-stage ownership from geometry,
//!   recomputed after structural changes instead of stored as pointers
//! - `HistoryStack`: compressed immutable snapshots, recorded only for
//!   mutations classified as semantic
//! - `validate`: fixed-precedence rule chain gating publish
//! - `cells`: the wire format, forward-compatible for additive fields
//!
//! No I/O happens here; persistence and scheduling live in the service
//! crate.

pub mod builder;
pub mod cells;
pub mod containment;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod model;
pub mod mutation;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::DiagramBuilder;
pub use error::{DiagramError, Result};
pub use events::{DiagramEvent, EventSink, NullEventSink, VecEventSink};
pub use history::HistoryStack;
pub use model::Diagram;
pub use mutation::{Mutation, MutationOutcome};
pub use types::{
    Connection, ConnectionStyle, SaveStatus, Stage, TaskConfig, TaskNode, ValidationState,
};
pub use validation::{validate, Rule, ValidationReport};
