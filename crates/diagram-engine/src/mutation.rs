//! Mutation records produced by diagram operations
//!
//! Each model operation returns the mutation it performed, classified
//! at creation as semantic or cosmetic. Only semantic mutations enter
//! the undo history and trigger autosave; cosmetic mutations cover
//! derived UI state (validation tags, selection, port visibility) and
//! must never pollute either.

use crate::types::{ConnectionId, ElementId, NodeId, StageId};

/// A mutation applied to the diagram model
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddStage { id: StageId },
    AddNode { id: NodeId },
    AddConnection { id: ConnectionId },
    MoveElement { id: ElementId },
    ResizeElement { id: ElementId },
    RemoveElements { ids: Vec<ElementId> },
    Rename { id: ElementId },
    UpdateNodeConfig { id: NodeId },
    /// Validation tags were applied after a publish attempt
    SetValidationStates,
    /// Validation tags were reset
    ClearValidationStates,
    /// Selection highlight changed
    SetSelection { ids: Vec<NodeId> },
    /// Connection ports shown or hidden on hover
    SetPortsVisible { id: NodeId, visible: bool },
}

impl Mutation {
    /// Whether this mutation changes persisted diagram state
    pub fn is_semantic(&self) -> bool {
        !matches!(
            self,
            Mutation::SetValidationStates
                | Mutation::ClearValidationStates
                | Mutation::SetSelection { .. }
                | Mutation::SetPortsVisible { .. }
        )
    }

    /// Inverse of [`is_semantic`](Self::is_semantic)
    pub fn is_cosmetic(&self) -> bool {
        !self.is_semantic()
    }
}

/// Result of a model operation
///
/// `affected` lists every element whose derived state (containment,
/// validation tag) may have changed, so dependent components can react
/// without rescanning the whole diagram.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub mutation: Mutation,
    pub affected: Vec<ElementId>,
}

impl MutationOutcome {
    pub fn new(mutation: Mutation, affected: Vec<ElementId>) -> Self {
        Self { mutation, affected }
    }
}
