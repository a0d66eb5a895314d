//! The diagram model: single source of truth for one edit session
//!
//! All mutations go through [`Diagram`] methods, which keep two
//! invariants intact no matter how elements are dragged, resized,
//! connected or deleted:
//!
//! - a task node belongs to at most one stage, decided by geometry
//! - no connection ever references a missing task node
//!
//! Every mutation returns a [`MutationOutcome`] naming the elements
//! whose derived state may have changed, and resets the transient
//! validation tag on those elements.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::containment::{compute_containment, enclosing_rect};
use crate::error::{DiagramError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::mutation::{Mutation, MutationOutcome};
use crate::types::{
    Connection, ElementId, NodeId, Stage, StageId, TaskConfig, TaskNode, ValidationState,
};

/// The aggregate of all stages, task nodes and connections for one
/// workflow identity
///
/// Stages are kept in creation order; the containment tie-break for
/// nested stages depends on it. Equality is structural and ignores
/// transient per-element UI state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub stages: Vec<Stage>,
    pub nodes: Vec<TaskNode>,
    pub connections: Vec<Connection>,
    /// Derived node -> stage ownership, rebuilt after every structural
    /// mutation. Never serialized.
    #[serde(skip)]
    pub(crate) containment: HashMap<NodeId, StageId>,
}

impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.stages == other.stages
            && self.nodes == other.nodes
            && self.connections == other.connections
    }
}

impl Diagram {
    /// Create an empty diagram
    pub fn new() -> Self {
        Self::default()
    }

    // ---- mutations ----

    /// Add a stage
    pub fn add_stage(&mut self, stage: Stage) -> Result<MutationOutcome> {
        self.ensure_free_id(&stage.id)?;
        let id = stage.id.clone();
        self.stages.push(stage);
        let mut affected = vec![id.clone()];
        extend_unique(&mut affected, self.refresh_containment());
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(Mutation::AddStage { id }, affected))
    }

    /// Add a task node
    pub fn add_node(&mut self, node: TaskNode) -> Result<MutationOutcome> {
        self.ensure_free_id(&node.id)?;
        let id = node.id.clone();
        self.nodes.push(node);
        let mut affected = vec![id.clone()];
        extend_unique(&mut affected, self.refresh_containment());
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(Mutation::AddNode { id }, affected))
    }

    /// Add a connection between two existing task nodes
    ///
    /// A connection with a blank endpoint or an endpoint that is not a
    /// live task node is rejected and never enters the model.
    pub fn add_connection(&mut self, connection: Connection) -> Result<MutationOutcome> {
        self.ensure_free_id(&connection.id)?;
        self.check_endpoint(&connection.id, "source", &connection.source)?;
        self.check_endpoint(&connection.id, "target", &connection.target)?;
        let id = connection.id.clone();
        let affected = vec![
            id.clone(),
            connection.source.clone(),
            connection.target.clone(),
        ];
        self.connections.push(connection);
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(Mutation::AddConnection { id }, affected))
    }

    /// Move a stage or task node to a new position
    ///
    /// Moving a stage carries its currently contained nodes along, so a
    /// lane drag never evicts content; eviction happens only when a
    /// node itself is dragged out.
    pub fn move_element(&mut self, id: &str, position: Point) -> Result<MutationOutcome> {
        let mut affected = vec![id.to_string()];
        if let Some(index) = self.stages.iter().position(|s| s.id == id) {
            let stage = &mut self.stages[index];
            let dx = position.x - stage.position.x;
            let dy = position.y - stage.position.y;
            stage.position = position;
            let children: Vec<NodeId> = self
                .containment
                .iter()
                .filter(|(_, owner)| owner.as_str() == id)
                .map(|(node, _)| node.clone())
                .collect();
            for child in &children {
                if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == child) {
                    node.position = node.position.translated(dx, dy);
                }
            }
            extend_unique(&mut affected, children);
        } else if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.position = position;
        } else {
            return Err(DiagramError::UnknownElement(id.to_string()));
        }
        extend_unique(&mut affected, self.refresh_containment());
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(
            Mutation::MoveElement { id: id.to_string() },
            affected,
        ))
    }

    /// Resize a stage or task node
    ///
    /// A stage resized below the union of its contained nodes' boxes is
    /// grown back to enclose them instead of silently evicting nodes.
    pub fn resize_element(&mut self, id: &str, size: Size) -> Result<MutationOutcome> {
        let mut affected = vec![id.to_string()];
        if let Some(index) = self.stages.iter().position(|s| s.id == id) {
            let requested = Rect::new(self.stages[index].position, size);
            let children: Vec<&TaskNode> = self
                .nodes
                .iter()
                .filter(|n| self.containment.get(&n.id).map(String::as_str) == Some(id))
                .collect();
            let fitted = enclosing_rect(requested, children.into_iter());
            let stage = &mut self.stages[index];
            stage.position = fitted.origin;
            stage.size = fitted.size;
        } else if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.size = size;
        } else {
            return Err(DiagramError::UnknownElement(id.to_string()));
        }
        extend_unique(&mut affected, self.refresh_containment());
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(
            Mutation::ResizeElement { id: id.to_string() },
            affected,
        ))
    }

    /// Remove a set of elements
    ///
    /// Removing a stage unembeds its contained nodes (they stay in the
    /// diagram). Removing a task node also removes every connection
    /// incident to it. Ids not present in the diagram are ignored.
    pub fn remove(&mut self, ids: &[ElementId]) -> Result<MutationOutcome> {
        let requested: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let stage_ids: HashSet<StageId> = self
            .stages
            .iter()
            .filter(|s| requested.contains(s.id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        let node_ids: HashSet<NodeId> = self
            .nodes
            .iter()
            .filter(|n| requested.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        let connection_ids: HashSet<ElementId> = self
            .connections
            .iter()
            .filter(|c| {
                requested.contains(c.id.as_str())
                    || node_ids.contains(&c.source)
                    || node_ids.contains(&c.target)
            })
            .map(|c| c.id.clone())
            .collect();

        // Nodes unembedded by a removed stage survive and must be
        // re-evaluated downstream.
        let unembedded: Vec<NodeId> = self
            .containment
            .iter()
            .filter(|(node, owner)| stage_ids.contains(*owner) && !node_ids.contains(*node))
            .map(|(node, _)| node.clone())
            .collect();

        // Surviving endpoints of removed connections lose a link.
        let orphaned_endpoints: Vec<NodeId> = self
            .connections
            .iter()
            .filter(|c| connection_ids.contains(&c.id))
            .flat_map(|c| [c.source.clone(), c.target.clone()])
            .filter(|endpoint| !node_ids.contains(endpoint))
            .collect();

        self.stages.retain(|s| !stage_ids.contains(&s.id));
        self.nodes.retain(|n| !node_ids.contains(&n.id));
        self.connections.retain(|c| !connection_ids.contains(&c.id));

        let mut removed: Vec<ElementId> = Vec::new();
        extend_unique(&mut removed, stage_ids);
        extend_unique(&mut removed, node_ids);
        extend_unique(&mut removed, connection_ids);

        let mut affected = removed.clone();
        extend_unique(&mut affected, unembedded);
        extend_unique(&mut affected, orphaned_endpoints);
        extend_unique(&mut affected, self.refresh_containment());
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(
            Mutation::RemoveElements { ids: removed },
            affected,
        ))
    }

    /// Rename a stage or task node
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> Result<MutationOutcome> {
        let name = name.into();
        if let Some(stage) = self.stages.iter_mut().find(|s| s.id == id) {
            stage.name = name;
        } else if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.name = name;
        } else {
            return Err(DiagramError::UnknownElement(id.to_string()));
        }
        let affected = vec![id.to_string()];
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(
            Mutation::Rename { id: id.to_string() },
            affected,
        ))
    }

    /// Replace a task node's configuration
    pub fn update_node_config(
        &mut self,
        id: &str,
        config: TaskConfig,
    ) -> Result<MutationOutcome> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DiagramError::UnknownElement(id.to_string()))?;
        node.config = config;
        let affected = vec![id.to_string()];
        self.reset_validation(&affected);
        Ok(MutationOutcome::new(
            Mutation::UpdateNodeConfig { id: id.to_string() },
            affected,
        ))
    }

    // ---- cosmetic mutations ----

    /// Apply validation tags to elements (cosmetic)
    pub fn set_validation_states(
        &mut self,
        tags: &[(ElementId, ValidationState)],
    ) -> MutationOutcome {
        let mut affected = Vec::new();
        for (id, state) in tags {
            if let Some(stage) = self.stages.iter_mut().find(|s| &s.id == id) {
                stage.validation_state = *state;
                affected.push(id.clone());
            } else if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
                node.validation_state = *state;
                affected.push(id.clone());
            }
        }
        MutationOutcome::new(Mutation::SetValidationStates, affected)
    }

    /// Reset every validation tag to `Normal` (cosmetic)
    pub fn clear_validation_states(&mut self) -> MutationOutcome {
        let mut affected = Vec::new();
        for stage in &mut self.stages {
            if stage.validation_state != ValidationState::Normal {
                stage.validation_state = ValidationState::Normal;
                affected.push(stage.id.clone());
            }
        }
        for node in &mut self.nodes {
            if node.validation_state != ValidationState::Normal {
                node.validation_state = ValidationState::Normal;
                affected.push(node.id.clone());
            }
        }
        MutationOutcome::new(Mutation::ClearValidationStates, affected)
    }

    /// Replace the selection highlight (cosmetic)
    pub fn set_selection(&mut self, ids: &[NodeId]) -> MutationOutcome {
        let selected: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for node in &mut self.nodes {
            node.selected = selected.contains(node.id.as_str());
        }
        MutationOutcome::new(Mutation::SetSelection { ids: ids.to_vec() }, ids.to_vec())
    }

    /// Show or hide a node's connection ports (cosmetic)
    pub fn set_ports_visible(&mut self, id: &str, visible: bool) -> Result<MutationOutcome> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DiagramError::UnknownElement(id.to_string()))?;
        node.ports_visible = visible;
        Ok(MutationOutcome::new(
            Mutation::SetPortsVisible { id: id.to_string(), visible },
            vec![id.to_string()],
        ))
    }

    // ---- queries ----

    /// Find a stage by id
    pub fn find_stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Find a task node by id
    pub fn find_node(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a connection by id
    pub fn find_connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Connections incident to a task node
    pub fn connections_of<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.touches(node_id))
    }

    /// The stage currently owning a task node, if any
    pub fn containing_stage(&self, node_id: &str) -> Option<&StageId> {
        self.containment.get(node_id)
    }

    /// Whether the diagram has no task nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rebuild the derived containment map
    ///
    /// Returns the ids of nodes whose owning stage changed. Must be
    /// called after deserializing a diagram from any source.
    pub fn refresh_containment(&mut self) -> Vec<NodeId> {
        let next = compute_containment(&self.stages, &self.nodes);
        let mut changed: Vec<NodeId> = Vec::new();
        for node in &self.nodes {
            if self.containment.get(&node.id) != next.get(&node.id) {
                changed.push(node.id.clone());
            }
        }
        self.containment = next;
        changed
    }

    // ---- internals ----

    fn ensure_free_id(&self, id: &str) -> Result<()> {
        let taken = self.stages.iter().any(|s| s.id == id)
            || self.nodes.iter().any(|n| n.id == id)
            || self.connections.iter().any(|c| c.id == id);
        if taken {
            Err(DiagramError::DuplicateId(id.to_string()))
        } else {
            Ok(())
        }
    }

    fn check_endpoint(&self, connection_id: &str, end: &'static str, node_id: &str) -> Result<()> {
        if node_id.trim().is_empty() {
            return Err(DiagramError::BlankEndpoint {
                id: connection_id.to_string(),
                end,
            });
        }
        if self.nodes.iter().any(|n| n.id == node_id) {
            return Ok(());
        }
        if self.stages.iter().any(|s| s.id == node_id)
            || self.connections.iter().any(|c| c.id == node_id)
        {
            return Err(DiagramError::InvalidEndpoint {
                id: connection_id.to_string(),
                target: node_id.to_string(),
            });
        }
        Err(DiagramError::DanglingEndpoint {
            id: connection_id.to_string(),
            node_id: node_id.to_string(),
        })
    }

    fn reset_validation(&mut self, ids: &[ElementId]) {
        for id in ids {
            if let Some(stage) = self.stages.iter_mut().find(|s| &s.id == id) {
                stage.validation_state = ValidationState::Normal;
            } else if let Some(node) = self.nodes.iter_mut().find(|n| &n.id == id) {
                node.validation_state = ValidationState::Normal;
            }
        }
    }
}

fn extend_unique(target: &mut Vec<ElementId>, extra: impl IntoIterator<Item = ElementId>) {
    for id in extra {
        if !target.contains(&id) {
            target.push(id);
        }
    }
}
