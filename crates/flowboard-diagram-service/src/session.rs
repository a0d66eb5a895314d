//! The editor session: wiring between model, history and services
//!
//! One session owns one diagram for the lifetime of an editor tab. All
//! mutations arrive here (relayed from the canvas), are applied to the
//! model, recorded in history when semantic, and handed to the
//! autosave scheduler. There is exactly one mutator, serialized
//! through the host's event loop; the locks below only guard against
//! the async persistence tasks reading mid-write.

use std::sync::Arc;

use diagram_engine::{
    cells, Diagram, DiagramEvent, EventSink, HistoryStack, MutationOutcome, SaveStatus, Stage,
    TaskConfig, TaskNode, ValidationReport,
};
use diagram_engine::geometry::{Point, Size};
use diagram_engine::types::{Connection, ElementId, NodeId};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::api::{ExecutorRole, WorkflowApi};
use crate::autosave::{AutosaveScheduler, DraftSnapshot, SnapshotSource};
use crate::config::AutosaveConfig;
use crate::error::{Result, ServiceError};
use crate::preview::PreviewRenderer;
use crate::publish::{PublishOrchestrator, PublishOutcome};
use crate::report::ErrorReporter;

/// Feeds the autosave scheduler the latest state at save time
struct SessionSnapshotSource {
    workflow_id: Arc<RwLock<Option<String>>>,
    diagram: Arc<RwLock<Diagram>>,
}

impl SnapshotSource for SessionSnapshotSource {
    fn snapshot(&self) -> Option<DraftSnapshot> {
        let workflow_id = self.workflow_id.read().clone()?;
        Some(DraftSnapshot {
            workflow_id,
            diagram: self.diagram.read().clone(),
        })
    }
}

/// An interactive edit session over one workflow diagram
pub struct EditorSession {
    workflow_id: Arc<RwLock<Option<String>>>,
    diagram: Arc<RwLock<Diagram>>,
    history: Mutex<HistoryStack>,
    scheduler: AutosaveScheduler,
    publisher: PublishOrchestrator,
    api: Arc<dyn WorkflowApi>,
    sink: Arc<dyn EventSink>,
    roles: RwLock<Vec<ExecutorRole>>,
}

impl EditorSession {
    /// Create a detached session; call [`load`](Self::load) or
    /// [`create`](Self::create) to bind a workflow identity.
    pub fn new(
        api: Arc<dyn WorkflowApi>,
        renderer: Arc<dyn PreviewRenderer>,
        sink: Arc<dyn EventSink>,
        config: AutosaveConfig,
    ) -> Self {
        let workflow_id = Arc::new(RwLock::new(None));
        let diagram = Arc::new(RwLock::new(Diagram::new()));
        let reporter = Arc::new(ErrorReporter::new(sink.clone(), config.error_debounce));
        let source = Arc::new(SessionSnapshotSource {
            workflow_id: workflow_id.clone(),
            diagram: diagram.clone(),
        });
        let scheduler = AutosaveScheduler::new(
            api.clone(),
            renderer.clone(),
            source,
            sink.clone(),
            reporter.clone(),
            config,
        );
        let publisher = PublishOrchestrator::new(api.clone(), renderer, sink.clone(), reporter);
        Self {
            workflow_id,
            diagram,
            history: Mutex::new(HistoryStack::default()),
            scheduler,
            publisher,
            api,
            sink,
            roles: RwLock::new(Vec::new()),
        }
    }

    // ---- lifecycle ----

    /// Load the persisted diagram for an existing workflow
    pub async fn load(&self, workflow_id: &str) -> Result<()> {
        let content = self.api.fetch_content(workflow_id).await?;
        let diagram = cells::decode_content(&content.content)?;
        self.bind(workflow_id, diagram)?;
        self.refresh_roles().await?;
        Ok(())
    }

    /// Start editing a freshly issued workflow identity
    pub async fn create(&self, workflow_id: &str) -> Result<()> {
        self.bind(workflow_id, Diagram::new())?;
        self.refresh_roles().await?;
        Ok(())
    }

    fn bind(&self, workflow_id: &str, diagram: Diagram) -> Result<()> {
        {
            let mut history = self.history.lock();
            history.clear();
            history.push(&diagram)?;
        }
        *self.diagram.write() = diagram;
        *self.workflow_id.write() = Some(workflow_id.to_string());
        Ok(())
    }

    /// Unbind the workflow identity and cancel pending persistence
    ///
    /// Called when the editor navigates away; a save must never target
    /// an identity that is no longer open.
    pub fn detach(&self) {
        *self.workflow_id.write() = None;
        self.scheduler.cancel_pending();
    }

    /// The bound workflow identity, if any
    pub fn workflow_id(&self) -> Option<String> {
        self.workflow_id.read().clone()
    }

    /// A snapshot of the current diagram state
    pub fn diagram(&self) -> Diagram {
        self.diagram.read().clone()
    }

    // ---- semantic mutations ----

    pub fn add_stage(&self, stage: Stage) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().add_stage(stage)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    pub fn add_node(&self, node: TaskNode) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().add_node(node)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    pub fn add_connection(&self, connection: Connection) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().add_connection(connection)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    pub fn move_element(&self, id: &str, position: Point) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().move_element(id, position)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    pub fn resize_element(&self, id: &str, size: Size) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().resize_element(id, size)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    pub fn remove(&self, ids: &[ElementId]) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().remove(ids)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    pub fn rename(&self, id: &str, name: &str) -> Result<Vec<ElementId>> {
        let outcome = self.diagram.write().rename(id, name)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    /// Update a task node's configuration
    ///
    /// A configuration referencing an executor role that no longer
    /// exists in the catalog means the local state is stale; the
    /// session recovers by reloading the last persisted content
    /// instead of surfacing the broken reference.
    pub async fn update_node_config(
        &self,
        node_id: &str,
        config: TaskConfig,
    ) -> Result<Vec<ElementId>> {
        if let Some(role) = config.executor_role.as_deref() {
            let known = self.roles.read().iter().any(|r| r.id == role);
            if !known {
                log::warn!(
                    "executor role '{}' no longer exists; reloading diagram",
                    role
                );
                self.reload().await?;
                return Ok(Vec::new());
            }
        }
        let outcome = self.diagram.write().update_node_config(node_id, config)?;
        self.commit(&outcome);
        Ok(outcome.affected)
    }

    // ---- cosmetic mutations (no history, no autosave) ----

    pub fn set_selection(&self, ids: &[NodeId]) {
        self.diagram.write().set_selection(ids);
    }

    pub fn set_ports_visible(&self, id: &str, visible: bool) -> Result<()> {
        self.diagram.write().set_ports_visible(id, visible)?;
        Ok(())
    }

    pub fn clear_validation_states(&self) {
        self.diagram.write().clear_validation_states();
    }

    // ---- history ----

    /// Restore the previous semantic state; returns false at the
    /// oldest state
    pub fn undo(&self) -> Result<bool> {
        let restored = match self.history.lock().undo() {
            None => return Ok(false),
            Some(diagram) => diagram?,
        };
        *self.diagram.write() = restored;
        self.scheduler.notify_mutated();
        Ok(true)
    }

    /// Re-apply an undone semantic state; returns false at the newest
    /// state
    pub fn redo(&self) -> Result<bool> {
        let restored = match self.history.lock().redo() {
            None => return Ok(false),
            Some(diagram) => diagram?,
        };
        *self.diagram.write() = restored;
        self.scheduler.notify_mutated();
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().can_redo()
    }

    // ---- publish ----

    /// Run the readiness check and, when it passes, the final save
    ///
    /// On a blocked attempt the offending elements are tagged on the
    /// live diagram for highlighting.
    pub async fn publish(&self) -> Result<PublishOutcome> {
        let workflow_id = self
            .workflow_id
            .read()
            .clone()
            .ok_or(ServiceError::MissingWorkflowId)?;
        let snapshot = self.diagram.read().clone();
        let outcome = self.publisher.publish(&workflow_id, &snapshot).await?;
        if let PublishOutcome::Blocked { rule, offenders } = &outcome {
            let mut diagram = self.diagram.write();
            diagram.clear_validation_states();
            ValidationReport::Blocked {
                rule: *rule,
                offenders: offenders.clone(),
            }
            .apply(&mut diagram);
        }
        Ok(outcome)
    }

    pub fn is_published(&self) -> bool {
        self.publisher.is_published()
    }

    // ---- observability ----

    /// Observe the autosave indicator
    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.scheduler.status()
    }

    /// The cached executor role catalog
    pub fn roles(&self) -> Vec<ExecutorRole> {
        self.roles.read().clone()
    }

    /// Re-fetch the executor role catalog
    pub async fn refresh_roles(&self) -> Result<()> {
        let roles = self.api.fetch_roles().await?;
        *self.roles.write() = roles;
        Ok(())
    }

    // ---- internals ----

    fn commit(&self, outcome: &MutationOutcome) {
        if outcome.mutation.is_cosmetic() {
            return;
        }
        if let Err(err) = self
            .history
            .lock()
            .record(&outcome.mutation, &self.diagram.read())
        {
            log::warn!("history snapshot failed: {}", err);
        }
        self.scheduler.notify_mutated();
    }

    /// Replace the in-memory diagram with the last persisted content
    async fn reload(&self) -> Result<()> {
        let workflow_id = self
            .workflow_id
            .read()
            .clone()
            .ok_or(ServiceError::MissingWorkflowId)?;
        let content = self.api.fetch_content(&workflow_id).await?;
        let diagram = cells::decode_content(&content.content)?;
        self.bind(&workflow_id, diagram)?;
        let _ = self.sink.send(DiagramEvent::DiagramReloaded { workflow_id });
        Ok(())
    }
}
