//! Shared test doubles for the service crate

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use diagram_engine::Diagram;
use parking_lot::Mutex;

use crate::api::{ExecutorRole, SaveRequest, WorkflowApi, WorkflowContent};
use crate::autosave::{DraftSnapshot, SnapshotSource};
use crate::error::{Result, ServiceError};
use crate::preview::PreviewRenderer;

/// In-memory workflow API that records every save call
pub(crate) struct MockWorkflowApi {
    content: Mutex<String>,
    roles: Mutex<Vec<ExecutorRole>>,
    saves: Mutex<Vec<(String, SaveRequest)>>,
    fail_saves: AtomicBool,
    not_found: AtomicBool,
    save_delay: Mutex<Duration>,
}

impl MockWorkflowApi {
    pub(crate) fn new() -> Self {
        Self {
            content: Mutex::new(String::new()),
            roles: Mutex::new(Vec::new()),
            saves: Mutex::new(Vec::new()),
            fail_saves: AtomicBool::new(false),
            not_found: AtomicBool::new(false),
            save_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub(crate) fn set_content(&self, content: &str) {
        *self.content.lock() = content.to_string();
    }

    pub(crate) fn set_roles(&self, roles: Vec<ExecutorRole>) {
        *self.roles.lock() = roles;
    }

    /// All recorded save calls as (workflow id, request)
    pub(crate) fn saves(&self) -> Vec<(String, SaveRequest)> {
        self.saves.lock().clone()
    }

    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_not_found(&self, not_found: bool) {
        self.not_found.store(not_found, Ordering::SeqCst);
    }

    pub(crate) fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock() = delay;
    }
}

#[async_trait]
impl WorkflowApi for MockWorkflowApi {
    async fn fetch_content(&self, workflow_id: &str) -> Result<WorkflowContent> {
        if self.not_found.load(Ordering::SeqCst) {
            return Err(ServiceError::WorkflowNotFound(workflow_id.to_string()));
        }
        Ok(WorkflowContent {
            content: self.content.lock().clone(),
        })
    }

    async fn save_content(&self, workflow_id: &str, request: SaveRequest) -> Result<()> {
        let delay = *self.save_delay.lock();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport("simulated failure".to_string()));
        }
        *self.content.lock() = request.content.clone();
        self.saves.lock().push((workflow_id.to_string(), request));
        Ok(())
    }

    async fn fetch_roles(&self) -> Result<Vec<ExecutorRole>> {
        Ok(self.roles.lock().clone())
    }
}

/// Snapshot source backed by settable shared state
pub(crate) struct SharedSnapshotSource {
    state: Mutex<Option<(String, Diagram)>>,
}

impl SharedSnapshotSource {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    pub(crate) fn set(&self, workflow_id: &str, diagram: Diagram) {
        *self.state.lock() = Some((workflow_id.to_string(), diagram));
    }
}

impl SnapshotSource for SharedSnapshotSource {
    fn snapshot(&self) -> Option<DraftSnapshot> {
        self.state.lock().as_ref().map(|(workflow_id, diagram)| DraftSnapshot {
            workflow_id: workflow_id.clone(),
            diagram: diagram.clone(),
        })
    }
}

/// Renderer that takes a while, for re-entrancy tests
pub(crate) struct SlowPreviewRenderer {
    delay: Duration,
}

impl SlowPreviewRenderer {
    pub(crate) fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PreviewRenderer for SlowPreviewRenderer {
    async fn render_preview(&self, _diagram: &Diagram) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("data:image/png;base64,AAAA".to_string())
    }
}
