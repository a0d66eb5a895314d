//! Throttled autosave scheduling
//!
//! Persists the diagram continuously without flooding the backend or
//! racing itself. Bursts of mutations coalesce: `notify_mutated` arms
//! a single pending task (an arena of one) that sleeps out the
//! throttle window and then saves whatever the snapshot source holds
//! at that moment (trailing-edge, last-write-wins). A mutation landing
//! while a save is in flight re-arms the task for one more window, so
//! at most one save is ever in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use diagram_engine::{cells, Diagram, DiagramEvent, EventSink, SaveStatus};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::{SaveRequest, SaveType, WorkflowApi};
use crate::config::AutosaveConfig;
use crate::error::Result;
use crate::preview::PreviewRenderer;
use crate::report::ErrorReporter;

/// The state an autosave call persists
pub struct DraftSnapshot {
    pub workflow_id: String,
    pub diagram: Diagram,
}

/// Provides the latest diagram state at save time
///
/// Returning `None` means no workflow identity is bound (the editor
/// detached); a pending save aborts silently in that case, since a
/// save must never target a stale or absent identity.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Option<DraftSnapshot>;
}

/// Coalesces mutation bursts into throttled draft saves
pub struct AutosaveScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    api: Arc<dyn WorkflowApi>,
    renderer: Arc<dyn PreviewRenderer>,
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn EventSink>,
    reporter: Arc<ErrorReporter>,
    config: AutosaveConfig,
    status_tx: watch::Sender<SaveStatus>,
    /// Set by `notify_mutated`, consumed when a window closes
    dirty: AtomicBool,
    /// The single pending/in-flight save task
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveScheduler {
    pub fn new(
        api: Arc<dyn WorkflowApi>,
        renderer: Arc<dyn PreviewRenderer>,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn EventSink>,
        reporter: Arc<ErrorReporter>,
        config: AutosaveConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(SaveStatus::Normal);
        Self {
            inner: Arc::new(SchedulerInner {
                api,
                renderer,
                source,
                sink,
                reporter,
                config,
                status_tx,
                dirty: AtomicBool::new(false),
                slot: Mutex::new(None),
            }),
        }
    }

    /// Record that the diagram changed semantically
    ///
    /// Arms the pending save task if none is armed; otherwise the
    /// change rides along with the one already scheduled.
    pub fn notify_mutated(&self) {
        self.inner.dirty.store(true, Ordering::SeqCst);
        let mut slot = self.inner.slot.lock();
        let armed = slot.as_ref().map(|task| !task.is_finished()).unwrap_or(false);
        if !armed {
            let inner = Arc::clone(&self.inner);
            *slot = Some(tokio::spawn(run_pending(inner)));
        }
    }

    /// Abort any pending or in-flight save
    ///
    /// Called when the workflow identity becomes unset.
    pub fn cancel_pending(&self) {
        let mut slot = self.inner.slot.lock();
        if let Some(task) = slot.take() {
            task.abort();
        }
        self.inner.dirty.store(false, Ordering::SeqCst);
        self.inner.set_status(SaveStatus::Normal);
    }

    /// Observe the save-status indicator
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Whether a save is pending or in flight
    pub fn is_pending(&self) -> bool {
        self.inner
            .slot
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl SchedulerInner {
    fn set_status(&self, status: SaveStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current != status {
                *current = status;
                true
            } else {
                false
            }
        });
        if changed {
            let _ = self.sink.send(DiagramEvent::SaveStatusChanged { status });
        }
    }
}

/// The single pending task: one loop iteration per throttle window
async fn run_pending(inner: Arc<SchedulerInner>) {
    loop {
        tokio::time::sleep(inner.config.throttle_window).await;
        inner.dirty.store(false, Ordering::SeqCst);

        let Some(snapshot) = inner.source.snapshot() else {
            // Identity was unset between arming and firing
            *inner.slot.lock() = None;
            return;
        };

        inner.set_status(SaveStatus::Saving);
        match save_draft(&inner, &snapshot).await {
            Ok(()) => {
                log::debug!("autosaved workflow '{}'", snapshot.workflow_id);
                inner.set_status(SaveStatus::Saved);
                tokio::time::sleep(inner.config.saved_display).await;
                inner.set_status(SaveStatus::Normal);
            }
            Err(err) => {
                inner
                    .reporter
                    .report(format!("autosave of '{}' failed: {}", snapshot.workflow_id, err));
                inner.set_status(SaveStatus::Normal);
            }
        }

        // Disarm unless a mutation arrived while saving. The slot lock
        // closes the race with notify_mutated: it sets dirty before
        // checking the slot, so either we see its dirty flag here or it
        // sees the slot already empty and re-arms.
        let mut slot = inner.slot.lock();
        if !inner.dirty.load(Ordering::SeqCst) {
            *slot = None;
            return;
        }
    }
}

async fn save_draft(inner: &SchedulerInner, snapshot: &DraftSnapshot) -> Result<()> {
    let content = cells::encode_content(&snapshot.diagram)?;
    let image = match inner.renderer.render_preview(&snapshot.diagram).await {
        Ok(data_uri) => Some(data_uri),
        Err(err) => {
            inner.reporter.report(format!("preview rendering failed: {}", err));
            None
        }
    };
    inner
        .api
        .save_content(
            &snapshot.workflow_id,
            SaveRequest {
                content,
                save_type: SaveType::Temp,
                image,
            },
        )
        .await
}
