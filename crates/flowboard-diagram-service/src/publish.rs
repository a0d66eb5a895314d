//! Publish orchestration
//!
//! Publishing promotes a draft diagram to an executable workflow
//! definition consumed by the external scheduler. The orchestrator
//! runs the validation engine over a snapshot, and only on success
//! serializes the cell list, collects a preview and issues the final
//! save. One explicit user action, guarded against re-entrancy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use diagram_engine::{cells, validate, Diagram, DiagramEvent, EventSink, ValidationReport};
use diagram_engine::types::ElementId;
use diagram_engine::validation::Rule;

use crate::api::{SaveRequest, SaveType, WorkflowApi};
use crate::error::{Result, ServiceError};
use crate::preview::PreviewRenderer;
use crate::report::ErrorReporter;

/// Result of a publish attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// The diagram is now an executable workflow definition
    Published,
    /// Validation blocked the attempt; offenders carry the element ids
    /// to highlight
    Blocked {
        rule: Rule,
        offenders: Vec<ElementId>,
    },
}

/// Runs validation and the final save for one editor session
pub struct PublishOrchestrator {
    api: Arc<dyn WorkflowApi>,
    renderer: Arc<dyn PreviewRenderer>,
    sink: Arc<dyn EventSink>,
    reporter: Arc<ErrorReporter>,
    in_flight: AtomicBool,
    published: AtomicBool,
}

impl PublishOrchestrator {
    pub fn new(
        api: Arc<dyn WorkflowApi>,
        renderer: Arc<dyn PreviewRenderer>,
        sink: Arc<dyn EventSink>,
        reporter: Arc<ErrorReporter>,
    ) -> Self {
        Self {
            api,
            renderer,
            sink,
            reporter,
            in_flight: AtomicBool::new(false),
            published: AtomicBool::new(false),
        }
    }

    /// Whether a publish attempt succeeded in this session
    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::SeqCst)
    }

    /// Validate the snapshot and, when ready, issue the final save
    ///
    /// Returns `Blocked` with the first failing rule instead of an
    /// error: a validation failure is an expected outcome, not an
    /// exceptional one. Transport failures are errors, reported through
    /// the debounced channel as well.
    pub async fn publish(&self, workflow_id: &str, snapshot: &Diagram) -> Result<PublishOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ServiceError::PublishInFlight);
        }
        let result = self.publish_inner(workflow_id, snapshot).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn publish_inner(
        &self,
        workflow_id: &str,
        snapshot: &Diagram,
    ) -> Result<PublishOutcome> {
        if let ValidationReport::Blocked { rule, offenders } = validate(snapshot) {
            let _ = self.sink.send(DiagramEvent::ValidationFailed {
                rule,
                offenders: offenders.clone(),
                message: rule.message().to_string(),
            });
            return Ok(PublishOutcome::Blocked { rule, offenders });
        }

        let content = cells::encode_content(snapshot)?;
        let image = match self.renderer.render_preview(snapshot).await {
            Ok(data_uri) => Some(data_uri),
            Err(err) => {
                self.reporter.report(format!("preview rendering failed: {}", err));
                None
            }
        };

        let request = SaveRequest {
            content,
            save_type: SaveType::Final,
            image,
        };
        if let Err(err) = self.api.save_content(workflow_id, request).await {
            self.reporter
                .report(format!("publish of '{}' failed: {}", workflow_id, err));
            return Err(err);
        }

        log::debug!("published workflow '{}'", workflow_id);
        self.published.store(true, Ordering::SeqCst);
        let _ = self.sink.send(DiagramEvent::Published {
            workflow_id: workflow_id.to_string(),
        });
        Ok(PublishOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use diagram_engine::{DiagramBuilder, VecEventSink};
    use diagram_engine::types::{StartMode, TaskConfig};

    use crate::preview::NullPreviewRenderer;
    use crate::testing::{MockWorkflowApi, SlowPreviewRenderer};

    fn configured() -> TaskConfig {
        TaskConfig {
            start_mode: Some(StartMode::Scheduled),
            ..TaskConfig::default()
        }
    }

    fn ready_diagram() -> Diagram {
        DiagramBuilder::new()
            .node("a", "Pull orders", (0.0, 0.0), (160.0, 80.0))
            .with_config(configured())
            .node("b", "Cleanse", (0.0, 200.0), (160.0, 80.0))
            .with_config(configured())
            .connect("a", "b")
            .build()
    }

    fn orchestrator(
        api: Arc<MockWorkflowApi>,
        sink: Arc<VecEventSink>,
    ) -> PublishOrchestrator {
        let reporter = Arc::new(ErrorReporter::new(sink.clone(), Duration::from_secs(3)));
        PublishOrchestrator::new(api, Arc::new(NullPreviewRenderer), sink, reporter)
    }

    #[tokio::test]
    async fn test_blocked_diagram_emits_one_validation_event() {
        let api = Arc::new(MockWorkflowApi::new());
        let sink = Arc::new(VecEventSink::new());
        let orchestrator = orchestrator(api.clone(), sink.clone());

        let snapshot = DiagramBuilder::new()
            .node("a", "Task", (0.0, 0.0), (160.0, 80.0))
            .build();
        let outcome = orchestrator.publish("wf-1", &snapshot).await.unwrap();
        assert!(matches!(
            outcome,
            PublishOutcome::Blocked { rule: Rule::MissingConfig, .. }
        ));
        assert!(api.saves().is_empty());
        assert_eq!(sink.events().len(), 1);
        assert!(!orchestrator.is_published());
    }

    #[tokio::test]
    async fn test_ready_diagram_issues_final_save() {
        let api = Arc::new(MockWorkflowApi::new());
        let sink = Arc::new(VecEventSink::new());
        let orchestrator = orchestrator(api.clone(), sink.clone());

        let outcome = orchestrator.publish("wf-1", &ready_diagram()).await.unwrap();
        assert_eq!(outcome, PublishOutcome::Published);
        assert!(orchestrator.is_published());

        let saves = api.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].1.save_type, SaveType::Final);
        assert!(saves[0].1.image.is_some());
        assert!(sink
            .events()
            .iter()
            .any(|event| matches!(event, DiagramEvent::Published { .. })));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_published() {
        let api = Arc::new(MockWorkflowApi::new());
        api.fail_saves(true);
        let sink = Arc::new(VecEventSink::new());
        let orchestrator = orchestrator(api.clone(), sink.clone());

        let result = orchestrator.publish("wf-1", &ready_diagram()).await;
        assert!(result.is_err());
        assert!(!orchestrator.is_published());
        assert!(sink
            .events()
            .iter()
            .any(|event| matches!(event, DiagramEvent::SaveFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentrant_publish_is_rejected() {
        let api = Arc::new(MockWorkflowApi::new());
        let sink = Arc::new(VecEventSink::new());
        let reporter = Arc::new(ErrorReporter::new(sink.clone(), Duration::from_secs(3)));
        let orchestrator = Arc::new(PublishOrchestrator::new(
            api,
            Arc::new(SlowPreviewRenderer::new(Duration::from_secs(10))),
            sink,
            reporter,
        ));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.publish("wf-1", &ready_diagram()).await })
        };
        // Let the first attempt reach the (slow) preview render
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        let second = orchestrator.publish("wf-1", &ready_diagram()).await;
        assert!(matches!(second, Err(ServiceError::PublishInFlight)));

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(first.await.unwrap().is_ok());
    }
}
