//! Debounced error reporting
//!
//! Persistence and preview failures are transient and non-fatal; the
//! in-memory model is never rolled back for them. They are surfaced to
//! the user, but a burst of failures (e.g. the backend going away for
//! a few seconds mid-drag) collapses to one visible message.

use std::sync::Arc;
use std::time::Duration;

use diagram_engine::{DiagramEvent, EventSink};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Collapses failures inside a window into one `SaveFailed` event
pub struct ErrorReporter {
    sink: Arc<dyn EventSink>,
    window: Duration,
    last_report: Mutex<Option<Instant>>,
}

impl ErrorReporter {
    pub fn new(sink: Arc<dyn EventSink>, window: Duration) -> Self {
        Self {
            sink,
            window,
            last_report: Mutex::new(None),
        }
    }

    /// Report a failure; suppressed if one was already shown recently
    ///
    /// Every failure is logged regardless.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);

        let now = Instant::now();
        let mut last = self.last_report.lock();
        if let Some(previous) = *last {
            if now.duration_since(previous) < self.window {
                return;
            }
        }
        *last = Some(now);
        let _ = self.sink.send(DiagramEvent::SaveFailed {
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagram_engine::VecEventSink;

    #[tokio::test(start_paused = true)]
    async fn test_failures_collapse_within_window() {
        let sink = Arc::new(VecEventSink::new());
        let reporter = ErrorReporter::new(sink.clone(), Duration::from_secs(3));

        reporter.report("save failed");
        reporter.report("save failed again");
        reporter.report("and again");
        assert_eq!(sink.events().len(), 1);

        tokio::time::advance(Duration::from_secs(4)).await;
        reporter.report("later failure");
        assert_eq!(sink.events().len(), 2);
    }
}
