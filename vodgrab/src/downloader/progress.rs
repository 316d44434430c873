//! Progress events and the sinks they are delivered to.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Human status carried by every `Progress` event.
pub const STATUS_DOWNLOADING: &str = "Downloading";

/// One update about an acquisition, as relayed to observers.
///
/// Serialized with an internal `type` tag:
/// `{"type":"progress","percentage":50,"status":"Downloading","duration":"00:01","size":"1024kB"}`,
/// `{"type":"complete"}`, `{"type":"error","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress {
        /// `round(elapsed / expected * 100)`. May exceed 100 when the expected
        /// duration was too short.
        percentage: u32,
        status: String,
        /// Elapsed media time as `HH:MM`.
        #[serde(rename = "duration")]
        elapsed: String,
        /// Output size label as printed by the transcoder, e.g. `1024kB`.
        size: String,
    },
    Complete,
    Error {
        message: String,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error { .. })
    }

    pub fn percentage(&self) -> Option<u32> {
        match self {
            Self::Progress { percentage, .. } => Some(*percentage),
            _ => None,
        }
    }
}

/// Receives the events of one acquisition. Owned by the caller.
///
/// Delivery must not block; a sink that cannot keep up should drop events
/// rather than stall the transcoder's output reader.
pub trait ProgressSink: Send + Sync {
    fn send(&self, event: ProgressEvent);
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn send(&self, event: ProgressEvent) {
        if mpsc::UnboundedSender::send(self, event).is_err() {
            trace!("Progress receiver dropped");
        }
    }
}

impl ProgressSink for mpsc::Sender<ProgressEvent> {
    fn send(&self, event: ProgressEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "Progress channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("Progress receiver dropped");
            }
        }
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn send(&self, event: ProgressEvent) {
        (**self).send(event)
    }
}

/// Adapts a callback into a [`ProgressSink`].
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn send(&self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Enforces the event ordering rules for one acquisition.
///
/// - `Progress` is forwarded only when its percentage is strictly greater
///   than the last one forwarded (starting from 0), so percentages never
///   repeat and never go down.
/// - At most one terminal event (`Complete` or `Error`) is forwarded, and
///   nothing is forwarded after it.
pub struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    last_percentage: u32,
    finished: bool,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last_percentage: 0,
            finished: false,
        }
    }

    /// Returns whether the event was forwarded.
    pub fn progress(&mut self, percentage: u32, elapsed: String, size: String) -> bool {
        if self.finished || percentage <= self.last_percentage {
            return false;
        }
        self.last_percentage = percentage;
        self.sink.send(ProgressEvent::Progress {
            percentage,
            status: STATUS_DOWNLOADING.to_string(),
            elapsed,
            size,
        });
        true
    }

    pub fn complete(&mut self) -> bool {
        self.finish(ProgressEvent::Complete)
    }

    pub fn error(&mut self, message: impl Into<String>) -> bool {
        self.finish(ProgressEvent::Error {
            message: message.into(),
        })
    }

    fn finish(&mut self, event: ProgressEvent) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        self.sink.send(event);
        true
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
