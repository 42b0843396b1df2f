use std::future::Future;

use stream_bridge_core::entry::TransportEntry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Destination for one batch of at most ten entries. Implementations are
/// shared across concurrently running submissions.
pub trait EventSink: Send + Sync + 'static {
    fn put_events(
        &self,
        entries: Vec<TransportEntry>,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
