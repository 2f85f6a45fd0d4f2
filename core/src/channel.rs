//! Channel configuration for the per-request log

use crate::response::RequestOutcome;
use tokio::sync::mpsc;

/// Channel buffer configuration for scheduler communication
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Request log buffer size (workers -> log writer)
    pub outcome_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            outcome_buffer: 10_000,
        }
    }
}

impl ChannelConfig {
    /// Create a new channel config with a custom request log buffer size
    pub fn with_outcome_buffer(mut self, size: usize) -> Self {
        self.outcome_buffer = size.max(1);
        self
    }
}

/// Bounded channel carrying every recorded outcome to a log writer
pub fn outcome_channel(
    config: &ChannelConfig,
) -> (mpsc::Sender<RequestOutcome>, mpsc::Receiver<RequestOutcome>) {
    mpsc::channel(config.outcome_buffer)
}
