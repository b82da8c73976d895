//! Opens the log exactly once per engine lifetime and hands out the
//! [`StreamManager`] built on top of it.

use storage_core::Result;

use crate::config::StreamConfig;
use crate::external::Log;
use crate::stream::StreamManager;

/// Owns the single [`Log`] an engine instance is configured with.
pub struct LogManager<L: Log> {
    log: L,
}

impl<L: Log> LogManager<L> {
    pub fn new(log: L) -> Self {
        Self { log }
    }

    /// Opens the log's stream and wraps it in a [`StreamManager`]
    /// configured with `config`.
    pub fn open_stream(&self, config: StreamConfig) -> Result<StreamManager<L::Stream>> {
        let stream = self.log.open()?;
        Ok(StreamManager::new(stream, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::testing::MemoryLog;

    #[test]
    fn opens_a_usable_stream() {
        let manager = LogManager::new(MemoryLog::new());
        let mut stream = manager.open_stream(StreamConfig::default()).unwrap();
        assert_eq!(stream.read_from_beginning().unwrap(), vec![]);
    }
}
