//! Engine configuration

use std::time::Duration;
use tracing::warn;

/// Default bound on how long a mutation waits for its user's lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the `PointEngine`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum time a charge or use waits for the per-user lock
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with a custom lock timeout
    ///
    /// A zero timeout would reject every contended mutation, so it falls
    /// back to the default with a warning.
    pub fn new(lock_timeout: Duration) -> Self {
        let lock_timeout = if lock_timeout.is_zero() {
            warn!(
                default_ms = DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
                "Invalid lock_timeout (0ms), using default"
            );
            DEFAULT_LOCK_TIMEOUT
        } else {
            lock_timeout
        };

        Self { lock_timeout }
    }

    /// Create a config from a timeout in milliseconds
    pub fn from_millis(lock_timeout_ms: u64) -> Self {
        Self::new(Duration::from_millis(lock_timeout_ms))
    }
}
