//! Resource limits for terminal sessions
//!
//! These limits keep a single session from hanging a request forever or
//! growing its persisted history without bound.

use std::time::Duration;

/// Default number of history entries kept per session.
pub const DEFAULT_MAX_HISTORY: usize = 2000;

/// Resource limits for command execution
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Wall-clock limit for a spawned subprocess. The process is killed when
    /// it is exceeded.
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Maximum number of history entries kept; older entries are dropped on
    /// write.
    /// Default: 2,000
    pub max_history: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl ExecutionLimits {
    /// Create new limits with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set subprocess timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum history length
    pub fn max_history(mut self, count: usize) -> Self {
        self.max_history = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.timeout, Duration::from_secs(30));
        assert_eq!(limits.max_history, 2000);
    }

    #[test]
    fn test_builder_pattern() {
        let limits = ExecutionLimits::new()
            .timeout(Duration::from_secs(5))
            .max_history(10);

        assert_eq!(limits.timeout, Duration::from_secs(5));
        assert_eq!(limits.max_history, 10);
    }
}
