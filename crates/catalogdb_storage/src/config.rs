//! File access configuration.

use std::time::Duration;

/// Timing policy for a [`FileAccessManager`](crate::FileAccessManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessConfig {
    /// How long a read waits for the file lock before falling back to an
    /// unguarded read.
    pub read_lock_timeout: Duration,

    /// How many times a failed read is retried.
    pub read_retries: u32,

    /// Base delay between read retries. Attempt `n` waits `n * retry_delay`.
    pub retry_delay: Duration,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            read_lock_timeout: Duration::from_secs(3),
            read_retries: 2,
            retry_delay: Duration::from_millis(50),
        }
    }
}

impl AccessConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bounded wait for read access.
    #[must_use]
    pub const fn read_lock_timeout(mut self, timeout: Duration) -> Self {
        self.read_lock_timeout = timeout;
        self
    }

    /// Sets the number of read retries.
    #[must_use]
    pub const fn read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    /// Sets the base retry delay.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AccessConfig::default();
        assert_eq!(config.read_lock_timeout, Duration::from_secs(3));
        assert_eq!(config.read_retries, 2);
    }

    #[test]
    fn builder_pattern() {
        let config = AccessConfig::new()
            .read_lock_timeout(Duration::from_millis(10))
            .read_retries(0)
            .retry_delay(Duration::from_millis(1));

        assert_eq!(config.read_lock_timeout, Duration::from_millis(10));
        assert_eq!(config.read_retries, 0);
        assert_eq!(config.retry_delay, Duration::from_millis(1));
    }
}
