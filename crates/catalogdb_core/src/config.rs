//! Repository configuration.

use catalogdb_storage::AccessConfig;
use std::time::Duration;

/// Configuration for opening a product repository.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to start from an empty store if the file doesn't exist.
    pub create_if_missing: bool,

    /// How long a read waits for a writer before reading unguarded.
    pub read_lock_timeout: Duration,

    /// Extra attempts after a failed read.
    pub read_retries: u32,

    /// Base delay between read attempts, multiplied by the attempt number.
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let access = AccessConfig::default();
        Self {
            create_if_missing: true,
            read_lock_timeout: access.read_lock_timeout,
            read_retries: access.read_retries,
            retry_delay: access.retry_delay,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a missing store file is treated as an empty store.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the bounded wait for the read lock.
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

    /// Returns the file access settings.
    #[must_use]
    pub fn access_config(&self) -> AccessConfig {
        AccessConfig::new()
            .read_lock_timeout(self.read_lock_timeout)
            .read_retries(self.read_retries)
            .retry_delay(self.retry_delay)
    }
}
