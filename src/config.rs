//! Registry Configuration
//!
//! Tunables consumed by the [`Registry`](crate::storage::Registry) and its
//! background sweeper. Every value has a sensible default and a `with_*`
//! builder method so callers only spell out what they change.
//!
//! ```
//! use flashlink::RegistryConfig;
//! use std::time::Duration;
//!
//! let config = RegistryConfig::default()
//!     .with_default_ttl(Duration::from_secs(300))
//!     .with_alias_length(8);
//! assert_eq!(config.alias_length, 8);
//! ```

use std::time::Duration;

/// Default time-to-live applied when a caller gives none (2 minutes)
pub const DEFAULT_TTL_SECS: u64 = 120;

/// Default length of generated aliases
pub const DEFAULT_ALIAS_LENGTH: usize = 6;

/// Default number of access timestamps kept per link
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Default period of the background expiry sweep
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Longest TTL a link can carry (~100 years); keeps deadlines representable
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Configuration for a [`Registry`](crate::storage::Registry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// TTL used when a create omits one or passes zero (default: 120s)
    pub default_ttl: Duration,

    /// Length of randomly generated aliases (default: 6)
    pub alias_length: usize,

    /// Interval between expiry sweeps (default: 1s)
    pub sweep_interval: Duration,

    /// Number of recent access timestamps kept per link (default: 10)
    pub history_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            alias_length: DEFAULT_ALIAS_LENGTH,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default TTL. Rounded to whole seconds, clamped to
    /// `1..=MAX_TTL_SECS`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Duration::from_secs(ttl.as_secs().clamp(1, MAX_TTL_SECS));
        self
    }

    /// Sets the generated alias length, never below one.
    pub fn with_alias_length(mut self, length: usize) -> Self {
        self.alias_length = length.max(1);
        self
    }

    /// Sets the sweep interval, never below one millisecond.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Sets how many access timestamps each link keeps, never below one.
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size.max(1);
        self
    }

    /// The default TTL in whole seconds.
    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl.as_secs().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(120));
        assert_eq!(config.alias_length, 6);
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.history_size, 10);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::new()
            .with_default_ttl(Duration::from_secs(30))
            .with_alias_length(10)
            .with_sweep_interval(Duration::from_millis(250))
            .with_history_size(3);

        assert_eq!(config.default_ttl_secs(), 30);
        assert_eq!(config.alias_length, 10);
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
        assert_eq!(config.history_size, 3);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = RegistryConfig::new()
            .with_default_ttl(Duration::ZERO)
            .with_alias_length(0)
            .with_sweep_interval(Duration::ZERO)
            .with_history_size(0);

        assert_eq!(config.default_ttl, Duration::from_secs(1));
        assert_eq!(config.alias_length, 1);
        assert_eq!(config.sweep_interval, Duration::from_millis(1));
        assert_eq!(config.history_size, 1);
    }

    #[test]
    fn test_huge_default_ttl_is_capped() {
        let config = RegistryConfig::new().with_default_ttl(Duration::MAX);
        assert_eq!(config.default_ttl_secs(), MAX_TTL_SECS);
    }
}
