//! Definition of the retention policy of a queue.

use crate::ConfigError;
use std::time::Duration;

/// Default maximum number of messages retained by a queue.
pub const DEFAULT_RETENTION_COUNT: u64 = 1_000_000_000;

/// Default maximum age of a message retained by a queue.
pub const DEFAULT_RETENTION_TIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Retention policy of a [`Queue`](crate::Queue).
///
/// A config is an immutable value. Every `with_*` method returns a new config and
/// leaves the receiver untouched, so a config can be shared as a template between
/// queues and tweaked per queue.
///
/// ```
/// use retainq::RetentionConfig;
/// use std::time::Duration;
///
/// let base = RetentionConfig::default().with_name("events");
/// let config = base
///     .with_retention_count(2)?
///     .with_retention_time(Duration::from_secs(60))?
///     .with_auto_cleanup(true);
///
/// assert_eq!(config.retention_count(), 2);
/// assert_eq!(base.retention_count(), retainq::DEFAULT_RETENTION_COUNT);
/// # Ok::<(), retainq::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawConfig"))]
pub struct RetentionConfig {
    // Informational only.
    name: String,

    // Maximum number of messages to keep, always > 0.
    retention_count: u64,

    // Maximum age of a message, always > 0.
    retention_time: Duration,

    // Run cleanup after every append and before every query.
    auto_cleanup: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            retention_count: DEFAULT_RETENTION_COUNT,
            retention_time: DEFAULT_RETENTION_TIME,
            auto_cleanup: false,
        }
    }
}

impl RetentionConfig {
    /// Name of the queue.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of messages a queue retains after cleanup.
    pub fn retention_count(&self) -> u64 {
        self.retention_count
    }

    /// Maximum age of messages a queue retains after cleanup.
    pub fn retention_time(&self) -> Duration {
        self.retention_time
    }

    /// true if cleanup runs automatically, false if it has to be triggered explicitly.
    pub fn auto_cleanup(&self) -> bool {
        self.auto_cleanup
    }

    /// Returns a new config with a different name.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the queue, any value is accepted.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Returns a new config with a different retention count.
    ///
    /// Returns [`ConfigError::RetentionCount`] if count is 0.
    ///
    /// # Arguments
    ///
    /// * `retention_count` - Maximum number of messages to retain.
    pub fn with_retention_count(&self, retention_count: u64) -> Result<Self, ConfigError> {
        if retention_count == 0 {
            return Err(ConfigError::RetentionCount);
        }

        Ok(Self {
            retention_count,
            ..self.clone()
        })
    }

    /// Returns a new config with a different retention time.
    ///
    /// Returns [`ConfigError::RetentionTime`] if time is zero.
    ///
    /// # Arguments
    ///
    /// * `retention_time` - Maximum age of messages to retain.
    pub fn with_retention_time(&self, retention_time: Duration) -> Result<Self, ConfigError> {
        if retention_time.is_zero() {
            return Err(ConfigError::RetentionTime(retention_time));
        }

        Ok(Self {
            retention_time,
            ..self.clone()
        })
    }

    /// Returns a new config with automatic cleanup turned on or off.
    ///
    /// # Arguments
    ///
    /// * `auto_cleanup` - true to run cleanup on every operation.
    pub fn with_auto_cleanup(&self, auto_cleanup: bool) -> Self {
        Self {
            auto_cleanup,
            ..self.clone()
        }
    }
}

// Wire shape of a config. Missing fields fall back to defaults, and the
// result goes through the same validation as the builder.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct RawConfig {
    name: String,
    retention_count: u64,
    retention_time: Duration,
    auto_cleanup: bool,
}

#[cfg(feature = "serde")]
impl Default for RawConfig {
    fn default() -> Self {
        let config = RetentionConfig::default();
        Self {
            name: config.name,
            retention_count: config.retention_count,
            retention_time: config.retention_time,
            auto_cleanup: config.auto_cleanup,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawConfig> for RetentionConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        Ok(RetentionConfig::default()
            .with_name(raw.name)
            .with_retention_count(raw.retention_count)?
            .with_retention_time(raw.retention_time)?
            .with_auto_cleanup(raw.auto_cleanup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = RetentionConfig::default();
        assert_eq!(config.name(), "");
        assert_eq!(config.retention_count(), DEFAULT_RETENTION_COUNT);
        assert_eq!(config.retention_time(), Duration::from_secs(86_400));
        assert!(!config.auto_cleanup());
    }

    #[test]
    fn builder_does_not_mutate_receiver() -> Result<(), ConfigError> {
        let base = RetentionConfig::default();
        let config = base
            .with_name("orders")
            .with_retention_count(10)?
            .with_retention_time(Duration::from_millis(500))?
            .with_auto_cleanup(true);

        assert_eq!(config.name(), "orders");
        assert_eq!(config.retention_count(), 10);
        assert_eq!(config.retention_time(), Duration::from_millis(500));
        assert!(config.auto_cleanup());

        // Template is still pristine.
        assert_eq!(base, RetentionConfig::default());
        Ok(())
    }

    #[test]
    fn name_and_auto_cleanup_accept_anything() {
        let config = RetentionConfig::default().with_name("").with_auto_cleanup(false);
        assert_eq!(config, RetentionConfig::default());
    }

    #[test]
    fn zero_retention_count() {
        let config = RetentionConfig::default().with_name("keep");
        assert_eq!(
            config.with_retention_count(0),
            Err(ConfigError::RetentionCount)
        );
        assert_eq!(config.retention_count(), DEFAULT_RETENTION_COUNT);
        assert_eq!(config.name(), "keep");
    }

    #[test]
    fn zero_retention_time() {
        let config = RetentionConfig::default();
        assert_eq!(
            config.with_retention_time(Duration::ZERO),
            Err(ConfigError::RetentionTime(Duration::ZERO))
        );
        assert_eq!(config.retention_time(), DEFAULT_RETENTION_TIME);
    }

    #[rstest]
    #[case(1)]
    #[case(42)]
    #[case(u64::MAX)]
    fn positive_retention_count(#[case] count: u64) -> Result<(), ConfigError> {
        let config = RetentionConfig::default().with_retention_count(count)?;
        assert_eq!(config.retention_count(), count);
        Ok(())
    }

    #[test]
    fn smallest_retention_time() -> Result<(), ConfigError> {
        let config = RetentionConfig::default().with_retention_time(Duration::from_nanos(1))?;
        assert_eq!(config.retention_time(), Duration::from_nanos(1));
        Ok(())
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_with_defaults() {
        let config: RetentionConfig =
            serde_json::from_str(r#"{ "name": "jobs", "retention_count": 5 }"#)
                .expect("Should deserialize config");

        assert_eq!(config.name(), "jobs");
        assert_eq!(config.retention_count(), 5);
        assert_eq!(config.retention_time(), DEFAULT_RETENTION_TIME);
        assert!(!config.auto_cleanup());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rejects_invalid_values() {
        let count = serde_json::from_str::<RetentionConfig>(r#"{ "retention_count": 0 }"#);
        assert!(count.is_err());

        let time = serde_json::from_str::<RetentionConfig>(
            r#"{ "retention_time": { "secs": 0, "nanos": 0 } }"#,
        );
        assert!(time.is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialize_then_deserialize() -> Result<(), ConfigError> {
        let config = RetentionConfig::default()
            .with_name("audit")
            .with_retention_time(Duration::from_secs(30))?
            .with_auto_cleanup(true);

        let json = serde_json::to_string(&config).expect("Should serialize config");
        let returned: RetentionConfig =
            serde_json::from_str(&json).expect("Should deserialize config");
        assert_eq!(config, returned);
        Ok(())
    }
}
