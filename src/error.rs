//! Definition of errors returned by queue and config operations.

use std::time::Duration;
use thiserror::Error;

/// Convenient alias for results of [`Queue`](crate::Queue) operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Different types of error that can happen when operating on a [`Queue`](crate::Queue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue was not built with [`Queue::new`](crate::Queue::new) or
    /// [`Queue::with_config`](crate::Queue::with_config).
    #[error("Improperly initialized queue, tail is missing")]
    NotInitialized,

    /// There are no messages to read or peek.
    #[error("Queue is empty")]
    Empty,

    /// A read was requested for zero messages.
    #[error("Limit must be positive")]
    InvalidLimit,

    /// The operation has no implementation yet.
    #[error("Unimplemented")]
    Unimplemented,
}

/// Different types of error that can happen when building a [`RetentionConfig`](crate::RetentionConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration parameter, retention count must be > 0")]
    RetentionCount,

    #[error("Invalid configuration parameter, retention time must be > 0. Got: {0:?}")]
    RetentionTime(Duration),
}
