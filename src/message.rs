//! Definition of a message held in a queue.

use std::time::SystemTime;

/// A value stored in a [`Queue`](crate::Queue) along with its metadata.
///
/// Messages are handed out by value. Once read, a message is no longer part of the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<T> {
    /// The payload, opaque to the queue.
    pub value: T,

    /// Sequence number assigned when the message was appended.
    ///
    /// The first message of a queue gets offset 0, every following message gets the
    /// previous offset + 1. Wraps around to 0 after [`u64::MAX`].
    pub offset: u64,

    /// Wall clock time when the message was appended.
    pub append_time: SystemTime,
}

impl<T> Message<T> {
    /// Consume the message and return the payload.
    pub fn into_value(self) -> T {
        self.value
    }
}
