//! Definition of a concurrent in-memory message queue.

use crate::chain::Chain;
use crate::{Message, QueueError, Result, RetentionConfig};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, trace};

/// A FIFO message queue that is safe to share between threads.
///
/// * Messages are consumed on read, there is no retention after a message was read.
/// * Use [`Queue::peek_next`] to look at the next message without consuming it.
/// * Every operation is serialized through one lock, concurrent operations never
///   observe a partially applied batch.
/// * Messages that violate the [`RetentionConfig`] are evicted by [`Queue::cleanup`],
///   or on every operation when auto cleanup is turned on.
///
/// A queue must be built with [`Queue::new`] or [`Queue::with_config`]. A queue
/// from [`Default`] is not attached to any storage and every operation on it returns
/// [`QueueError::NotInitialized`].
#[derive(Debug)]
pub struct Queue<T> {
    // Retention policy, fixed for the lifetime of the queue.
    config: RetentionConfig,

    // Storage for messages. None only when the queue was not built by a constructor.
    chain: Option<Mutex<Chain<T>>>,
}

impl<T> Default for Queue<T> {
    /// A queue that is not attached to any storage.
    ///
    /// This exists as the zero value of a queue. Use [`Queue::new`] to get a usable one.
    fn default() -> Self {
        Self {
            config: RetentionConfig::default(),
            chain: None,
        }
    }
}

impl<T> Queue<T> {
    /// Create a new empty queue with the default [`RetentionConfig`].
    pub fn new() -> Self {
        Self::with_config(RetentionConfig::default())
    }

    /// Create a new empty queue with the given retention policy.
    ///
    /// # Arguments
    ///
    /// * `config` - Retention policy of the queue.
    pub fn with_config(config: RetentionConfig) -> Self {
        debug!(
            queue = config.name(),
            retention_count = config.retention_count(),
            retention_time = ?config.retention_time(),
            auto_cleanup = config.auto_cleanup(),
            "Created queue"
        );

        Self {
            config,
            chain: Some(Mutex::new(Chain::new())),
        }
    }

    /// Retention policy of this queue.
    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// true if there are no messages in the queue, false otherwise.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_and_clean()?.is_empty())
    }

    /// Number of messages in the queue.
    pub fn len(&self) -> Result<u64> {
        Ok(self.lock_and_clean()?.len())
    }

    /// Append a single message to the queue.
    ///
    /// # Arguments
    ///
    /// * `value` - Value to append.
    pub fn add(&self, value: T) -> Result<()> {
        self.add_many([value])
    }

    /// Append a batch of messages to the queue.
    ///
    /// Either the whole batch is appended or nothing is. Messages of the batch get
    /// consecutive offsets and share the same append time.
    ///
    /// # Arguments
    ///
    /// * `values` - Values to append, in order.
    pub fn add_many<I: IntoIterator<Item = T>>(&self, values: I) -> Result<()> {
        let chain = self.chain()?;

        // Collect before locking, a panicking iterator must not leave half a batch behind.
        let values: Vec<T> = values.into_iter().collect();
        let appended = values.len();

        let mut chain = chain.lock().unwrap_or_else(PoisonError::into_inner);
        chain.append(values);
        trace!(
            queue = self.config.name(),
            appended,
            tail_offset = chain.tail_offset(),
            "Appended messages"
        );

        if self.config.auto_cleanup() {
            self.evict(&mut chain);
        }

        Ok(())
    }

    /// Read and consume the next message from the queue.
    ///
    /// Returns [`QueueError::Empty`] if there are no messages.
    pub fn read(&self) -> Result<Message<T>> {
        self.read_many(1)?.pop().ok_or(QueueError::Empty)
    }

    /// Read and consume at most limit messages from the queue.
    ///
    /// * Messages are returned in the order they were appended.
    /// * Returns fewer messages than the limit if the queue does not have enough.
    /// * Returns [`QueueError::InvalidLimit`] if limit is 0.
    /// * Returns [`QueueError::Empty`] if there are no messages.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of messages to read.
    pub fn read_many(&self, limit: usize) -> Result<Vec<Message<T>>> {
        if limit == 0 {
            return Err(QueueError::InvalidLimit);
        }

        let mut chain = self.lock_and_clean()?;
        if chain.is_empty() {
            return Err(QueueError::Empty);
        }

        Ok(chain.take(limit))
    }

    /// Most recently appended message.
    ///
    /// Not implemented, always returns [`QueueError::Unimplemented`].
    pub fn peek_last(&self) -> Result<Message<T>> {
        Err(QueueError::Unimplemented)
    }

    /// Remove messages that violate the retention policy.
    ///
    /// First removes the oldest messages till at most retention count messages remain,
    /// then removes messages older than retention time. Returns the number of messages
    /// removed.
    pub fn cleanup(&self) -> Result<u64> {
        let mut chain = self.lock()?;
        Ok(self.evict(&mut chain))
    }

    /// Storage of the queue, if the queue was built by a constructor.
    fn chain(&self) -> Result<&Mutex<Chain<T>>> {
        self.chain.as_ref().ok_or(QueueError::NotInitialized)
    }

    /// Acquire exclusive access to storage.
    ///
    /// Every critical section leaves the chain consistent before anything that can
    /// panic, so a poisoned lock still guards valid state.
    fn lock(&self) -> Result<MutexGuard<'_, Chain<T>>> {
        Ok(self.chain()?.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Acquire exclusive access to storage and evict if auto cleanup is on.
    fn lock_and_clean(&self) -> Result<MutexGuard<'_, Chain<T>>> {
        let mut chain = self.lock()?;
        if self.config.auto_cleanup() {
            self.evict(&mut chain);
        }

        Ok(chain)
    }

    /// Enforce retention policy on storage that is already locked.
    fn evict(&self, chain: &mut Chain<T>) -> u64 {
        let evicted = chain.evict(&self.config, Instant::now());
        if evicted.total() > 0 {
            debug!(
                queue = self.config.name(),
                by_count = evicted.by_count,
                by_age = evicted.by_age,
                head_offset = chain.head_offset(),
                remaining = chain.len(),
                "Evicted messages"
            );
        }

        evicted.total()
    }
}

impl<T: Clone> Queue<T> {
    /// Next message in the queue, without consuming it.
    ///
    /// Returns [`QueueError::Empty`] if there are no messages.
    pub fn peek_next(&self) -> Result<Message<T>> {
        self.lock_and_clean()?
            .front()
            .cloned()
            .ok_or(QueueError::Empty)
    }
}
