//! # Retainq
//!
//! Retainq provides an in-memory FIFO message queue with bounded retention, meant to be
//! embedded in a larger program.
//!
//! ## Queue
//!
//! A [`Queue`] holds messages of any type `T`. It is safe to share between threads,
//! every operation is serialized through a single lock. Messages are consumed on read.
//!
//! Every message carries an offset. Offsets start at 0 and grow by 1 per message,
//! wrapping around to 0 after [`u64::MAX`].
//!
//! ## Retention
//!
//! A [`RetentionConfig`] bounds how many messages a queue keeps and for how long.
//! Messages beyond those bounds are evicted by [`Queue::cleanup`], or automatically on
//! every operation when auto cleanup is turned on.
//!
//! ### Features
//!
//! * `serde` - Serialize and deserialize [`RetentionConfig`] with [`serde`](https://docs.rs/serde/latest/serde/).
//!
//! ## Example
//!
//! ```
//! use retainq::{Queue, QueueError, RetentionConfig};
//!
//! let queue = Queue::new();
//! assert_eq!(queue.is_empty(), Ok(true));
//!
//! queue.add(123)?;
//! queue.add_many([123, 321])?;
//! assert_eq!(queue.len(), Ok(3));
//!
//! // Reads consume messages.
//! let message = queue.read()?;
//! assert_eq!((message.value, message.offset), (123, 0));
//!
//! // Reads return at most limit messages.
//! let messages = queue.read_many(10)?;
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].value, 321);
//! assert_eq!(queue.read(), Err(QueueError::Empty));
//!
//! // Peek does not consume.
//! queue.add(222)?;
//! assert_eq!(queue.peek_next()?.value, 222);
//! assert_eq!(queue.is_empty(), Ok(false));
//!
//! // Retain only the two newest messages, evicting on every operation.
//! let config = RetentionConfig::default()
//!     .with_retention_count(2)?
//!     .with_auto_cleanup(true);
//!
//! let queue = Queue::with_config(config);
//! queue.add_many(["a", "b", "c"])?;
//! assert_eq!(queue.read()?.value, "b");
//!
//! // Without auto cleanup, eviction happens only on request.
//! let config = RetentionConfig::default().with_retention_count(2)?;
//! let queue = Queue::with_config(config);
//! queue.add_many(["a", "b", "c"])?;
//! assert_eq!(queue.len(), Ok(3));
//! assert_eq!(queue.cleanup(), Ok(1));
//! assert_eq!(queue.read()?.value, "b");
//!
//! // A queue that was not built by a constructor cannot be used.
//! let detached = Queue::<u8>::default();
//! assert_eq!(detached.is_empty(), Err(QueueError::NotInitialized));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub(crate) mod chain;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod message;
pub(crate) mod queue;

// Externally exposed types.
pub use config::{DEFAULT_RETENTION_COUNT, DEFAULT_RETENTION_TIME, RetentionConfig};
pub use error::{ConfigError, QueueError, Result};
pub use message::Message;
pub use queue::Queue;
