//! Definition of the storage that backs a queue.

use crate::{Message, RetentionConfig};
use std::collections::VecDeque;
use std::time::{Instant, SystemTime};

/// A message along with bookkeeping that is never handed out.
#[derive(Debug)]
struct Slot<T> {
    message: Message<T>,

    // Monotonic append time. Age based retention is measured against this,
    // so wall clock adjustments cannot evict or pin messages.
    appended_at: Instant,
}

/// Number of messages removed by a single eviction pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Evicted {
    pub(crate) by_count: u64,
    pub(crate) by_age: u64,
}

impl Evicted {
    pub(crate) fn total(&self) -> u64 {
        self.by_count + self.by_age
    }
}

/// Ordered chain of unconsumed messages.
///
/// Works like an arena of slots where head and tail are offsets rather than pointers:
/// * Head is the offset of the oldest unconsumed message.
/// * Tail is the offset the next appended message will get, i.e, the empty slot
///   at the end of the chain.
///
/// Offsets wrap around on overflow. Length is always the modular distance between
/// tail and head, which is correct as long as the chain never holds 2^64 messages.
///
/// Nothing here is synchronized, callers are expected to hold the queue lock.
#[derive(Debug)]
pub(crate) struct Chain<T> {
    // Unconsumed messages, oldest first.
    slots: VecDeque<Slot<T>>,

    // Offset of the next message to be appended.
    next_offset: u64,
}

impl<T> Chain<T> {
    /// Create a new empty chain, first message will get offset 0.
    pub(crate) fn new() -> Self {
        Self {
            slots: VecDeque::new(),
            next_offset: 0,
        }
    }

    /// Offset of the oldest unconsumed message, equal to tail when empty.
    pub(crate) fn head_offset(&self) -> u64 {
        self.slots
            .front()
            .map_or(self.next_offset, |slot| slot.message.offset)
    }

    /// Offset the next appended message will get.
    pub(crate) fn tail_offset(&self) -> u64 {
        self.next_offset
    }

    /// Number of unconsumed messages.
    pub(crate) fn len(&self) -> u64 {
        let len = self.next_offset.wrapping_sub(self.head_offset());
        debug_assert_eq!(len, self.slots.len() as u64, "Offsets out of sync with slots");
        len
    }

    /// true if there are no unconsumed messages, false otherwise.
    pub(crate) fn is_empty(&self) -> bool {
        self.head_offset() == self.next_offset
    }

    /// Append a batch of values to the tail of the chain.
    ///
    /// Every value gets its own offset, the whole batch shares one append time.
    ///
    /// # Arguments
    ///
    /// * `values` - Values to append, in order.
    pub(crate) fn append(&mut self, values: Vec<T>) {
        let append_time = SystemTime::now();
        let appended_at = Instant::now();

        self.slots.reserve(values.len());
        for value in values {
            let offset = self.next_offset;
            self.slots.push_back(Slot {
                message: Message {
                    value,
                    offset,
                    append_time,
                },
                appended_at,
            });

            // Tail moves to the next empty slot.
            self.next_offset = offset.wrapping_add(1);
        }
    }

    /// Remove up to limit messages from the head of the chain.
    ///
    /// Returns fewer messages than asked for if the chain does not have enough.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of messages to remove.
    pub(crate) fn take(&mut self, limit: usize) -> Vec<Message<T>> {
        // Length fits in usize, every message is held in memory.
        let limit = std::cmp::min(limit, self.len() as usize);
        self.slots.drain(..limit).map(|slot| slot.message).collect()
    }

    /// Reference to the message at head of the chain, if any.
    pub(crate) fn front(&self) -> Option<&Message<T>> {
        self.slots.front().map(|slot| &slot.message)
    }

    /// Move head forward past messages that violate the retention policy.
    ///
    /// * First drops the oldest messages till at most retention count remain.
    /// * Then drops messages from head that are older than retention time.
    ///
    /// Tail is never touched.
    ///
    /// # Arguments
    ///
    /// * `config` - Retention policy to enforce.
    /// * `now` - Point in time to measure message age against.
    pub(crate) fn evict(&mut self, config: &RetentionConfig, now: Instant) -> Evicted {
        // Excess can never be more than length, so it fits in usize.
        let by_count = self.len().saturating_sub(config.retention_count());
        self.slots.drain(..by_count as usize);

        // Messages are ordered by append time, so the first young enough message
        // means everything after it is young enough too.
        let mut by_age = 0;
        while let Some(slot) = self.slots.front() {
            if now.saturating_duration_since(slot.appended_at) <= config.retention_time() {
                break;
            }

            self.slots.pop_front();
            by_age += 1;
        }

        Evicted { by_count, by_age }
    }

    /// Shift offsets so that head starts at the given offset.
    ///
    /// Only meant to put the chain near the wraparound boundary in tests.
    #[cfg(test)]
    pub(crate) fn rebase(&mut self, head_offset: u64) {
        let mut offset = head_offset;
        for slot in self.slots.iter_mut() {
            slot.message.offset = offset;
            offset = offset.wrapping_add(1);
        }

        self.next_offset = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn chain_of(values: &[&'static str]) -> Chain<&'static str> {
        let mut chain = Chain::new();
        chain.append(values.to_vec());
        chain
    }

    #[test]
    fn offsets_are_consecutive() {
        let mut chain = chain_of(&["a", "b", "c"]);
        assert_eq!(chain.head_offset(), 0);
        assert_eq!(chain.tail_offset(), 3);
        assert_eq!(chain.len(), 3);

        let taken = chain.take(2);
        let offsets: Vec<_> = taken.iter().map(|message| message.offset).collect();
        assert_eq!(offsets, vec![0, 1]);
        assert_eq!(chain.head_offset(), 2);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn batch_shares_append_time() {
        let mut chain = chain_of(&["a", "b"]);
        let taken = chain.take(2);
        assert_eq!(taken[0].append_time, taken[1].append_time);
    }

    #[test]
    fn take_is_clamped() {
        let mut chain = chain_of(&["a", "b"]);
        let taken: Vec<_> = chain.take(10).into_iter().map(Message::into_value).collect();
        assert_eq!(taken, vec!["a", "b"]);
        assert!(chain.is_empty());
        assert!(chain.take(10).is_empty());
    }

    #[test]
    fn wraparound() {
        let mut chain = chain_of(&["a"]);
        chain.rebase(u64::MAX - 1);
        assert_eq!(chain.head_offset(), u64::MAX - 1);
        assert_eq!(chain.tail_offset(), u64::MAX);
        assert_eq!(chain.len(), 1);

        chain.append(vec!["b", "c"]);
        assert_eq!(chain.tail_offset(), 1);
        assert_eq!(chain.len(), 3);
        assert!(!chain.is_empty());

        let offsets: Vec<_> = chain.take(3).iter().map(|message| message.offset).collect();
        assert_eq!(offsets, vec![u64::MAX - 1, u64::MAX, 0]);
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn evict_by_count_then_age() -> Result<(), crate::ConfigError> {
        let mut chain = chain_of(&["a", "b", "c"]);
        let config = RetentionConfig::default().with_retention_count(2)?;

        let evicted = chain.evict(&config, Instant::now());
        assert_eq!(evicted, Evicted { by_count: 1, by_age: 0 });
        assert_eq!(chain.front().map(|message| message.value), Some("b"));

        // Pretend a lot of time has passed.
        let later = Instant::now() + Duration::from_secs(25 * 60 * 60);
        let evicted = chain.evict(&config, later);
        assert_eq!(evicted, Evicted { by_count: 0, by_age: 2 });
        assert_eq!(evicted.total(), 2);
        assert!(chain.is_empty());

        // Tail is untouched.
        assert_eq!(chain.tail_offset(), 3);
        Ok(())
    }

    #[test]
    fn evict_stops_at_young_messages() -> Result<(), crate::ConfigError> {
        let mut chain = chain_of(&["old"]);
        std::thread::sleep(Duration::from_millis(300));
        chain.append(vec!["new"]);

        let config = RetentionConfig::default().with_retention_time(Duration::from_millis(150))?;
        let evicted = chain.evict(&config, Instant::now());
        assert_eq!(evicted.by_age, 1);
        assert_eq!(chain.front().map(|message| message.value), Some("new"));
        Ok(())
    }
}
