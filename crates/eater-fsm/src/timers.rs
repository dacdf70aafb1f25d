//! Postponed event queue.
//!
//! Entries are keyed by `(deadline, sequence)`, so iteration order is
//! earliest deadline first and insertion order among equal deadlines.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::PostponeError;
use crate::machine::FsmEvent;

/// Ordering key of a postponed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PostponedKey {
    /// When the event is due.
    at: Instant,
    /// Insertion counter, FIFO among equal deadlines.
    sequence: u64,
}

impl Ord for PostponedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for PostponedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The postponed events of one engine.
///
/// Only reachable under the engine's write lock: handlers get it as
/// `&mut Timers` and the engine's own cancel methods lock first.
#[derive(Debug)]
pub struct Timers<E> {
    queue: BTreeMap<PostponedKey, E>,
    next_sequence: u64,
    capacity: usize,
    /// Set when the earliest deadline may have changed.
    rearm: bool,
}

impl<E: FsmEvent> Timers<E> {
    pub(crate) const fn new(capacity: usize) -> Self {
        Self {
            queue: BTreeMap::new(),
            next_sequence: 0,
            capacity,
            rearm: false,
        }
    }

    /// Schedule `event` to fire after `delay`.
    ///
    /// # Panics
    ///
    /// Panics if `event` carries a payload.
    pub fn postpone(&mut self, event: E, delay: Duration) -> Result<(), PostponeError> {
        assert!(
            !event.carries_payload(),
            "payload event {} cannot be postponed",
            event.name()
        );
        if self.queue.len() >= self.capacity {
            return Err(PostponeError::QueueFull {
                capacity: self.capacity,
            });
        }
        let at = Instant::now()
            .checked_add(delay)
            .ok_or(PostponeError::DeadlineOverflow)?;
        let key = PostponedKey {
            at,
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if self.next_deadline().is_none_or(|earliest| at < earliest) {
            self.rearm = true;
        }
        self.queue.insert(key, event);
        Ok(())
    }

    /// Drop every pending event.
    pub fn cancel_all(&mut self) {
        if !self.queue.is_empty() {
            self.queue.clear();
            self.rearm = true;
        }
    }

    /// Drop every pending event of the same kind as `event`.
    pub fn cancel_by_type(&mut self, event: &E) {
        let index = event.index();
        let before = self.queue.len();
        self.queue.retain(|_, pending| pending.index() != index);
        if self.queue.len() != before {
            self.rearm = true;
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending events of the same kind as `event`.
    pub fn count_of(&self, event: &E) -> usize {
        let index = event.index();
        self.queue.values().filter(|pending| pending.index() == index).count()
    }

    /// Deadline of the earliest pending event.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|key| key.at)
    }

    /// Remove and return the earliest event if it is due at `now`.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<E> {
        let entry = self.queue.first_entry()?;
        if entry.key().at > now {
            return None;
        }
        Some(entry.remove())
    }

    /// Read and clear the re-arm flag.
    pub(crate) const fn take_rearm(&mut self) -> bool {
        let rearm = self.rearm;
        self.rearm = false;
        rearm
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Tick {
        A,
        B,
        Data(u8),
    }

    impl FsmEvent for Tick {
        const COUNT: usize = 3;

        fn index(&self) -> usize {
            match self {
                Self::A => 0,
                Self::B => 1,
                Self::Data(_) => 2,
            }
        }

        fn name(&self) -> &'static str {
            match self {
                Self::A => "A",
                Self::B => "B",
                Self::Data(_) => "Data",
            }
        }

        fn carries_payload(&self) -> bool {
            matches!(self, Self::Data(_))
        }
    }

    fn drain(timers: &mut Timers<Tick>, now: Instant) -> Vec<Tick> {
        std::iter::from_fn(|| timers.pop_due(now)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn pops_in_deadline_then_fifo_order() {
        let mut timers = Timers::new(8);
        timers.postpone(Tick::B, Duration::from_secs(2)).unwrap();
        timers.postpone(Tick::A, Duration::from_secs(1)).unwrap();
        timers.postpone(Tick::A, Duration::from_secs(2)).unwrap();
        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(drain(&mut timers, later), vec![Tick::A, Tick::B, Tick::A]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_pops_before_its_deadline() {
        let mut timers = Timers::new(8);
        timers.postpone(Tick::A, Duration::from_secs(10)).unwrap();
        assert_eq!(timers.pop_due(Instant::now()), None);
        assert_eq!(timers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_by_type_keeps_other_kinds() {
        let mut timers = Timers::new(8);
        timers.postpone(Tick::A, Duration::from_secs(1)).unwrap();
        timers.postpone(Tick::B, Duration::from_secs(2)).unwrap();
        timers.postpone(Tick::A, Duration::from_secs(3)).unwrap();
        timers.take_rearm();
        timers.cancel_by_type(&Tick::A);
        assert!(timers.take_rearm());
        assert_eq!(timers.count_of(&Tick::A), 0);
        assert_eq!(timers.count_of(&Tick::B), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_only_when_earliest_changes() {
        let mut timers = Timers::new(8);
        timers.postpone(Tick::A, Duration::from_secs(5)).unwrap();
        assert!(timers.take_rearm());
        timers.postpone(Tick::B, Duration::from_secs(9)).unwrap();
        assert!(!timers.take_rearm());
        timers.postpone(Tick::B, Duration::from_secs(1)).unwrap();
        assert!(timers.take_rearm());
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_is_reported() {
        let mut timers = Timers::new(1);
        timers.postpone(Tick::A, Duration::from_secs(1)).unwrap();
        assert_eq!(
            timers.postpone(Tick::B, Duration::from_secs(1)),
            Err(PostponeError::QueueFull { capacity: 1 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overflowing_delay_is_reported() {
        let mut timers = Timers::new(1);
        assert_eq!(
            timers.postpone(Tick::A, Duration::MAX),
            Err(PostponeError::DeadlineOverflow)
        );
        assert!(timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "cannot be postponed")]
    async fn postponing_a_payload_event_panics() {
        let mut timers = Timers::new(1);
        let _ = timers.postpone(Tick::Data(1), Duration::from_secs(1));
    }
}
