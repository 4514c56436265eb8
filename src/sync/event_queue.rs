//! Jitter buffer: releases timestamped events against the shared clock
//!
//! Inbound events are buffered by their server-stamped logical time and
//! released once the locally reconstructed shared clock catches up, so state
//! changes apply in the order the server intended rather than arrival order.

use std::collections::VecDeque;

use tracing::warn;

/// Cap on buffered events
///
/// A peer with a wildly wrong clock estimate can stamp events far in the
/// future; without a cap those wait forever for a shared clock that never
/// reaches them.
pub const MAX_BUFFERED_EVENTS: usize = 256;

/// Buffered event queue ordered by logical timestamp, FIFO within a timestamp
#[derive(Debug)]
pub struct TimedEventQueue<T> {
    buffer: VecDeque<(u64, T)>,
}

impl<T> TimedEventQueue<T> {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Buffer an event stamped with a logical timestamp
    ///
    /// Insertion keeps the buffer sorted and places the event after any
    /// already-buffered event with the same stamp, so equal timestamps stay
    /// in push order. At capacity the furthest-future event is shed, which
    /// may be the one being pushed.
    pub fn push(&mut self, ts: u64, event: T) {
        let pos = self.buffer.partition_point(|(t, _)| *t <= ts);
        self.buffer.insert(pos, (ts, event));
        if self.buffer.len() > MAX_BUFFERED_EVENTS {
            if let Some((shed_ts, _)) = self.buffer.pop_back() {
                warn!(shed_ts, "Event buffer full, shedding furthest-future event");
            }
        }
    }

    /// Release every event whose stamp has been reached by the shared clock
    ///
    /// The shared clock is `local_now + clock_offset`. Released events come
    /// out in non-decreasing timestamp order and are removed; the rest stay
    /// buffered for later ticks. Draining twice at non-decreasing time never
    /// re-releases an event.
    pub fn drain(&mut self, local_now: u64, clock_offset: i64) -> Vec<T> {
        let shared_now = local_now as i64 + clock_offset;

        let mut released = Vec::new();
        while let Some((ts, _)) = self.buffer.front() {
            if *ts as i64 <= shared_now {
                let (_, event) = self.buffer.pop_front().unwrap();
                released.push(event);
            } else {
                break;
            }
        }
        released
    }
}

impl<T> Default for TimedEventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
