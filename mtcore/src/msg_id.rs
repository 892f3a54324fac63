//! Outgoing message-ID generation with clock-skew correction.

use std::time::Duration;

use crate::message::MessageId;

/// Produces strictly increasing client message IDs from wall-clock time.
#[derive(Clone, Debug, Default)]
pub struct MsgIdGenerator {
    last_msg_id: i64,
    time_offset: i32,
}

impl MsgIdGenerator {
    /// Start with the given clock skew in seconds.
    pub fn new(time_offset: i32) -> Self {
        Self { last_msg_id: 0, time_offset }
    }

    /// The current skew correction in seconds.
    pub fn time_offset(&self) -> i32 { self.time_offset }

    /// The most recently generated ID, or 0.
    pub fn last_msg_id(&self) -> i64 { self.last_msg_id }

    /// Generate the next ID for local time `now` (since the Unix epoch).
    ///
    /// Falls back to `last + 4` whenever the clock has not moved forward,
    /// so consecutive IDs are distinct even within one nanosecond.
    pub fn next(&mut self, now: Duration) -> MessageId {
        let secs = (now.as_secs() as i64).wrapping_add(i64::from(self.time_offset));
        let nanos = i64::from(now.subsec_nanos());
        let mut id = (secs << 32) | (nanos << 2);
        if self.last_msg_id >= id {
            id = self.last_msg_id + 4;
        }
        self.last_msg_id = id;
        MessageId(id)
    }

    /// Re-derive the skew from a message ID the server considers correct.
    ///
    /// A changed offset also forgets the last generated ID, so the next ID
    /// follows the corrected clock even if that is numerically lower. A skew
    /// that does not fit in an `i32` is ignored and the old offset kept.
    pub fn update_time_offset(&mut self, correct: MessageId, now: Duration) -> i32 {
        let old = self.time_offset;
        let offset = correct.secs() - now.as_secs() as i64;
        self.time_offset = match i32::try_from(offset) {
            Ok(offset) => offset,
            Err(_) => {
                log::warn!("[mtcore] Ignoring out-of-range time offset {offset}s from msg_id {correct}");
                old
            }
        };
        if self.time_offset != old {
            self.last_msg_id = 0;
            log::debug!(
                "[mtcore] Updated time offset (old {old}, good msg_id {correct}, new {})",
                self.time_offset,
            );
        }
        self.time_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    #[test]
    fn layout_matches_clock() {
        let mut ids = MsgIdGenerator::new(0);
        let id = ids.next(Duration::new(T, 500));
        assert_eq!(id.0, ((T as i64) << 32) | (500 << 2));
        assert_eq!(id.0 & 3, 0);
    }

    #[test]
    fn same_instant_still_increases() {
        let mut ids = MsgIdGenerator::new(0);
        let now = Duration::from_secs(T);
        let a = ids.next(now);
        let b = ids.next(now);
        assert_eq!(b.0 - a.0, 4);
        assert_eq!(a.secs(), T as i64);
        assert_eq!(b.secs(), T as i64);
    }

    #[test]
    fn clock_going_backwards_still_increases() {
        let mut ids = MsgIdGenerator::new(0);
        let a = ids.next(Duration::from_secs(T + 10));
        let b = ids.next(Duration::from_secs(T));
        assert!(b > a);
    }

    #[test]
    fn offset_is_applied() {
        let mut ids = MsgIdGenerator::new(-5);
        assert_eq!(ids.next(Duration::from_secs(T)).secs(), T as i64 - 5);
    }

    #[test]
    fn offset_update_resets_monotonic_floor() {
        let mut ids = MsgIdGenerator::new(0);
        let now = Duration::from_secs(T);
        let before = ids.next(now);

        let good = MessageId(((T as i64 - 100) << 32) | 1);
        assert_eq!(ids.update_time_offset(good, now), -100);
        assert_eq!(ids.last_msg_id(), 0);

        let after = ids.next(now);
        assert!(after < before);
        assert_eq!(after.secs(), T as i64 - 100);
    }

    #[test]
    fn unchanged_offset_keeps_floor() {
        let mut ids = MsgIdGenerator::new(0);
        let now = Duration::from_secs(T);
        let before = ids.next(now);
        let good = MessageId(((T as i64) << 32) | 1);
        assert_eq!(ids.update_time_offset(good, now), 0);
        assert_eq!(ids.last_msg_id(), before.0);
    }

    #[test]
    fn out_of_range_offset_is_ignored() {
        let mut ids = MsgIdGenerator::new(7);
        let now = Duration::from_secs(T);
        let before = ids.next(now);

        let bogus = MessageId(i64::MIN | 1);
        assert_eq!(ids.update_time_offset(bogus, now), 7);
        assert_eq!(ids.time_offset(), 7);
        assert_eq!(ids.last_msg_id(), before.0);
    }
}
