//! Session sequence numbers.

/// Counts content-related messages.
///
/// Content-related messages get `2n + 1` and advance `n`; everything else
/// (acks, pings, containers) gets `2n` and leaves `n` alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeqNoGenerator {
    sequence: i32,
}

impl SeqNoGenerator {
    /// Start a fresh counter at 0.
    pub fn new() -> Self { Self::default() }

    /// Number of content-related messages generated so far.
    pub fn sequence(&self) -> i32 { self.sequence }

    /// The seq_no for the next message.
    pub fn next(&mut self, content_related: bool) -> i32 {
        if content_related {
            let n = self.sequence * 2 + 1;
            self.sequence += 1;
            n
        } else {
            self.sequence * 2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_odd_and_even() {
        let mut seq = SeqNoGenerator::new();
        let got: Vec<i32> = [true, true, false, true].into_iter().map(|c| seq.next(c)).collect();
        assert_eq!(got, [1, 3, 4, 5]);
    }

    #[test]
    fn non_content_does_not_advance() {
        let mut seq = SeqNoGenerator::new();
        assert_eq!(seq.next(false), 0);
        assert_eq!(seq.next(false), 0);
        assert_eq!(seq.sequence(), 0);
        assert_eq!(seq.next(true), 1);
        assert_eq!(seq.next(false), 2);
    }
}
