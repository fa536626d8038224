use std::sync::atomic::{AtomicI64, Ordering};

/// Offset between the exchange clock and the local clock, in milliseconds.
///
/// Shared by every request builder of a client; updated after a resync. Writes are
/// last-writer-wins.
#[derive(Debug, Default)]
pub struct ClockSkew {
    offset_ms: AtomicI64,
}

impl ClockSkew {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(offset_ms: i64) -> Self {
        Self {
            offset_ms: AtomicI64::new(offset_ms),
        }
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::Relaxed)
    }

    pub fn set_offset_ms(&self, offset_ms: i64) {
        self.offset_ms.store(offset_ms, Ordering::Relaxed);
    }

    /// Local wall clock in milliseconds since the epoch.
    pub fn local_now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Estimated exchange time in milliseconds.
    pub fn now_ms(&self) -> i64 {
        Self::local_now_ms() + self.offset_ms()
    }

    /// Record a server time sample taken between `sent_at` and `received_at` (local ms).
    ///
    /// The server stamp is assumed to sit halfway through the round trip.
    pub fn calibrate(&self, server_time_ms: i64, sent_at: i64, received_at: i64) -> i64 {
        let midpoint = sent_at + (received_at - sent_at) / 2;
        let offset = server_time_ms - midpoint;
        self.set_offset_ms(offset);
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(ClockSkew::new().offset_ms(), 0);
    }

    #[test]
    fn calibrate_uses_round_trip_midpoint() {
        let clock = ClockSkew::new();
        let offset = clock.calibrate(10_600, 10_000, 10_200);
        assert_eq!(offset, 500);
        assert_eq!(clock.offset_ms(), 500);
    }

    #[test]
    fn offset_shifts_now() {
        let clock = ClockSkew::with_offset(60_000);
        let local = ClockSkew::local_now_ms();
        let shifted = clock.now_ms();
        assert!(shifted - local >= 59_000);
    }
}
