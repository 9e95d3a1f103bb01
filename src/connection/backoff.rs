use std::time::Duration;

/// Exponential reconnect backoff.
///
/// The delay for attempt `n` (zero based) is `initial * 2^n`, capped at
/// `max`. A successful connection resets the attempt counter.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempts: u32,
}

impl Backoff {
    pub const DEFAULT_INITIAL: Duration = Duration::from_millis(100);
    pub const DEFAULT_MAX: Duration = Duration::from_secs(30);

    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            attempts: 0,
        }
    }

    /// Delay to wait before the next attempt; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let initial_ms = self.initial.as_millis().min(u64::MAX as u128) as u64;
        let max_ms = self.max.as_millis().min(u64::MAX as u128) as u64;
        let delay_ms = std::cmp::min(
            initial_ms.saturating_mul(2u64.saturating_pow(self.attempts)),
            max_ms,
        );
        self.attempts = self.attempts.saturating_add(1);
        Duration::from_millis(delay_ms)
    }

    /// Number of delays handed out since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL, Self::DEFAULT_MAX)
    }
}
