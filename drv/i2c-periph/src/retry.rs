//! Shared retry policy: a bounded counter that self-posts a retry signal
//! while budget remains.

use af_core::{Event, Signal};
use af_kernel::AoPort;

pub(crate) struct RetryCounter {
    count: u8,
    limit: u8,
}

impl RetryCounter {
    pub fn new(limit: u8) -> Self {
        Self { count: 0, limit }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    /// Consume one retry: increments the counter and self-posts `signal`,
    /// returning `true`. At the limit, returns `false` without posting; the
    /// caller decides between the error state and surfacing a timeout.
    pub fn try_retry(&mut self, port: &AoPort, signal: Signal) -> bool {
        if self.count >= self.limit {
            return false;
        }
        self.count += 1;
        if let Err(err) = port.post_self(Event::new(signal)) {
            log::warn!("{}: retry signal dropped: {err}", port.id());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use af_core::ActiveObjectId;
    use af_kernel::AoPort;

    use super::RetryCounter;

    #[test]
    fn counter_stops_at_the_limit() {
        // Detached port: posting fails quietly, the budget still counts down.
        let port = AoPort::new(ActiveObjectId::new(1));
        let mut retries = RetryCounter::new(3);

        let sig = crate::signals::LOCAL_SIG_BASE;
        assert!(retries.try_retry(&port, sig));
        assert!(retries.try_retry(&port, sig));
        assert!(retries.try_retry(&port, sig));
        assert!(!retries.try_retry(&port, sig));
        assert_eq!(retries.count(), 3);

        retries.reset();
        assert!(retries.try_retry(&port, sig));
    }
}
