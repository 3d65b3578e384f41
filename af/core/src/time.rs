//! Tick conversions for the framework timebase.

/// Framework tick rate. One tick per millisecond.
pub const TICK_HZ: u32 = 1_000;

/// Convert a millisecond interval to framework ticks.
pub const fn ms_to_ticks(ms: u32) -> u64 {
    (ms as u64 * TICK_HZ as u64) / 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millisecond_ticks_are_identity_at_1khz() {
        assert_eq!(ms_to_ticks(0), 0);
        assert_eq!(ms_to_ticks(20), 20);
        assert_eq!(ms_to_ticks(1_000), 1_000);
    }
}
