use std::time::Duration;

/// Cadences of a puzzle session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Period of the elapsed-time display tick.
    pub display_tick: Duration,
    /// Period of the elapsed-time flush; each tick adds its length in whole seconds.
    pub persist_tick: Duration,
    /// Quiet period after the last edit before guesses are written.
    pub guess_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_tick: Duration::from_secs(1),
            persist_tick: Duration::from_secs(5),
            guess_debounce: Duration::from_millis(3000),
        }
    }
}

impl SessionConfig {
    /// Seconds added to the persisted counter per flush tick, at least 1.
    #[must_use]
    pub fn persist_step_secs(&self) -> u32 {
        u32::try_from(self.persist_tick.as_secs()).unwrap_or(u32::MAX).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_play_page_cadence() {
        let config = SessionConfig::default();
        assert_eq!(config.display_tick, Duration::from_secs(1));
        assert_eq!(config.persist_step_secs(), 5);
        assert_eq!(config.guess_debounce, Duration::from_secs(3));
    }

    #[test]
    fn sub_second_flush_still_advances() {
        let config = SessionConfig {
            persist_tick: Duration::from_millis(200),
            ..SessionConfig::default()
        };
        assert_eq!(config.persist_step_secs(), 1);
    }
}
