/// Outcome of one display tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTick {
    Ticked(u32),
    /// The limit was reached on this tick.
    Expired(u32),
}

/// The two elapsed-time counters of a timed session.
///
/// `display` drives what the player sees; `persisted` only decides when the
/// elapsed time is flushed. Both are clamped at the limit. A limit of 0
/// means the puzzle is untimed and neither counter ever moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimers {
    time_limit: u32,
    display: u32,
    persisted: u32,
    time_expired: bool,
}

impl SessionTimers {
    #[must_use]
    pub fn new(time_limit: u32) -> Self {
        Self {
            time_limit,
            display: 0,
            persisted: 0,
            time_expired: false,
        }
    }

    /// Seed both counters from a stored elapsed time. A stored time at (or
    /// past) the limit means the attempt already ran out; the counters then
    /// start at 0 with the expired flag set.
    pub fn seed(&mut self, time_spent: u32) {
        if self.time_limit > 0 && time_spent >= self.time_limit {
            self.display = 0;
            self.persisted = 0;
            self.time_expired = true;
        } else {
            self.display = time_spent;
            self.persisted = time_spent;
            self.time_expired = false;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.time_limit);
    }

    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit > 0
    }

    #[must_use]
    pub fn display(&self) -> u32 {
        self.display
    }

    #[must_use]
    pub fn persisted(&self) -> u32 {
        self.persisted
    }

    #[must_use]
    pub fn time_expired(&self) -> bool {
        self.time_expired
    }

    /// Seconds left on the clock; 0 once expired.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        if self.time_expired {
            0
        } else {
            self.time_limit.saturating_sub(self.display)
        }
    }

    /// Guard shared by both timers, minus the per-timer conditions.
    fn may_run(&self, terminal: bool) -> bool {
        self.is_timed() && !terminal && !self.time_expired
    }

    #[must_use]
    pub fn display_active(&self, record_known: bool, terminal: bool) -> bool {
        record_known && self.may_run(terminal)
    }

    #[must_use]
    pub fn persist_active(&self, terminal: bool) -> bool {
        self.may_run(terminal) && self.persisted < self.time_limit
    }

    /// Advance the display counter by one second.
    ///
    /// On reaching the limit the counter clamps, the session expires and the
    /// persisted counter jumps to the limit so no further flush happens.
    pub fn tick_display(&mut self) -> DisplayTick {
        self.display = (self.display + 1).min(self.time_limit);
        if self.display >= self.time_limit {
            self.time_expired = true;
            self.persisted = self.time_limit;
            DisplayTick::Expired(self.time_limit)
        } else {
            DisplayTick::Ticked(self.display)
        }
    }

    /// Advance the persisted counter by `step`, clamped at the limit.
    /// Returns the value to flush while it is still below the limit.
    pub fn tick_persist(&mut self, step: u32) -> Option<u32> {
        self.persisted = self.persisted.saturating_add(step).min(self.time_limit);
        (self.persisted < self.time_limit && !self.time_expired).then_some(self.persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_expires_exactly_at_limit() {
        let mut timers = SessionTimers::new(3);
        assert_eq!(timers.tick_display(), DisplayTick::Ticked(1));
        assert_eq!(timers.tick_display(), DisplayTick::Ticked(2));
        assert_eq!(timers.tick_display(), DisplayTick::Expired(3));
        assert!(timers.time_expired());
        assert_eq!(timers.persisted(), 3);
        assert!(!timers.display_active(true, false));
        assert!(!timers.persist_active(false));
    }

    #[test]
    fn persist_flushes_only_below_limit() {
        let mut timers = SessionTimers::new(12);
        assert_eq!(timers.tick_persist(5), Some(5));
        assert_eq!(timers.tick_persist(5), Some(10));
        assert_eq!(timers.tick_persist(5), None);
        assert_eq!(timers.persisted(), 12);
        assert!(!timers.persist_active(false));
    }

    #[test]
    fn seeding_at_limit_counts_as_expired() {
        let mut timers = SessionTimers::new(60);
        timers.seed(60);
        assert!(timers.time_expired());
        assert_eq!(timers.display(), 0);
        assert_eq!(timers.remaining(), 0);

        timers.seed(20);
        assert!(!timers.time_expired());
        assert_eq!(timers.remaining(), 40);
    }

    #[test]
    fn untimed_sessions_never_run() {
        let timers = SessionTimers::new(0);
        assert!(!timers.display_active(true, false));
        assert!(!timers.persist_active(false));
    }

    #[test]
    fn terminal_or_unknown_record_stops_display() {
        let timers = SessionTimers::new(60);
        assert!(timers.display_active(true, false));
        assert!(!timers.display_active(false, false));
        assert!(!timers.display_active(true, true));
    }
}
