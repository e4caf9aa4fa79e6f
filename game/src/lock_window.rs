use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies one accepted move inside one session. Timers hold on to it so a
/// callback that fires after a restart (or after the window was already
/// closed) can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockTicket {
    pub session: u64,
    pub move_number: u32,
}

/// The cooldown between accepting a move and accepting the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockWindow {
    ticket: LockTicket,
    elapsed: Duration,
    limit: Duration,
}

impl LockWindow {
    pub fn new(ticket: LockTicket, limit: Duration) -> Self {
        Self {
            ticket,
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn ticket(&self) -> LockTicket {
        self.ticket
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed)
    }

    pub fn is_up(&self) -> bool {
        self.elapsed >= self.limit
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.is_up() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> LockTicket {
        LockTicket {
            session: 1,
            move_number: 1,
        }
    }

    #[test]
    fn window_reports_up_at_or_past_limit() {
        let mut w = LockWindow::new(ticket(), Duration::from_millis(1050));
        assert!(!w.is_up());
        assert_eq!(w.remaining(), Duration::from_millis(1050));

        w.tick(Duration::from_millis(1000));
        assert!(!w.is_up());
        assert_eq!(w.remaining(), Duration::from_millis(50));

        w.tick(Duration::from_millis(80));
        assert!(w.is_up());
        assert_eq!(w.remaining(), Duration::ZERO);

        // Once up it stays pinned at the limit.
        w.tick(Duration::from_secs(5));
        assert_eq!(w.elapsed(), Duration::from_millis(1050));
    }

    #[test]
    fn zero_length_window_is_up_immediately() {
        let w = LockWindow::new(ticket(), Duration::ZERO);
        assert!(w.is_up());
    }
}
