//! Time-limited arming for destructive actions.
//!
//! Every mutating command (terminate a cluster, stop a warehouse, ...) must
//! pass through [`ArmingGuard::require_armed`]. The guard starts disarmed; an
//! explicit arm opens a fixed window after which it falls back to disarmed,
//! either when the presentation loop calls [`ArmingGuard::tick`] or lazily
//! on the next query.
//!
//! All operations have an `_at` form taking the current [`Instant`] so the
//! state machine is deterministic under test.

use std::time::{Duration, Instant};

use tracing::info;

/// Default length of an armed window.
pub const DEFAULT_ARM_WINDOW: Duration = Duration::from_secs(30);

/// Current arming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed { expires_at: Instant },
}

/// Observable transitions, drained by the presentation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    /// A window was opened (or reset) for `window`.
    Armed { window: Duration },
    /// The operator disarmed explicitly.
    Disarmed,
    /// The window ran out.
    Expired,
    /// A destructive action was attempted while disarmed.
    Rejected { action: String },
}

impl GuardEvent {
    /// User-facing text for this event.
    pub fn message(&self) -> String {
        match self {
            GuardEvent::Armed { window } => {
                format!("ARMED for {}s - destructive actions enabled", window.as_secs())
            }
            GuardEvent::Disarmed => "Disarmed".to_string(),
            GuardEvent::Expired => "Armed mode expired".to_string(),
            GuardEvent::Rejected { action } => format!("Press A to arm before {}", action),
        }
    }
}

/// Gate for destructive operations.
#[derive(Debug)]
pub struct ArmingGuard {
    window: Duration,
    state: ArmState,
    events: Vec<GuardEvent>,
}

impl Default for ArmingGuard {
    fn default() -> Self {
        Self::new(DEFAULT_ARM_WINDOW)
    }
}

impl ArmingGuard {
    /// Create a disarmed guard with the given window length.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: ArmState::Disarmed,
            events: Vec::new(),
        }
    }

    /// Length of an armed window.
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn arm(&mut self) {
        self.arm_at(Instant::now());
    }

    /// Open a window ending at `now + window`, resetting any current one.
    pub fn arm_at(&mut self, now: Instant) {
        // A window that lapsed without being ticked still gets its Expired.
        if let ArmState::Armed { expires_at } = self.state {
            if now >= expires_at {
                self.expire();
            }
        }
        self.state = ArmState::Armed {
            expires_at: now + self.window,
        };
        info!(window_secs = self.window.as_secs(), "armed");
        self.events.push(GuardEvent::Armed {
            window: self.window,
        });
    }

    pub fn disarm(&mut self) {
        self.disarm_at(Instant::now());
    }

    /// Close the window. No-op when already disarmed, including a window
    /// that lapsed without being ticked: that one is expired instead.
    pub fn disarm_at(&mut self, now: Instant) {
        match self.state {
            ArmState::Armed { expires_at } if now >= expires_at => self.expire(),
            ArmState::Armed { .. } => {
                self.state = ArmState::Disarmed;
                info!("disarmed");
                self.events.push(GuardEvent::Disarmed);
            }
            ArmState::Disarmed => {}
        }
    }

    pub fn is_armed(&self) -> bool {
        self.is_armed_at(Instant::now())
    }

    /// True iff armed and `now` is before the expiry instant.
    pub fn is_armed_at(&self, now: Instant) -> bool {
        match self.state {
            ArmState::Armed { expires_at } => now < expires_at,
            ArmState::Disarmed => false,
        }
    }

    pub fn state(&self) -> ArmState {
        self.state_at(Instant::now())
    }

    /// State as seen at `now`; a lapsed window reads as disarmed.
    pub fn state_at(&self, now: Instant) -> ArmState {
        if self.is_armed_at(now) {
            self.state
        } else {
            ArmState::Disarmed
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Instant::now())
    }

    /// Time left in the window, `None` while disarmed.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self.state_at(now) {
            ArmState::Armed { expires_at } => Some(expires_at - now),
            ArmState::Disarmed => None,
        }
    }

    /// Whole seconds left, rounded up so a fresh window shows its full length.
    pub fn remaining_seconds_at(&self, now: Instant) -> Option<u64> {
        self.remaining_at(now).map(|d| {
            let secs = d.as_secs();
            if d.subsec_nanos() > 0 {
                secs + 1
            } else {
                secs
            }
        })
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.remaining_seconds_at(Instant::now())
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Periodic expiry check. Returns true on the tick that closed the
    /// window; the `Expired` event itself goes through the queue.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        match self.state {
            ArmState::Armed { expires_at } if now >= expires_at => {
                self.expire();
                true
            }
            _ => false,
        }
    }

    pub fn require_armed(&mut self, action: &str) -> bool {
        self.require_armed_at(action, Instant::now())
    }

    /// Gate for a destructive action. Queues a `Rejected` event when disarmed.
    pub fn require_armed_at(&mut self, action: &str, now: Instant) -> bool {
        if self.is_armed_at(now) {
            return true;
        }
        self.events.push(GuardEvent::Rejected {
            action: action.to_string(),
        });
        false
    }

    /// Take all queued events in the order they happened.
    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        std::mem::take(&mut self.events)
    }

    fn expire(&mut self) {
        self.state = ArmState::Disarmed;
        info!("armed window expired");
        self.events.push(GuardEvent::Expired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_starts_disarmed() {
        let guard = ArmingGuard::default();
        let now = Instant::now();
        assert!(!guard.is_armed_at(now));
        assert_eq!(guard.state_at(now), ArmState::Disarmed);
        assert_eq!(guard.remaining_at(now), None);
    }

    #[test]
    fn test_arm_then_disarm() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();

        guard.arm_at(t0);
        assert!(guard.is_armed_at(t0));

        guard.disarm();
        assert!(!guard.is_armed_at(t0));
        assert_eq!(
            guard.drain_events(),
            vec![GuardEvent::Armed { window: secs(30) }, GuardEvent::Disarmed]
        );
    }

    #[test]
    fn test_disarm_when_disarmed_is_noop() {
        let mut guard = ArmingGuard::default();
        guard.disarm();
        guard.disarm();
        assert!(guard.drain_events().is_empty());
    }

    #[test]
    fn test_window_boundary() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);

        assert!(guard.is_armed_at(t0 + Duration::from_millis(29_999)));
        assert!(!guard.is_armed_at(t0 + secs(30)));
        assert!(!guard.is_armed_at(t0 + secs(31)));
    }

    #[test]
    fn test_rearm_resets_timer() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();

        guard.arm_at(t0);
        guard.arm_at(t0 + secs(20));

        assert!(guard.is_armed_at(t0 + secs(45)));
        assert!(!guard.is_armed_at(t0 + secs(51)));
    }

    #[test]
    fn test_expiry_fires_once() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);
        guard.drain_events();

        assert!(!guard.tick_at(t0 + secs(10)));
        assert!(guard.tick_at(t0 + secs(30)));
        assert!(!guard.tick_at(t0 + secs(31)));
        assert!(!guard.tick_at(t0 + secs(90)));

        assert_eq!(guard.drain_events(), vec![GuardEvent::Expired]);
    }

    #[test]
    fn test_query_expires_lazily_before_tick() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);

        // No tick yet, the query alone must report disarmed.
        assert!(!guard.is_armed_at(t0 + secs(40)));
        assert_eq!(guard.state_at(t0 + secs(40)), ArmState::Disarmed);
        assert!(guard.tick_at(t0 + secs(40)));
    }

    #[test]
    fn test_disarm_after_lapse_reports_expiry() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);
        guard.drain_events();

        assert!(!guard.is_armed_at(t0 + secs(40)));
        guard.disarm_at(t0 + secs(40));
        assert!(!guard.tick_at(t0 + secs(41)));

        assert_eq!(guard.drain_events(), vec![GuardEvent::Expired]);
    }

    #[test]
    fn test_disarm_inside_window() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);
        guard.drain_events();

        guard.disarm_at(t0 + secs(29));
        assert!(!guard.tick_at(t0 + secs(31)));
        assert_eq!(guard.drain_events(), vec![GuardEvent::Disarmed]);
    }

    #[test]
    fn test_rearm_after_lapse_closes_old_window() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);
        guard.arm_at(t0 + secs(40));

        assert_eq!(
            guard.drain_events(),
            vec![
                GuardEvent::Armed { window: secs(30) },
                GuardEvent::Expired,
                GuardEvent::Armed { window: secs(30) },
            ]
        );
        assert!(guard.is_armed_at(t0 + secs(69)));
        assert!(!guard.tick_at(t0 + secs(69)));
    }

    #[test]
    fn test_remaining_seconds() {
        let mut guard = ArmingGuard::new(secs(30));
        let t0 = Instant::now();
        guard.arm_at(t0);

        assert_eq!(guard.remaining_seconds_at(t0), Some(30));
        assert_eq!(guard.remaining_seconds_at(t0 + Duration::from_millis(500)), Some(30));
        assert_eq!(guard.remaining_seconds_at(t0 + secs(29)), Some(1));
        assert_eq!(guard.remaining_seconds_at(t0 + secs(30)), None);
    }

    #[test]
    fn test_require_armed_while_disarmed_warns_once() {
        let mut guard = ArmingGuard::default();
        assert!(!guard.require_armed_at("terminating cluster", Instant::now()));

        let events = guard.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message(), "Press A to arm before terminating cluster");
    }

    #[test]
    fn test_require_armed_while_armed_is_silent() {
        let mut guard = ArmingGuard::default();
        let t0 = Instant::now();
        guard.arm_at(t0);
        guard.drain_events();

        assert!(guard.require_armed_at("terminating cluster", t0 + secs(1)));
        assert!(guard.drain_events().is_empty());
    }
}
