//! Two independent periodic timers sampled by the simulation loop.
//!
//! The loop asks the scheduler on every iteration whether the action cooldown
//! or the physics tick has elapsed. Callers pass the current instant in, which
//! keeps the timing logic deterministic under test.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    period: Duration,
    last: Instant,
}

impl PeriodicTimer {
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            last: start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.period
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}

/// Action cooldown plus physics tick.
///
/// The physics timer restarts every time it fires. The cooldown restarts only
/// when an action was actually applied, so the first action after an idle
/// stretch goes through immediately.
#[derive(Debug, Clone)]
pub struct Scheduler {
    action: PeriodicTimer,
    physics: PeriodicTimer,
}

impl Scheduler {
    pub fn new(cooldown: Duration, tick: Duration, start: Instant) -> Self {
        Self {
            action: PeriodicTimer::new(cooldown, start),
            physics: PeriodicTimer::new(tick, start),
        }
    }

    pub fn action_due(&self, now: Instant) -> bool {
        self.action.is_due(now)
    }

    pub fn action_applied(&mut self, now: Instant) {
        self.action.reset(now);
    }

    /// Returns true and restarts the physics timer if a tick is due.
    pub fn take_physics_tick(&mut self, now: Instant) -> bool {
        if self.physics.is_due(now) {
            self.physics.reset(now);
            true
        } else {
            false
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.action.period()
    }

    pub fn tick(&self) -> Duration {
        self.physics.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_timer_due_after_period() {
        let start = Instant::now();
        let timer = PeriodicTimer::new(ms(50), start);
        assert!(!timer.is_due(start));
        assert!(!timer.is_due(start + ms(49)));
        assert!(timer.is_due(start + ms(50)));
    }

    #[test]
    fn test_timer_tolerates_clock_before_start() {
        let start = Instant::now();
        let timer = PeriodicTimer::new(ms(50), start + ms(10));
        assert!(!timer.is_due(start));
    }

    #[test]
    fn test_physics_tick_restarts_timer() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(ms(100), ms(50), start);

        assert!(!scheduler.take_physics_tick(start + ms(20)));
        assert!(scheduler.take_physics_tick(start + ms(55)));
        assert!(!scheduler.take_physics_tick(start + ms(60)));
        assert!(scheduler.take_physics_tick(start + ms(105)));
    }

    #[test]
    fn test_cooldown_waits_for_applied_action() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(ms(100), ms(50), start);

        assert!(!scheduler.action_due(start + ms(99)));
        assert!(scheduler.action_due(start + ms(100)));

        // Nothing applied: the cooldown stays open.
        assert!(scheduler.action_due(start + ms(300)));

        scheduler.action_applied(start + ms(300));
        assert!(!scheduler.action_due(start + ms(350)));
        assert!(scheduler.action_due(start + ms(400)));
    }

    #[test]
    fn test_schedules_are_independent() {
        let start = Instant::now();
        let mut scheduler = Scheduler::new(ms(100), ms(50), start);

        let mut physics_ticks = 0;
        let mut actions = 0;
        for step in 1..=40 {
            let now = start + ms(step * 5);
            if scheduler.action_due(now) {
                scheduler.action_applied(now);
                actions += 1;
            }
            if scheduler.take_physics_tick(now) {
                physics_ticks += 1;
            }
        }

        assert_eq!(physics_ticks, 4);
        assert_eq!(actions, 2);
        assert_eq!(scheduler.cooldown(), ms(100));
        assert_eq!(scheduler.tick(), ms(50));
    }
}
