//! Anti-oscillation escalation.
//!
//! A robot wedged in a corner can dodge, re-approach and dodge again without
//! end. The tracker counts dodges of one kind in a row and, once a streak
//! reaches the profile's `consecutive` limit, forces a larger recovery
//! maneuver in place of whatever the classifier picked for that step.
//!
//! # Counting
//!
//! The check runs before the step's category is applied. A step continues a
//! streak when it is the same kind of dodge, or when it is a cruise step and
//! the streak is already running; the step trips the streak when it would be
//! the `consecutive`-th step of it. A streak that has already collected
//! `consecutive - 1` dodges therefore escalates on the next clear frame too.
//! A dodge of the other kind never trips a streak: it is executed, and it
//! zeroes the other counter as usual.
//!
//! With `consecutive = 5`, five obstacle dodges in a row execute as four
//! dodges and one recovery, and the counter is back at zero afterwards.

use serde::Serialize;

use super::classifier::Category;

/// Recovery forced by a tripped streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ForcedRecovery {
    Obstacle,
    Wall,
}

/// Consecutive-dodge counters. At most one is non-zero between steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EscalationState {
    pub consecutive_obstacle_dodges: u32,
    pub consecutive_wall_dodges: u32,
}

/// Per-episode escalation tracker.
#[derive(Clone, Debug)]
pub struct EscalationTracker {
    limit: u32,
    state: EscalationState,
}

impl EscalationTracker {
    /// Tracker with fresh counters. A limit of 0 is treated as 1.
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            state: EscalationState::default(),
        }
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Zero both counters (episode start).
    pub fn reset(&mut self) {
        self.state = EscalationState::default();
    }

    /// Observe the classifier's would-be category for this step.
    ///
    /// Returns the recovery that must replace it, if a streak tripped. A
    /// forced recovery counts as a non-dodge step, so both counters are
    /// zero afterwards.
    pub fn observe(&mut self, category: &Category) -> Option<ForcedRecovery> {
        if let Some(forced) = self.tripped(category) {
            tracing::debug!(
                "Escalation tripped ({:?}) after {:?}",
                forced,
                self.state
            );
            self.state = EscalationState::default();
            return Some(forced);
        }

        match category {
            Category::ObstacleDodge(_) => {
                self.state.consecutive_obstacle_dodges += 1;
                self.state.consecutive_wall_dodges = 0;
            }
            Category::WallDodge(_) => {
                self.state.consecutive_wall_dodges += 1;
                self.state.consecutive_obstacle_dodges = 0;
            }
            Category::Cruise { .. } => {
                self.state = EscalationState::default();
            }
        }
        None
    }

    fn tripped(&self, category: &Category) -> Option<ForcedRecovery> {
        let cruise = matches!(category, Category::Cruise { .. });

        let obstacle = streak_length(
            self.state.consecutive_obstacle_dodges,
            matches!(category, Category::ObstacleDodge(_)),
            cruise,
        );
        if obstacle >= self.limit {
            return Some(ForcedRecovery::Obstacle);
        }

        let wall = streak_length(
            self.state.consecutive_wall_dodges,
            matches!(category, Category::WallDodge(_)),
            cruise,
        );
        if wall >= self.limit {
            return Some(ForcedRecovery::Wall);
        }

        None
    }
}

/// Length the streak would reach by counting the current step. Zero when
/// the step breaks the streak.
#[inline]
fn streak_length(counter: u32, same_kind: bool, cruise: bool) -> u32 {
    if same_kind || (cruise && counter > 0) {
        counter + 1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::classifier::TurnDirection;

    const OBSTACLE: Category = Category::ObstacleDodge(TurnDirection::Right);
    const WALL: Category = Category::WallDodge(TurnDirection::Left);
    const CRUISE: Category = Category::Cruise { sprint: false };

    #[test]
    fn test_escalates_on_limit_th_dodge() {
        let mut tracker = EscalationTracker::new(3);
        let results: Vec<_> = (0..5).map(|_| tracker.observe(&OBSTACLE)).collect();

        assert_eq!(
            results,
            vec![None, None, Some(ForcedRecovery::Obstacle), None, None]
        );
        // Counter restarted from 0 after the forced recovery
        assert_eq!(tracker.state().consecutive_obstacle_dodges, 2);
    }

    #[test]
    fn test_wall_streak_escalates() {
        let mut tracker = EscalationTracker::new(2);
        assert_eq!(tracker.observe(&WALL), None);
        assert_eq!(tracker.observe(&WALL), Some(ForcedRecovery::Wall));
        assert_eq!(tracker.state(), EscalationState::default());
    }

    #[test]
    fn test_counter_exclusivity() {
        let mut tracker = EscalationTracker::new(10);
        tracker.observe(&OBSTACLE);
        tracker.observe(&OBSTACLE);
        tracker.observe(&WALL);
        assert_eq!(tracker.state().consecutive_obstacle_dodges, 0);
        assert_eq!(tracker.state().consecutive_wall_dodges, 1);

        tracker.observe(&OBSTACLE);
        assert_eq!(tracker.state().consecutive_wall_dodges, 0);
        assert_eq!(tracker.state().consecutive_obstacle_dodges, 1);
    }

    #[test]
    fn test_cruise_resets_counters() {
        let mut tracker = EscalationTracker::new(5);
        tracker.observe(&OBSTACLE);
        tracker.observe(&OBSTACLE);
        assert_eq!(tracker.observe(&CRUISE), None);
        assert_eq!(tracker.state(), EscalationState::default());
    }

    #[test]
    fn test_full_streak_escalates_without_dodge() {
        let mut tracker = EscalationTracker::new(3);
        tracker.observe(&OBSTACLE);
        tracker.observe(&OBSTACLE);
        // Third step would be cruise, but the streak is already at its limit
        assert_eq!(tracker.observe(&CRUISE), Some(ForcedRecovery::Obstacle));
        assert_eq!(tracker.state(), EscalationState::default());
    }

    #[test]
    fn test_other_dodge_kind_breaks_full_streak() {
        let mut tracker = EscalationTracker::new(3);
        tracker.observe(&OBSTACLE);
        tracker.observe(&OBSTACLE);
        // Obstacle streak is one short of the limit; a wall dodge still runs
        assert_eq!(tracker.observe(&WALL), None);
        assert_eq!(tracker.state().consecutive_obstacle_dodges, 0);
        assert_eq!(tracker.state().consecutive_wall_dodges, 1);

        tracker.observe(&WALL);
        assert_eq!(tracker.observe(&OBSTACLE), None);
        assert_eq!(tracker.state().consecutive_obstacle_dodges, 1);
    }

    #[test]
    fn test_limit_one_escalates_every_dodge() {
        let mut tracker = EscalationTracker::new(1);
        assert_eq!(tracker.observe(&CRUISE), None);
        assert_eq!(tracker.observe(&OBSTACLE), Some(ForcedRecovery::Obstacle));
        assert_eq!(tracker.observe(&WALL), Some(ForcedRecovery::Wall));
        assert_eq!(tracker.observe(&CRUISE), None);
    }

    #[test]
    fn test_reset() {
        let mut tracker = EscalationTracker::new(4);
        tracker.observe(&WALL);
        tracker.reset();
        assert_eq!(tracker.state(), EscalationState::default());
        assert_eq!(tracker.limit(), 4);
    }
}
