//! Exploration distance tracking.
//!
//! Movement updates accumulate Euclidean distance per player. Each full
//! [`STEP_DISTANCE`] walked is worth one `explore_steps` action.

use dashmap::DashMap;
use log::debug;
use uuid::Uuid;

/// Action granted per full step of accumulated distance.
pub const EXPLORE_ACTION: &str = "explore_steps";
/// Distance that earns one `explore_steps` grant.
pub const STEP_DISTANCE: f64 = 100.0;
/// Largest distance a single update may contribute (teleports, respawns).
pub const MAX_UPDATE_DISTANCE: f64 = 20.0;

pub type Position = (f64, f64, f64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct WalkState {
    last: Option<Position>,
    accumulated: f64,
}

#[derive(Debug, Default)]
pub struct WalkTracker {
    states: DashMap<Uuid, WalkState>,
}

impl WalkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position and return how many step grants it earned.
    pub fn update(&self, player: Uuid, position: Position) -> u32 {
        let mut state = self.states.entry(player).or_default();
        let Some(last) = state.last.replace(position) else {
            return 0;
        };
        let delta = distance(last, position);
        if !delta.is_finite() {
            return 0;
        }
        state.accumulated += delta.min(MAX_UPDATE_DISTANCE);

        let mut steps = 0;
        while state.accumulated >= STEP_DISTANCE {
            state.accumulated -= STEP_DISTANCE;
            steps += 1;
        }
        if steps > 0 {
            debug!("{player} walked {steps} step(s)");
        }
        steps
    }

    /// Distance walked toward the next step grant.
    pub fn accumulated(&self, player: Uuid) -> f64 {
        self.states.get(&player).map_or(0.0, |state| state.accumulated)
    }

    pub fn remove(&self, player: Uuid) -> bool {
        self.states.remove(&player).is_some()
    }

    pub fn tracked(&self) -> usize {
        self.states.len()
    }
}

fn distance(a: Position, b: Position) -> f64 {
    let (dx, dy, dz) = (b.0 - a.0, b.1 - a.1, b.2 - a.2);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_only_records_position() {
        let walk = WalkTracker::new();
        let player = Uuid::new_v4();
        assert_eq!(walk.update(player, (50.0, 0.0, 0.0)), 0);
        assert!(walk.accumulated(player).abs() < f64::EPSILON);
    }

    #[test]
    fn long_jumps_are_capped() {
        let walk = WalkTracker::new();
        let player = Uuid::new_v4();
        walk.update(player, (0.0, 0.0, 0.0));
        walk.update(player, (0.0, 0.0, 500.0));
        assert!((walk.accumulated(player) - MAX_UPDATE_DISTANCE).abs() < 1e-9);
    }

    #[test]
    fn every_hundred_units_earns_a_step() {
        let walk = WalkTracker::new();
        let player = Uuid::new_v4();
        walk.update(player, (0.0, 0.0, 0.0));
        let mut steps = 0;
        for i in 1..=11 {
            steps += walk.update(player, (f64::from(i) * 10.0, 0.0, 0.0));
        }
        // 110 units walked
        assert_eq!(steps, 1);
        assert!((walk.accumulated(player) - 10.0).abs() < 1e-9);

        assert!(walk.remove(player));
        assert_eq!(walk.tracked(), 0);
    }
}
