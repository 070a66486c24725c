//! Terminal heading correction
//!
//! A lattice path ends at the nearest discrete heading. The finalizer
//! replaces any trailing turns in place with a single turn to the exact
//! requested heading when the discrete one is off by more than the
//! threshold.

use log::debug;

use crate::common::types::{normalize_angle, Point2D};
use crate::config::LatticePlannerConfig;
use crate::path::{Path, PathSegment, SpeedProfile};

#[derive(Debug, Clone)]
pub struct PathFinalizer {
    threshold_rad: f64,
    turn_speed: f64,
    turn_accel: f64,
    turn_decel: f64,
}

impl PathFinalizer {
    pub fn new(config: &LatticePlannerConfig) -> Self {
        Self {
            threshold_rad: config.terminal_turn_threshold_deg.to_radians(),
            turn_speed: config.terminal_turn_speed_rad_s,
            turn_accel: config.terminal_turn_accel,
            turn_decel: config.terminal_turn_decel,
        }
    }

    /// Make `path` end at `desired_heading`. Returns true if a correcting
    /// point turn was appended. Empty paths are left alone.
    pub fn finalize(&self, path: &mut Path, desired_heading: f64) -> bool {
        let trailing_turns = path
            .segments()
            .iter()
            .rev()
            .take_while(|seg| seg.is_point_turn())
            .count();

        let (position, achieved) = if trailing_turns < path.len() {
            let end = path.segments()[path.len() - trailing_turns - 1].end_pose();
            (end.position(), end.yaw)
        } else {
            // turns only: measure from the heading held before any of them
            match path.segments().first() {
                Some(PathSegment::PointTurn { position, start_angle, .. }) => (*position, *start_angle),
                _ => return false,
            }
        };

        path.pop_back(trailing_turns);

        let error = normalize_angle(desired_heading - achieved);
        if error.abs() <= self.threshold_rad {
            return false;
        }

        debug!(
            "appending terminal point turn of {:.2} deg at ({:.1}, {:.1})",
            error.to_degrees(),
            position.x,
            position.y
        );
        self.append_turn(path, position, achieved, error);
        true
    }

    fn append_turn(&self, path: &mut Path, position: Point2D, from: f64, delta: f64) {
        let profile = SpeedProfile::new(delta.signum() * self.turn_speed, self.turn_accel, self.turn_decel);
        path.append_point_turn(position, from, from + delta, profile);
    }
}
