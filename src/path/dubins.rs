//! Dubins CSC curve generation
//!
//! Builds the four curve-straight-curve words (LSL, LSR, RSL, RSR) between
//! two poses and keeps the shortest feasible one. Each circle is tangent to
//! its pose; the straight piece is the common tangent of the two circles.
//!
//! Only CSC words are generated, so poses that are too close for the two
//! circles to separate have no solution.

use crate::common::traits::CurveGenerator;
use crate::common::types::{Point2D, Pose2D};
use crate::path::{Path, PathSegment, SpeedProfile};

const EPS: f64 = 1e-6;

/// Turn direction of one circle. Right turns are clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl Turn {
    fn sign(self) -> f64 {
        match self {
            Turn::Right => 1.0,
            Turn::Left => -1.0,
        }
    }
}

pub const DUBINS_WORDS: [(Turn, Turn); 4] = [
    (Turn::Left, Turn::Left),
    (Turn::Left, Turn::Right),
    (Turn::Right, Turn::Right),
    (Turn::Right, Turn::Left),
];

/// Angle swept going from `from` to `to` around `center`, constrained to
/// the turn direction.
fn arc_sweep(from: &Point2D, to: &Point2D, center: &Point2D, ccw: bool) -> f64 {
    let theta = (to.y - center.y).atan2(to.x - center.x) - (from.y - center.y).atan2(from.x - center.x);
    let theta = crate::common::types::normalize_angle(theta);
    if theta.abs() < EPS {
        0.0
    } else if theta < 0.0 && ccw {
        theta + 2.0 * std::f64::consts::PI
    } else if theta > 0.0 && !ccw {
        theta - 2.0 * std::f64::consts::PI
    } else {
        theta
    }
}

/// One CSC word. Returns the segments (zero-length pieces dropped) and the
/// total length, or `None` if the circles overlap too much for a tangent.
pub fn csc_curve(
    start: &Pose2D,
    end: &Pose2D,
    start_radius: f64,
    end_radius: f64,
    word: (Turn, Turn),
    profile: SpeedProfile,
) -> Option<(Vec<PathSegment>, f64)> {
    let r1 = start_radius.abs();
    let r2 = end_radius.abs();
    let s1 = word.0.sign();
    let s2 = word.1.sign();
    let min_center_dist = if word.0 == word.1 { (r1 - r2).abs() } else { r1 + r2 };

    let c1 = Point2D::new(start.x + s1 * r1 * start.yaw.sin(), start.y - s1 * r1 * start.yaw.cos());
    let c2 = Point2D::new(end.x + s2 * r2 * end.yaw.sin(), end.y - s2 * r2 * end.yaw.cos());

    let dx = c2.x - c1.x;
    let dy = c2.y - c1.y;
    let d = (dx * dx + dy * dy).sqrt();
    if d <= min_center_dist {
        return None;
    }
    let (vx, vy) = (dx / d, dy / d);

    let c = ((s1 * r1 - s2 * r2) / d).clamp(-1.0, 1.0);
    let s = (1.0 - c * c).sqrt();
    let nx = vx * c - vy * s;
    let ny = vx * s + vy * c;

    let t1 = Point2D::new(c1.x + nx * r1 * s1, c1.y + ny * r1 * s1);
    let t2 = Point2D::new(c2.x + nx * r2 * s2, c2.y + ny * r2 * s2);

    let start_pt = start.position();
    let end_pt = end.position();
    let candidates = [
        PathSegment::Arc {
            center: c1,
            radius: r1,
            start_rad: (start_pt.y - c1.y).atan2(start_pt.x - c1.x),
            sweep_rad: arc_sweep(&start_pt, &t1, &c1, s1 < 0.0),
            profile,
        },
        PathSegment::Line { start: t1, end: t2, profile },
        PathSegment::Arc {
            center: c2,
            radius: r2,
            start_rad: (t2.y - c2.y).atan2(t2.x - c2.x),
            sweep_rad: arc_sweep(&t2, &end_pt, &c2, s2 < 0.0),
            profile,
        },
    ];

    let segments: Vec<PathSegment> = candidates.into_iter().filter(|seg| seg.length() > EPS).collect();
    let length = segments.iter().map(|seg| seg.length()).sum();
    Some((segments, length))
}

/// Curve generator producing the shortest CSC Dubins path
#[derive(Debug, Clone, Default)]
pub struct DubinsCurveGenerator {
    /// Length of a straight approach appended in front of the goal
    pub final_straight_approach_length: f64,
}

impl DubinsCurveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_final_approach(final_straight_approach_length: f64) -> Self {
        Self { final_straight_approach_length }
    }
}

impl CurveGenerator for DubinsCurveGenerator {
    fn generate_curve(
        &self,
        start: &Pose2D,
        goal: &Pose2D,
        start_radius: f64,
        end_radius: f64,
        profile: SpeedProfile,
    ) -> Option<Path> {
        let approach = self.final_straight_approach_length;
        let pre_approach = Pose2D::new(
            goal.x - approach * goal.yaw.cos(),
            goal.y - approach * goal.yaw.sin(),
            goal.yaw,
        );

        let (segments, _) = DUBINS_WORDS
            .iter()
            .filter_map(|&word| csc_curve(start, &pre_approach, start_radius, end_radius, word, profile))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        let mut path = Path::new();
        for seg in segments {
            path.push(seg);
        }
        if approach > EPS {
            path.append_line(pre_approach.position(), goal.position(), profile);
        }
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn profile() -> SpeedProfile {
        SpeedProfile::new(60.0, 200.0, 200.0)
    }

    fn assert_reaches(path: &Path, goal: &Pose2D) {
        let end = path.end_pose().unwrap();
        assert_relative_eq!(end.x, goal.x, epsilon = 1e-6);
        assert_relative_eq!(end.y, goal.y, epsilon = 1e-6);
        assert!(crate::common::types::normalize_angle(end.yaw - goal.yaw).abs() < 1e-6);
    }

    #[test]
    fn test_straight_ahead_is_single_line() {
        let generator = DubinsCurveGenerator::new();
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(300.0, 0.0, 0.0);
        let path = generator.generate_curve(&start, &goal, 50.0, 50.0, profile()).unwrap();
        assert_eq!(path.len(), 1);
        assert_relative_eq!(path.total_length(), 300.0, epsilon = 1e-6);
    }

    #[test]
    fn test_turning_curve_is_continuous() {
        let generator = DubinsCurveGenerator::new();
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(300.0, 200.0, PI / 2.0);
        let path = generator.generate_curve(&start, &goal, 50.0, 50.0, profile()).unwrap();
        assert_reaches(&path, &goal);
        assert_relative_eq!(path.start_pose().unwrap().yaw, 0.0, epsilon = 1e-6);
        assert!(path.check_continuity(1e-6, 1e-6));
    }

    #[test]
    fn test_u_turn_curve() {
        let generator = DubinsCurveGenerator::new();
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(0.0, 400.0, PI);
        let path = generator.generate_curve(&start, &goal, 80.0, 80.0, profile()).unwrap();
        assert_reaches(&path, &goal);
        assert!(path.check_continuity(1e-6, 1e-6));
    }

    #[test]
    fn test_final_approach_line() {
        let generator = DubinsCurveGenerator::with_final_approach(40.0);
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(250.0, -150.0, -PI / 2.0);
        let path = generator.generate_curve(&start, &goal, 30.0, 30.0, profile()).unwrap();
        assert_reaches(&path, &goal);
        assert!(matches!(path.last(), Some(PathSegment::Line { .. })));
    }

    #[test]
    fn test_overlapping_circles_have_no_same_side_word() {
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(0.0, 0.0, 0.0);
        assert!(csc_curve(&start, &goal, 50.0, 50.0, (Turn::Left, Turn::Left), profile()).is_none());
    }
}
