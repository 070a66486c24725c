//! Motion primitives of the xytheta lattice
//!
//! Headings are the 16 directions of small integer vectors, so every
//! straight move lands exactly on a grid cell. Soft turns move one heading
//! bucket while travelling the sum of the two direction vectors, built as
//! an arc followed (or preceded) by a straight piece.

use std::f64::consts::PI;

use crate::common::types::{normalize_angle, Point2D};
use crate::config::LatticeEnvironmentConfig;
use crate::lattice::state::ActionId;
use crate::path::{PathSegment, SpeedProfile};

pub const NUM_HEADINGS: usize = 16;

const DIRECTIONS: [(i32, i32); NUM_HEADINGS] = [
    (1, 0),
    (2, 1),
    (1, 1),
    (1, 2),
    (0, 1),
    (-1, 2),
    (-1, 1),
    (-2, 1),
    (-1, 0),
    (-2, -1),
    (-1, -1),
    (-1, -2),
    (0, -1),
    (1, -2),
    (1, -1),
    (2, -1),
];

const EPS: f64 = 1e-9;

/// Heading of bucket `theta` in radians
pub fn heading_angle(theta: u8) -> f64 {
    let (dx, dy) = DIRECTIONS[theta as usize % NUM_HEADINGS];
    (dy as f64).atan2(dx as f64)
}

/// Bucket whose heading is closest to `angle`
pub fn nearest_heading(angle: f64) -> u8 {
    let mut best = 0u8;
    let mut best_err = f64::INFINITY;
    for t in 0..NUM_HEADINGS as u8 {
        let err = normalize_angle(angle - heading_angle(t)).abs();
        if err < best_err {
            best_err = err;
            best = t;
        }
    }
    best
}

fn rotate_heading(theta: u8, delta: i32) -> u8 {
    (theta as i32 + delta).rem_euclid(NUM_HEADINGS as i32) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Straight,
    LongStraight,
    Backup,
    SoftLeft,
    SoftRight,
    TurnInPlaceLeft,
    TurnInPlaceRight,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Straight,
        ActionKind::LongStraight,
        ActionKind::Backup,
        ActionKind::SoftLeft,
        ActionKind::SoftRight,
        ActionKind::TurnInPlaceLeft,
        ActionKind::TurnInPlaceRight,
    ];

    pub fn id(self) -> ActionId {
        match self {
            ActionKind::Straight => 0,
            ActionKind::LongStraight => 1,
            ActionKind::Backup => 2,
            ActionKind::SoftLeft => 3,
            ActionKind::SoftRight => 4,
            ActionKind::TurnInPlaceLeft => 5,
            ActionKind::TurnInPlaceRight => 6,
        }
    }

    pub fn is_turn_in_place(self) -> bool {
        matches!(self, ActionKind::TurnInPlaceLeft | ActionKind::TurnInPlaceRight)
    }
}

/// Sample point along a primitive, relative to its start cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediatePosition {
    pub position: Point2D,
    pub theta: u8,
    /// Distance covered since the previous sample (mm)
    pub step_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionPrimitive {
    pub id: ActionId,
    pub kind: ActionKind,
    pub start_theta: u8,
    pub end_dx: i32,
    pub end_dy: i32,
    pub end_theta: u8,
    /// Traversal time without obstacles (s)
    pub cost: f64,
    /// Continuous geometry relative to the start cell
    pub segments: Vec<PathSegment>,
    pub samples: Vec<IntermediatePosition>,
}

/// All primitives, indexed by start heading
#[derive(Debug, Clone)]
pub struct ActionSpace {
    resolution: f64,
    primitives: Vec<Vec<MotionPrimitive>>,
}

impl ActionSpace {
    pub fn new(config: &LatticeEnvironmentConfig) -> Self {
        let primitives = (0..NUM_HEADINGS as u8)
            .map(|theta| {
                ActionKind::ALL
                    .iter()
                    .filter_map(|&kind| build_primitive(config, theta, kind))
                    .collect()
            })
            .collect();
        Self {
            resolution: config.resolution_mm,
            primitives,
        }
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn primitives(&self, theta: u8) -> &[MotionPrimitive] {
        &self.primitives[theta as usize % NUM_HEADINGS]
    }

    pub fn primitive(&self, theta: u8, action: ActionId) -> Option<&MotionPrimitive> {
        self.primitives(theta).iter().find(|p| p.id == action)
    }
}

fn line_samples(start: Point2D, end: Point2D, theta: u8, spacing: f64) -> Vec<IntermediatePosition> {
    let length = start.distance(&end);
    let n = (length / spacing).ceil().max(1.0) as usize;
    (1..=n)
        .map(|i| {
            let f = i as f64 / n as f64;
            IntermediatePosition {
                position: Point2D::new(start.x + f * (end.x - start.x), start.y + f * (end.y - start.y)),
                theta,
                step_mm: length / n as f64,
            }
        })
        .collect()
}

fn arc_samples(segment: &PathSegment, spacing: f64) -> Vec<IntermediatePosition> {
    let (center, radius, start_rad, sweep_rad) = match segment {
        PathSegment::Arc { center, radius, start_rad, sweep_rad, .. } => (*center, *radius, *start_rad, *sweep_rad),
        _ => return Vec::new(),
    };
    let length = radius * sweep_rad.abs();
    let n = (length / spacing)
        .ceil()
        .max((sweep_rad.abs() / (PI / 32.0)).ceil())
        .max(1.0) as usize;
    let heading_offset = if sweep_rad >= 0.0 { PI / 2.0 } else { -PI / 2.0 };
    (1..=n)
        .map(|i| {
            let rad = start_rad + sweep_rad * i as f64 / n as f64;
            IntermediatePosition {
                position: Point2D::new(center.x + radius * rad.cos(), center.y + radius * rad.sin()),
                theta: nearest_heading(rad + heading_offset),
                step_mm: length / n as f64,
            }
        })
        .collect()
}

/// Arc of turn sign `s` (left = +1) from heading `a0` to `a1` combined with a
/// straight piece so that the move ends at `end`. Returns radius, straight
/// length and whether the arc comes first.
fn solve_turn(a0: f64, a1: f64, s: f64, end: Point2D, min_radius: f64) -> Option<(f64, f64, bool)> {
    let q = (a1.sin() - a0.sin(), a0.cos() - a1.cos());
    let cross = |u: (f64, f64), v: (f64, f64)| u.0 * v.1 - u.1 * v.0;
    let dot = |u: (f64, f64), v: (f64, f64)| u.0 * v.0 + u.1 * v.1;
    let e = (end.x, end.y);

    let candidate = |u: (f64, f64), arc_first: bool| -> Option<(f64, f64, bool)> {
        let denom = s * cross(u, q);
        if denom.abs() < EPS {
            return None;
        }
        let r = cross(u, e) / denom;
        if !r.is_finite() || r < min_radius {
            return None;
        }
        let l = dot(u, (e.0 - s * r * q.0, e.1 - s * r * q.1));
        if l < -1e-6 {
            return None;
        }
        Some((r, l.max(0.0), arc_first))
    };

    let arc_then_line = candidate((a1.cos(), a1.sin()), true);
    let line_then_arc = candidate((a0.cos(), a0.sin()), false);
    match (arc_then_line, line_then_arc) {
        (Some(a), Some(b)) => Some(if a.0 >= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn build_primitive(config: &LatticeEnvironmentConfig, theta: u8, kind: ActionKind) -> Option<MotionPrimitive> {
    let res = config.resolution_mm;
    let spacing = res / 2.0;
    let (dx, dy) = DIRECTIONS[theta as usize];
    let a0 = heading_angle(theta);
    let origin = Point2D::origin();
    let forward = SpeedProfile::new(config.max_velocity_mm_s, config.linear_accel, config.linear_decel);

    let straight = |cells: i32, profile: SpeedProfile, speed: f64| {
        let end = Point2D::new((dx * cells) as f64 * res, (dy * cells) as f64 * res);
        let length = origin.distance(&end);
        MotionPrimitive {
            id: kind.id(),
            kind,
            start_theta: theta,
            end_dx: dx * cells,
            end_dy: dy * cells,
            end_theta: theta,
            cost: length / speed,
            segments: vec![PathSegment::Line { start: origin, end, profile }],
            samples: line_samples(origin, end, theta, spacing),
        }
    };

    match kind {
        ActionKind::Straight => Some(straight(1, forward, config.max_velocity_mm_s)),
        ActionKind::LongStraight => Some(straight(config.long_straight_cells, forward, config.max_velocity_mm_s)),
        ActionKind::Backup => {
            let reverse = SpeedProfile::new(-config.reverse_velocity_mm_s, config.linear_accel, config.linear_decel);
            Some(straight(-1, reverse, config.reverse_velocity_mm_s))
        }
        ActionKind::SoftLeft | ActionKind::SoftRight => {
            let s = if kind == ActionKind::SoftLeft { 1.0 } else { -1.0 };
            let end_theta = rotate_heading(theta, s as i32);
            let (ex, ey) = DIRECTIONS[end_theta as usize];
            let a1 = heading_angle(end_theta);
            let end = Point2D::new((dx + ex) as f64 * res, (dy + ey) as f64 * res);
            let (r, l, arc_first) = solve_turn(a0, a1, s, end, config.min_turn_radius_mm)?;

            let sweep = normalize_angle(a1 - a0);
            let arc_at = |p: Point2D| PathSegment::Arc {
                center: Point2D::new(p.x - s * r * a0.sin(), p.y + s * r * a0.cos()),
                radius: r,
                start_rad: a0 - s * PI / 2.0,
                sweep_rad: sweep,
                profile: forward,
            };

            let mut segments = Vec::new();
            let mut samples = Vec::new();
            if arc_first {
                let arc = arc_at(origin);
                let arc_end = arc.end_pose().position();
                samples.extend(arc_samples(&arc, spacing));
                segments.push(arc);
                if l > EPS {
                    samples.extend(line_samples(arc_end, end, end_theta, spacing));
                    segments.push(PathSegment::Line { start: arc_end, end, profile: forward });
                }
            } else {
                let line_end = Point2D::new(l * a0.cos(), l * a0.sin());
                if l > EPS {
                    samples.extend(line_samples(origin, line_end, theta, spacing));
                    segments.push(PathSegment::Line { start: origin, end: line_end, profile: forward });
                }
                let arc = arc_at(line_end);
                samples.extend(arc_samples(&arc, spacing));
                segments.push(arc);
            }

            let length: f64 = segments.iter().map(|seg| seg.length()).sum();
            Some(MotionPrimitive {
                id: kind.id(),
                kind,
                start_theta: theta,
                end_dx: dx + ex,
                end_dy: dy + ey,
                end_theta,
                cost: length / config.max_velocity_mm_s,
                segments,
                samples,
            })
        }
        ActionKind::TurnInPlaceLeft | ActionKind::TurnInPlaceRight => {
            let s = if kind == ActionKind::TurnInPlaceLeft { 1 } else { -1 };
            let end_theta = rotate_heading(theta, s);
            let a1 = heading_angle(end_theta);
            let sweep = normalize_angle(a1 - a0);
            let profile = SpeedProfile::new(
                s as f64 * config.point_turn_speed_rad_s,
                config.point_turn_accel,
                config.point_turn_accel,
            );
            // a turn in place is charged like driving one cell through an obstacle
            let samples = [theta, end_theta]
                .iter()
                .map(|&t| IntermediatePosition { position: origin, theta: t, step_mm: spacing })
                .collect();
            Some(MotionPrimitive {
                id: kind.id(),
                kind,
                start_theta: theta,
                end_dx: 0,
                end_dy: 0,
                end_theta,
                cost: sweep.abs() / config.point_turn_speed_rad_s,
                segments: vec![PathSegment::PointTurn {
                    position: origin,
                    start_angle: a0,
                    target_angle: a0 + sweep,
                    profile,
                }],
                samples,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn space() -> ActionSpace {
        ActionSpace::new(&LatticeEnvironmentConfig::default())
    }

    #[test]
    fn test_nearest_heading() {
        assert_eq!(nearest_heading(0.0), 0);
        assert_eq!(nearest_heading(PI / 2.0), 4);
        assert_eq!(nearest_heading(-PI), 8);
        assert_eq!(nearest_heading(PI), 8);
        assert_eq!(nearest_heading(-PI / 4.0 + 0.01), 14);
        for t in 0..NUM_HEADINGS as u8 {
            assert_eq!(nearest_heading(heading_angle(t)), t);
        }
    }

    #[test]
    fn test_every_heading_has_all_actions() {
        let space = space();
        for t in 0..NUM_HEADINGS as u8 {
            assert_eq!(space.primitives(t).len(), ActionKind::ALL.len(), "heading {}", t);
        }
    }

    #[test]
    fn test_primitive_geometry_matches_end_state() {
        let space = space();
        let res = space.resolution();
        for t in 0..NUM_HEADINGS as u8 {
            for prim in space.primitives(t) {
                let first = prim.segments.first().unwrap().start_pose();
                assert_relative_eq!(first.x, 0.0, epsilon = 1e-6);
                assert_relative_eq!(first.y, 0.0, epsilon = 1e-6);
                assert!(normalize_angle(first.yaw - heading_angle(t)).abs() < 1e-6);

                let last = prim.segments.last().unwrap().end_pose();
                assert_relative_eq!(last.x, prim.end_dx as f64 * res, epsilon = 1e-6);
                assert_relative_eq!(last.y, prim.end_dy as f64 * res, epsilon = 1e-6);
                assert!(normalize_angle(last.yaw - heading_angle(prim.end_theta)).abs() < 1e-6);

                let sample_end = prim.samples.last().unwrap().position;
                assert_relative_eq!(sample_end.x, last.x, epsilon = 1e-6);
                assert_relative_eq!(sample_end.y, last.y, epsilon = 1e-6);
                assert!(prim.cost > 0.0);
            }
        }
    }

    #[test]
    fn test_soft_turn_radius() {
        let space = space();
        let left = space.primitive(0, ActionKind::SoftLeft.id()).unwrap();
        match &left.segments[0] {
            PathSegment::Arc { radius, sweep_rad, .. } => {
                assert_relative_eq!(*radius, 42.36, epsilon = 0.01);
                assert!(*sweep_rad > 0.0);
            }
            other => panic!("expected arc first, got {:?}", other),
        }
        let right = space.primitive(0, ActionKind::SoftRight.id()).unwrap();
        assert_eq!(right.end_theta, 15);
        assert_eq!((right.end_dx, right.end_dy), (3, -1));
    }

    #[test]
    fn test_backup_is_reverse() {
        let space = space();
        let backup = space.primitive(4, ActionKind::Backup.id()).unwrap();
        assert_eq!((backup.end_dx, backup.end_dy, backup.end_theta), (0, -1, 4));
        assert!(backup.segments[0].is_reverse());
        assert!(normalize_angle(backup.segments[0].start_pose().yaw - PI / 2.0).abs() < 1e-9);
    }
}
