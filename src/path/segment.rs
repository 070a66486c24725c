//! Drivable path segments: straight lines, circular arcs and turns in place

use std::f64::consts::PI;

use crate::common::types::{normalize_angle, Point2D, Pose2D};

/// Target speed with acceleration limits.
///
/// For lines and arcs speeds are in mm/s, for point turns in rad/s.
/// A negative target speed means the segment is driven in reverse
/// (or clockwise, for a point turn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedProfile {
    pub target_speed: f64,
    pub accel: f64,
    pub decel: f64,
}

impl SpeedProfile {
    pub fn new(target_speed: f64, accel: f64, decel: f64) -> Self {
        Self { target_speed, accel, decel }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Line {
        start: Point2D,
        end: Point2D,
        profile: SpeedProfile,
    },
    /// Positive `sweep_rad` is counter-clockwise
    Arc {
        center: Point2D,
        radius: f64,
        start_rad: f64,
        sweep_rad: f64,
        profile: SpeedProfile,
    },
    PointTurn {
        position: Point2D,
        start_angle: f64,
        target_angle: f64,
        profile: SpeedProfile,
    },
}

impl PathSegment {
    pub fn profile(&self) -> &SpeedProfile {
        match self {
            PathSegment::Line { profile, .. }
            | PathSegment::Arc { profile, .. }
            | PathSegment::PointTurn { profile, .. } => profile,
        }
    }

    pub fn is_point_turn(&self) -> bool {
        matches!(self, PathSegment::PointTurn { .. })
    }

    pub fn is_reverse(&self) -> bool {
        !self.is_point_turn() && self.profile().target_speed < 0.0
    }

    pub fn start_pose(&self) -> Pose2D {
        match self {
            PathSegment::Line { start, end, profile } => {
                Pose2D::new(start.x, start.y, line_heading(start, end, profile))
            }
            PathSegment::Arc { center, radius, start_rad, sweep_rad, profile } => {
                arc_pose(center, *radius, *start_rad, *sweep_rad, profile)
            }
            PathSegment::PointTurn { position, start_angle, .. } => {
                Pose2D::new(position.x, position.y, normalize_angle(*start_angle))
            }
        }
    }

    pub fn end_pose(&self) -> Pose2D {
        match self {
            PathSegment::Line { start, end, profile } => {
                Pose2D::new(end.x, end.y, line_heading(start, end, profile))
            }
            PathSegment::Arc { center, radius, start_rad, sweep_rad, profile } => {
                arc_pose(center, *radius, start_rad + sweep_rad, *sweep_rad, profile)
            }
            PathSegment::PointTurn { position, target_angle, .. } => {
                Pose2D::new(position.x, position.y, normalize_angle(*target_angle))
            }
        }
    }

    /// Same segment shifted by `(dx, dy)`
    pub fn translated(&self, dx: f64, dy: f64) -> PathSegment {
        let shift = |p: &Point2D| Point2D::new(p.x + dx, p.y + dy);
        match self {
            PathSegment::Line { start, end, profile } => PathSegment::Line {
                start: shift(start),
                end: shift(end),
                profile: *profile,
            },
            PathSegment::Arc { center, radius, start_rad, sweep_rad, profile } => PathSegment::Arc {
                center: shift(center),
                radius: *radius,
                start_rad: *start_rad,
                sweep_rad: *sweep_rad,
                profile: *profile,
            },
            PathSegment::PointTurn { position, start_angle, target_angle, profile } => PathSegment::PointTurn {
                position: shift(position),
                start_angle: *start_angle,
                target_angle: *target_angle,
                profile: *profile,
            },
        }
    }

    /// Distance travelled along the ground (zero for point turns)
    pub fn length(&self) -> f64 {
        match self {
            PathSegment::Line { start, end, .. } => start.distance(end),
            PathSegment::Arc { radius, sweep_rad, .. } => radius * sweep_rad.abs(),
            PathSegment::PointTurn { .. } => 0.0,
        }
    }
}

fn line_heading(start: &Point2D, end: &Point2D, profile: &SpeedProfile) -> f64 {
    let mut heading = (end.y - start.y).atan2(end.x - start.x);
    if profile.target_speed < 0.0 {
        heading += PI;
    }
    normalize_angle(heading)
}

fn arc_pose(center: &Point2D, radius: f64, rad: f64, sweep_rad: f64, profile: &SpeedProfile) -> Pose2D {
    let x = center.x + radius * rad.cos();
    let y = center.y + radius * rad.sin();
    let mut heading = if sweep_rad >= 0.0 { rad + PI / 2.0 } else { rad - PI / 2.0 };
    if profile.target_speed < 0.0 {
        heading += PI;
    }
    Pose2D::new(x, y, normalize_angle(heading))
}
