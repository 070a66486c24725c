//! Continuous paths made of drivable segments
//!
//! # Components
//!
//! - `segment`: line, arc and point-turn primitives with speed profiles
//! - `dubins`: CSC curve generator used by the curve planner

pub mod segment;
pub mod dubins;

pub use segment::{PathSegment, SpeedProfile};
pub use dubins::DubinsCurveGenerator;

use itertools::Itertools;

use crate::common::types::{normalize_angle, Point2D, Pose2D};

/// Ordered sequence of path segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn append_line(&mut self, start: Point2D, end: Point2D, profile: SpeedProfile) {
        self.push(PathSegment::Line { start, end, profile });
    }

    pub fn append_arc(
        &mut self,
        center: Point2D,
        radius: f64,
        start_rad: f64,
        sweep_rad: f64,
        profile: SpeedProfile,
    ) {
        self.push(PathSegment::Arc {
            center,
            radius,
            start_rad,
            sweep_rad,
            profile,
        });
    }

    pub fn append_point_turn(
        &mut self,
        position: Point2D,
        start_angle: f64,
        target_angle: f64,
        profile: SpeedProfile,
    ) {
        self.push(PathSegment::PointTurn {
            position,
            start_angle,
            target_angle,
            profile,
        });
    }

    /// Remove the last `n` segments. Returns false (and leaves the path
    /// untouched) if there are fewer than `n`.
    pub fn pop_back(&mut self, n: usize) -> bool {
        if n > self.segments.len() {
            return false;
        }
        self.segments.truncate(self.segments.len() - n);
        true
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn start_pose(&self) -> Option<Pose2D> {
        self.segments.first().map(|s| s.start_pose())
    }

    pub fn end_pose(&self) -> Option<Pose2D> {
        self.segments.last().map(|s| s.end_pose())
    }

    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length()).sum()
    }

    /// True if every segment starts where the previous one ended, within
    /// `position_tol` mm and `angle_tol` rad.
    pub fn check_continuity(&self, position_tol: f64, angle_tol: f64) -> bool {
        self.segments.iter().tuple_windows().all(|(a, b)| {
            let end = a.end_pose();
            let start = b.start_pose();
            end.distance(&start) <= position_tol
                && normalize_angle(end.yaw - start.yaw).abs() <= angle_tol
        })
    }
}
