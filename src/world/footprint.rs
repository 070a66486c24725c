//! Rectangular robot body

use crate::common::geometry::ConvexPolygon;
use crate::common::traits::RobotGeometry;
use crate::common::types::{Point2D, Pose2D};

/// Rectangle whose center sits `origin_offset` mm ahead of the drive center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangularFootprint {
    pub length: f64,
    pub width: f64,
    pub origin_offset: f64,
}

impl RectangularFootprint {
    pub fn new(length: f64, width: f64, origin_offset: f64) -> Self {
        Self { length, width, origin_offset }
    }
}

impl Default for RectangularFootprint {
    fn default() -> Self {
        Self::new(60.0, 45.0, 10.0)
    }
}

impl RobotGeometry for RectangularFootprint {
    fn compute_origin_pose(&self, drive_center: &Pose2D) -> Pose2D {
        let p = drive_center.transform_point(&Point2D::new(self.origin_offset, 0.0));
        Pose2D::new(p.x, p.y, drive_center.yaw)
    }

    fn bounding_footprint(&self, origin: &Pose2D, padding: f64) -> ConvexPolygon {
        ConvexPolygon::from_rect(origin, self.length + 2.0 * padding, self.width + 2.0 * padding)
    }
}
