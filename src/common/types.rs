//! Common pose types used throughout rust_navigation
//!
//! All planar quantities are in millimetres and radians.

use std::f64::consts::PI;

use nalgebra::{Unit, UnitQuaternion, Vector2, Vector3};

use crate::common::error::{PlannerError, PlannerResult};

/// Largest allowed `1 - |axis . z|` for a rotation to count as "about vertical"
/// (roughly 10 degrees of tilt).
pub const VERTICAL_AXIS_TOLERANCE: f64 = 0.0152;

/// Wrap an angle to [-pi, pi)
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = (angle + PI) % (2.0 * PI);
    if a < 0.0 {
        a += 2.0 * PI;
    }
    a - PI
}

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + heading)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Planar distance, heading ignored
    pub fn distance(&self, other: &Pose2D) -> f64 {
        self.position().distance(&other.position())
    }

    /// Map a point given in this pose's frame into the parent frame
    pub fn transform_point(&self, local: &Point2D) -> Point2D {
        let (s, c) = self.yaw.sin_cos();
        Point2D::new(
            self.x + c * local.x - s * local.y,
            self.y + s * local.x + c * local.y,
        )
    }

    /// Normalize yaw to [-pi, pi)
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }
}

/// Full 3D pose as reported by the robot's localization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3D {
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Pose3D {
    pub fn new(translation: Vector3<f64>, axis: Vector3<f64>, angle: f64) -> Self {
        let rotation = if axis.norm() > 0.0 {
            UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), angle)
        } else {
            UnitQuaternion::identity()
        };
        Self { translation, rotation }
    }

    /// Pose on the ground plane rotated about +z
    pub fn from_xy_heading(x: f64, y: f64, heading: f64) -> Self {
        Self::new(Vector3::new(x, y, 0.0), Vector3::z(), heading)
    }

    /// Euclidean distance between translations
    pub fn distance(&self, other: &Pose3D) -> f64 {
        (self.translation - other.translation).norm()
    }

    /// Project onto the ground plane.
    ///
    /// The rotation axis must lie within the vertical tolerance of +z or -z,
    /// otherwise the pose is rejected rather than truncated.
    pub fn to_pose2d(&self) -> PlannerResult<Pose2D> {
        let heading = match self.rotation.axis_angle() {
            None => 0.0,
            Some((axis, angle)) => {
                if 1.0 - axis.z.abs() > VERTICAL_AXIS_TOLERANCE {
                    return Err(PlannerError::NonVerticalRotation { axis_z: axis.z });
                }
                angle * axis.z.signum()
            }
        };
        Ok(Pose2D::new(
            self.translation.x,
            self.translation.y,
            normalize_angle(heading),
        ))
    }
}

impl From<Pose2D> for Pose3D {
    fn from(p: Pose2D) -> Self {
        Pose3D::from_xy_heading(p.x, p.y, p.yaw)
    }
}
