//! Convex polygon helpers for footprints and configuration-space obstacles

use std::f64::consts::PI;

use itertools::Itertools;

use crate::common::types::{Point2D, Pose2D};

const EPS: f64 = 1e-9;

fn cross(o: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point2D,
    pub max: Point2D,
}

impl Aabb {
    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x - EPS
            && p.x <= self.max.x + EPS
            && p.y >= self.min.y - EPS
            && p.y <= self.max.y + EPS
    }
}

/// Convex polygon with counter-clockwise vertices
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<Point2D>,
}

impl ConvexPolygon {
    /// Build the convex hull of an arbitrary point set (Andrew's monotone chain)
    pub fn from_points(points: &[Point2D]) -> Self {
        let mut pts: Vec<Point2D> = points.to_vec();
        pts.sort_by(|a, b| {
            a.x.partial_cmp(&b.x)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
        });
        pts.dedup_by(|a, b| (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS);

        if pts.len() < 3 {
            return Self { vertices: pts };
        }

        let mut lower: Vec<Point2D> = Vec::with_capacity(pts.len());
        for p in &pts {
            while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= EPS {
                lower.pop();
            }
            lower.push(*p);
        }
        let mut upper: Vec<Point2D> = Vec::with_capacity(pts.len());
        for p in pts.iter().rev() {
            while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= EPS {
                upper.pop();
            }
            upper.push(*p);
        }
        lower.pop();
        upper.pop();
        lower.extend(upper);
        Self { vertices: lower }
    }

    /// Rectangle of the given size centred on `center`, long side along its heading
    pub fn from_rect(center: &Pose2D, length: f64, width: f64) -> Self {
        let hl = length / 2.0;
        let hw = width / 2.0;
        let corners = [(hl, hw), (-hl, hw), (-hl, -hw), (hl, -hw)]
            .iter()
            .map(|&(x, y)| center.transform_point(&Point2D::new(x, y)))
            .collect_vec();
        Self::from_points(&corners)
    }

    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Point-in-polygon, boundary inclusive
    pub fn contains(&self, p: &Point2D) -> bool {
        match self.vertices.len() {
            0 => false,
            1 => self.vertices[0].distance(p) < EPS,
            2 => {
                let (a, b) = (&self.vertices[0], &self.vertices[1]);
                cross(a, b, p).abs() < EPS
                    && p.x >= a.x.min(b.x) - EPS
                    && p.x <= a.x.max(b.x) + EPS
                    && p.y >= a.y.min(b.y) - EPS
                    && p.y <= a.y.max(b.y) + EPS
            }
            _ => self
                .vertices
                .iter()
                .circular_tuple_windows()
                .all(|(a, b)| cross(a, b, p) >= -EPS),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        let mut min = Point2D::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2D::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        Aabb { min, max }
    }

    /// Configuration-space obstacle: the set of robot origins `q` for which
    /// `robot` translated by `q` overlaps `self`.
    ///
    /// `robot` must be expressed relative to the reference point being planned for.
    pub fn minkowski_difference(&self, robot: &ConvexPolygon) -> ConvexPolygon {
        let points = self
            .vertices
            .iter()
            .cartesian_product(robot.vertices.iter())
            .map(|(o, r)| Point2D::new(o.x - r.x, o.y - r.y))
            .collect_vec();
        Self::from_points(&points)
    }

    /// Grow the polygon outward by `padding` (octagonal approximation of a
    /// round offset, never smaller than the true offset).
    pub fn inflated(&self, padding: f64) -> ConvexPolygon {
        if padding <= 0.0 {
            return self.clone();
        }
        let r = padding / (PI / 8.0).cos();
        let points = self
            .vertices
            .iter()
            .flat_map(|v| {
                (0..8).map(move |k| {
                    let a = PI / 8.0 + k as f64 * PI / 4.0;
                    Point2D::new(v.x + r * a.cos(), v.y + r * a.sin())
                })
            })
            .collect_vec();
        Self::from_points(&points)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> ConvexPolygon {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| Point2D::new(v.x + dx, v.y + dy))
                .collect(),
        }
    }
}
