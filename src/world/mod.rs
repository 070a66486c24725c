//! In-memory world model and robot footprint

pub mod footprint;

pub use footprint::RectangularFootprint;

use std::collections::BTreeMap;

use crate::common::geometry::ConvexPolygon;
use crate::common::traits::{ObjectId, WorldModel};

/// Known obstacles with a change flag.
///
/// The flag is raised by every modification and lowered by
/// `clear_changed`, which the owner calls once per control tick after
/// planning.
#[derive(Debug, Clone, Default)]
pub struct ObstacleWorld {
    obstacles: BTreeMap<ObjectId, ConvexPolygon>,
    next_id: u32,
    changed: bool,
}

impl ObstacleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_obstacle(&mut self, footprint: ConvexPolygon) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.obstacles.insert(id, footprint);
        self.changed = true;
        id
    }

    /// Replace the footprint of an existing obstacle. Returns false for unknown ids.
    pub fn move_obstacle(&mut self, id: ObjectId, footprint: ConvexPolygon) -> bool {
        match self.obstacles.get_mut(&id) {
            Some(existing) => {
                *existing = footprint;
                self.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn remove_obstacle(&mut self, id: ObjectId) -> Option<ConvexPolygon> {
        let removed = self.obstacles.remove(&id);
        if removed.is_some() {
            self.changed = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.obstacles.is_empty() {
            self.changed = true;
        }
        self.obstacles.clear();
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}

impl WorldModel for ObstacleWorld {
    fn obstacles(&self, padding: f64) -> Vec<(ConvexPolygon, ObjectId)> {
        self.obstacles
            .iter()
            .map(|(id, polygon)| (polygon.inflated(padding), *id))
            .collect()
    }

    fn did_objects_change(&self) -> bool {
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Point2D, Pose2D};

    fn block(x: f64, y: f64) -> ConvexPolygon {
        ConvexPolygon::from_rect(&Pose2D::new(x, y, 0.0), 20.0, 20.0)
    }

    #[test]
    fn test_change_tracking() {
        let mut world = ObstacleWorld::new();
        assert!(!world.did_objects_change());
        let id = world.add_obstacle(block(0.0, 0.0));
        assert!(world.did_objects_change());
        world.clear_changed();
        assert!(!world.did_objects_change());

        assert!(world.move_obstacle(id, block(50.0, 0.0)));
        assert!(world.did_objects_change());
        world.clear_changed();

        assert!(!world.move_obstacle(ObjectId(99), block(0.0, 0.0)));
        assert!(world.remove_obstacle(ObjectId(99)).is_none());
        assert!(!world.did_objects_change());

        assert!(world.remove_obstacle(id).is_some());
        assert!(world.did_objects_change());
        assert!(world.is_empty());
    }

    #[test]
    fn test_obstacles_are_padded() {
        let mut world = ObstacleWorld::new();
        let id = world.add_obstacle(block(0.0, 0.0));
        let obstacles = world.obstacles(5.0);
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].1, id);
        assert!(obstacles[0].0.contains(&Point2D::new(14.5, 0.0)));
        assert!(!world.obstacles(0.0)[0].0.contains(&Point2D::new(14.5, 0.0)));
    }
}
