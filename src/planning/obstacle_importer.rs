//! Copies world obstacles into the lattice environment as per-heading
//! configuration-space obstacles

use log::debug;

use crate::common::traits::{RobotGeometry, WorldModel};
use crate::common::types::Pose2D;
use crate::config::LatticePlannerConfig;
use crate::lattice::LatticeEnvironment;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportReport {
    /// Nothing was imported because the world did not change
    pub skipped: bool,
    pub robot_padding: f64,
    pub obstacle_padding: f64,
    /// Configuration-space obstacles registered across all headings
    pub obstacles_added: usize,
}

#[derive(Debug, Clone)]
pub struct ObstacleImporter {
    robot_padding: f64,
    obstacle_padding: f64,
    replan_padding_subtract: f64,
    penalty: f64,
}

impl ObstacleImporter {
    pub fn new(config: &LatticePlannerConfig) -> Self {
        Self {
            robot_padding: config.robot_padding_mm,
            obstacle_padding: config.obstacle_padding_mm,
            replan_padding_subtract: config.replan_padding_subtract_mm,
            penalty: config.obstacle_penalty_s_per_mm,
        }
    }

    /// Paddings for (robot, obstacles)
    pub fn paddings(&self, is_replanning: bool) -> (f64, f64) {
        if is_replanning {
            (
                self.robot_padding - self.replan_padding_subtract,
                self.obstacle_padding - self.replan_padding_subtract,
            )
        } else {
            (self.robot_padding, self.obstacle_padding)
        }
    }

    /// Rebuild the environment's obstacles from `world`.
    ///
    /// While replanning, reduced paddings are used and the import is
    /// skipped entirely if the world reports no change. A fresh import
    /// always runs with full paddings.
    pub fn import<E, W, R>(&self, env: &mut E, world: &W, robot: &R, is_replanning: bool) -> ImportReport
    where
        E: LatticeEnvironment + ?Sized,
        W: WorldModel + ?Sized,
        R: RobotGeometry + ?Sized,
    {
        let (robot_padding, obstacle_padding) = self.paddings(is_replanning);

        if is_replanning && !world.did_objects_change() {
            debug!("world unchanged, keeping {} imported obstacles", env.num_obstacles());
            return ImportReport {
                skipped: true,
                robot_padding,
                obstacle_padding,
                obstacles_added: 0,
            };
        }

        // single snapshot for the whole import
        let obstacles = world.obstacles(obstacle_padding);

        env.clear_obstacles();
        let mut added = 0;
        for theta in 0..env.num_angles() as u8 {
            let drive_center = Pose2D::new(0.0, 0.0, env.theta_angle(theta));
            let origin = robot.compute_origin_pose(&drive_center);
            let footprint = robot.bounding_footprint(&origin, robot_padding);
            for (obstacle, _) in &obstacles {
                env.add_obstacle_with_expansion(obstacle, &footprint, theta, self.penalty);
                added += 1;
            }
        }

        debug!(
            "imported {} obstacles over {} headings (robot padding {:.1}, obstacle padding {:.1})",
            obstacles.len(),
            env.num_angles(),
            robot_padding,
            obstacle_padding
        );

        ImportReport {
            skipped: false,
            robot_padding,
            obstacle_padding,
            obstacles_added: added,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::ConvexPolygon;
    use crate::lattice::{XYThetaEnvironment, NUM_HEADINGS};
    use crate::world::{ObstacleWorld, RectangularFootprint};

    fn world_with_block() -> ObstacleWorld {
        let mut world = ObstacleWorld::new();
        world.add_obstacle(ConvexPolygon::from_rect(&Pose2D::new(200.0, 0.0, 0.0), 40.0, 40.0));
        world
    }

    #[test]
    fn test_fresh_import_uses_full_padding() {
        let importer = ObstacleImporter::new(&LatticePlannerConfig::default());
        let mut env = XYThetaEnvironment::with_defaults();
        let world = world_with_block();
        let report = importer.import(&mut env, &world, &RectangularFootprint::default(), false);
        assert!(!report.skipped);
        assert_eq!(report.robot_padding, 7.0);
        assert_eq!(report.obstacle_padding, 6.0);
        assert_eq!(report.obstacles_added, NUM_HEADINGS);
        assert_eq!(env.num_obstacles(), NUM_HEADINGS);
        assert!(env.collision_penalty(&Pose2D::new(200.0, 0.0, 0.0)) > 0.0);
    }

    #[test]
    fn test_replan_import_reduces_padding_and_skips_when_unchanged() {
        let importer = ObstacleImporter::new(&LatticePlannerConfig::default());
        let mut env = XYThetaEnvironment::with_defaults();
        let mut world = world_with_block();
        let robot = RectangularFootprint::default();

        let report = importer.import(&mut env, &world, &robot, true);
        assert!(!report.skipped);
        assert_eq!(report.robot_padding, 2.0);
        assert_eq!(report.obstacle_padding, 1.0);

        world.clear_changed();
        let report = importer.import(&mut env, &world, &robot, true);
        assert!(report.skipped);
        assert_eq!(env.num_obstacles(), NUM_HEADINGS);

        // a fresh import always runs
        assert!(!importer.import(&mut env, &world, &robot, false).skipped);
    }

    #[test]
    fn test_reduced_padding_shrinks_cspace() {
        let importer = ObstacleImporter::new(&LatticePlannerConfig::default());
        let world = world_with_block();
        let robot = RectangularFootprint::new(60.0, 40.0, 0.0);

        // obstacle edge at 180, robot half length 30: full padding blocks up to 180 - 30 - 7 - 6 = 137
        let probe = Pose2D::new(140.0, 0.0, 0.0);
        let mut full = XYThetaEnvironment::with_defaults();
        importer.import(&mut full, &world, &robot, false);
        assert!(full.collision_penalty(&probe) > 0.0);

        let mut reduced = XYThetaEnvironment::with_defaults();
        importer.import(&mut reduced, &world, &robot, true);
        assert_eq!(reduced.collision_penalty(&probe), 0.0);
    }
}
