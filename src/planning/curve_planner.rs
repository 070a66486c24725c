//! Single-shot curve planner
//!
//! Connects start and goal with one bounded-curvature curve. No obstacle
//! checking and no memory between calls.

use log::{debug, warn};

use crate::common::traits::{CurveGenerator, PathPlanner, PlanOutcome, PlanStatus};
use crate::common::types::Pose3D;
use crate::config::CurvePlannerConfig;
use crate::path::{DubinsCurveGenerator, SpeedProfile};

pub struct CurvePlanner<G: CurveGenerator = DubinsCurveGenerator> {
    config: CurvePlannerConfig,
    generator: G,
}

impl CurvePlanner<DubinsCurveGenerator> {
    pub fn new(config: CurvePlannerConfig) -> Self {
        Self::with_generator(config, DubinsCurveGenerator::new())
    }

    pub fn with_defaults() -> Self {
        Self::new(CurvePlannerConfig::default())
    }
}

impl<G: CurveGenerator> CurvePlanner<G> {
    pub fn with_generator(config: CurvePlannerConfig, generator: G) -> Self {
        Self { config, generator }
    }

    /// Turn radii at (start, goal) for a given start-goal separation
    pub fn radii(&self, distance: f64) -> (f64, f64) {
        let r = distance * self.config.radius_distance_ratio;
        (r.min(self.config.max_start_radius_mm), r.min(self.config.max_end_radius_mm))
    }

    /// Planning only reads `self`, so a shared planner can serve several callers.
    pub fn compute(&self, start: &Pose3D, goal: &Pose3D) -> PlanOutcome {
        let start = match start.to_pose2d() {
            Ok(p) => p,
            Err(e) => {
                warn!("curve planner start rejected: {}", e);
                return PlanOutcome::status(PlanStatus::NeededButStartFailure);
            }
        };
        let goal = match goal.to_pose2d() {
            Ok(p) => p,
            Err(e) => {
                warn!("curve planner goal rejected: {}", e);
                return PlanOutcome::status(PlanStatus::NeededButGoalFailure);
            }
        };

        let (start_radius, end_radius) = self.radii(start.distance(&goal));
        let profile = SpeedProfile::new(self.config.target_speed_mm_s, self.config.accel, self.config.decel);

        match self.generator.generate_curve(&start, &goal, start_radius, end_radius, profile) {
            Some(path) => {
                debug!("curve with {} segments, {:.1} mm long", path.len(), path.total_length());
                PlanOutcome::planned(path)
            }
            None => {
                warn!(
                    "no curve from ({:.1}, {:.1}) to ({:.1}, {:.1}) with radii {:.1}/{:.1}",
                    start.x, start.y, goal.x, goal.y, start_radius, end_radius
                );
                PlanOutcome::status(PlanStatus::NeededButPlanFailure)
            }
        }
    }
}

impl<G: CurveGenerator> PathPlanner for CurvePlanner<G> {
    fn plan(&mut self, start: &Pose3D, goal: &Pose3D) -> PlanOutcome {
        self.compute(start, goal)
    }
}
