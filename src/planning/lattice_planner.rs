//! Lattice replanning planner
//!
//! Keeps the last discrete plan and, on every control tick, decides whether
//! it can still be followed. When it cannot, the safe part ahead of the
//! robot is kept and only the rest is searched again, so the robot never
//! has to stop while a new plan is computed.
//!
//! # Example
//!
//! ```no_run
//! use rust_navigation::common::{PathPlanner, PlanStatus, Pose3D};
//! use rust_navigation::config::PlannerConfig;
//! use rust_navigation::planning::LatticePlanner;
//! use rust_navigation::world::{ObstacleWorld, RectangularFootprint};
//!
//! let config = PlannerConfig::default();
//! let mut planner =
//!     LatticePlanner::from_config(&config, ObstacleWorld::new(), RectangularFootprint::default()).unwrap();
//!
//! let start = Pose3D::from_xy_heading(0.0, 0.0, 0.0);
//! let goal = Pose3D::from_xy_heading(500.0, 200.0, 1.57);
//! let outcome = planner.plan(&start, &goal);
//! assert_eq!(outcome.status, PlanStatus::DidPlan);
//!
//! // every tick afterwards
//! let outcome = planner.replan(&start, false);
//! ```

use log::{debug, error, info, warn};

use crate::common::error::PlannerResult;
use crate::common::traits::{
    MultiGoalOutcome, PathPlanner, PlanOutcome, PlanStatus, RobotGeometry, WorldModel,
};
use crate::common::types::{Pose2D, Pose3D};
use crate::config::{LatticePlannerConfig, PlannerConfig};
use crate::lattice::{LatticeEnvironment, LatticePlan, SearchBackend, XYThetaPlanner};
use crate::path::Path;
use crate::planning::goal_selection::select_goal;
use crate::planning::observer::PlannerObserver;
use crate::planning::obstacle_importer::{ImportReport, ObstacleImporter};
use crate::planning::path_finalizer::PathFinalizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    /// No goal has been accepted
    NoGoal,
    /// The cached plan reaches the goal
    Planned,
    /// A goal is set but the cached plan is missing or incomplete
    Replanning,
}

/// Plan memory between ticks.
///
/// `original_goal` is written only when a goal is set and read only by the
/// finalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedPlan {
    pub plan: LatticePlan,
    pub path: Path,
    pub original_goal: Option<Pose2D>,
}

impl CachedPlan {
    fn clear(&mut self) {
        self.plan.clear();
        self.path.clear();
        self.original_goal = None;
    }

    fn clear_plan(&mut self) {
        self.plan.clear();
        self.path.clear();
    }
}

pub struct LatticePlanner<W, R, B = XYThetaPlanner>
where
    W: WorldModel,
    R: RobotGeometry,
    B: SearchBackend,
{
    config: LatticePlannerConfig,
    backend: B,
    world: W,
    robot: R,
    importer: ObstacleImporter,
    finalizer: PathFinalizer,
    cache: CachedPlan,
    state: PlannerState,
    observer: Option<Box<dyn PlannerObserver + Send>>,
}

impl<W: WorldModel, R: RobotGeometry> LatticePlanner<W, R, XYThetaPlanner> {
    /// Planner with the built-in xytheta search backend
    pub fn from_config(config: &PlannerConfig, world: W, robot: R) -> PlannerResult<Self> {
        config.environment.validate()?;
        let backend = XYThetaPlanner::with_config(config.environment.clone());
        Self::new(config.lattice.clone(), backend, world, robot)
    }
}

impl<W, R, B> LatticePlanner<W, R, B>
where
    W: WorldModel,
    R: RobotGeometry,
    B: SearchBackend,
{
    pub fn new(config: LatticePlannerConfig, mut backend: B, world: W, robot: R) -> PlannerResult<Self> {
        config.validate()?;
        backend.allow_free_turn_in_place_at_goal(config.allow_free_turn_in_place_at_goal);
        Ok(Self {
            importer: ObstacleImporter::new(&config),
            finalizer: PathFinalizer::new(&config),
            config,
            backend,
            world,
            robot,
            cache: CachedPlan::default(),
            state: PlannerState::NoGoal,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn PlannerObserver + Send>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn cached_plan(&self) -> &CachedPlan {
        &self.cache
    }

    pub fn original_goal(&self) -> Option<Pose2D> {
        self.cache.original_goal
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &LatticePlannerConfig {
        &self.config
    }

    fn import_obstacles(&mut self, is_replanning: bool) -> ImportReport {
        let report = self
            .importer
            .import(self.backend.env_mut(), &self.world, &self.robot, is_replanning);
        if let Some(observer) = self.observer.as_mut() {
            observer.obstacles_imported(&report);
        }
        report
    }

    fn finalize(&self, path: &mut Path) {
        match self.cache.original_goal {
            Some(goal) => {
                self.finalizer.finalize(path, goal.yaw);
            }
            None => warn!("finalizing a path without a goal heading"),
        }
    }

    /// Drop everything and plan from `start` to `goal` from scratch
    pub fn set_goal(&mut self, start: &Pose3D, goal: &Pose3D) -> PlanOutcome {
        self.cache.clear();
        self.state = PlannerState::NoGoal;

        let goal = match goal.to_pose2d() {
            Ok(goal) => goal,
            Err(e) => {
                warn!("goal rejected: {}", e);
                return PlanOutcome::status(PlanStatus::NeededButGoalFailure);
            }
        };

        self.import_obstacles(false);
        if !self.backend.set_goal(&goal) {
            info!("goal ({:.1}, {:.1}, {:.3}) is not reachable", goal.x, goal.y, goal.yaw);
            return PlanOutcome::status(PlanStatus::NeededButGoalFailure);
        }

        self.cache.original_goal = Some(goal);
        self.state = PlannerState::Replanning;
        self.replan(start, true)
    }

    fn replan_from(&mut self, start: Pose2D, force_replan_from_scratch: bool) -> PlanOutcome {
        self.import_obstacles(!force_replan_from_scratch);

        let mut prefix = LatticePlan::new(self.backend.env().pose_to_state(&start));
        let mut last_safe_state = start;

        if !force_replan_from_scratch && !self.cache.plan.is_empty() {
            let env = self.backend.env();
            let (index, offset) = env.find_closest_plan_segment(&self.cache.plan, &start);
            if offset >= self.config.plan_error_for_replan_mm {
                info!(
                    "robot is {:.1} mm from the plan (closest action {}), dropping the plan",
                    offset, index
                );
                self.cache.clear_plan();
                self.state = PlannerState::Replanning;
                return PlanOutcome::status(PlanStatus::NeededButPlanFailure);
            }

            let safety = env.plan_is_safe(&self.cache.plan, self.config.max_distance_to_follow_old_plan_mm, index);
            if safety.is_safe && self.state == PlannerState::Planned {
                return PlanOutcome::status(PlanStatus::NotNeeded);
            }
            if safety.is_safe {
                // kept prefix of a failed search: safe, but it stops short of the goal
                info!(
                    "cached plan does not reach the goal, searching on from action {} with {} actions kept",
                    index,
                    safety.valid_prefix.len()
                );
            } else {
                info!(
                    "old plan unsafe, replanning from action {} and keeping {} actions",
                    index,
                    safety.valid_prefix.len()
                );
            }
            prefix = safety.valid_prefix;
            last_safe_state = safety.last_safe_state;
        }

        if prefix.is_empty() {
            last_safe_state = start;
        }

        self.cache.plan = prefix;
        self.cache.path.clear();

        if !self.backend.set_start(&last_safe_state) {
            self.state = PlannerState::Replanning;
            return PlanOutcome::status(PlanStatus::NeededButStartFailure);
        }
        if !self.backend.goal_is_valid() {
            info!("goal may have moved into collision");
            self.state = PlannerState::Replanning;
            return PlanOutcome::status(PlanStatus::NeededButGoalFailure);
        }

        self.import_obstacles(false);
        if force_replan_from_scratch {
            self.backend.set_replan_from_scratch();
        }

        debug!(
            "searching from ({:.1}, {:.1}, {:.3})",
            last_safe_state.x, last_safe_state.y, last_safe_state.yaw
        );
        self.backend.env_mut().prepare_for_planning();
        if !self.backend.replan(self.config.max_expansions) {
            warn!("search failed, keeping {} safe actions", self.cache.plan.len());
            self.state = PlannerState::Replanning;
            let env = self.backend.env();
            env.append_to_path(&self.cache.plan, &mut self.cache.path, 0);
            let path = (!self.cache.path.is_empty()).then(|| self.cache.path.clone());
            return PlanOutcome {
                status: PlanStatus::NeededButPlanFailure,
                path,
            };
        }

        let extension = self.backend.plan().clone();
        let env = self.backend.env();
        if !self.cache.plan.is_empty() {
            let prefix_end = env.plan_final_state(&self.cache.plan);
            if prefix_end != extension.start {
                error!(
                    "kept plan ends at {:?} but the new plan starts at {:?}",
                    prefix_end, extension.start
                );
                debug_assert_eq!(prefix_end, extension.start, "plan prefix and extension do not connect");
            }
        }
        self.cache.plan.append(&extension);

        let mut path = Path::new();
        env.append_to_path(&self.cache.plan, &mut path, 0);
        self.finalize(&mut path);
        self.cache.path = path;
        self.state = PlannerState::Planned;

        info!(
            "planned {} actions ({} segments, {:.1} mm)",
            self.cache.plan.len(),
            self.cache.path.len(),
            self.cache.path.total_length()
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.path_computed(&self.cache.path);
        }
        PlanOutcome::planned(self.cache.path.clone())
    }

    /// Path still to drive from `current`, with actions the robot already
    /// passed removed. Returns `None` (and drops the plan) if the robot has
    /// strayed from it.
    pub fn complete_path(&mut self, current: &Pose3D) -> Option<Path> {
        let current = current.to_pose2d().ok()?;
        if self.cache.plan.is_empty() {
            return None;
        }
        let env = self.backend.env();
        let (index, offset) = env.find_closest_plan_segment(&self.cache.plan, &current);
        if offset >= self.config.plan_error_for_replan_mm {
            info!("robot is {:.1} mm from the plan, dropping it", offset);
            self.cache.clear_plan();
            self.state = PlannerState::Replanning;
            return None;
        }

        let mut path = Path::new();
        env.append_to_path(&self.cache.plan, &mut path, index);
        self.finalize(&mut path);
        Some(path)
    }
}

impl<W, R, B> PathPlanner for LatticePlanner<W, R, B>
where
    W: WorldModel,
    R: RobotGeometry,
    B: SearchBackend,
{
    fn plan(&mut self, start: &Pose3D, goal: &Pose3D) -> PlanOutcome {
        self.set_goal(start, goal)
    }

    fn replan(&mut self, start: &Pose3D, force_replan_from_scratch: bool) -> PlanOutcome {
        if self.state == PlannerState::NoGoal {
            return PlanOutcome::status(PlanStatus::NeededButGoalFailure);
        }
        match start.to_pose2d() {
            Ok(start) => self.replan_from(start, force_replan_from_scratch),
            Err(e) => {
                warn!("start rejected: {}", e);
                PlanOutcome::status(PlanStatus::NeededButStartFailure)
            }
        }
    }

    fn plan_to_any(&mut self, start: &Pose3D, goals: &[Pose3D]) -> MultiGoalOutcome {
        let start_2d = match start.to_pose2d() {
            Ok(p) => p,
            Err(e) => {
                warn!("start rejected: {}", e);
                return MultiGoalOutcome {
                    outcome: PlanOutcome::status(PlanStatus::NeededButStartFailure),
                    selected: None,
                };
            }
        };

        self.import_obstacles(false);
        let candidates: Vec<Option<Pose2D>> = goals.iter().map(|g| g.to_pose2d().ok()).collect();
        let thresholds = [self.config.soft_collision_threshold, self.config.hard_collision_threshold];

        match select_goal(self.backend.env(), &start_2d, &candidates, &thresholds) {
            Some(i) => MultiGoalOutcome {
                outcome: self.set_goal(start, &goals[i]),
                selected: Some(i),
            },
            None => MultiGoalOutcome {
                outcome: PlanOutcome::status(PlanStatus::NeededButGoalFailure),
                selected: None,
            },
        }
    }

    fn test_path(&mut self, start: &Pose3D) -> Path {
        let mut path = Path::new();
        if let Ok(start) = start.to_pose2d() {
            let plan = self.backend.test_plan(&start);
            self.backend.env().append_to_path(&plan, &mut path, 0);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::ConvexPolygon;
    use crate::common::traits::ObjectId;
    use crate::lattice::GraphState;
    use crate::world::{ObstacleWorld, RectangularFootprint};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::PI;
    use std::sync::{Arc, Mutex};

    type Planner = LatticePlanner<ObstacleWorld, RectangularFootprint>;

    fn config() -> PlannerConfig {
        let mut config = PlannerConfig::default();
        config.lattice.max_expansions = 300_000;
        config
    }

    fn planner_with(config: &PlannerConfig) -> Planner {
        let _ = env_logger::builder().is_test(true).try_init();
        LatticePlanner::from_config(config, ObstacleWorld::new(), RectangularFootprint::new(40.0, 30.0, 0.0)).unwrap()
    }

    fn planner() -> Planner {
        planner_with(&config())
    }

    fn pose(x: f64, y: f64, deg: f64) -> Pose3D {
        Pose3D::from_xy_heading(x, y, deg.to_radians())
    }

    fn block(x: f64, y: f64, size: f64) -> ConvexPolygon {
        ConvexPolygon::from_rect(&Pose2D::new(x, y, 0.0), size, size)
    }

    fn tilted() -> Pose3D {
        Pose3D::new(Vector3::zeros(), Vector3::new(0.0, 1.0, 0.5), 0.3)
    }

    fn plan_state_at(planner: &Planner, n: usize) -> GraphState {
        let plan = &planner.cached_plan().plan;
        let mut prefix = LatticePlan::new(plan.start);
        for &(a, p) in &plan.actions()[..n] {
            prefix.push(a, p);
        }
        planner.backend().env().plan_final_state(&prefix)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.lattice.replan_padding_subtract_mm = 10.0;
        let result = LatticePlanner::from_config(&config, ObstacleWorld::new(), RectangularFootprint::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_straight_to_goal() {
        let mut planner = planner();
        let outcome = planner.plan(&pose(0.0, 0.0, 0.0), &pose(300.0, 0.0, 0.0));
        assert_eq!(outcome.status, PlanStatus::DidPlan);
        assert_eq!(planner.state(), PlannerState::Planned);
        let path = outcome.path.unwrap();
        let end = path.end_pose().unwrap();
        assert_relative_eq!(end.x, 300.0, epsilon = 1e-6);
        assert_relative_eq!(end.y, 0.0, epsilon = 1e-6);
        assert!(path.check_continuity(1e-6, 1e-6));
        assert_eq!(planner.original_goal(), Some(Pose2D::new(300.0, 0.0, 0.0)));
    }

    #[test]
    fn test_goal_heading_corrected_exactly() {
        let mut planner = planner();
        let goal_heading = 95.0_f64.to_radians();
        let outcome = planner.plan(&pose(0.0, 0.0, 0.0), &pose(200.0, 100.0, 95.0));
        assert_eq!(outcome.status, PlanStatus::DidPlan);
        let path = outcome.path.unwrap();
        let end = path.end_pose().unwrap();
        assert_relative_eq!(end.yaw, goal_heading, epsilon = 1e-9);
        assert!(path.last().unwrap().is_point_turn());
        let turns_at_end = path.segments().iter().rev().take_while(|s| s.is_point_turn()).count();
        assert_eq!(turns_at_end, 1);
    }

    #[test]
    fn test_replan_idempotent_when_nothing_changed() {
        let mut planner = planner();
        planner.world_mut().add_obstacle(block(150.0, 120.0, 40.0));
        let start = pose(0.0, 0.0, 0.0);
        assert_eq!(planner.plan(&start, &pose(400.0, 0.0, 0.0)).status, PlanStatus::DidPlan);
        planner.world_mut().clear_changed();

        let before = planner.cached_plan().clone();
        let first = planner.replan(&start, false);
        assert_eq!(first.status, PlanStatus::NotNeeded);
        assert!(first.path.is_none());
        assert_eq!(planner.cached_plan(), &before);

        let second = planner.replan(&start, false);
        assert_eq!(second.status, PlanStatus::NotNeeded);
        assert_eq!(planner.cached_plan(), &before);
    }

    #[test]
    fn test_replan_not_needed_halfway_along_plan() {
        let mut planner = planner();
        assert_eq!(
            planner.plan(&pose(0.0, 0.0, 0.0), &pose(400.0, 0.0, 0.0)).status,
            PlanStatus::DidPlan
        );
        let half = plan_state_at(&planner, planner.cached_plan().plan.len() / 2);
        let robot = planner.backend().env().state_to_pose(&half);
        let outcome = planner.replan(&Pose3D::from(robot), false);
        assert_eq!(outcome.status, PlanStatus::NotNeeded);
    }

    #[test]
    fn test_divergence_clears_cache() {
        let mut planner = planner();
        assert_eq!(
            planner.plan(&pose(0.0, 0.0, 0.0), &pose(400.0, 0.0, 0.0)).status,
            PlanStatus::DidPlan
        );
        let outcome = planner.replan(&pose(200.0, 25.0, 0.0), false);
        assert_eq!(outcome.status, PlanStatus::NeededButPlanFailure);
        assert!(outcome.path.is_none());
        assert!(planner.cached_plan().plan.is_empty());
        assert!(planner.cached_plan().path.is_empty());
        assert_eq!(planner.state(), PlannerState::Replanning);

        // the goal is kept, so the next tick plans again from where the robot is
        let outcome = planner.replan(&pose(200.0, 25.0, 0.0), false);
        assert_eq!(outcome.status, PlanStatus::DidPlan);
        let end = outcome.path.unwrap().end_pose().unwrap();
        assert_relative_eq!(end.x, 400.0, epsilon = 1e-6);
    }

    #[test]
    fn test_goal_inside_lethal_obstacle() {
        let mut config = config();
        config.lattice.obstacle_penalty_s_per_mm = 1000.0;
        let mut planner = planner_with(&config);
        planner.world_mut().add_obstacle(block(300.0, 0.0, 60.0));
        let outcome = planner.plan(&pose(0.0, 0.0, 0.0), &pose(300.0, 0.0, 0.0));
        assert_eq!(outcome.status, PlanStatus::NeededButGoalFailure);
        assert!(outcome.path.is_none());
        assert_eq!(planner.state(), PlannerState::NoGoal);
        assert_eq!(planner.replan(&pose(0.0, 0.0, 0.0), false).status, PlanStatus::NeededButGoalFailure);
    }

    #[test]
    fn test_non_vertical_poses() {
        let mut planner = planner();
        assert_eq!(
            planner.plan(&pose(0.0, 0.0, 0.0), &tilted()).status,
            PlanStatus::NeededButGoalFailure
        );
        assert_eq!(
            planner.plan(&tilted(), &pose(100.0, 0.0, 0.0)).status,
            PlanStatus::NeededButStartFailure
        );
        assert_eq!(planner.replan(&tilted(), false).status, PlanStatus::NeededButStartFailure);
    }

    #[test]
    fn test_new_obstacle_triggers_partial_replan() {
        let mut config = config();
        config.lattice.obstacle_penalty_s_per_mm = 1000.0;
        let mut planner = planner_with(&config);
        let start = pose(0.0, 0.0, 0.0);
        assert_eq!(planner.plan(&start, &pose(500.0, 0.0, 0.0)).status, PlanStatus::DidPlan);
        planner.world_mut().clear_changed();
        let old_plan = planner.cached_plan().plan.clone();

        planner.world_mut().add_obstacle(block(250.0, 0.0, 40.0));
        let outcome = planner.replan(&start, false);
        assert_eq!(outcome.status, PlanStatus::DidPlan);
        let path = outcome.path.unwrap();
        assert!(path.check_continuity(1e-6, 1e-6));
        let end = path.end_pose().unwrap();
        assert_relative_eq!(end.x, 500.0, epsilon = 1e-6);
        assert_relative_eq!(end.y, 0.0, epsilon = 1e-6);

        // the first actions, within the lookahead, were kept as they were
        let new_plan = &planner.cached_plan().plan;
        assert_eq!(new_plan.start, old_plan.start);
        assert_eq!(new_plan.action(0), old_plan.action(0));
        assert_ne!(new_plan, &old_plan);

        // and the new plan is clear of the obstacle under full padding
        let env = planner.backend().env();
        assert!(env.plan_is_safe(new_plan, f64::INFINITY, 0).is_safe);
        let blocked = env.pose_to_state(&Pose2D::new(250.0, 0.0, 0.0));
        let mut curr = new_plan.start;
        for &(action, _) in new_plan.actions() {
            curr = env.apply_action(&curr, action, false).unwrap().0;
            assert_ne!((curr.x, curr.y), (blocked.x, blocked.y));
        }
    }

    #[test]
    fn test_search_failure_keeps_safe_prefix() {
        let mut config = config();
        config.lattice.max_expansions = 200;
        config.lattice.max_distance_to_follow_old_plan_mm = 60.0;
        config.lattice.obstacle_penalty_s_per_mm = 1000.0;
        let mut planner = planner_with(&config);
        let start = pose(0.0, 0.0, 0.0);
        assert_eq!(planner.plan(&start, &pose(300.0, 0.0, 0.0)).status, PlanStatus::DidPlan);
        planner.world_mut().clear_changed();

        // a wall across the path forces a long detour the budget cannot cover
        planner.world_mut().add_obstacle(ConvexPolygon::from_rect(&Pose2D::new(180.0, 0.0, 0.0), 20.0, 600.0));
        let outcome = planner.replan(&start, false);
        assert_eq!(outcome.status, PlanStatus::NeededButPlanFailure);
        assert_eq!(planner.state(), PlannerState::Replanning);
        let kept = planner.cached_plan().plan.len();
        assert!(kept > 0);
        let path = outcome.path.unwrap();
        assert_relative_eq!(path.start_pose().unwrap().x, 0.0, epsilon = 1e-6);
        assert!(path.end_pose().unwrap().x <= 100.0);
    }

    #[test]
    fn test_kept_prefix_extended_once_path_clears() {
        let mut config = config();
        config.lattice.max_expansions = 200;
        config.lattice.max_distance_to_follow_old_plan_mm = 60.0;
        config.lattice.obstacle_penalty_s_per_mm = 1000.0;
        let mut planner = planner_with(&config);
        let start = pose(0.0, 0.0, 0.0);
        assert_eq!(planner.plan(&start, &pose(300.0, 0.0, 0.0)).status, PlanStatus::DidPlan);
        planner.world_mut().clear_changed();

        let wall = planner
            .world_mut()
            .add_obstacle(ConvexPolygon::from_rect(&Pose2D::new(180.0, 0.0, 0.0), 20.0, 600.0));
        assert_eq!(planner.replan(&start, false).status, PlanStatus::NeededButPlanFailure);
        planner.world_mut().clear_changed();

        // the kept prefix is safe but incomplete, so every tick searches again
        let outcome = planner.replan(&start, false);
        assert_eq!(outcome.status, PlanStatus::NeededButPlanFailure);
        assert_eq!(planner.state(), PlannerState::Replanning);

        assert!(planner.world_mut().remove_obstacle(wall).is_some());
        let outcome = planner.replan(&start, false);
        assert_eq!(outcome.status, PlanStatus::DidPlan);
        assert_eq!(planner.state(), PlannerState::Planned);
        let path = outcome.path.unwrap();
        assert!(path.check_continuity(1e-6, 1e-6));
        let end = path.end_pose().unwrap();
        assert_relative_eq!(end.x, 300.0, epsilon = 1e-6);
        assert_relative_eq!(end.y, 0.0, epsilon = 1e-6);

        planner.world_mut().clear_changed();
        assert_eq!(planner.replan(&start, false).status, PlanStatus::NotNeeded);
    }

    #[test]
    fn test_forced_replan_plans_again() {
        let mut planner = planner();
        let start = pose(0.0, 0.0, 0.0);
        assert_eq!(planner.plan(&start, &pose(200.0, 0.0, 0.0)).status, PlanStatus::DidPlan);
        let outcome = planner.replan(&start, true);
        assert_eq!(outcome.status, PlanStatus::DidPlan);
        assert!(outcome.path.is_some());
    }

    #[test]
    fn test_multi_goal_prefers_clear_candidate() {
        let mut planner = planner();
        planner.world_mut().add_obstacle(block(150.0, 0.0, 60.0));
        planner.world_mut().add_obstacle(block(0.0, 150.0, 60.0));
        let start = pose(0.0, 0.0, 0.0);
        let goals = vec![pose(150.0, 0.0, 0.0), pose(0.0, 150.0, 90.0), pose(-250.0, 0.0, 180.0)];
        let result = planner.plan_to_any(&start, &goals);
        assert_eq!(result.selected, Some(2));
        assert_eq!(result.outcome.status, PlanStatus::DidPlan);
        let goal = planner.original_goal().unwrap();
        assert_relative_eq!(goal.x, -250.0, epsilon = 1e-9);
        assert_relative_eq!(goal.yaw.cos(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_multi_goal_all_blocked() {
        let mut config = config();
        config.lattice.obstacle_penalty_s_per_mm = 1000.0;
        let mut planner = planner_with(&config);
        planner.world_mut().add_obstacle(block(150.0, 0.0, 60.0));
        let start = pose(0.0, 0.0, 0.0);
        let result = planner.plan_to_any(&start, &[pose(150.0, 0.0, 0.0), tilted()]);
        assert_eq!(result.selected, None);
        assert_eq!(result.outcome.status, PlanStatus::NeededButGoalFailure);
    }

    #[test]
    fn test_complete_path_skips_passed_actions() {
        let mut planner = planner();
        assert_eq!(
            planner.plan(&pose(0.0, 0.0, 0.0), &pose(400.0, 0.0, 45.0)).status,
            PlanStatus::DidPlan
        );
        let full = planner.cached_plan().path.clone();
        let n = planner.cached_plan().plan.len();
        let robot = planner.backend().env().state_to_pose(&plan_state_at(&planner, n / 2));

        let remaining = planner.complete_path(&Pose3D::from(robot)).unwrap();
        assert!(remaining.len() < full.len());
        let first = remaining.start_pose().unwrap();
        assert_relative_eq!(first.x, robot.x, epsilon = 1e-6);
        assert_relative_eq!(remaining.end_pose().unwrap().yaw, PI / 4.0, epsilon = 1e-9);

        assert!(planner.complete_path(&pose(200.0, 300.0, 0.0)).is_none());
        assert!(planner.cached_plan().plan.is_empty());
    }

    #[test]
    fn test_test_path() {
        let mut planner = planner();
        let path = planner.test_path(&pose(0.0, 0.0, 0.0));
        assert!(!path.is_empty());
        assert!(path.check_continuity(1e-6, 1e-6));
        assert!(planner.test_path(&tilted()).is_empty());
    }

    #[test]
    fn test_replan_stays_within_budget() {
        let mut config = config();
        config.lattice.max_expansions = 100;
        let mut planner = planner_with(&config);
        let outcome = planner.plan(&pose(0.0, 0.0, 0.0), &pose(2000.0, 1500.0, 0.0));
        assert_eq!(outcome.status, PlanStatus::NeededButPlanFailure);
        assert!(planner.backend().last_expansions() <= 101);
    }

    #[derive(Default)]
    struct Recorder {
        imports: usize,
        paths: usize,
    }

    struct SharedRecorder(Arc<Mutex<Recorder>>);

    impl PlannerObserver for SharedRecorder {
        fn obstacles_imported(&mut self, _report: &ImportReport) {
            self.0.lock().unwrap().imports += 1;
        }

        fn path_computed(&mut self, _path: &Path) {
            self.0.lock().unwrap().paths += 1;
        }
    }

    #[test]
    fn test_observer_notified() {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let mut planner = planner().with_observer(Box::new(SharedRecorder(recorder.clone())));
        planner.world_mut().add_obstacle(block(500.0, 500.0, 20.0));
        planner.plan(&pose(0.0, 0.0, 0.0), &pose(100.0, 0.0, 0.0));
        let recorder = recorder.lock().unwrap();
        assert_eq!(recorder.paths, 1);
        assert_eq!(recorder.imports, 3);
    }

    #[test]
    fn test_world_ids_round_trip() {
        let mut planner = planner();
        let id = planner.world_mut().add_obstacle(block(100.0, 0.0, 20.0));
        assert_eq!(id, ObjectId(0));
        assert!(planner.world().did_objects_change());
    }
}
