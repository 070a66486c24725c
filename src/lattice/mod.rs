//! xytheta lattice search
//!
//! The lattice planner talks to its search machinery only through the two
//! traits defined here, so a different environment or search engine can be
//! dropped in.
//!
//! # Components
//!
//! - `state`: discrete states and plans
//! - `action_space`: motion primitives per heading
//! - `environment`: configuration-space obstacles and plan/path queries
//! - `search`: bounded A* over the lattice

pub mod state;
pub mod action_space;
pub mod environment;
pub mod search;

pub use state::{ActionId, GraphState, LatticePlan};
pub use action_space::{ActionKind, ActionSpace, MotionPrimitive, NUM_HEADINGS};
pub use environment::XYThetaEnvironment;
pub use search::XYThetaPlanner;

use crate::common::geometry::ConvexPolygon;
use crate::common::types::Pose2D;
use crate::path::Path;

/// Result of checking a cached plan against the current obstacles
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSafety {
    pub is_safe: bool,
    /// Continuous state at the end of `valid_prefix` (or at the check's
    /// starting point if the prefix is empty)
    pub last_safe_state: Pose2D,
    /// Actions from the check's starting point that are collision free and
    /// lie within the lookahead distance
    pub valid_prefix: LatticePlan,
}

/// Discretized world the search runs in
pub trait LatticeEnvironment {
    fn num_angles(&self) -> usize;

    /// Heading of bucket `theta` in radians
    fn theta_angle(&self, theta: u8) -> f64;

    fn clear_obstacles(&mut self);

    /// Add `obstacle` expanded by the robot footprint for heading `theta`.
    /// `robot` is expressed relative to the drive center.
    fn add_obstacle_with_expansion(&mut self, obstacle: &ConvexPolygon, robot: &ConvexPolygon, theta: u8, penalty: f64);

    fn num_obstacles(&self) -> usize;

    /// Largest penalty among obstacles containing the pose
    fn collision_penalty(&self, pose: &Pose2D) -> f64;

    fn max_obstacle_cost(&self) -> f64;

    fn is_in_fatal_collision(&self, pose: &Pose2D) -> bool {
        self.collision_penalty(pose) >= self.max_obstacle_cost()
    }

    fn pose_to_state(&self, pose: &Pose2D) -> GraphState;

    fn state_to_pose(&self, state: &GraphState) -> Pose2D;

    /// Index of the plan action the pose is on (or closest to) and the
    /// distance from it, zero for an exact discrete match
    fn find_closest_plan_segment(&self, plan: &LatticePlan, pose: &Pose2D) -> (usize, f64);

    fn plan_is_safe(&self, plan: &LatticePlan, lookahead_mm: f64, from_index: usize) -> PlanSafety;

    /// Append the continuous geometry of `plan` to `path`, skipping the
    /// first `skip_actions` actions
    fn append_to_path(&self, plan: &LatticePlan, path: &mut Path, skip_actions: usize);

    fn plan_final_state(&self, plan: &LatticePlan) -> GraphState;

    /// Called once obstacles are in place and before searching
    fn prepare_for_planning(&mut self);
}

/// Search engine over a `LatticeEnvironment`
pub trait SearchBackend {
    type Env: LatticeEnvironment;

    fn env(&self) -> &Self::Env;

    fn env_mut(&mut self) -> &mut Self::Env;

    /// False if no collision-free state near `start` exists
    fn set_start(&mut self, start: &Pose2D) -> bool;

    /// False if no collision-free state near `goal` exists
    fn set_goal(&mut self, goal: &Pose2D) -> bool;

    /// Re-check the current goal against the current obstacles
    fn goal_is_valid(&self) -> bool;

    /// Search from the current start to the current goal within the
    /// expansion budget. The result is available from `plan`.
    fn replan(&mut self, max_expansions: usize) -> bool;

    fn plan(&self) -> &LatticePlan;

    /// Discard any warm-start information for the next `replan`
    fn set_replan_from_scratch(&mut self);

    fn allow_free_turn_in_place_at_goal(&mut self, allow: bool);

    /// Fixed plan used to exercise the executor
    fn test_plan(&self, start: &Pose2D) -> LatticePlan;
}
