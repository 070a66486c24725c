//! Common traits defining the planning contract and its collaborators

use crate::common::geometry::ConvexPolygon;
use crate::common::types::{Pose2D, Pose3D};
use crate::path::{Path, SpeedProfile};

/// Result classification of a planning request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanStatus {
    /// The existing path is still valid, nothing was computed
    NotNeeded,
    /// A new path was produced
    DidPlan,
    /// The start pose is unusable (bad rotation or in collision)
    NeededButStartFailure,
    /// The goal pose is unusable (bad rotation or in collision)
    NeededButGoalFailure,
    /// Search failed, or the robot diverged from its plan
    NeededButPlanFailure,
}

impl PlanStatus {
    pub fn is_failure(&self) -> bool {
        !matches!(self, PlanStatus::NotNeeded | PlanStatus::DidPlan)
    }
}

/// Status plus the produced path, if any
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub status: PlanStatus,
    pub path: Option<Path>,
}

impl PlanOutcome {
    pub fn status(status: PlanStatus) -> Self {
        Self { status, path: None }
    }

    pub fn planned(path: Path) -> Self {
        Self {
            status: PlanStatus::DidPlan,
            path: Some(path),
        }
    }
}

/// Outcome of planning towards one of several candidate goals
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGoalOutcome {
    pub outcome: PlanOutcome,
    /// Index into the candidate list of the goal that was planned to
    pub selected: Option<usize>,
}

/// Identifier of an object known to the world model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// Planning capability shared by every planner.
///
/// Only `plan` is required; the rest have defaults that suit a planner
/// without memory.
pub trait PathPlanner {
    /// Plan from `start` to `goal`
    fn plan(&mut self, start: &Pose3D, goal: &Pose3D) -> PlanOutcome;

    /// Re-check a previously computed plan from the robot's current pose
    fn replan(&mut self, _start: &Pose3D, _force_replan_from_scratch: bool) -> PlanOutcome {
        PlanOutcome::status(PlanStatus::NotNeeded)
    }

    /// Plan to whichever candidate is closest to `start`
    fn plan_to_any(&mut self, start: &Pose3D, goals: &[Pose3D]) -> MultiGoalOutcome {
        let closest = goals
            .iter()
            .enumerate()
            .map(|(i, g)| (i, start.distance(g)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i);

        match closest {
            Some(i) => MultiGoalOutcome {
                outcome: self.plan(start, &goals[i]),
                selected: Some(i),
            },
            None => MultiGoalOutcome {
                outcome: PlanOutcome::status(PlanStatus::NeededButGoalFailure),
                selected: None,
            },
        }
    }

    /// Fixed diagnostic path starting at `start`
    fn test_path(&mut self, _start: &Pose3D) -> Path {
        Path::new()
    }
}

/// Source of obstacle footprints
pub trait WorldModel {
    /// Snapshot of every known obstacle, grown by `padding` mm
    fn obstacles(&self, padding: f64) -> Vec<(ConvexPolygon, ObjectId)>;

    /// True if any obstacle changed since the last import
    fn did_objects_change(&self) -> bool;
}

/// Shape of the robot body relative to its drive center
pub trait RobotGeometry {
    /// Pose of the body origin given the drive-center pose
    fn compute_origin_pose(&self, drive_center: &Pose2D) -> Pose2D;

    /// Body outline at `origin`, grown by `padding` mm
    fn bounding_footprint(&self, origin: &Pose2D, padding: f64) -> ConvexPolygon;
}

/// Produces a single drivable curve between two poses
pub trait CurveGenerator {
    fn generate_curve(
        &self,
        start: &Pose2D,
        goal: &Pose2D,
        start_radius: f64,
        end_radius: f64,
        profile: SpeedProfile,
    ) -> Option<Path>;
}
