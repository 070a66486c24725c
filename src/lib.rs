//! rust_navigation - motion planning for a small differential-drive robot
//!
//! This crate provides the planners that turn a goal pose into a drivable
//! path: a single-curve planner for open space and a lattice planner that
//! avoids obstacles and repairs its plan every control tick.

// Core modules
pub mod common;
pub mod config;

// Geometry and search
pub mod path;
pub mod lattice;
pub mod world;

// Planners
pub mod planning;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Pose3D};
pub use common::{MultiGoalOutcome, PathPlanner, PlanOutcome, PlanStatus};
pub use common::{PlannerError, PlannerResult};
pub use config::PlannerConfig;
pub use path::Path;
pub use planning::{CurvePlanner, LatticePlanner};
