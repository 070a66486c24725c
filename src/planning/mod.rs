//! Planners and the pieces they share
//!
//! # Components
//!
//! - `curve_planner`: single bounded-curvature curve, no obstacles
//! - `lattice_planner`: obstacle-aware planner with incremental replanning
//! - `obstacle_importer`: world obstacles to configuration-space obstacles
//! - `path_finalizer`: exact terminal heading
//! - `goal_selection`: choice among several candidate goals
//! - `observer`: optional event hooks

pub mod curve_planner;
pub mod lattice_planner;
pub mod obstacle_importer;
pub mod path_finalizer;
pub mod goal_selection;
pub mod observer;

pub use curve_planner::CurvePlanner;
pub use lattice_planner::{CachedPlan, LatticePlanner, PlannerState};
pub use obstacle_importer::{ImportReport, ObstacleImporter};
pub use path_finalizer::PathFinalizer;
pub use goal_selection::select_goal;
pub use observer::PlannerObserver;
