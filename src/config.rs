//! Planner configuration loaded from YAML
//!
//! Every section has defaults, so a partial (or empty) file is valid:
//!
//! ```yaml
//! lattice:
//!   robot_padding_mm: 8.0
//!   max_expansions: 200000
//! environment:
//!   resolution_mm: 10.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::{PlannerError, PlannerResult};

mod defaults {
    pub fn robot_padding_mm() -> f64 {
        7.0
    }
    pub fn obstacle_padding_mm() -> f64 {
        6.0
    }
    pub fn replan_padding_subtract_mm() -> f64 {
        5.0
    }
    pub fn max_expansions() -> usize {
        1_000_000
    }
    pub fn obstacle_penalty_s_per_mm() -> f64 {
        0.1
    }
    pub fn plan_error_for_replan_mm() -> f64 {
        20.0
    }
    pub fn max_distance_to_follow_old_plan_mm() -> f64 {
        40.0
    }
    pub fn soft_collision_threshold() -> f64 {
        0.01
    }
    pub fn max_obstacle_cost() -> f64 {
        1000.0
    }
    pub fn terminal_turn_threshold_deg() -> f64 {
        2.0
    }
    pub fn terminal_turn_speed_rad_s() -> f64 {
        2.0
    }
    pub fn terminal_turn_accel() -> f64 {
        100.0
    }
    pub fn resolution_mm() -> f64 {
        10.0
    }
    pub fn max_velocity_mm_s() -> f64 {
        60.0
    }
    pub fn reverse_velocity_mm_s() -> f64 {
        30.0
    }
    pub fn linear_accel() -> f64 {
        200.0
    }
    pub fn point_turn_speed_rad_s() -> f64 {
        2.0
    }
    pub fn min_turn_radius_mm() -> f64 {
        20.0
    }
    pub fn long_straight_cells() -> i32 {
        3
    }
    pub fn replan_penalty_buffer() -> f64 {
        0.5
    }
    pub fn max_curve_radius_mm() -> f64 {
        50.0
    }
    pub fn radius_distance_ratio() -> f64 {
        0.25
    }
}

/// Lattice replanning planner parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LatticePlannerConfig {
    /// Padding added around the robot footprint (mm)
    #[serde(default = "defaults::robot_padding_mm")]
    pub robot_padding_mm: f64,
    /// Padding added around each obstacle (mm)
    #[serde(default = "defaults::obstacle_padding_mm")]
    pub obstacle_padding_mm: f64,
    /// Amount both paddings shrink by while checking an existing plan (mm)
    #[serde(default = "defaults::replan_padding_subtract_mm")]
    pub replan_padding_subtract_mm: f64,
    /// Search expansion budget per planning call
    #[serde(default = "defaults::max_expansions")]
    pub max_expansions: usize,
    /// Cost per mm driven inside an obstacle (s/mm)
    #[serde(default = "defaults::obstacle_penalty_s_per_mm")]
    pub obstacle_penalty_s_per_mm: f64,
    /// Distance from the plan beyond which the robot counts as diverged (mm)
    #[serde(default = "defaults::plan_error_for_replan_mm")]
    pub plan_error_for_replan_mm: f64,
    /// How far ahead of the robot the old plan is checked for safety (mm)
    #[serde(default = "defaults::max_distance_to_follow_old_plan_mm")]
    pub max_distance_to_follow_old_plan_mm: f64,
    /// First-pass collision cost threshold when choosing among goals
    #[serde(default = "defaults::soft_collision_threshold")]
    pub soft_collision_threshold: f64,
    /// Second-pass collision cost threshold when choosing among goals
    #[serde(default = "defaults::max_obstacle_cost")]
    pub hard_collision_threshold: f64,
    #[serde(default)]
    pub allow_free_turn_in_place_at_goal: bool,
    /// Heading error above which a terminal point turn is appended (deg)
    #[serde(default = "defaults::terminal_turn_threshold_deg")]
    pub terminal_turn_threshold_deg: f64,
    #[serde(default = "defaults::terminal_turn_speed_rad_s")]
    pub terminal_turn_speed_rad_s: f64,
    #[serde(default = "defaults::terminal_turn_accel")]
    pub terminal_turn_accel: f64,
    #[serde(default = "defaults::terminal_turn_accel")]
    pub terminal_turn_decel: f64,
}

impl Default for LatticePlannerConfig {
    fn default() -> Self {
        Self {
            robot_padding_mm: defaults::robot_padding_mm(),
            obstacle_padding_mm: defaults::obstacle_padding_mm(),
            replan_padding_subtract_mm: defaults::replan_padding_subtract_mm(),
            max_expansions: defaults::max_expansions(),
            obstacle_penalty_s_per_mm: defaults::obstacle_penalty_s_per_mm(),
            plan_error_for_replan_mm: defaults::plan_error_for_replan_mm(),
            max_distance_to_follow_old_plan_mm: defaults::max_distance_to_follow_old_plan_mm(),
            soft_collision_threshold: defaults::soft_collision_threshold(),
            hard_collision_threshold: defaults::max_obstacle_cost(),
            allow_free_turn_in_place_at_goal: false,
            terminal_turn_threshold_deg: defaults::terminal_turn_threshold_deg(),
            terminal_turn_speed_rad_s: defaults::terminal_turn_speed_rad_s(),
            terminal_turn_accel: defaults::terminal_turn_accel(),
            terminal_turn_decel: defaults::terminal_turn_accel(),
        }
    }
}

impl LatticePlannerConfig {
    /// Robot padding used while validating an existing plan
    pub fn reduced_robot_padding(&self) -> f64 {
        self.robot_padding_mm - self.replan_padding_subtract_mm
    }

    /// Obstacle padding used while validating an existing plan
    pub fn reduced_obstacle_padding(&self) -> f64 {
        self.obstacle_padding_mm - self.replan_padding_subtract_mm
    }

    /// Reduced paddings must stay non-negative and strictly below the full paddings.
    pub fn validate(&self) -> PlannerResult<()> {
        if !self.robot_padding_mm.is_finite() || !self.obstacle_padding_mm.is_finite() {
            return Err(PlannerError::InvalidParameter(format!(
                "paddings must be finite, got robot {} and obstacle {}",
                self.robot_padding_mm, self.obstacle_padding_mm
            )));
        }
        if !(self.replan_padding_subtract_mm > 0.0 && self.replan_padding_subtract_mm.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "replan_padding_subtract_mm must be positive, got {}",
                self.replan_padding_subtract_mm
            )));
        }
        if !(self.reduced_robot_padding() >= 0.0 && self.reduced_obstacle_padding() >= 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "replan_padding_subtract_mm {} exceeds robot padding {} or obstacle padding {}",
                self.replan_padding_subtract_mm, self.robot_padding_mm, self.obstacle_padding_mm
            )));
        }
        if self.max_expansions == 0 {
            return Err(PlannerError::InvalidParameter(
                "max_expansions must be at least 1".to_string(),
            ));
        }
        if !(self.soft_collision_threshold <= self.hard_collision_threshold) {
            return Err(PlannerError::InvalidParameter(format!(
                "soft_collision_threshold {} is above hard_collision_threshold {}",
                self.soft_collision_threshold, self.hard_collision_threshold
            )));
        }
        Ok(())
    }
}

/// Discretization and motion parameters of the xytheta lattice
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LatticeEnvironmentConfig {
    /// Grid cell size (mm)
    #[serde(default = "defaults::resolution_mm")]
    pub resolution_mm: f64,
    #[serde(default = "defaults::max_velocity_mm_s")]
    pub max_velocity_mm_s: f64,
    #[serde(default = "defaults::reverse_velocity_mm_s")]
    pub reverse_velocity_mm_s: f64,
    #[serde(default = "defaults::linear_accel")]
    pub linear_accel: f64,
    #[serde(default = "defaults::linear_accel")]
    pub linear_decel: f64,
    #[serde(default = "defaults::point_turn_speed_rad_s")]
    pub point_turn_speed_rad_s: f64,
    #[serde(default = "defaults::terminal_turn_accel")]
    pub point_turn_accel: f64,
    /// Arcs tighter than this are not generated as motion primitives (mm)
    #[serde(default = "defaults::min_turn_radius_mm")]
    pub min_turn_radius_mm: f64,
    /// Length of the long straight primitive in heading steps
    #[serde(default = "defaults::long_straight_cells")]
    pub long_straight_cells: i32,
    /// Accumulated penalty at or above which a motion is fatal
    #[serde(default = "defaults::max_obstacle_cost")]
    pub max_obstacle_cost: f64,
    /// Tolerated increase of an action's penalty before an old plan counts as unsafe
    #[serde(default = "defaults::replan_penalty_buffer")]
    pub replan_penalty_buffer: f64,
}

impl Default for LatticeEnvironmentConfig {
    fn default() -> Self {
        Self {
            resolution_mm: defaults::resolution_mm(),
            max_velocity_mm_s: defaults::max_velocity_mm_s(),
            reverse_velocity_mm_s: defaults::reverse_velocity_mm_s(),
            linear_accel: defaults::linear_accel(),
            linear_decel: defaults::linear_accel(),
            point_turn_speed_rad_s: defaults::point_turn_speed_rad_s(),
            point_turn_accel: defaults::terminal_turn_accel(),
            min_turn_radius_mm: defaults::min_turn_radius_mm(),
            long_straight_cells: defaults::long_straight_cells(),
            max_obstacle_cost: defaults::max_obstacle_cost(),
            replan_penalty_buffer: defaults::replan_penalty_buffer(),
        }
    }
}

impl LatticeEnvironmentConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        if self.resolution_mm <= 0.0 {
            return Err(PlannerError::InvalidParameter(format!(
                "resolution_mm must be positive, got {}",
                self.resolution_mm
            )));
        }
        if self.max_velocity_mm_s <= 0.0 || self.reverse_velocity_mm_s <= 0.0 || self.point_turn_speed_rad_s <= 0.0 {
            return Err(PlannerError::InvalidParameter(
                "velocities must be positive".to_string(),
            ));
        }
        if self.long_straight_cells < 2 {
            return Err(PlannerError::InvalidParameter(format!(
                "long_straight_cells must be at least 2, got {}",
                self.long_straight_cells
            )));
        }
        if self.max_obstacle_cost <= 0.0 {
            return Err(PlannerError::InvalidParameter(
                "max_obstacle_cost must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Curve planner parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CurvePlannerConfig {
    #[serde(default = "defaults::max_curve_radius_mm")]
    pub max_start_radius_mm: f64,
    #[serde(default = "defaults::max_curve_radius_mm")]
    pub max_end_radius_mm: f64,
    /// Turn radius as a fraction of the start-goal distance
    #[serde(default = "defaults::radius_distance_ratio")]
    pub radius_distance_ratio: f64,
    #[serde(default = "defaults::max_velocity_mm_s")]
    pub target_speed_mm_s: f64,
    #[serde(default = "defaults::linear_accel")]
    pub accel: f64,
    #[serde(default = "defaults::linear_accel")]
    pub decel: f64,
}

impl Default for CurvePlannerConfig {
    fn default() -> Self {
        Self {
            max_start_radius_mm: defaults::max_curve_radius_mm(),
            max_end_radius_mm: defaults::max_curve_radius_mm(),
            radius_distance_ratio: defaults::radius_distance_ratio(),
            target_speed_mm_s: defaults::max_velocity_mm_s(),
            accel: defaults::linear_accel(),
            decel: defaults::linear_accel(),
        }
    }
}

impl CurvePlannerConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        if !(self.max_start_radius_mm > 0.0 && self.max_end_radius_mm > 0.0) {
            return Err(PlannerError::InvalidParameter(format!(
                "curve radii must be positive, got start {} and end {}",
                self.max_start_radius_mm, self.max_end_radius_mm
            )));
        }
        if !(self.radius_distance_ratio > 0.0 && self.radius_distance_ratio.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "radius_distance_ratio must be positive, got {}",
                self.radius_distance_ratio
            )));
        }
        if !(self.target_speed_mm_s > 0.0 && self.accel > 0.0 && self.decel > 0.0) {
            return Err(PlannerError::InvalidParameter(
                "curve speed and accelerations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Full planner configuration loaded from YAML
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct PlannerConfig {
    #[serde(default)]
    pub lattice: LatticePlannerConfig,
    #[serde(default)]
    pub environment: LatticeEnvironmentConfig,
    #[serde(default)]
    pub curve: CurvePlannerConfig,
}

impl PlannerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> PlannerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse from YAML string and validate
    pub fn from_yaml(yaml: &str) -> PlannerResult<Self> {
        let config: PlannerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlannerResult<()> {
        self.lattice.validate()?;
        self.environment.validate()?;
        self.curve.validate()
    }
}
