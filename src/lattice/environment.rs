//! xytheta environment: per-heading configuration-space obstacles and the
//! plan/path queries the planner needs.

use itertools::iproduct;
use log::debug;

use crate::common::geometry::{Aabb, ConvexPolygon};
use crate::common::types::{Point2D, Pose2D};
use crate::config::LatticeEnvironmentConfig;
use crate::lattice::action_space::{heading_angle, nearest_heading, ActionSpace, MotionPrimitive, NUM_HEADINGS};
use crate::lattice::state::{ActionId, GraphState, LatticePlan};
use crate::lattice::{LatticeEnvironment, PlanSafety};
use crate::path::Path;

#[derive(Debug, Clone)]
struct CSpaceObstacle {
    polygon: ConvexPolygon,
    bounds: Aabb,
    penalty: f64,
}

impl CSpaceObstacle {
    fn contains(&self, p: &Point2D) -> bool {
        self.bounds.contains(p) && self.polygon.contains(p)
    }
}

pub struct XYThetaEnvironment {
    config: LatticeEnvironmentConfig,
    actions: ActionSpace,
    obstacles_per_angle: Vec<Vec<CSpaceObstacle>>,
}

impl XYThetaEnvironment {
    pub fn new(config: LatticeEnvironmentConfig) -> Self {
        let actions = ActionSpace::new(&config);
        Self {
            config,
            actions,
            obstacles_per_angle: vec![Vec::new(); NUM_HEADINGS],
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LatticeEnvironmentConfig::default())
    }

    pub fn config(&self) -> &LatticeEnvironmentConfig {
        &self.config
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.actions
    }

    fn cell_center(&self, state: &GraphState) -> Point2D {
        let res = self.config.resolution_mm;
        Point2D::new(state.x as f64 * res, state.y as f64 * res)
    }

    fn primitive(&self, state: &GraphState, action: ActionId) -> Option<&MotionPrimitive> {
        self.actions.primitive(state.theta, action)
    }

    /// Largest obstacle penalty at a continuous point for heading bucket `theta`
    pub fn point_penalty(&self, p: &Point2D, theta: u8) -> f64 {
        self.obstacles_per_angle[theta as usize % NUM_HEADINGS]
            .iter()
            .filter(|obs| obs.contains(p))
            .map(|obs| obs.penalty)
            .fold(0.0, f64::max)
    }

    /// Successor of `state` under `action`.
    ///
    /// With `check_collisions`, the penalty accumulated along the
    /// primitive is returned too, and `None` means the motion is fatal.
    /// `None` is also returned for unknown actions.
    pub fn apply_action(&self, state: &GraphState, action: ActionId, check_collisions: bool) -> Option<(GraphState, f64)> {
        let prim = self.primitive(state, action)?;
        let mut penalty = 0.0;

        if check_collisions {
            let start = self.cell_center(state);
            let max_cost = self.config.max_obstacle_cost;
            for sample in &prim.samples {
                let p = Point2D::new(start.x + sample.position.x, start.y + sample.position.y);
                for obs in &self.obstacles_per_angle[sample.theta as usize] {
                    if obs.contains(&p) {
                        penalty += obs.penalty * sample.step_mm;
                        if obs.penalty >= max_cost || penalty >= max_cost {
                            return None;
                        }
                    }
                }
            }
        }

        let next = GraphState::new(state.x + prim.end_dx, state.y + prim.end_dy, prim.end_theta);
        Some((next, penalty))
    }

    /// Nearest collision-free cell to `pose` among the four surrounding
    /// cells, keeping the nearest heading
    pub fn round_safe(&self, pose: &Pose2D) -> Option<GraphState> {
        let res = self.config.resolution_mm;
        let theta = nearest_heading(pose.yaw);
        let (fx, cx) = ((pose.x / res).floor() as i32, (pose.x / res).ceil() as i32);
        let (fy, cy) = ((pose.y / res).floor() as i32, (pose.y / res).ceil() as i32);

        iproduct!(fx..=cx, fy..=cy)
            .map(|(x, y)| GraphState::new(x, y, theta))
            .filter(|s| !self.is_in_fatal_collision(&self.state_to_pose(s)))
            .min_by(|a, b| {
                let da = self.cell_center(a).distance(&pose.position());
                let db = self.cell_center(b).distance(&pose.position());
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

impl LatticeEnvironment for XYThetaEnvironment {
    fn num_angles(&self) -> usize {
        NUM_HEADINGS
    }

    fn theta_angle(&self, theta: u8) -> f64 {
        heading_angle(theta)
    }

    fn clear_obstacles(&mut self) {
        for obstacles in &mut self.obstacles_per_angle {
            obstacles.clear();
        }
    }

    fn add_obstacle_with_expansion(&mut self, obstacle: &ConvexPolygon, robot: &ConvexPolygon, theta: u8, penalty: f64) {
        let polygon = obstacle.minkowski_difference(robot);
        let bounds = polygon.bounding_box();
        self.obstacles_per_angle[theta as usize % NUM_HEADINGS].push(CSpaceObstacle { polygon, bounds, penalty });
    }

    fn num_obstacles(&self) -> usize {
        self.obstacles_per_angle.iter().map(|v| v.len()).sum()
    }

    fn collision_penalty(&self, pose: &Pose2D) -> f64 {
        self.point_penalty(&pose.position(), nearest_heading(pose.yaw))
    }

    fn max_obstacle_cost(&self) -> f64 {
        self.config.max_obstacle_cost
    }

    fn pose_to_state(&self, pose: &Pose2D) -> GraphState {
        let res = self.config.resolution_mm;
        GraphState::new(
            (pose.x / res).round() as i32,
            (pose.y / res).round() as i32,
            nearest_heading(pose.yaw),
        )
    }

    fn state_to_pose(&self, state: &GraphState) -> Pose2D {
        let c = self.cell_center(state);
        Pose2D::new(c.x, c.y, heading_angle(state.theta))
    }

    fn find_closest_plan_segment(&self, plan: &LatticePlan, pose: &Pose2D) -> (usize, f64) {
        if plan.is_empty() {
            return (0, f64::INFINITY);
        }
        let target = self.pose_to_state(pose);
        let robot = pose.position();
        let mut closest = (0, f64::INFINITY);

        let mut curr = plan.start;
        for i in 0..plan.len() {
            if curr == target {
                return (i, 0.0);
            }
            let d = self.cell_center(&curr).distance(&robot);
            if d < closest.1 {
                closest = (i, d);
            }
            match self.apply_action(&curr, plan.action(i), false) {
                Some((next, _)) => curr = next,
                None => break,
            }
        }

        // intermediate samples; the last one of each action is the next start
        let res = self.config.resolution_mm;
        let mut curr = plan.start;
        for i in 0..plan.len() {
            let Some(prim) = self.primitive(&curr, plan.action(i)) else {
                break;
            };
            let origin = self.cell_center(&curr);
            for sample in prim.samples.iter().take(prim.samples.len().saturating_sub(1)) {
                let p = Point2D::new(origin.x + sample.position.x, origin.y + sample.position.y);
                let rounded = GraphState::new((p.x / res).round() as i32, (p.y / res).round() as i32, sample.theta);
                if rounded == target {
                    return (i, 0.0);
                }
                let d = p.distance(&robot);
                if d < closest.1 {
                    closest = (i, d);
                }
            }
            curr = GraphState::new(curr.x + prim.end_dx, curr.y + prim.end_dy, prim.end_theta);
        }

        closest
    }

    fn plan_is_safe(&self, plan: &LatticePlan, lookahead_mm: f64, from_index: usize) -> PlanSafety {
        let mut valid_prefix = LatticePlan::new(plan.start);
        if plan.is_empty() {
            return PlanSafety {
                is_safe: false,
                last_safe_state: self.state_to_pose(&plan.start),
                valid_prefix,
            };
        }

        let mut curr = plan.start;
        for i in 0..from_index.min(plan.len()) {
            if let Some((next, _)) = self.apply_action(&curr, plan.action(i), false) {
                curr = next;
            }
        }

        let robot_state = self.state_to_pose(&curr);
        let mut last_safe_state = robot_state;
        valid_prefix.start = curr;
        let mut within_lookahead = true;

        for i in from_index..plan.len() {
            let Some((next, penalty)) = self.apply_action(&curr, plan.action(i), true) else {
                debug!("plan action {} (checking from {}) now collides fatally", i, from_index);
                return PlanSafety { is_safe: false, last_safe_state, valid_prefix };
            };
            if penalty > plan.penalty(i) + self.config.replan_penalty_buffer {
                debug!(
                    "plan action {} (checking from {}) penalty increased from {:.3} to {:.3}",
                    i,
                    from_index,
                    plan.penalty(i),
                    penalty
                );
                return PlanSafety { is_safe: false, last_safe_state, valid_prefix };
            }
            curr = next;

            if within_lookahead {
                valid_prefix.push(plan.action(i), plan.penalty(i));
                last_safe_state = self.state_to_pose(&curr);
                if last_safe_state.distance(&robot_state) > lookahead_mm {
                    within_lookahead = false;
                }
            }
        }

        PlanSafety { is_safe: true, last_safe_state, valid_prefix }
    }

    fn append_to_path(&self, plan: &LatticePlan, path: &mut Path, skip_actions: usize) {
        let mut curr = plan.start;
        for i in 0..plan.len() {
            let Some(prim) = self.primitive(&curr, plan.action(i)) else {
                log::error!(
                    "no primitive for heading {} and action {}, path truncated",
                    curr.theta,
                    plan.action(i)
                );
                break;
            };
            if i >= skip_actions {
                let origin = self.cell_center(&curr);
                for seg in &prim.segments {
                    path.push(seg.translated(origin.x, origin.y));
                }
            }
            curr = GraphState::new(curr.x + prim.end_dx, curr.y + prim.end_dy, prim.end_theta);
        }
    }

    fn plan_final_state(&self, plan: &LatticePlan) -> GraphState {
        let mut curr = plan.start;
        for &(action, _) in plan.actions() {
            if let Some((next, _)) = self.apply_action(&curr, action, false) {
                curr = next;
            }
        }
        curr
    }

    /// Fatal obstacles are moved to the front so collision checks fail early.
    fn prepare_for_planning(&mut self) {
        for obstacles in &mut self.obstacles_per_angle {
            obstacles.sort_by(|a, b| b.penalty.partial_cmp(&a.penalty).unwrap_or(std::cmp::Ordering::Equal));
        }
        debug!("prepared {} configuration-space obstacles", self.num_obstacles());
    }
}
