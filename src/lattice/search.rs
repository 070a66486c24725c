//! Bounded A* search over the xytheta lattice
//!
//! Edge costs are traversal time plus accumulated obstacle penalty; the
//! heuristic is straight-line distance at maximum velocity, which never
//! overestimates.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use crate::common::types::Pose2D;
use crate::config::LatticeEnvironmentConfig;
use crate::lattice::action_space::ActionKind;
use crate::lattice::environment::XYThetaEnvironment;
use crate::lattice::state::{ActionId, GraphState, LatticePlan};
use crate::lattice::{LatticeEnvironment, SearchBackend};

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    g: f64,
    parent: Option<(GraphState, ActionId, f64)>,
    closed: bool,
}

pub struct XYThetaPlanner {
    env: XYThetaEnvironment,
    start: Option<GraphState>,
    goal: Option<GraphState>,
    plan: LatticePlan,
    /// Start and goal the current `plan` was searched for
    searched_for: Option<(GraphState, GraphState)>,
    from_scratch: bool,
    free_turn_at_goal: bool,
    last_expansions: usize,
}

impl XYThetaPlanner {
    pub fn new(env: XYThetaEnvironment) -> Self {
        Self {
            env,
            start: None,
            goal: None,
            plan: LatticePlan::default(),
            searched_for: None,
            from_scratch: true,
            free_turn_at_goal: false,
            last_expansions: 0,
        }
    }

    pub fn with_config(config: LatticeEnvironmentConfig) -> Self {
        Self::new(XYThetaEnvironment::new(config))
    }

    pub fn with_defaults() -> Self {
        Self::new(XYThetaEnvironment::with_defaults())
    }

    /// Expansions used by the most recent search
    pub fn last_expansions(&self) -> usize {
        self.last_expansions
    }

    fn valid_state_near(&self, pose: &Pose2D) -> Option<GraphState> {
        let state = self.env.pose_to_state(pose);
        if !self.env.is_in_fatal_collision(&self.env.state_to_pose(&state)) {
            return Some(state);
        }
        self.env.round_safe(pose)
    }

    fn heuristic(&self, from: &GraphState, goal: &GraphState) -> f64 {
        let a = self.env.state_to_pose(from);
        let b = self.env.state_to_pose(goal);
        a.distance(&b) / self.env.config().max_velocity_mm_s
    }

    fn search(&mut self, start: GraphState, goal: GraphState, max_expansions: usize) -> Option<LatticePlan> {
        let mut open = BinaryHeap::new();
        let mut table: HashMap<GraphState, SearchNode> = HashMap::new();

        table.insert(start, SearchNode { g: 0.0, parent: None, closed: false });
        open.push(Reverse((OrderedFloat(self.heuristic(&start, &goal)), start)));

        let mut expansions = 0;
        let mut reached = None;

        while let Some(Reverse((_, state))) = open.pop() {
            let node = match table.get_mut(&state) {
                Some(node) if !node.closed => node,
                _ => continue,
            };
            node.closed = true;
            let g = node.g;

            if state == goal {
                reached = Some(state);
                break;
            }

            expansions += 1;
            if expansions > max_expansions {
                warn!(
                    "search stopped after {} expansions without reaching the goal ({} states seen)",
                    max_expansions,
                    table.len()
                );
                break;
            }

            let at_goal_cell = state.x == goal.x && state.y == goal.y;
            for prim in self.env.action_space().primitives(state.theta) {
                let Some((next, penalty)) = self.env.apply_action(&state, prim.id, true) else {
                    continue;
                };
                let free = self.free_turn_at_goal && at_goal_cell && prim.kind.is_turn_in_place();
                let step = if free { 0.0 } else { prim.cost + penalty };
                let new_g = g + step;

                let improved = match table.get(&next) {
                    Some(existing) => !existing.closed && new_g < existing.g,
                    None => true,
                };
                if improved {
                    table.insert(next, SearchNode { g: new_g, parent: Some((state, prim.id, penalty)), closed: false });
                    open.push(Reverse((OrderedFloat(new_g + self.heuristic(&next, &goal)), next)));
                }
            }
        }

        self.last_expansions = expansions;
        let goal_state = reached?;

        let mut actions = Vec::new();
        let mut curr = goal_state;
        for _ in 0..=table.len() {
            match table.get(&curr).and_then(|n| n.parent) {
                Some((parent, action, penalty)) => {
                    actions.push((action, penalty));
                    curr = parent;
                }
                None => break,
            }
        }
        if curr != start {
            warn!("backtracking from {:?} did not reach the start {:?}", goal_state, start);
            return None;
        }

        let mut plan = LatticePlan::new(start);
        for &(action, penalty) in actions.iter().rev() {
            plan.push(action, penalty);
        }
        info!(
            "found plan with {} actions after {} expansions (cost {:.3})",
            plan.len(),
            expansions,
            table.get(&goal_state).map(|n| n.g).unwrap_or(0.0)
        );
        Some(plan)
    }
}

impl SearchBackend for XYThetaPlanner {
    type Env = XYThetaEnvironment;

    fn env(&self) -> &XYThetaEnvironment {
        &self.env
    }

    fn env_mut(&mut self) -> &mut XYThetaEnvironment {
        &mut self.env
    }

    fn set_start(&mut self, start: &Pose2D) -> bool {
        self.start = self.valid_state_near(start);
        if self.start.is_none() {
            warn!("start ({:.1}, {:.1}, {:.3}) is in collision", start.x, start.y, start.yaw);
        }
        self.start.is_some()
    }

    fn set_goal(&mut self, goal: &Pose2D) -> bool {
        self.goal = self.valid_state_near(goal);
        if self.goal.is_none() {
            warn!("goal ({:.1}, {:.1}, {:.3}) is in collision", goal.x, goal.y, goal.yaw);
        }
        self.goal.is_some()
    }

    fn goal_is_valid(&self) -> bool {
        match &self.goal {
            Some(goal) => !self.env.is_in_fatal_collision(&self.env.state_to_pose(goal)),
            None => false,
        }
    }

    fn replan(&mut self, max_expansions: usize) -> bool {
        let (Some(start), Some(goal)) = (self.start, self.goal) else {
            warn!("replan called without a valid start and goal");
            return false;
        };

        let warm = !self.from_scratch
            && self.searched_for == Some((start, goal))
            && !self.plan.is_empty()
            && self.env.plan_is_safe(&self.plan, f64::INFINITY, 0).is_safe;
        self.from_scratch = false;
        if warm {
            debug!("start and goal unchanged and previous plan still safe, reusing it");
            self.last_expansions = 0;
            return true;
        }

        match self.search(start, goal, max_expansions) {
            Some(plan) => {
                self.plan = plan;
                self.searched_for = Some((start, goal));
                true
            }
            None => {
                self.plan = LatticePlan::new(start);
                self.searched_for = None;
                false
            }
        }
    }

    fn plan(&self) -> &LatticePlan {
        &self.plan
    }

    fn set_replan_from_scratch(&mut self) {
        self.from_scratch = true;
    }

    fn allow_free_turn_in_place_at_goal(&mut self, allow: bool) {
        self.free_turn_at_goal = allow;
    }

    fn test_plan(&self, start: &Pose2D) -> LatticePlan {
        let mut plan = LatticePlan::new(self.env.pose_to_state(start));
        let sequence = [
            ActionKind::Straight,
            ActionKind::LongStraight,
            ActionKind::SoftLeft,
            ActionKind::SoftLeft,
            ActionKind::TurnInPlaceRight,
            ActionKind::TurnInPlaceRight,
            ActionKind::SoftRight,
            ActionKind::Backup,
        ];
        for kind in sequence {
            plan.push(kind.id(), 0.0);
        }
        plan
    }
}
