// Lattice replanning demo
//
// Drives a simulated robot along its plan one action per tick. Halfway an
// obstacle appears on the route and the planner repairs the plan without
// stopping. Usage: replan_demo [config.yaml]

use std::path::Path as FsPath;

use log::{error, info};

use rust_navigation::common::{ConvexPolygon, PathPlanner, PlanStatus, Pose2D, Pose3D};
use rust_navigation::config::PlannerConfig;
use rust_navigation::lattice::{LatticeEnvironment, LatticePlan, SearchBackend};
use rust_navigation::planning::{CurvePlanner, LatticePlanner};
use rust_navigation::world::{ObstacleWorld, RectangularFootprint};
use rust_navigation::PlannerResult;

const MAX_TICKS: usize = 200;

fn load_config() -> PlannerResult<PlannerConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {}", path);
            PlannerConfig::load(FsPath::new(&path))
        }
        None => Ok(PlannerConfig::default()),
    }
}

fn block(x: f64, y: f64, size: f64) -> ConvexPolygon {
    ConvexPolygon::from_rect(&Pose2D::new(x, y, 0.0), size, size)
}

fn run() -> PlannerResult<()> {
    let config = load_config()?;

    let start = Pose3D::from_xy_heading(0.0, 0.0, 0.0);
    let goal = Pose3D::from_xy_heading(800.0, 200.0, 100.0_f64.to_radians());

    let curve = CurvePlanner::new(config.curve.clone()).compute(&start, &goal);
    if let Some(path) = &curve.path {
        println!("curve planner: {} segments, {:.1} mm", path.len(), path.total_length());
    }

    let mut world = ObstacleWorld::new();
    world.add_obstacle(block(300.0, 60.0, 80.0));
    let mut planner = LatticePlanner::from_config(&config, world, RectangularFootprint::default())?;

    let outcome = planner.plan(&start, &goal);
    let Some(path) = outcome.path else {
        error!("initial plan failed: {:?}", outcome.status);
        return Ok(());
    };
    println!("lattice planner: {} segments, {:.1} mm", path.len(), path.total_length());
    planner.world_mut().clear_changed();

    let mut robot = start;
    let mut obstacle_added = false;
    for tick in 0..MAX_TICKS {
        let plan = planner.cached_plan().plan.clone();
        let env = planner.backend().env();
        let (index, _) = env.find_closest_plan_segment(&plan, &robot.to_pose2d()?);
        if index + 1 >= plan.len() {
            println!("tick {}: goal reached", tick);
            break;
        }

        // advance one action
        let mut driven = LatticePlan::new(plan.start);
        for &(action, penalty) in &plan.actions()[..=index] {
            driven.push(action, penalty);
        }
        robot = Pose3D::from(env.state_to_pose(&env.plan_final_state(&driven)));

        if !obstacle_added && index >= plan.len() / 2 {
            let ahead = env.state_to_pose(&plan_state(&plan, index + 4, env));
            planner.world_mut().add_obstacle(block(ahead.x, ahead.y, 30.0));
            obstacle_added = true;
            println!("tick {}: obstacle appeared at ({:.0}, {:.0})", tick, ahead.x, ahead.y);
        }

        let outcome = planner.replan(&robot, false);
        planner.world_mut().clear_changed();
        match outcome.status {
            PlanStatus::NotNeeded => {}
            PlanStatus::DidPlan => println!("tick {}: replanned", tick),
            status => {
                println!("tick {}: replanning failed ({:?})", tick, status);
                break;
            }
        }
    }

    if let Some(rest) = planner.complete_path(&robot) {
        println!("remaining path: {} segments", rest.len());
    }
    Ok(())
}

fn plan_state<E: LatticeEnvironment>(plan: &LatticePlan, n: usize, env: &E) -> rust_navigation::lattice::GraphState {
    let mut prefix = LatticePlan::new(plan.start);
    for &(action, penalty) in plan.actions().iter().take(n) {
        prefix.push(action, penalty);
    }
    env.plan_final_state(&prefix)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("replan demo failed: {}", e);
        std::process::exit(1);
    }
}
