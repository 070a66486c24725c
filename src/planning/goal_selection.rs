//! Collision-aware choice among candidate goals

use log::{debug, info};

use crate::common::types::Pose2D;
use crate::lattice::LatticeEnvironment;

/// Pick the candidate closest to `start` whose discretized collision
/// penalty is below the first threshold that admits any candidate.
///
/// Thresholds are tried in order. `None` candidates (goals that could not
/// be projected onto the ground plane) are never selected.
pub fn select_goal<E>(env: &E, start: &Pose2D, candidates: &[Option<Pose2D>], thresholds: &[f64]) -> Option<usize>
where
    E: LatticeEnvironment + ?Sized,
{
    let penalties: Vec<Option<f64>> = candidates
        .iter()
        .map(|c| c.map(|goal| env.collision_penalty(&env.state_to_pose(&env.pose_to_state(&goal)))))
        .collect();

    for &threshold in thresholds {
        let best = candidates
            .iter()
            .zip(&penalties)
            .enumerate()
            .filter_map(|(i, (goal, penalty))| match (goal, penalty) {
                (Some(goal), Some(penalty)) if *penalty < threshold => Some((i, start.distance(goal))),
                _ => None,
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((i, distance)) = best {
            info!(
                "selected goal {} of {} ({:.1} mm away) with collision threshold {}",
                i,
                candidates.len(),
                distance,
                threshold
            );
            return Some(i);
        }
        debug!("no goal below collision threshold {}", threshold);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::geometry::ConvexPolygon;
    use crate::common::types::Point2D;
    use crate::lattice::{XYThetaEnvironment, NUM_HEADINGS};

    fn env_with(obstacles: &[(f64, f64, f64)]) -> XYThetaEnvironment {
        let mut env = XYThetaEnvironment::with_defaults();
        let robot = ConvexPolygon::from_points(&[Point2D::origin()]);
        for &(x, y, penalty) in obstacles {
            let block = ConvexPolygon::from_rect(&Pose2D::new(x, y, 0.0), 40.0, 40.0);
            for t in 0..NUM_HEADINGS as u8 {
                env.add_obstacle_with_expansion(&block, &robot, t, penalty);
            }
        }
        env
    }

    #[test]
    fn test_prefers_clear_goal_over_closer_soft_ones() {
        let env = env_with(&[(100.0, 0.0, 0.1), (0.0, 100.0, 0.1)]);
        let start = Pose2D::origin();
        let candidates = vec![
            Some(Pose2D::new(100.0, 0.0, 0.0)),
            Some(Pose2D::new(0.0, 100.0, 0.0)),
            Some(Pose2D::new(-300.0, 0.0, 0.0)),
        ];
        assert_eq!(select_goal(&env, &start, &candidates, &[0.01, 1000.0]), Some(2));
    }

    #[test]
    fn test_falls_back_to_hard_threshold() {
        let env = env_with(&[(100.0, 0.0, 0.1), (0.0, 300.0, 0.1)]);
        let start = Pose2D::origin();
        let candidates = vec![Some(Pose2D::new(0.0, 300.0, 0.0)), Some(Pose2D::new(100.0, 0.0, 0.0))];
        assert_eq!(select_goal(&env, &start, &candidates, &[0.01, 1000.0]), Some(1));
    }

    #[test]
    fn test_all_fatal_goals_rejected() {
        let env = env_with(&[(100.0, 0.0, 1000.0)]);
        let start = Pose2D::origin();
        let candidates = vec![Some(Pose2D::new(100.0, 0.0, 0.0)), None];
        assert_eq!(select_goal(&env, &start, &candidates, &[0.01, 1000.0]), None);
        assert_eq!(select_goal(&env, &start, &[], &[0.01, 1000.0]), None);
    }
}
