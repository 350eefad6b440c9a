//! Closed-loop episodes against the built-in simulator.

use vighna_nav::control::episode::run_episodes;
use vighna_nav::control::{EpisodeConfig, EpisodeRunner, FinishReason, ThresholdProfile};
use vighna_nav::robot::sim::SimulationConfig;
use vighna_nav::robot::sim::config::{ArenaConfig, ObstacleConfig};
use vighna_nav::{Robot, SensorFrame, SimulatedRobot, VighnaError};

fn episode(steps: u32) -> EpisodeConfig {
    EpisodeConfig {
        steps,
        settle_ms: 0,
        stop_after_wall_dodges: None,
    }
}

fn seeded_config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.random_seed = seed;
    config
}

#[test]
fn default_arena_episode_runs_to_budget() {
    let profile = ThresholdProfile::simulation();
    let mut robot = SimulatedRobot::new(seeded_config(7)).unwrap();

    let summaries = run_episodes(&mut robot, &profile, &episode(40), 1, |_, outcome| {
        assert_eq!(outcome.log.len(), 40);
        Ok(())
    })
    .unwrap();

    let summary = &summaries[0];
    assert_eq!(summary.finish, FinishReason::StepBudget);
    assert_eq!(summary.steps_run, 40);
    assert!(summary.simulated);
    // Obstacle straight ahead of the start pose
    assert!(summary.obstacle_dodges + summary.wall_dodges > 0);
    assert!(robot.clock_us() > 0);
    assert!(robot.trajectory().len() > 40);
}

#[test]
fn same_seed_same_episode() {
    let profile = ThresholdProfile::simulation();
    let frames = |seed: u64| -> Vec<SensorFrame> {
        let mut robot = SimulatedRobot::new(seeded_config(seed)).unwrap();
        robot.start().unwrap();
        let outcome = EpisodeRunner::new(&mut robot, &profile, episode(15)).run();
        robot.stop().unwrap();
        outcome
            .log
            .records()
            .iter()
            .map(|r| r.frame.clone())
            .collect()
    };

    assert_eq!(frames(11), frames(11));
}

#[test]
fn open_arena_cruises_forward() {
    let profile = ThresholdProfile::simulation();
    let mut config = seeded_config(3);
    config.ir.noise_stddev = 0.0;
    config.arena = ArenaConfig {
        width: 4.0,
        height: 2.0,
        obstacles: Vec::new(),
    };
    let mut robot = SimulatedRobot::new(config).unwrap();
    robot.start().unwrap();
    let outcome = EpisodeRunner::new(&mut robot, &profile, episode(3)).run();

    assert_eq!(outcome.summary.obstacle_dodges, 0);
    assert_eq!(outcome.summary.wall_dodges, 0);
    assert!(robot.pose().x > 0.5);
    assert_eq!(robot.collisions(), 0);
}

#[test]
fn unstarted_simulation_fails_first_read() {
    let profile = ThresholdProfile::simulation();
    let mut robot = SimulatedRobot::new(seeded_config(1)).unwrap();
    let outcome = EpisodeRunner::new(&mut robot, &profile, episode(5)).run();

    assert_eq!(outcome.summary.steps_run, 0);
    assert!(outcome.log.is_empty());
    assert!(matches!(
        outcome.summary.finish,
        FinishReason::SensorReadError(_)
    ));
}

#[test]
fn start_inside_obstacle_is_rejected() {
    let mut config = seeded_config(1);
    config.arena.obstacles = vec![ObstacleConfig {
        x: config.start_x,
        y: config.start_y,
        radius: 0.1,
    }];
    assert!(matches!(
        SimulatedRobot::new(config),
        Err(VighnaError::Config(_))
    ));
}

#[test]
fn restart_resets_pose_and_clock() {
    let profile = ThresholdProfile::simulation();
    let mut robot = SimulatedRobot::new(seeded_config(5)).unwrap();
    let start = robot.pose();

    robot.start().unwrap();
    EpisodeRunner::new(&mut robot, &profile, episode(5)).run();
    robot.stop().unwrap();
    assert!(robot.clock_us() > 0);

    robot.start().unwrap();
    assert_eq!(robot.clock_us(), 0);
    assert_eq!(robot.pose(), start);
    assert_eq!(robot.trajectory().len(), 1);
}
