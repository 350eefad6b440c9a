//! Episode loop.
//!
//! One episode is a bounded run of the sense → decide → act cycle:
//!
//! ```text
//! Running ──tick──► Running
//!    │
//!    ├── step budget reached ──────► Finished(StepBudget)
//!    ├── wall-dodge goal reached ──► Finished(WallDodgeGoal)
//!    └── acquisition failed ───────► Finished(SensorReadError)
//! ```
//!
//! Each tick acquires one frame, classifies it, lets the escalation tracker
//! override the category, executes the maneuver and any rear corrections,
//! and appends a record. Frame N is fully processed before frame N+1 is
//! acquired. The runner never calls the robot's lifecycle hooks; the caller
//! brackets the episode with `start()` / `stop()`.

use serde::Serialize;
use std::fmt;

use super::classifier::{self, Category};
use super::escalation::{EscalationState, EscalationTracker};
use super::maneuver::{Maneuver, ManeuverExecutor};
use super::profile::ThresholdProfile;
use crate::error::{Result, VighnaError};
use crate::robot::{DriveCommand, Robot};
use crate::sensors::{CHANNEL_COUNT, SensorFrame};

/// Per-episode limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpisodeConfig {
    /// Step budget
    pub steps: u32,
    /// Stop held before the second acquisition (0 disables)
    pub settle_ms: u32,
    /// Finish early once this many wall dodges have executed
    pub stop_after_wall_dodges: Option<u32>,
}

impl EpisodeConfig {
    pub fn with_steps(steps: u32) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            settle_ms: 1500,
            stop_after_wall_dodges: None,
        }
    }
}

/// Why an episode ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinishReason {
    StepBudget,
    WallDodgeGoal,
    /// Acquisition failed; the log up to the failed step is kept
    SensorReadError(String),
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::StepBudget => f.write_str("step_budget"),
            FinishReason::WallDodgeGoal => f.write_str("wall_dodge_goal"),
            FinishReason::SensorReadError(msg) => write!(f, "sensor_read_error: {}", msg),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EpisodeState {
    Running,
    Finished(FinishReason),
}

impl EpisodeState {
    pub fn is_finished(&self) -> bool {
        matches!(self, EpisodeState::Finished(_))
    }
}

/// One executed step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepRecord {
    pub step: u32,
    pub frame: SensorFrame,
    /// Executed primary maneuver (after escalation)
    pub maneuver: Maneuver,
    /// Rear corrections executed after the primary maneuver
    pub corrections: Vec<Maneuver>,
    /// Counters after this step
    pub escalation: EscalationState,
}

impl StepRecord {
    pub fn was_wall_dodge(&self) -> bool {
        self.maneuver.is_wall_dodge()
    }

    pub fn was_obstacle_dodge(&self) -> bool {
        self.maneuver.is_obstacle_dodge()
    }
}

/// Dodge or recovery step kept for the summary metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DodgeEvent {
    pub step: u32,
    pub kind: String,
    pub values: [f32; CHANNEL_COUNT],
}

/// Append-only record of an episode.
#[derive(Clone, Debug, Default)]
pub struct EpisodeLog {
    records: Vec<StepRecord>,
    events: Vec<DodgeEvent>,
    obstacle_dodges: u32,
    wall_dodges: u32,
}

impl EpisodeLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, record: StepRecord) {
        if record.was_obstacle_dodge() {
            self.obstacle_dodges += 1;
        }
        if record.was_wall_dodge() {
            self.wall_dodges += 1;
        }
        if record.maneuver.is_obstacle_dodge() || record.maneuver.is_wall_dodge() {
            self.events.push(DodgeEvent {
                step: record.step,
                kind: record.maneuver.to_string(),
                values: *record.frame.values(),
            });
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn events(&self) -> &[DodgeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn obstacle_dodges(&self) -> u32 {
        self.obstacle_dodges
    }

    pub fn wall_dodges(&self) -> u32 {
        self.wall_dodges
    }
}

/// Frozen result of an episode.
#[derive(Clone, Debug)]
pub struct EpisodeSummary {
    pub steps_run: u32,
    pub obstacle_dodges: u32,
    pub wall_dodges: u32,
    pub finish: FinishReason,
    pub simulated: bool,
    pub profile: ThresholdProfile,
    pub events: Vec<DodgeEvent>,
}

/// Log plus summary, returned by [`EpisodeRunner::run`].
#[derive(Clone, Debug)]
pub struct EpisodeOutcome {
    pub log: EpisodeLog,
    pub summary: EpisodeSummary,
}

/// Drives one episode against a robot.
pub struct EpisodeRunner<'a, R: Robot + ?Sized> {
    robot: &'a mut R,
    executor: ManeuverExecutor,
    tracker: EscalationTracker,
    config: EpisodeConfig,
    log: EpisodeLog,
    state: EpisodeState,
    step: u32,
}

impl<'a, R: Robot + ?Sized> EpisodeRunner<'a, R> {
    /// Fresh episode: zeroed counters, empty log.
    pub fn new(robot: &'a mut R, profile: &ThresholdProfile, config: EpisodeConfig) -> Self {
        let state = if config.steps == 0 {
            EpisodeState::Finished(FinishReason::StepBudget)
        } else {
            EpisodeState::Running
        };
        Self {
            robot,
            executor: ManeuverExecutor::new(profile.clone()),
            tracker: EscalationTracker::new(profile.consecutive()),
            config,
            log: EpisodeLog::new(),
            state,
            step: 0,
        }
    }

    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    pub fn log(&self) -> &EpisodeLog {
        &self.log
    }

    pub fn escalation(&self) -> EscalationState {
        self.tracker.state()
    }

    /// Run one step. No-op once finished.
    pub fn tick(&mut self) -> &EpisodeState {
        if self.state.is_finished() {
            return &self.state;
        }

        if self.step == 1 && self.config.settle_ms > 0 {
            self.robot.drive(DriveCommand::stop(self.config.settle_ms));
        }

        let frame = match self.robot.acquire_frame() {
            Ok(frame) => frame,
            Err(e) => {
                let msg = match e {
                    VighnaError::SensorRead(msg) => msg,
                    other => other.to_string(),
                };
                tracing::error!("Step {}: sensor read failed: {}", self.step, msg);
                self.state = EpisodeState::Finished(FinishReason::SensorReadError(msg));
                return &self.state;
            }
        };

        let profile = self.executor.profile();
        let category = classifier::classify(&frame, profile);
        let corrections: Vec<Maneuver> = classifier::corrections(&frame, profile)
            .into_iter()
            .map(Maneuver::from)
            .collect();
        let rear_blocked = classifier::rear_blocked(&frame, profile);

        let maneuver = match self.tracker.observe(&category) {
            Some(forced) => {
                tracing::warn!(
                    "Step {}: {} overridden by {:?} recovery",
                    self.step,
                    Maneuver::from(category),
                    forced
                );
                Maneuver::forced(forced, rear_blocked)
            }
            None => Maneuver::from(category),
        };

        log_decision(self.step, &frame, &category, maneuver);

        self.executor.execute(&mut *self.robot, maneuver);
        for &correction in &corrections {
            tracing::debug!("Step {}: {}", self.step, correction);
            self.executor.execute(&mut *self.robot, correction);
        }

        self.log.push(StepRecord {
            step: self.step,
            frame,
            maneuver,
            corrections,
            escalation: self.tracker.state(),
        });
        self.step += 1;

        if self.step >= self.config.steps {
            self.state = EpisodeState::Finished(FinishReason::StepBudget);
        } else if self
            .config
            .stop_after_wall_dodges
            .is_some_and(|goal| self.log.wall_dodges() >= goal)
        {
            tracing::info!(
                "Wall-dodge goal reached after {} steps ({} wall dodges)",
                self.step,
                self.log.wall_dodges()
            );
            self.state = EpisodeState::Finished(FinishReason::WallDodgeGoal);
        }
        &self.state
    }

    /// Tick until finished and freeze the log into a summary.
    pub fn run(mut self) -> EpisodeOutcome {
        while !self.tick().is_finished() {}

        let finish = match &self.state {
            EpisodeState::Finished(reason) => reason.clone(),
            EpisodeState::Running => FinishReason::StepBudget,
        };
        let summary = EpisodeSummary {
            steps_run: self.step,
            obstacle_dodges: self.log.obstacle_dodges(),
            wall_dodges: self.log.wall_dodges(),
            finish,
            simulated: self.robot.is_simulated(),
            profile: self.executor.profile().clone(),
            events: self.log.events().to_vec(),
        };
        tracing::info!(
            "Episode finished ({}): {} steps, {} obstacle dodges, {} wall dodges",
            summary.finish,
            summary.steps_run,
            summary.obstacle_dodges,
            summary.wall_dodges
        );

        EpisodeOutcome {
            log: self.log,
            summary,
        }
    }
}

/// Run `runs` episodes back to back, each bracketed by `start()` / `stop()`
/// and each with fresh counters and log.
///
/// `on_episode` sees every outcome as soon as its episode ends, so output for
/// finished runs survives a later failure.
pub fn run_episodes<R, F>(
    robot: &mut R,
    profile: &ThresholdProfile,
    config: &EpisodeConfig,
    runs: u32,
    mut on_episode: F,
) -> Result<Vec<EpisodeSummary>>
where
    R: Robot + ?Sized,
    F: FnMut(u32, &EpisodeOutcome) -> Result<()>,
{
    let mut summaries = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        tracing::info!("Starting episode {}/{}", run + 1, runs);
        robot.start()?;
        let outcome = EpisodeRunner::new(&mut *robot, profile, config.clone()).run();
        robot.stop()?;
        on_episode(run, &outcome)?;
        summaries.push(outcome.summary);
    }
    Ok(summaries)
}

fn log_decision(step: u32, frame: &SensorFrame, category: &Category, maneuver: Maneuver) {
    if maneuver.is_escalated() {
        return;
    }
    if category.is_dodge() {
        tracing::info!("Step {}: {} {:?}", step, maneuver, frame.values());
    } else {
        tracing::debug!("Step {}: {}", step, maneuver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::classifier::TurnDirection;
    use crate::robot::ScriptedRobot;
    use crate::sensors::Channel;

    fn front(value: f32) -> SensorFrame {
        SensorFrame::clear(0)
            .with(Channel::FrontCenter, value)
            .unwrap()
    }

    fn no_settle(steps: u32) -> EpisodeConfig {
        EpisodeConfig {
            steps,
            settle_ms: 0,
            stop_after_wall_dodges: None,
        }
    }

    #[test]
    fn test_escalation_on_fifth_obstacle() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(40.0); 6]);
        let mut runner = EpisodeRunner::new(&mut robot, &profile, no_settle(6));

        for _ in 0..4 {
            runner.tick();
        }
        assert_eq!(runner.escalation().consecutive_obstacle_dodges, 4);
        runner.tick();
        assert_eq!(runner.escalation().consecutive_obstacle_dodges, 0);

        let outcome = runner.run();
        let maneuvers: Vec<_> = outcome.log.records().iter().map(|r| r.maneuver).collect();
        let dodge = Maneuver::ObstacleDodge(TurnDirection::Right);
        assert_eq!(
            maneuvers,
            vec![
                dodge,
                dodge,
                dodge,
                dodge,
                Maneuver::EscalatedObstacleRecovery {
                    rear_blocked: false
                },
                dodge,
            ]
        );
        assert_eq!(outcome.summary.obstacle_dodges, 6);
        assert_eq!(outcome.summary.finish, FinishReason::StepBudget);
    }

    #[test]
    fn test_sensor_failure_keeps_partial_log() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(20.0), front(260.0)]);
        let outcome = EpisodeRunner::new(&mut robot, &profile, no_settle(10)).run();

        assert_eq!(outcome.summary.steps_run, 2);
        assert_eq!(outcome.log.len(), 2);
        assert_eq!(outcome.summary.wall_dodges, 1);
        assert!(matches!(
            outcome.summary.finish,
            FinishReason::SensorReadError(_)
        ));
    }

    #[test]
    fn test_zero_budget_never_acquires() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(40.0)]);
        let outcome = EpisodeRunner::new(&mut robot, &profile, no_settle(0)).run();
        assert_eq!(outcome.summary.steps_run, 0);
        assert!(robot.commands().is_empty());
        assert_eq!(robot.remaining(), 1);
    }

    #[test]
    fn test_settle_stop_before_second_acquisition() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(20.0), front(20.0)]);
        let config = EpisodeConfig {
            steps: 2,
            settle_ms: 1500,
            stop_after_wall_dodges: None,
        };
        EpisodeRunner::new(&mut robot, &profile, config).run();

        let commands = robot.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1], DriveCommand::stop(1500));
    }

    #[test]
    fn test_back_correction_follows_primary() {
        let profile = ThresholdProfile::simulation();
        let frame = front(40.0).with(Channel::BackCenter, 70.0).unwrap();
        let mut robot = ScriptedRobot::new(vec![frame]);
        let outcome = EpisodeRunner::new(&mut robot, &profile, no_settle(1)).run();

        let record = &outcome.log.records()[0];
        assert_eq!(record.maneuver, Maneuver::ObstacleDodge(TurnDirection::Right));
        assert_eq!(record.corrections, vec![Maneuver::BackCorrection]);
        assert_eq!(robot.commands().last(), Some(&profile.back_correction()));
    }

    #[test]
    fn test_wall_dodge_goal_finishes_early() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(300.0), front(20.0), front(300.0), front(20.0)]);
        let config = EpisodeConfig {
            steps: 4,
            settle_ms: 0,
            stop_after_wall_dodges: Some(2),
        };
        let outcome = EpisodeRunner::new(&mut robot, &profile, config).run();
        assert_eq!(outcome.summary.finish, FinishReason::WallDodgeGoal);
        assert_eq!(outcome.summary.steps_run, 3);
        assert_eq!(outcome.summary.events.len(), 2);
    }

    #[test]
    fn test_tick_after_finish_is_noop() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(20.0), front(20.0)]);
        let mut runner = EpisodeRunner::new(&mut robot, &profile, no_settle(1));
        assert!(runner.tick().is_finished());
        assert!(runner.tick().is_finished());
        assert_eq!(runner.log().len(), 1);
    }

    #[test]
    fn test_run_episodes_brackets_each_run() {
        let profile = ThresholdProfile::simulation();
        let mut robot = ScriptedRobot::new(vec![front(20.0); 4]);
        let mut seen = Vec::new();
        let summaries = run_episodes(&mut robot, &profile, &no_settle(2), 2, |run, outcome| {
            seen.push((run, outcome.log.len()));
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![(0, 2), (1, 2)]);
        assert_eq!(summaries.len(), 2);
        assert!(!robot.is_running());
        // Each run ends with the stop issued by the lifecycle hook
        let stops = robot.commands().iter().filter(|c| c.is_stop()).count();
        assert_eq!(stops, 2);
    }
}
