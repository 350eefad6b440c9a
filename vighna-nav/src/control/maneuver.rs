//! Maneuvers and their execution as timed drive commands.

use serde::Serialize;
use std::fmt;

use super::classifier::{Category, Correction, TurnDirection};
use super::escalation::ForcedRecovery;
use super::profile::ThresholdProfile;
use crate::robot::{DriveCommand, Robot};

/// Action taken for a step (primary) or layered after it (corrections).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Maneuver {
    Cruise { sprint: bool },
    ObstacleDodge(TurnDirection),
    WallDodge(TurnDirection),
    /// Forced after repeated obstacle dodges. Softer when the rear is in contact.
    EscalatedObstacleRecovery { rear_blocked: bool },
    /// Forced after repeated wall dodges
    EscalatedWallRecovery,
    BackCorrection,
    RearSideCorrection(TurnDirection),
}

impl Maneuver {
    /// Counts toward the episode's obstacle-dodge total.
    pub fn is_obstacle_dodge(&self) -> bool {
        matches!(
            self,
            Maneuver::ObstacleDodge(_) | Maneuver::EscalatedObstacleRecovery { .. }
        )
    }

    /// Counts toward the episode's wall-dodge total.
    pub fn is_wall_dodge(&self) -> bool {
        matches!(
            self,
            Maneuver::WallDodge(_) | Maneuver::EscalatedWallRecovery
        )
    }

    pub fn is_escalated(&self) -> bool {
        matches!(
            self,
            Maneuver::EscalatedObstacleRecovery { .. } | Maneuver::EscalatedWallRecovery
        )
    }

    /// Recovery maneuver for a tripped escalation.
    pub fn forced(recovery: ForcedRecovery, rear_blocked: bool) -> Self {
        match recovery {
            ForcedRecovery::Obstacle => Maneuver::EscalatedObstacleRecovery { rear_blocked },
            ForcedRecovery::Wall => Maneuver::EscalatedWallRecovery,
        }
    }
}

impl From<Category> for Maneuver {
    fn from(category: Category) -> Self {
        match category {
            Category::Cruise { sprint } => Maneuver::Cruise { sprint },
            Category::ObstacleDodge(dir) => Maneuver::ObstacleDodge(dir),
            Category::WallDodge(dir) => Maneuver::WallDodge(dir),
        }
    }
}

impl From<Correction> for Maneuver {
    fn from(correction: Correction) -> Self {
        match correction {
            Correction::Back => Maneuver::BackCorrection,
            Correction::RearSide(dir) => Maneuver::RearSideCorrection(dir),
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Maneuver::Cruise { sprint: false } => f.write_str("cruise"),
            Maneuver::Cruise { sprint: true } => f.write_str("cruise_sprint"),
            Maneuver::ObstacleDodge(dir) => write!(f, "obstacle_dodge_{}", dir),
            Maneuver::WallDodge(dir) => write!(f, "wall_dodge_{}", dir),
            Maneuver::EscalatedObstacleRecovery { .. } => f.write_str("obstacle_recovery"),
            Maneuver::EscalatedWallRecovery => f.write_str("wall_recovery"),
            Maneuver::BackCorrection => f.write_str("back_correction"),
            Maneuver::RearSideCorrection(dir) => write!(f, "rear_side_correction_{}", dir),
        }
    }
}

/// Turns maneuvers into drive command sequences and issues them.
///
/// Commands go out strictly one after another; each `drive` call blocks for
/// its duration, which is the only timing mechanism.
#[derive(Clone, Debug)]
pub struct ManeuverExecutor {
    profile: ThresholdProfile,
}

impl ManeuverExecutor {
    pub fn new(profile: ThresholdProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ThresholdProfile {
        &self.profile
    }

    /// Command sequence for a maneuver.
    pub fn plan(&self, maneuver: Maneuver) -> Vec<DriveCommand> {
        let p = &self.profile;
        match maneuver {
            Maneuver::Cruise { sprint: false } => vec![p.forward()],
            Maneuver::Cruise { sprint: true } => vec![p.sprint()],
            Maneuver::ObstacleDodge(dir) => {
                vec![DriveCommand::stop(p.stop_pause_ms()), self.turn(dir)]
            }
            Maneuver::WallDodge(dir) => vec![
                p.backward(),
                DriveCommand::stop(0),
                self.turn(dir).held_for(p.wall_turn_ms()),
            ],
            Maneuver::EscalatedObstacleRecovery { rear_blocked: false } => {
                vec![p.obstacle_recovery()]
            }
            Maneuver::EscalatedObstacleRecovery { rear_blocked: true } => {
                vec![p.rear_blocked_recovery()]
            }
            Maneuver::EscalatedWallRecovery => vec![
                DriveCommand::stop(p.wall_recovery_pause_ms()),
                p.wall_recovery(),
            ],
            Maneuver::BackCorrection => vec![p.back_correction()],
            Maneuver::RearSideCorrection(dir) => vec![self.turn(dir), p.forward()],
        }
    }

    /// Issue a maneuver's commands in order. Returns the total blocked time.
    pub fn execute<R: Robot + ?Sized>(&self, robot: &mut R, maneuver: Maneuver) -> u64 {
        let mut total_ms = 0u64;
        for command in self.plan(maneuver) {
            tracing::trace!(
                "{}: drive({}, {}, {}ms)",
                maneuver,
                command.left,
                command.right,
                command.duration_ms
            );
            robot.drive(command);
            total_ms += u64::from(command.duration_ms);
        }
        total_ms
    }

    fn turn(&self, dir: TurnDirection) -> DriveCommand {
        match dir {
            TurnDirection::Left => self.profile.turn_left(),
            TurnDirection::Right => self.profile.turn_right(),
        }
    }
}
