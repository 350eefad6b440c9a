//! Threshold profile: tiered IR thresholds plus maneuver parameters.
//!
//! A [`ProfileSpec`] is the unvalidated, deserializable form. It becomes a
//! [`ThresholdProfile`] only through [`ThresholdProfile::new`], which rejects
//! inconsistent tiers, negative values and a zero escalation limit. The
//! profile is read-only for the rest of the episode.
//!
//! Two presets carry the tuned values for the simulator and for the physical
//! robot. The simulator's IR readings saturate much higher than hardware, so
//! thresholds differ by roughly 3x.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, VighnaError};
use crate::robot::DriveCommand;
use crate::sensors::{CHANNEL_COUNT, Channel, SensorFrame};

/// Channels covered by the dodge tier.
pub const DODGE_CHANNELS: [Channel; 5] = [
    Channel::FrontCenter,
    Channel::FrontRightRight,
    Channel::FrontLeftLeft,
    Channel::FrontLeft45,
    Channel::FrontRight45,
];

/// Channels covered by the escape tier.
pub const ESCAPE_CHANNELS: [Channel; 3] = [
    Channel::FrontCenter,
    Channel::FrontRightRight,
    Channel::FrontLeftLeft,
];

/// Thresholds for a subset of channels. Unset channels never trigger.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelThresholds([Option<f32>; CHANNEL_COUNT]);

impl ChannelThresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Channel, threshold: f32) -> Self {
        self.0[channel.index()] = Some(threshold);
        self
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> Option<f32> {
        self.0[channel.index()]
    }

    /// Strictly greater than the threshold; equality does not trigger.
    #[inline]
    pub fn exceeded(&self, frame: &SensorFrame, channel: Channel) -> bool {
        matches!(self.get(channel), Some(t) if frame.get(channel) > t)
    }

    /// Set channels in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(|c| self.get(c).map(|t| (c, t)))
    }
}

impl Serialize for ChannelThresholds {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (channel, threshold) in self.iter() {
            map.serialize_entry(channel.label(), &threshold)?;
        }
        map.end()
    }
}

/// Dodge tier as written in configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DodgeTierSpec {
    pub front_center: Option<f32>,
    pub front_right_right: Option<f32>,
    pub front_left_left: Option<f32>,
    pub front_left_45: Option<f32>,
    pub front_right_45: Option<f32>,
}

impl DodgeTierSpec {
    fn thresholds(&self) -> ChannelThresholds {
        let mut t = ChannelThresholds::new();
        let entries = [
            (Channel::FrontCenter, self.front_center),
            (Channel::FrontRightRight, self.front_right_right),
            (Channel::FrontLeftLeft, self.front_left_left),
            (Channel::FrontLeft45, self.front_left_45),
            (Channel::FrontRight45, self.front_right_45),
        ];
        for (channel, value) in entries {
            if let Some(v) = value {
                t = t.with(channel, v);
            }
        }
        t
    }
}

/// Escape tier as written in configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EscapeTierSpec {
    pub front_center: Option<f32>,
    pub front_right_right: Option<f32>,
    pub front_left_left: Option<f32>,
}

impl EscapeTierSpec {
    fn thresholds(&self) -> ChannelThresholds {
        let mut t = ChannelThresholds::new();
        let entries = [
            (Channel::FrontCenter, self.front_center),
            (Channel::FrontRightRight, self.front_right_right),
            (Channel::FrontLeftLeft, self.front_left_left),
        ];
        for (channel, value) in entries {
            if let Some(v) = value {
                t = t.with(channel, v);
            }
        }
        t
    }
}

/// Unvalidated drive command. Duration is signed so that negative
/// values can be reported as configuration errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DriveSpec {
    pub left: i32,
    pub right: i32,
    pub duration_ms: i64,
}

impl DriveSpec {
    pub const fn new(left: i32, right: i32, duration_ms: i64) -> Self {
        Self {
            left,
            right,
            duration_ms,
        }
    }

    fn validate(&self, name: &str) -> Result<DriveCommand> {
        let duration_ms = validate_duration(name, self.duration_ms)?;
        Ok(DriveCommand::new(self.left, self.right, duration_ms))
    }
}

/// Drive commands used by the maneuvers.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DriveSpecs {
    pub forward: DriveSpec,
    pub backward: DriveSpec,
    pub turn_left: DriveSpec,
    pub turn_right: DriveSpec,
    /// Forward command used when the way ahead is clear
    pub sprint: DriveSpec,
    /// Forward nudge after rear contact
    pub back_correction: DriveSpec,
    /// Reverse used when obstacle dodges repeat too often
    pub obstacle_recovery: DriveSpec,
    /// Gentler reverse for the same case when the rear is already in contact
    pub rear_blocked_recovery: DriveSpec,
    /// Long reverse used when wall dodges repeat too often
    pub wall_recovery: DriveSpec,
}

/// Pauses and holds, in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TimingSpec {
    /// Stop before an obstacle-dodge turn
    pub stop_pause_ms: i64,
    /// Turn hold for a wall dodge (longer than an obstacle-dodge turn)
    pub wall_turn_ms: i64,
    /// Stop before the wall recovery reverse
    pub wall_recovery_pause_ms: i64,
}

/// Full unvalidated profile.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ProfileSpec {
    /// BackCenter threshold for the forward nudge
    pub back_contact: f32,
    /// BackLeft / BackRight threshold for rear-side corrections
    pub rear_side: Option<f32>,
    /// Cruise sprints while FrontCenter is below this value
    pub clear_ahead: Option<f32>,
    /// Dodges of one kind in a row before a forced recovery
    pub consecutive: i64,
    pub dodge: DodgeTierSpec,
    pub escape: EscapeTierSpec,
    pub drive: DriveSpecs,
    pub timing: TimingSpec,
}

impl ProfileSpec {
    /// Values tuned against the simulator.
    pub fn simulation() -> Self {
        const WHEEL_SPEED: i32 = 77;
        Self {
            dodge: DodgeTierSpec {
                front_center: Some(31.0),
                front_right_right: Some(50.0),
                front_left_left: Some(50.0),
                front_left_45: Some(380.0),
                front_right_45: Some(380.0),
            },
            escape: EscapeTierSpec {
                front_center: Some(250.0),
                front_right_right: Some(250.0),
                front_left_left: Some(250.0),
            },
            back_contact: 60.0,
            rear_side: Some(50.0),
            clear_ahead: Some(5.82),
            consecutive: 5,
            drive: DriveSpecs::with_wheel_speed(WHEEL_SPEED),
            timing: TimingSpec::default(),
        }
    }

    /// Values tuned against the physical robot.
    pub fn hardware() -> Self {
        const WHEEL_SPEED: i32 = 50;
        Self {
            dodge: DodgeTierSpec {
                front_center: Some(11.0),
                front_right_right: Some(15.0),
                front_left_left: Some(15.0),
                front_left_45: Some(80.0),
                front_right_45: Some(80.0),
            },
            escape: EscapeTierSpec {
                front_center: Some(90.0),
                front_right_right: Some(90.0),
                front_left_left: Some(90.0),
            },
            back_contact: 60.0,
            rear_side: Some(50.0),
            clear_ahead: Some(5.82),
            consecutive: 5,
            drive: DriveSpecs::with_wheel_speed(WHEEL_SPEED),
            timing: TimingSpec::default(),
        }
    }
}

impl DriveSpecs {
    fn with_wheel_speed(speed: i32) -> Self {
        Self {
            forward: DriveSpec::new(speed, speed, 350),
            backward: DriveSpec::new(-speed, -speed, 900),
            turn_left: DriveSpec::new(-25, 25, 650),
            turn_right: DriveSpec::new(25, -25, 650),
            sprint: DriveSpec::new(100, 100, 1000),
            back_correction: DriveSpec::new(speed, speed, 350),
            obstacle_recovery: DriveSpec::new(-speed, -speed, 1500),
            rear_blocked_recovery: DriveSpec::new(-50, -50, 800),
            wall_recovery: DriveSpec::new(-100, -100, 5000),
        }
    }
}

impl Default for TimingSpec {
    fn default() -> Self {
        Self {
            stop_pause_ms: 100,
            wall_turn_ms: 850,
            wall_recovery_pause_ms: 1000,
        }
    }
}

/// Validated, immutable thresholds and maneuver parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThresholdProfile {
    back_contact: f32,
    rear_side: Option<f32>,
    clear_ahead: Option<f32>,
    consecutive: u32,
    stop_pause_ms: u32,
    wall_turn_ms: u32,
    wall_recovery_pause_ms: u32,
    dodge: ChannelThresholds,
    escape: ChannelThresholds,
    forward: DriveCommand,
    backward: DriveCommand,
    turn_left: DriveCommand,
    turn_right: DriveCommand,
    sprint: DriveCommand,
    back_correction: DriveCommand,
    obstacle_recovery: DriveCommand,
    rear_blocked_recovery: DriveCommand,
    wall_recovery: DriveCommand,
}

impl ThresholdProfile {
    /// Validate a spec into a profile.
    pub fn new(spec: &ProfileSpec) -> Result<Self> {
        let dodge = spec.dodge.thresholds();
        let escape = spec.escape.thresholds();

        for (channel, t) in dodge.iter().chain(escape.iter()) {
            validate_threshold(channel.label(), t)?;
        }
        for (channel, escape_t) in escape.iter() {
            match dodge.get(channel) {
                Some(dodge_t) if escape_t < dodge_t => {
                    return Err(VighnaError::Config(format!(
                        "escape threshold for {} ({}) is below its dodge threshold ({})",
                        channel, escape_t, dodge_t
                    )));
                }
                _ => {}
            }
        }
        validate_threshold("back_contact", spec.back_contact)?;
        if let Some(t) = spec.rear_side {
            validate_threshold("rear_side", t)?;
        }
        if let Some(t) = spec.clear_ahead {
            validate_threshold("clear_ahead", t)?;
        }

        if spec.consecutive < 1 {
            return Err(VighnaError::Config(format!(
                "consecutive must be at least 1, got {}",
                spec.consecutive
            )));
        }
        let consecutive = u32::try_from(spec.consecutive).map_err(|_| {
            VighnaError::Config(format!("consecutive too large: {}", spec.consecutive))
        })?;

        let d = &spec.drive;
        let t = &spec.timing;
        Ok(Self {
            dodge,
            escape,
            back_contact: spec.back_contact,
            rear_side: spec.rear_side,
            clear_ahead: spec.clear_ahead,
            consecutive,
            forward: d.forward.validate("forward")?,
            backward: d.backward.validate("backward")?,
            turn_left: d.turn_left.validate("turn_left")?,
            turn_right: d.turn_right.validate("turn_right")?,
            sprint: d.sprint.validate("sprint")?,
            back_correction: d.back_correction.validate("back_correction")?,
            obstacle_recovery: d.obstacle_recovery.validate("obstacle_recovery")?,
            rear_blocked_recovery: d.rear_blocked_recovery.validate("rear_blocked_recovery")?,
            wall_recovery: d.wall_recovery.validate("wall_recovery")?,
            stop_pause_ms: validate_duration("stop_pause_ms", t.stop_pause_ms)?,
            wall_turn_ms: validate_duration("wall_turn_ms", t.wall_turn_ms)?,
            wall_recovery_pause_ms: validate_duration(
                "wall_recovery_pause_ms",
                t.wall_recovery_pause_ms,
            )?,
        })
    }

    /// Validated simulation preset.
    pub fn simulation() -> Self {
        Self::new(&ProfileSpec::simulation()).expect("simulation preset is valid")
    }

    /// Validated hardware preset.
    pub fn hardware() -> Self {
        Self::new(&ProfileSpec::hardware()).expect("hardware preset is valid")
    }

    pub fn dodge(&self) -> &ChannelThresholds {
        &self.dodge
    }

    pub fn escape(&self) -> &ChannelThresholds {
        &self.escape
    }

    pub fn back_contact(&self) -> f32 {
        self.back_contact
    }

    pub fn rear_side(&self) -> Option<f32> {
        self.rear_side
    }

    pub fn clear_ahead(&self) -> Option<f32> {
        self.clear_ahead
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn forward(&self) -> DriveCommand {
        self.forward
    }

    pub fn backward(&self) -> DriveCommand {
        self.backward
    }

    pub fn turn_left(&self) -> DriveCommand {
        self.turn_left
    }

    pub fn turn_right(&self) -> DriveCommand {
        self.turn_right
    }

    pub fn sprint(&self) -> DriveCommand {
        self.sprint
    }

    pub fn back_correction(&self) -> DriveCommand {
        self.back_correction
    }

    pub fn obstacle_recovery(&self) -> DriveCommand {
        self.obstacle_recovery
    }

    pub fn rear_blocked_recovery(&self) -> DriveCommand {
        self.rear_blocked_recovery
    }

    pub fn wall_recovery(&self) -> DriveCommand {
        self.wall_recovery
    }

    pub fn stop_pause_ms(&self) -> u32 {
        self.stop_pause_ms
    }

    pub fn wall_turn_ms(&self) -> u32 {
        self.wall_turn_ms
    }

    pub fn wall_recovery_pause_ms(&self) -> u32 {
        self.wall_recovery_pause_ms
    }
}

fn validate_threshold(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(VighnaError::Config(format!(
            "threshold {} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_duration(name: &str, duration_ms: i64) -> Result<u32> {
    u32::try_from(duration_ms).map_err(|_| {
        VighnaError::Config(format!(
            "duration {} must be between 0 and {} ms, got {}",
            name,
            u32::MAX,
            duration_ms
        ))
    })
}
