//! Frame classification.
//!
//! Pure decision function from a sensor frame and a threshold profile to a
//! maneuver category. First match wins:
//!
//! 1. **Wall**: FrontCenter, FrontRightRight or FrontLeftLeft above its
//!    escape threshold
//! 2. **Obstacle**: any dodge-tier channel above its dodge threshold
//! 3. **Cruise**
//!
//! Rear corrections are evaluated independently and layered after the
//! primary maneuver. They never replace it.
//!
//! The turn rule and the rear layering are empirically tuned: turn left only
//! when the right-hand side alone triggers, otherwise turn right.

use serde::Serialize;
use std::fmt;

use super::profile::{ChannelThresholds, DODGE_CHANNELS, ESCAPE_CHANNELS, ThresholdProfile};
use crate::sensors::{Channel, SensorFrame};

/// Direction of an in-place turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnDirection::Left => f.write_str("left"),
            TurnDirection::Right => f.write_str("right"),
        }
    }
}

/// Primary decision for one frame, before escalation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Category {
    /// Nothing in dodge range. `sprint` when the way ahead is clear.
    Cruise { sprint: bool },
    /// Near obstacle
    ObstacleDodge(TurnDirection),
    /// Wall contact or large obstacle
    WallDodge(TurnDirection),
}

impl Category {
    pub fn is_dodge(&self) -> bool {
        !matches!(self, Category::Cruise { .. })
    }
}

/// Supplementary action layered after the primary maneuver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Correction {
    /// BackCenter contact: nudge forward
    Back,
    /// BackLeft or BackRight contact: turn away, then nudge forward
    RearSide(TurnDirection),
}

/// Classify a frame. Pure: no history, no side effects.
pub fn classify(frame: &SensorFrame, profile: &ThresholdProfile) -> Category {
    let escape = profile.escape();
    if any_exceeded(frame, escape, &ESCAPE_CHANNELS) {
        return Category::WallDodge(turn_direction(frame, escape));
    }

    let dodge = profile.dodge();
    if any_exceeded(frame, dodge, &DODGE_CHANNELS) {
        return Category::ObstacleDodge(turn_direction(frame, dodge));
    }

    let sprint = profile
        .clear_ahead()
        .is_some_and(|t| frame.get(Channel::FrontCenter) < t);
    Category::Cruise { sprint }
}

/// Rear corrections for a frame, in execution order.
pub fn corrections(frame: &SensorFrame, profile: &ThresholdProfile) -> Vec<Correction> {
    let mut out = Vec::new();
    if frame.get(Channel::BackCenter) > profile.back_contact() {
        out.push(Correction::Back);
    }
    if let Some(t) = profile.rear_side() {
        if frame.get(Channel::BackLeft) > t {
            out.push(Correction::RearSide(TurnDirection::Right));
        }
        if frame.get(Channel::BackRight) > t {
            out.push(Correction::RearSide(TurnDirection::Left));
        }
    }
    out
}

/// True when BackCenter is in contact. Used to soften recovery reverses.
pub fn rear_blocked(frame: &SensorFrame, profile: &ThresholdProfile) -> bool {
    frame.get(Channel::BackCenter) > profile.back_contact()
}

fn any_exceeded(frame: &SensorFrame, tier: &ChannelThresholds, channels: &[Channel]) -> bool {
    channels.iter().any(|&c| tier.exceeded(frame, c))
}

/// Left only when FrontRightRight triggers and FrontLeftLeft does not.
fn turn_direction(frame: &SensorFrame, tier: &ChannelThresholds) -> TurnDirection {
    let right_side = tier.exceeded(frame, Channel::FrontRightRight);
    let left_side = tier.exceeded(frame, Channel::FrontLeftLeft);
    if right_side && !left_side {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    }
}
