//! IR proximity channels and sensor frames.
//!
//! The robot carries eight infrared proximity sensors. Raw readings arrive as
//! an 8-element array in a fixed channel order; higher values mean an
//! obstacle is closer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, VighnaError};

/// Number of IR channels on the robot.
pub const CHANNEL_COUNT: usize = 8;

/// Position of one IR proximity sensor.
///
/// Declaration order matches the index order of a raw reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "back_left")]
    BackLeft,
    #[serde(rename = "back_right")]
    BackRight,
    #[serde(rename = "front_left_45")]
    FrontLeft45,
    #[serde(rename = "front_right_45")]
    FrontRight45,
    #[serde(rename = "front_center")]
    FrontCenter,
    #[serde(rename = "front_right_right")]
    FrontRightRight,
    #[serde(rename = "back_center")]
    BackCenter,
    #[serde(rename = "front_left_left")]
    FrontLeftLeft,
}

impl Channel {
    /// All channels in raw index order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::BackLeft,
        Channel::BackRight,
        Channel::FrontLeft45,
        Channel::FrontRight45,
        Channel::FrontCenter,
        Channel::FrontRightRight,
        Channel::BackCenter,
        Channel::FrontLeftLeft,
    ];

    /// Index of this channel in a raw reading.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short column label used in tabular exports.
    pub fn label(self) -> &'static str {
        match self {
            Channel::BackLeft => "BackL",
            Channel::BackRight => "BackR",
            Channel::FrontLeft45 => "FrontL",
            Channel::FrontRight45 => "FrontR",
            Channel::FrontCenter => "FrontC",
            Channel::FrontRightRight => "FrontRR",
            Channel::BackCenter => "BackC",
            Channel::FrontLeftLeft => "FrontLL",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reading of all eight IR channels.
///
/// Values are validated on construction: finite and non-negative.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorFrame {
    /// Capture time in microseconds (source-defined epoch)
    timestamp_us: u64,
    values: [f32; CHANNEL_COUNT],
}

impl SensorFrame {
    /// Build a frame from a raw reading in channel index order.
    ///
    /// Rejects NaN, infinite and negative values with `SensorRead`.
    pub fn new(timestamp_us: u64, values: [f32; CHANNEL_COUNT]) -> Result<Self> {
        for channel in Channel::ALL {
            let v = values[channel.index()];
            if !v.is_finite() || v < 0.0 {
                return Err(VighnaError::SensorRead(format!(
                    "invalid {} reading: {}",
                    channel, v
                )));
            }
        }
        Ok(Self {
            timestamp_us,
            values,
        })
    }

    /// Build a frame from a slice, which must hold exactly eight values.
    pub fn from_slice(timestamp_us: u64, values: &[f32]) -> Result<Self> {
        let values: [f32; CHANNEL_COUNT] = values.try_into().map_err(|_| {
            VighnaError::SensorRead(format!(
                "expected {} channel values, got {}",
                CHANNEL_COUNT,
                values.len()
            ))
        })?;
        Self::new(timestamp_us, values)
    }

    /// Frame with every channel at zero (nothing in range).
    pub fn clear(timestamp_us: u64) -> Self {
        Self {
            timestamp_us,
            values: [0.0; CHANNEL_COUNT],
        }
    }

    /// Copy of this frame with one channel replaced.
    pub fn with(mut self, channel: Channel, value: f32) -> Result<Self> {
        self.values[channel.index()] = value;
        Self::new(self.timestamp_us, self.values)
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> f32 {
        self.values[channel.index()]
    }

    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    /// Raw values in channel index order.
    #[inline]
    pub fn values(&self) -> &[f32; CHANNEL_COUNT] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index_order() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
        assert_eq!(Channel::FrontCenter.index(), 4);
        assert_eq!(Channel::FrontLeftLeft.index(), 7);
    }

    #[test]
    fn test_frame_rejects_invalid_values() {
        let mut values = [0.0; CHANNEL_COUNT];
        values[Channel::FrontCenter.index()] = f32::NAN;
        assert!(matches!(
            SensorFrame::new(0, values),
            Err(VighnaError::SensorRead(_))
        ));

        values[Channel::FrontCenter.index()] = -1.0;
        assert!(SensorFrame::new(0, values).is_err());

        assert!(SensorFrame::from_slice(0, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_frame_accessors() {
        let frame = SensorFrame::clear(42)
            .with(Channel::BackCenter, 61.5)
            .unwrap();
        assert_eq!(frame.timestamp_us(), 42);
        assert_eq!(frame.get(Channel::BackCenter), 61.5);
        assert_eq!(frame.get(Channel::FrontCenter), 0.0);
        assert_eq!(frame.values()[6], 61.5);
    }

    #[test]
    fn test_channel_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            channel: Channel,
        }
        let w: Wrapper = toml::from_str(r#"channel = "front_right_right""#).unwrap();
        assert_eq!(w.channel, Channel::FrontRightRight);
    }
}
