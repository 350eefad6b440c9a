//! Robot capability interface.
//!
//! The controller only ever talks to a [`Robot`]: one blocking sensor read
//! per step, blocking timed drive commands, and lifecycle hooks that the
//! caller uses to bracket an episode. It never asks which implementation it
//! holds.
//!
//! - [`SimulatedRobot`]: differential-drive simulation with ray-cast IR sensors
//! - [`ScriptedRobot`]: replays recorded frames and records issued commands

mod scripted;
pub mod sim;

pub use scripted::ScriptedRobot;
pub use sim::SimulatedRobot;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sensors::SensorFrame;

/// One timed wheel command: left speed, right speed, duration.
///
/// Speeds are in the robot's native wheel units (positive = forward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub left: i32,
    pub right: i32,
    pub duration_ms: u32,
}

impl DriveCommand {
    pub const fn new(left: i32, right: i32, duration_ms: u32) -> Self {
        Self {
            left,
            right,
            duration_ms,
        }
    }

    /// Zero-speed command held for `duration_ms`.
    pub const fn stop(duration_ms: u32) -> Self {
        Self::new(0, 0, duration_ms)
    }

    /// Same wheel speeds, different duration.
    pub const fn held_for(self, duration_ms: u32) -> Self {
        Self::new(self.left, self.right, duration_ms)
    }

    pub fn is_stop(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Robot or simulator handle used by the controller.
pub trait Robot {
    /// Bring the robot up before an episode (e.g. start the simulation).
    fn start(&mut self) -> Result<()>;

    /// Shut the robot down after an episode. Must leave the wheels stopped.
    fn stop(&mut self) -> Result<()>;

    /// One blocking read of all eight IR channels.
    ///
    /// Fails with `VighnaError::SensorRead` when no valid frame is available.
    fn acquire_frame(&mut self) -> Result<SensorFrame>;

    /// Issue a wheel command and block until its duration has elapsed.
    fn drive(&mut self, command: DriveCommand);

    /// True for simulated robots; used only to label output.
    fn is_simulated(&self) -> bool;
}

impl<R: Robot + ?Sized> Robot for Box<R> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn acquire_frame(&mut self) -> Result<SensorFrame> {
        (**self).acquire_frame()
    }

    fn drive(&mut self, command: DriveCommand) {
        (**self).drive(command)
    }

    fn is_simulated(&self) -> bool {
        (**self).is_simulated()
    }
}
