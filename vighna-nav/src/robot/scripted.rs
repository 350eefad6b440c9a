//! Scripted robot: replays recorded frames, records drive commands.
//!
//! Used for replaying a previous episode's CSV export and as the test double
//! for the controller. Drive commands return immediately. A malformed CSV row
//! stays in the script and fails acquisition when it comes up, so the steps
//! before it still run.

use std::collections::VecDeque;
use std::path::Path;

use super::{DriveCommand, Robot};
use crate::error::{Result, VighnaError};
use crate::output::csv;
use crate::sensors::SensorFrame;

/// One script entry: a frame, or the read error for its row
type Entry = std::result::Result<SensorFrame, String>;

/// Robot backed by a fixed frame script
#[derive(Clone, Debug, Default)]
pub struct ScriptedRobot {
    frames: VecDeque<Entry>,
    commands: Vec<DriveCommand>,
    acquired: usize,
    running: bool,
}

impl ScriptedRobot {
    /// Create a robot that yields `frames` in order, then fails acquisition.
    pub fn new(frames: Vec<SensorFrame>) -> Self {
        Self {
            frames: frames.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    /// Load a script from an episode CSV export.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let frames: VecDeque<Entry> = csv::read_rows(path)?
            .into_iter()
            .map(|row| row.map_err(|e| e.to_string()))
            .collect();
        let invalid = frames.iter().filter(|f| f.is_err()).count();
        if invalid > 0 {
            tracing::warn!("{} invalid rows in {}", invalid, path.display());
        }
        tracing::info!("Loaded {} frames from {}", frames.len(), path.display());
        Ok(Self {
            frames,
            ..Self::default()
        })
    }

    /// Inject more frames at the end of the script
    pub fn push_frame(&mut self, frame: SensorFrame) {
        self.frames.push_back(Ok(frame));
    }

    /// Every command issued so far, in order
    pub fn commands(&self) -> &[DriveCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Frames not yet acquired
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Frames acquired so far
    pub fn acquired(&self) -> usize {
        self.acquired
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Robot for ScriptedRobot {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.commands.push(DriveCommand::stop(0));
        self.running = false;
        Ok(())
    }

    fn acquire_frame(&mut self) -> Result<SensorFrame> {
        let frame = self
            .frames
            .pop_front()
            .ok_or_else(|| {
                VighnaError::SensorRead(format!(
                    "script exhausted after {} frames",
                    self.acquired
                ))
            })?
            .map_err(VighnaError::SensorRead)?;
        self.acquired += 1;
        Ok(frame)
    }

    fn drive(&mut self, command: DriveCommand) {
        self.commands.push(command);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}
