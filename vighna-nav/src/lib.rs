//! VighnaNav - reactive IR obstacle avoidance
//!
//! Keeps a differential-drive robot with eight IR proximity sensors moving
//! forward without collisions. Each step classifies one sensor frame against
//! tiered thresholds (dodge range vs wall contact), executes a fixed timed
//! maneuver, and forces a larger recovery when the same kind of dodge keeps
//! repeating.
//!
//! ## Modules
//!
//! - [`sensors`]: IR channels and validated sensor frames
//! - [`control`]: profile, classifier, escalation, maneuvers, episode loop
//! - [`robot`]: the [`Robot`](robot::Robot) interface with simulated and
//!   scripted implementations
//! - [`output`]: CSV, metadata and plot export
//! - [`config`]: TOML configuration

pub mod config;
pub mod control;
pub mod error;
pub mod output;
pub mod robot;
pub mod sensors;

pub use config::VighnaConfig;
pub use control::{EpisodeConfig, EpisodeRunner, ThresholdProfile};
pub use error::{Result, VighnaError};
pub use robot::{DriveCommand, Robot, ScriptedRobot, SimulatedRobot};
pub use sensors::{Channel, SensorFrame};
