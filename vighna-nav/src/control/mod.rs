//! Reactive avoidance controller.
//!
//! Leaf-first:
//!
//! - [`profile`]: validated thresholds and maneuver parameters
//! - [`classifier`]: frame → category, fixed priority
//! - [`escalation`]: consecutive-dodge counters and forced recoveries
//! - [`maneuver`]: category → timed drive commands
//! - [`episode`]: the per-episode loop tying them together

pub mod classifier;
pub mod episode;
pub mod escalation;
pub mod maneuver;
pub mod profile;

pub use classifier::{Category, Correction, TurnDirection, classify};
pub use episode::{
    DodgeEvent, EpisodeConfig, EpisodeLog, EpisodeOutcome, EpisodeRunner, EpisodeState,
    EpisodeSummary, FinishReason, StepRecord,
};
pub use escalation::{EscalationState, EscalationTracker, ForcedRecovery};
pub use maneuver::{Maneuver, ManeuverExecutor};
pub use profile::{ProfileSpec, ThresholdProfile};
