//! Configuration loading for VighnaNav
//!
//! ```toml
//! [profile]
//! preset = "simulation"        # or "hardware"
//! consecutive = 5
//! clear_ahead = false          # disable the sprint rule
//! rear_side = 40               # enable with a custom threshold
//!
//! [profile.dodge]
//! front_center = 35
//!
//! [profile.drive.forward]
//! left = 60
//! right = 60
//! duration_ms = 300
//!
//! [episode]
//! steps = 200
//! runs = 5
//!
//! [simulation]
//! random_seed = 42
//!
//! [output]
//! root = "output"
//! arena = "similar_to_irl"
//! ```
//!
//! Every key is optional. Profile keys override the chosen preset.

use crate::control::EpisodeConfig;
use crate::control::profile::{DodgeTierSpec, DriveSpec, EscapeTierSpec, ProfileSpec};
use crate::control::ThresholdProfile;
use crate::error::{Result, VighnaError};
use crate::robot::sim::SimulationConfig;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VighnaConfig {
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub episode: EpisodeSection,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Tuned value set a profile starts from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Simulation,
    Hardware,
}

impl Preset {
    pub fn spec(self) -> ProfileSpec {
        match self {
            Preset::Simulation => ProfileSpec::simulation(),
            Preset::Hardware => ProfileSpec::hardware(),
        }
    }
}

/// Optional rule: `false` disables it, `true` keeps the preset threshold,
/// a number enables it with that threshold.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Toggle(bool),
    Threshold(f32),
}

impl RuleSetting {
    fn apply(self, preset: Option<f32>, fallback: f32) -> Option<f32> {
        match self {
            RuleSetting::Toggle(false) => None,
            RuleSetting::Toggle(true) => Some(preset.unwrap_or(fallback)),
            RuleSetting::Threshold(t) => Some(t),
        }
    }
}

/// Drive command overrides
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriveOverrides {
    pub forward: Option<DriveSpec>,
    pub backward: Option<DriveSpec>,
    pub turn_left: Option<DriveSpec>,
    pub turn_right: Option<DriveSpec>,
    pub sprint: Option<DriveSpec>,
    pub back_correction: Option<DriveSpec>,
    pub obstacle_recovery: Option<DriveSpec>,
    pub rear_blocked_recovery: Option<DriveSpec>,
    pub wall_recovery: Option<DriveSpec>,
}

/// Pause and hold overrides (milliseconds)
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingOverrides {
    pub stop_pause_ms: Option<i64>,
    pub wall_turn_ms: Option<i64>,
    pub wall_recovery_pause_ms: Option<i64>,
}

/// `[profile]` section
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(default)]
    pub preset: Preset,
    pub consecutive: Option<i64>,
    pub back_contact: Option<f32>,
    pub rear_side: Option<RuleSetting>,
    pub clear_ahead: Option<RuleSetting>,
    #[serde(default)]
    pub dodge: DodgeTierSpec,
    #[serde(default)]
    pub escape: EscapeTierSpec,
    #[serde(default)]
    pub drive: DriveOverrides,
    #[serde(default)]
    pub timing: TimingOverrides,
}

/// Threshold used when a rule is switched on but the preset has none
const DEFAULT_REAR_SIDE: f32 = 50.0;
const DEFAULT_CLEAR_AHEAD: f32 = 5.82;

impl ProfileConfig {
    /// Preset with overrides applied, before validation.
    pub fn spec(&self) -> ProfileSpec {
        let mut spec = self.preset.spec();

        if let Some(c) = self.consecutive {
            spec.consecutive = c;
        }
        if let Some(t) = self.back_contact {
            spec.back_contact = t;
        }
        if let Some(rule) = self.rear_side {
            spec.rear_side = rule.apply(spec.rear_side, DEFAULT_REAR_SIDE);
        }
        if let Some(rule) = self.clear_ahead {
            spec.clear_ahead = rule.apply(spec.clear_ahead, DEFAULT_CLEAR_AHEAD);
        }

        let d = &self.dodge;
        overlay(&mut spec.dodge.front_center, d.front_center);
        overlay(&mut spec.dodge.front_right_right, d.front_right_right);
        overlay(&mut spec.dodge.front_left_left, d.front_left_left);
        overlay(&mut spec.dodge.front_left_45, d.front_left_45);
        overlay(&mut spec.dodge.front_right_45, d.front_right_45);

        let e = &self.escape;
        overlay(&mut spec.escape.front_center, e.front_center);
        overlay(&mut spec.escape.front_right_right, e.front_right_right);
        overlay(&mut spec.escape.front_left_left, e.front_left_left);

        let drive = &self.drive;
        let target = &mut spec.drive;
        let pairs = [
            (&mut target.forward, drive.forward),
            (&mut target.backward, drive.backward),
            (&mut target.turn_left, drive.turn_left),
            (&mut target.turn_right, drive.turn_right),
            (&mut target.sprint, drive.sprint),
            (&mut target.back_correction, drive.back_correction),
            (&mut target.obstacle_recovery, drive.obstacle_recovery),
            (&mut target.rear_blocked_recovery, drive.rear_blocked_recovery),
            (&mut target.wall_recovery, drive.wall_recovery),
        ];
        for (slot, value) in pairs {
            if let Some(v) = value {
                *slot = v;
            }
        }

        let t = &self.timing;
        if let Some(ms) = t.stop_pause_ms {
            spec.timing.stop_pause_ms = ms;
        }
        if let Some(ms) = t.wall_turn_ms {
            spec.timing.wall_turn_ms = ms;
        }
        if let Some(ms) = t.wall_recovery_pause_ms {
            spec.timing.wall_recovery_pause_ms = ms;
        }

        spec
    }

    /// Validated profile. Fails with `Config` on any inconsistency.
    pub fn resolve(&self) -> Result<ThresholdProfile> {
        ThresholdProfile::new(&self.spec())
    }
}

fn overlay(slot: &mut Option<f32>, value: Option<f32>) {
    if value.is_some() {
        *slot = value;
    }
}

/// `[episode]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EpisodeSection {
    /// Step budget per episode (default: 100)
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Episodes to run back to back (default: 1)
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Stop held before the second acquisition (default: 1500)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u32,

    /// Finish an episode early after this many wall dodges
    #[serde(default)]
    pub stop_after_wall_dodges: Option<u32>,
}

impl Default for EpisodeSection {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            runs: default_runs(),
            settle_ms: default_settle_ms(),
            stop_after_wall_dodges: None,
        }
    }
}

impl EpisodeSection {
    pub fn episode_config(&self) -> EpisodeConfig {
        EpisodeConfig {
            steps: self.steps,
            settle_ms: self.settle_ms,
            stop_after_wall_dodges: self.stop_after_wall_dodges,
        }
    }
}

/// `[output]` section
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Root directory; episodes land under `<root>/grouped_data/`
    #[serde(default = "default_output_root")]
    pub root: String,

    /// Arena label used in directory names
    #[serde(default = "default_arena")]
    pub arena: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            arena: default_arena(),
        }
    }
}

// Default value functions
fn default_steps() -> u32 {
    100
}
fn default_runs() -> u32 {
    1
}
fn default_settle_ms() -> u32 {
    1500
}
fn default_output_root() -> String {
    "output".to_string()
}
fn default_arena() -> String {
    "open_arena".to_string()
}

impl VighnaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VighnaError::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: VighnaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not need the profile to be resolved
    pub fn validate(&self) -> Result<()> {
        if self.episode.runs == 0 {
            return Err(VighnaError::Config("episode.runs must be at least 1".into()));
        }
        if self.output.arena.is_empty() || self.output.arena.contains(['/', '\\']) {
            return Err(VighnaError::Config(format!(
                "output.arena must be a plain name, got {:?}",
                self.output.arena
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::DriveCommand;
    use crate::sensors::Channel;

    #[test]
    fn test_empty_config_is_simulation_preset() {
        let config = VighnaConfig::parse("").unwrap();
        assert_eq!(config.profile.preset, Preset::Simulation);
        assert_eq!(config.episode.steps, 100);
        assert_eq!(config.episode.runs, 1);
        assert_eq!(config.output.root, "output");
        assert_eq!(
            config.profile.resolve().unwrap(),
            ThresholdProfile::simulation()
        );
    }

    #[test]
    fn test_overrides_apply_on_top_of_preset() {
        let toml_content = r#"
[profile]
preset = "hardware"
consecutive = 3
clear_ahead = false
rear_side = 40

[profile.dodge]
front_center = 12

[profile.drive.forward]
left = 60
right = 60
duration_ms = 300

[profile.timing]
wall_turn_ms = 900
"#;
        let config = VighnaConfig::parse(toml_content).unwrap();
        let profile = config.profile.resolve().unwrap();

        assert_eq!(profile.consecutive(), 3);
        assert_eq!(profile.clear_ahead(), None);
        assert_eq!(profile.rear_side(), Some(40.0));
        assert_eq!(profile.dodge().get(Channel::FrontCenter), Some(12.0));
        // Untouched channels keep the hardware preset
        assert_eq!(profile.dodge().get(Channel::FrontRightRight), Some(15.0));
        assert_eq!(profile.escape().get(Channel::FrontCenter), Some(90.0));
        assert_eq!(profile.forward(), DriveCommand::new(60, 60, 300));
        assert_eq!(profile.wall_turn_ms(), 900);
    }

    #[test]
    fn test_rule_toggle_true_keeps_preset_value() {
        let config = VighnaConfig::parse("[profile]\nclear_ahead = true\n").unwrap();
        assert_eq!(config.profile.resolve().unwrap().clear_ahead(), Some(5.82));
    }

    #[test]
    fn test_invalid_profile_is_config_error() {
        let toml_content = r#"
[profile.escape]
front_center = 10
"#;
        let config = VighnaConfig::parse(toml_content).unwrap();
        assert!(matches!(
            config.profile.resolve(),
            Err(VighnaError::Config(_))
        ));

        let config = VighnaConfig::parse("[profile]\nconsecutive = 0\n").unwrap();
        assert!(config.profile.resolve().is_err());
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_sections() {
        assert!(matches!(
            VighnaConfig::parse("[profile.escape]\nfront_left_45 = 300\n"),
            Err(VighnaError::Config(_))
        ));
        assert!(VighnaConfig::parse("[episode]\nruns = 0\n").is_err());
        assert!(VighnaConfig::parse("[output]\narena = \"a/b\"\n").is_err());
        assert!(VighnaConfig::parse("[profile]\npreset = \"lab\"\n").is_err());
    }

    #[test]
    fn test_episode_section() {
        let config = VighnaConfig::parse(
            "[episode]\nsteps = 200\nsettle_ms = 0\nstop_after_wall_dodges = 4\n",
        )
        .unwrap();
        let episode = config.episode.episode_config();
        assert_eq!(episode.steps, 200);
        assert_eq!(episode.settle_ms, 0);
        assert_eq!(episode.stop_after_wall_dodges, Some(4));
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = VighnaConfig::parse(include_str!("../vighna.toml")).unwrap();
        assert_eq!(
            config.profile.resolve().unwrap(),
            ThresholdProfile::simulation()
        );
        assert_eq!(config.simulation.arena.obstacles.len(), 3);
        assert_eq!(config.simulation.ir.noise_stddev, 0.2);
        assert_eq!(config.output.arena, "open_arena");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            VighnaConfig::load(Path::new("/nonexistent/vighna.toml")),
            Err(VighnaError::Config(_))
        ));
    }
}
