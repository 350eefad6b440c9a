//! Episode summary metadata (`meta_data.toml`).

use serde::Serialize;
use std::path::Path;

use crate::control::{DodgeEvent, EpisodeSummary, ThresholdProfile};
use crate::error::Result;

/// Everything recorded about one episode besides the per-step rows
#[derive(Debug, Serialize)]
pub struct MetaData<'a> {
    pub date_time: &'a str,
    pub simulated: bool,
    pub arena: &'a str,
    /// Run index when several runs were requested
    pub run: Option<u32>,
    pub total_steps: u32,
    pub obstacle_dodges: u32,
    pub wall_dodges: u32,
    pub finish_reason: String,
    pub profile: &'a ThresholdProfile,
    pub events: &'a [DodgeEvent],
}

impl<'a> MetaData<'a> {
    pub fn new(
        summary: &'a EpisodeSummary,
        date_time: &'a str,
        arena: &'a str,
        run: Option<u32>,
    ) -> Self {
        Self {
            date_time,
            simulated: summary.simulated,
            arena,
            run,
            total_steps: summary.steps_run,
            obstacle_dodges: summary.obstacle_dodges,
            wall_dodges: summary.wall_dodges,
            finish_reason: summary.finish.to_string(),
            profile: &summary.profile,
            events: &summary.events,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
