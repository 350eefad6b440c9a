//! Episode output files.
//!
//! Each episode gets its own directory under `<root>/grouped_data/`:
//!
//! ```text
//! grouped_data/
//! ├── 20250101-120000_sim_open_arena/            # single run
//! │   ├── data_20250101-120000.csv
//! │   ├── meta_data.toml
//! │   └── sensor_plot_20250101-120000.svg
//! └── runs5_20250101-120000/                     # several runs
//!     ├── 20250101-120000_sim_open_arena_run0/
//!     └── ...
//! ```

pub mod csv;
pub mod metadata;
pub mod plot;

pub use metadata::MetaData;
pub use plot::{PlotConfig, SensorPlot};

use std::path::PathBuf;

use crate::control::EpisodeOutcome;
use crate::error::Result;

/// Local timestamp used in directory and file names
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Directory naming for one invocation
#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
    timestamp: String,
    simulated: bool,
    arena: String,
    runs: u32,
}

/// Paths written for one episode
#[derive(Clone, Debug)]
pub struct EpisodeFiles {
    pub dir: PathBuf,
    pub csv: PathBuf,
    pub metadata: PathBuf,
    pub plot: PathBuf,
}

impl OutputLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        timestamp: impl Into<String>,
        simulated: bool,
        arena: impl Into<String>,
        runs: u32,
    ) -> Self {
        Self {
            root: root.into(),
            timestamp: timestamp.into(),
            simulated,
            arena: arena.into(),
            runs,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn arena(&self) -> &str {
        &self.arena
    }

    /// Directory for run `run` (0-based)
    pub fn run_dir(&self, run: u32) -> PathBuf {
        let kind = if self.simulated { "_sim" } else { "_hard" };
        let grouped = self.root.join("grouped_data");
        if self.runs > 1 {
            grouped
                .join(format!("runs{}_{}", self.runs, self.timestamp))
                .join(format!("{}{}_{}_run{}", self.timestamp, kind, self.arena, run))
        } else {
            grouped.join(format!("{}{}_{}", self.timestamp, kind, self.arena))
        }
    }

    /// Write CSV, metadata and plot for one episode.
    pub fn write_episode(&self, run: u32, outcome: &EpisodeOutcome) -> Result<EpisodeFiles> {
        let dir = self.run_dir(run);
        std::fs::create_dir_all(&dir)?;

        let files = EpisodeFiles {
            csv: dir.join(format!("data_{}.csv", self.timestamp)),
            metadata: dir.join("meta_data.toml"),
            plot: dir.join(format!("sensor_plot_{}.svg", self.timestamp)),
            dir,
        };

        csv::write_records(&files.csv, outcome.log.records())?;

        let run_index = (self.runs > 1).then_some(run);
        MetaData::new(&outcome.summary, &self.timestamp, &self.arena, run_index)
            .save(&files.metadata)?;

        let title = match run_index {
            Some(i) => format!("IR readings, run {}", i),
            None => "IR readings".to_string(),
        };
        SensorPlot::new(outcome.log.records(), PlotConfig::default())
            .with_title(title)
            .save(&files.plot)?;

        tracing::info!("Episode output saved to {}", files.dir.display());
        Ok(files)
    }
}
