//! Episode export: directory layout, CSV replay, metadata and plot.

use std::fs;
use tempfile::TempDir;

use vighna_nav::control::episode::run_episodes;
use vighna_nav::control::{
    EpisodeConfig, EpisodeRunner, FinishReason, Maneuver, ThresholdProfile,
};
use vighna_nav::output::OutputLayout;
use vighna_nav::output::csv::{self, read_frames};
use vighna_nav::{Channel, ScriptedRobot, SensorFrame, VighnaConfig};

fn frame(t: u64, front_center: f32, back_center: f32) -> SensorFrame {
    SensorFrame::clear(t)
        .with(Channel::FrontCenter, front_center)
        .unwrap()
        .with(Channel::BackCenter, back_center)
        .unwrap()
}

fn script() -> Vec<SensorFrame> {
    vec![
        frame(0, 12.5, 0.0),
        frame(350_000, 40.25, 3.5),
        frame(1_200_000, 261.0, 0.0),
        frame(2_900_000, 2.0, 75.0),
    ]
}

fn episode(steps: u32) -> EpisodeConfig {
    EpisodeConfig {
        steps,
        settle_ms: 0,
        stop_after_wall_dodges: None,
    }
}

#[test]
fn episode_writes_all_three_files() {
    let dir = TempDir::new().unwrap();
    let profile = ThresholdProfile::simulation();
    let mut robot = ScriptedRobot::new(script());
    let outcome = EpisodeRunner::new(&mut robot, &profile, episode(4)).run();

    let layout = OutputLayout::new(dir.path(), "20250101-120000", false, "corner", 1);
    let files = layout.write_episode(0, &outcome).unwrap();

    assert_eq!(
        files.dir,
        dir.path()
            .join("grouped_data")
            .join("20250101-120000_hard_corner")
    );
    assert!(files.csv.ends_with("data_20250101-120000.csv"));
    assert!(files.plot.ends_with("sensor_plot_20250101-120000.svg"));
    assert!(files.csv.exists());
    assert!(files.metadata.exists());

    let svg = fs::read_to_string(&files.plot).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn exported_csv_replays_identically() {
    let dir = TempDir::new().unwrap();
    let profile = ThresholdProfile::simulation();
    let mut robot = ScriptedRobot::new(script());
    let recorded = EpisodeRunner::new(&mut robot, &profile, episode(4)).run();

    let layout = OutputLayout::new(dir.path(), "20250101-120000", false, "corner", 1);
    let files = layout.write_episode(0, &recorded).unwrap();

    assert_eq!(read_frames(&files.csv).unwrap(), script());

    let mut replay = ScriptedRobot::from_csv(&files.csv).unwrap();
    let replayed = EpisodeRunner::new(&mut replay, &profile, episode(4)).run();

    let maneuvers = |records: &[vighna_nav::control::StepRecord]| -> Vec<Maneuver> {
        records.iter().map(|r| r.maneuver).collect()
    };
    assert_eq!(
        maneuvers(replayed.log.records()),
        maneuvers(recorded.log.records())
    );
    assert_eq!(replay.commands(), robot.commands());
}

#[test]
fn replay_runs_up_to_a_malformed_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data_partial.csv");
    fs::write(
        &path,
        format!(
            "{}\n0,0,0,0,20,0,0,0,0,0,cruise,0\n0,0,0,0,40,0,0,0,0,1,obstacle_dodge_right,350000\n0,0,0,0,x,0,0,0,0,0,cruise,700000\n",
            csv::header()
        ),
    )
    .unwrap();

    let profile = ThresholdProfile::simulation();
    let mut robot = ScriptedRobot::from_csv(&path).unwrap();
    let outcome = EpisodeRunner::new(&mut robot, &profile, episode(10)).run();

    assert_eq!(outcome.summary.steps_run, 2);
    assert_eq!(outcome.log.len(), 2);
    assert_eq!(outcome.summary.obstacle_dodges, 1);
    match outcome.summary.finish {
        FinishReason::SensorReadError(msg) => assert!(msg.contains("line 4")),
        other => panic!("unexpected finish: {:?}", other),
    }
}

#[test]
fn metadata_summarises_the_episode() {
    let dir = TempDir::new().unwrap();
    let profile = ThresholdProfile::simulation();
    let mut robot = ScriptedRobot::new(script());
    let outcome = EpisodeRunner::new(&mut robot, &profile, episode(10)).run();

    let layout = OutputLayout::new(dir.path(), "20250101-120000", false, "corner", 1);
    let files = layout.write_episode(0, &outcome).unwrap();

    let text = fs::read_to_string(&files.metadata).unwrap();
    let meta: toml::Value = toml::from_str(&text).unwrap();
    assert_eq!(meta["total_steps"].as_integer(), Some(4));
    assert_eq!(meta["obstacle_dodges"].as_integer(), Some(1));
    assert_eq!(meta["wall_dodges"].as_integer(), Some(1));
    assert_eq!(meta["simulated"].as_bool(), Some(false));
    assert_eq!(meta["arena"].as_str(), Some("corner"));
    assert!(
        meta["finish_reason"]
            .as_str()
            .unwrap()
            .starts_with("sensor_read_error")
    );
    assert!(meta.get("run").is_none());
    assert!(meta["profile"].is_table());

    let events = meta["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["kind"].as_str(), Some("obstacle_dodge_right"));
    assert_eq!(events[1]["kind"].as_str(), Some("wall_dodge_right"));
}

#[test]
fn multiple_runs_share_a_group_directory() {
    let dir = TempDir::new().unwrap();
    let profile = ThresholdProfile::simulation();
    let mut frames = script();
    frames.extend(script());
    let mut robot = ScriptedRobot::new(frames);

    let layout = OutputLayout::new(dir.path(), "20250101-120000", false, "corner", 2);
    let mut written = Vec::new();
    run_episodes(&mut robot, &profile, &episode(4), 2, |run, outcome| {
        written.push(layout.write_episode(run, outcome)?);
        Ok(())
    })
    .unwrap();

    let group = dir
        .path()
        .join("grouped_data")
        .join("runs2_20250101-120000");
    assert_eq!(written.len(), 2);
    for (i, files) in written.iter().enumerate() {
        assert_eq!(files.dir.parent(), Some(group.as_path()));
        assert!(files.dir.ends_with(format!("20250101-120000_hard_corner_run{}", i)));

        let meta: toml::Value =
            toml::from_str(&fs::read_to_string(&files.metadata).unwrap()).unwrap();
        assert_eq!(meta["run"].as_integer(), Some(i as i64));
    }
}

#[test]
fn config_file_drives_a_replay() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("vighna.toml");
    fs::write(
        &config_path,
        r#"
[profile]
preset = "hardware"
consecutive = 2

[episode]
steps = 3
settle_ms = 0

[output]
arena = "hallway"
"#,
    )
    .unwrap();

    let config = VighnaConfig::load(&config_path).unwrap();
    let profile = config.profile.resolve().unwrap();
    assert_eq!(profile.consecutive(), 2);
    assert_eq!(config.output.arena, "hallway");

    // 12.5 clears the hardware dodge threshold of 11
    let mut robot = ScriptedRobot::new(vec![frame(0, 12.5, 0.0); 3]);
    let outcome =
        EpisodeRunner::new(&mut robot, &profile, config.episode.episode_config()).run();
    let escalated: Vec<bool> = outcome
        .log
        .records()
        .iter()
        .map(|r| r.maneuver.is_escalated())
        .collect();
    assert_eq!(escalated, vec![false, true, false]);
}
