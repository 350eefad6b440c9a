//! SVG line chart of IR readings over an episode.
//!
//! One polyline per channel, with dodge steps marked as vertical bands:
//! orange for obstacle dodges, red for wall dodges.

use std::fmt::Write;
use std::path::Path;

use crate::control::StepRecord;
use crate::error::Result;
use crate::sensors::Channel;

/// Line colors in channel index order
const CHANNEL_COLORS: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

/// Chart layout
#[derive(Clone, Debug)]
pub struct PlotConfig {
    pub width: f32,
    pub height: f32,
    /// Space around the plot area for axes and labels (pixels)
    pub padding: f32,
    pub line_width: f32,
    pub obstacle_color: &'static str,
    pub wall_color: &'static str,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 450.0,
            padding: 60.0,
            line_width: 1.5,
            obstacle_color: "#FFD8A8",
            wall_color: "#FFB3B3",
        }
    }
}

/// Sensor chart builder
pub struct SensorPlot<'a> {
    config: PlotConfig,
    records: &'a [StepRecord],
    title: Option<String>,
}

impl<'a> SensorPlot<'a> {
    pub fn new(records: &'a [StepRecord], config: PlotConfig) -> Self {
        Self {
            config,
            records,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Render to an SVG document
    pub fn render(&self) -> String {
        let c = &self.config;
        let plot_w = c.width - 2.0 * c.padding;
        let plot_h = c.height - 2.0 * c.padding;
        let steps = self.records.len().max(2) - 1;
        let y_max = self
            .records
            .iter()
            .flat_map(|r| r.frame.values().iter().copied())
            .fold(1.0f32, f32::max);

        let x_of = |i: usize| c.padding + plot_w * i as f32 / steps as f32;
        let y_of = |v: f32| c.padding + plot_h * (1.0 - v / y_max);

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            c.width, c.height, c.width, c.height
        )
        .unwrap();
        writeln!(
            svg,
            r#"<rect width="100%" height="100%" fill="white"/>"#
        )
        .unwrap();

        // Dodge bands
        let band_w = (plot_w / steps as f32).max(1.0);
        for (i, record) in self.records.iter().enumerate() {
            let color = if record.was_wall_dodge() {
                c.wall_color
            } else if record.was_obstacle_dodge() {
                c.obstacle_color
            } else {
                continue;
            };
            writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                x_of(i) - band_w / 2.0,
                c.padding,
                band_w,
                plot_h,
                color
            )
            .unwrap();
        }

        // Axes
        writeln!(
            svg,
            r#"<line x1="{0:.1}" y1="{1:.1}" x2="{0:.1}" y2="{2:.1}" stroke="black"/>"#,
            c.padding,
            c.padding,
            c.padding + plot_h
        )
        .unwrap();
        writeln!(
            svg,
            r#"<line x1="{0:.1}" y1="{1:.1}" x2="{2:.1}" y2="{1:.1}" stroke="black"/>"#,
            c.padding,
            c.padding + plot_h,
            c.padding + plot_w
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">Steps</text>"#,
            c.padding + plot_w / 2.0,
            c.height - c.padding / 3.0
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text x="{0:.1}" y="{1:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 {0:.1} {1:.1})">IR Sensor Values</text>"#,
            c.padding / 3.0,
            c.padding + plot_h / 2.0
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{:.0}</text>"#,
            c.padding - 4.0,
            c.padding + 4.0,
            y_max
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">0</text>"#,
            c.padding - 4.0,
            c.padding + plot_h
        )
        .unwrap();

        if let Some(ref title) = self.title {
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="16" text-anchor="middle">{}</text>"#,
                c.width / 2.0,
                c.padding / 2.0,
                title
            )
            .unwrap();
        }

        // Channel lines
        for channel in Channel::ALL {
            if self.records.is_empty() {
                break;
            }
            let points: Vec<String> = self
                .records
                .iter()
                .enumerate()
                .map(|(i, r)| format!("{:.1},{:.1}", x_of(i), y_of(r.frame.get(channel))))
                .collect();
            writeln!(
                svg,
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                points.join(" "),
                CHANNEL_COLORS[channel.index()],
                c.line_width
            )
            .unwrap();
        }

        // Legend
        for channel in Channel::ALL {
            let y = c.padding + 14.0 * channel.index() as f32;
            let x = c.width - c.padding + 8.0;
            writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="2"/>"#,
                x,
                y,
                x + 12.0,
                y,
                CHANNEL_COLORS[channel.index()]
            )
            .unwrap();
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="10">{}</text>"#,
                x + 16.0,
                y + 3.0,
                channel.label()
            )
            .unwrap();
        }

        svg.push_str("</svg>\n");
        svg
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}
