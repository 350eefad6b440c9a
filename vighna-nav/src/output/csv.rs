//! Episode CSV export and replay import.
//!
//! One row per executed step:
//!
//! ```text
//! BackL,BackR,FrontL,FrontR,FrontC,FrontRR,BackC,FrontLL,WallDodge,ObstacleDodge,Maneuver,TimestampUs
//! 0.12,0,3.4,2.9,41.2,1.1,0,0.8,0,1,obstacle_dodge_right,350000
//! ```
//!
//! The reader locates the eight channel columns by header label, so exports
//! that stop after `ObstacleDodge` replay too. A missing timestamp column
//! falls back to the row index.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::control::StepRecord;
use crate::error::{Result, VighnaError};
use crate::sensors::{CHANNEL_COUNT, Channel, SensorFrame};

const TIMESTAMP_COLUMN: &str = "TimestampUs";

/// Header line, without the trailing newline
pub fn header() -> String {
    let mut columns: Vec<&str> = Channel::ALL.iter().map(|c| c.label()).collect();
    columns.extend(["WallDodge", "ObstacleDodge", "Maneuver", TIMESTAMP_COLUMN]);
    columns.join(",")
}

/// Write an episode's records to `path`.
pub fn write_records(path: &Path, records: &[StepRecord]) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{}", header())?;
    for record in records {
        for value in record.frame.values() {
            write!(file, "{},", value)?;
        }
        writeln!(
            file,
            "{},{},{},{}",
            u8::from(record.was_wall_dodge()),
            u8::from(record.was_obstacle_dodge()),
            record.maneuver,
            record.frame.timestamp_us()
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Read sensor frames back from an exported CSV.
///
/// Fails on the first invalid row. Use [`read_rows`] to keep the rows
/// before it.
pub fn read_frames(path: &Path) -> Result<Vec<SensorFrame>> {
    read_rows(path)?.into_iter().collect()
}

/// Read an exported CSV row by row.
///
/// The outer error covers the file and its header. Each row carries its own
/// result, so a malformed row only fails when it is reached.
pub fn read_rows(path: &Path) -> Result<Vec<Result<SensorFrame>>> {
    let file = File::open(path).map_err(|e| {
        VighnaError::SensorRead(format!("cannot open {}: {}", path.display(), e))
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(VighnaError::SensorRead(format!(
                "{} is empty",
                path.display()
            )));
        }
    };
    let columns = Columns::locate(&header, path)?;

    let mut rows = Vec::new();
    for (row, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(columns.parse(&line, row));
    }
    Ok(rows)
}

/// Column positions found in the header
struct Columns {
    channels: [usize; CHANNEL_COUNT],
    timestamp: Option<usize>,
}

impl Columns {
    fn locate(header: &str, path: &Path) -> Result<Self> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let mut channels = [0usize; CHANNEL_COUNT];
        for channel in Channel::ALL {
            channels[channel.index()] = names
                .iter()
                .position(|&c| c == channel.label())
                .ok_or_else(|| {
                    VighnaError::SensorRead(format!(
                        "missing column {} in {}",
                        channel,
                        path.display()
                    ))
                })?;
        }
        Ok(Self {
            channels,
            timestamp: names.iter().position(|&c| c == TIMESTAMP_COLUMN),
        })
    }

    /// Parse data row `row` (0-based, header excluded).
    fn parse(&self, line: &str, row: usize) -> Result<SensorFrame> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let line_no = row + 2;

        let mut values = [0.0f32; CHANNEL_COUNT];
        for channel in Channel::ALL {
            let field = fields.get(self.channels[channel.index()]).ok_or_else(|| {
                VighnaError::SensorRead(format!("line {}: missing {} value", line_no, channel))
            })?;
            values[channel.index()] = field.parse().map_err(|_| {
                VighnaError::SensorRead(format!(
                    "line {}: invalid {} value {:?}",
                    line_no, channel, field
                ))
            })?;
        }

        let timestamp_us = match self.timestamp.and_then(|i| fields.get(i)) {
            Some(field) => field.parse().map_err(|_| {
                VighnaError::SensorRead(format!("line {}: invalid timestamp {:?}", line_no, field))
            })?,
            None => row as u64,
        };
        SensorFrame::new(timestamp_us, values)
            .map_err(|e| VighnaError::SensorRead(format!("line {}: {}", line_no, e)))
    }
}
