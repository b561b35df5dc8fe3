//! Progression history export.
//!
//! Writes a user's progression rows as CSV (one row per compared scan, column
//! names matching the `progression` table) or as a pretty-printed JSON array.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::models::{Category, ProgressionRecord};

/// Export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// JSON array of records
    Json,
}

const CSV_HEADER: [&str; 14] = [
    "progression_id",
    "scan_id",
    "scan_date",
    "days_since_baseline",
    "overall_score",
    "overall_score_delta",
    "shoulder_score_delta",
    "v_taper_score_delta",
    "core_score_delta",
    "symmetry_score_delta",
    "chest_score_delta",
    "posture_score_delta",
    "arms_score_delta",
    "notes",
];

/// Write progression records to any writer.
pub fn write_progression<W: Write>(records: &[ProgressionRecord], format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(records, writer),
        ExportFormat::Json => write_json(records, writer),
    }
}

/// Write progression records to `file_path`, creating parent directories.
pub fn write_progression_to_file(records: &[ProgressionRecord], format: ExportFormat, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let file = File::create(file_path)?;
    write_progression(records, format, BufWriter::new(file))
}

fn write_csv<W: Write>(records: &[ProgressionRecord], writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;

    for record in records {
        let mut row = vec![
            record.progression_id.to_string(),
            record.scan_id.to_string(),
            record.scan_date.to_rfc3339(),
            record.days_since_baseline.to_string(),
            record.overall_score.to_string(),
            record.deltas.overall.to_string(),
        ];
        // Category columns follow evaluation order
        row.extend(Category::ALL.iter().map(|c| record.deltas.get(*c).to_string()));
        row.push(record.notes.clone().unwrap_or_default());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(records: &[ProgressionRecord], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
