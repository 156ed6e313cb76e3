use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::release::ReleaseRecord;

pub const CSV_HEADER: [&str; 10] = [
    "artist", "title", "label", "catno", "format", "genre", "style", "tracks", "date", "images",
];

/// Keep alphanumerics, space, underscore and hyphen
pub fn safe_file_component(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `"{artist} - {title} ({date})"`, without extension
pub fn individual_file_stem(record: &ReleaseRecord) -> String {
    format!(
        "{} - {} ({})",
        safe_file_component(&record.artist),
        safe_file_component(&record.title),
        record.date
    )
}

/// `"{artist} - {title} ({date}).csv"`
pub fn individual_file_name(record: &ReleaseRecord) -> String {
    format!("{}.csv", individual_file_stem(record))
}

/// `{stem}.csv` in `dir`, or `{stem} (N).csv` with the lowest N >= 2 not yet taken
fn unused_csv_path(dir: &Path, stem: &str) -> PathBuf {
    let mut path = dir.join(format!("{}.csv", stem));
    let mut counter = 2;
    while path.exists() {
        path = dir.join(format!("{} ({}).csv", stem, counter));
        counter += 1;
    }
    path
}

pub fn combined_file_name(timestamp: &DateTime<Local>) -> String {
    format!("Combined CSV ({}).csv", timestamp.format("%Y%m%d_%H%M%S"))
}

fn write_records<'a>(path: &Path, records: impl IntoIterator<Item = &'a ReleaseRecord>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(record.fields())?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file '{}'", path.display()))?;
    Ok(())
}

/// Write one record to its own file in `dir`. An existing file with the same
/// name is never overwritten; a counter is appended instead.
pub fn save_individual_csv(record: &ReleaseRecord, dir: &Path) -> Result<PathBuf> {
    let path = unused_csv_path(dir, &individual_file_stem(record));
    write_records(&path, [record])?;
    info!("CSV saved: {}", path.display());
    Ok(path)
}

/// Write all records to one timestamped file in `dir`
pub fn save_combined_csv(records: &[ReleaseRecord], dir: &Path) -> Result<PathBuf> {
    let path = dir.join(combined_file_name(&Local::now()));
    write_records(&path, records)?;
    info!("Combined CSV saved: {}", path.display());
    Ok(path)
}
