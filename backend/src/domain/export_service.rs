//! Export of a child's daily points as CSV.
//!
//! Rows are `date,points`, oldest day first, with a header line. The file
//! name carries the child's nickname and the export date so repeated
//! exports do not overwrite each other.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use csv::Writer;
use shared::{Child, ChildProgress, ExportDailyPointsResponse};
use tracing::info;

/// Characters outside `[A-Za-z0-9_-]` become `_`; an empty result falls back to `child`
fn filename_safe(nickname: &str) -> String {
    let cleaned: String = nickname
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "child".to_string()
    } else {
        cleaned
    }
}

pub fn export_filename(child: &Child, now: &DateTime<FixedOffset>) -> String {
    format!("{}_daily_points_{}.csv", filename_safe(&child.nickname), now.format("%Y%m%d"))
}

pub fn daily_points_csv(progress: &ChildProgress) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["date", "points"])?;

    // BTreeMap keys are YYYY-MM-DD, so iteration order is chronological
    for (date, points) in &progress.daily_points {
        writer.write_record([date.as_str(), &points.to_string()])?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

pub fn export_daily_points(
    child: &Child,
    progress: &ChildProgress,
    now: &DateTime<FixedOffset>,
) -> Result<ExportDailyPointsResponse> {
    let csv_data = daily_points_csv(progress)?;
    let filename = export_filename(child, now);
    info!(
        "📄 EXPORT: {} days of points for {} as {}",
        progress.daily_points.len(),
        child.id,
        filename
    );
    Ok(ExportDailyPointsResponse { filename, csv_data })
}
