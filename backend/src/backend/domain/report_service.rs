//! Per-student lesson reports and their CSV export.

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::commands::reports::{ReportExport, StudentReport, StudentReportEntry};
use super::errors::{TrackerError, TrackerResult};
use super::models::TrackerState;

#[derive(Debug, Clone, Default)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// The student's `count` most recent lessons, newest first
    pub fn student_report(&self, state: &TrackerState, student_id: &str, count: usize) -> TrackerResult<StudentReport> {
        if count == 0 {
            return Err(TrackerError::InvalidInput("Report must include at least one lesson".to_string()));
        }
        let student = state.student(student_id)?;

        let entries: Vec<StudentReportEntry> = state
            .lessons_for_student(student_id)
            .into_iter()
            .rev()
            .take(count)
            .map(|l| StudentReportEntry {
                date: l.date,
                hour: l.hour,
                price: l.price,
                duration: l.duration,
            })
            .collect();

        info!(
            "Report for {}: {} of {} requested lessons",
            student.name,
            entries.len(),
            count
        );
        Ok(StudentReport {
            student_name: student.name.clone(),
            requested_count: count,
            entries,
        })
    }

    /// Render a report as CSV; the filename carries the student name and `today`
    pub fn export_report_csv(
        &self,
        state: &TrackerState,
        student_id: &str,
        count: usize,
        today: NaiveDate,
    ) -> TrackerResult<ReportExport> {
        let report = self.student_report(state, student_id, count)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["date", "hour", "duration_hours", "price"])
            .context("Failed to write report header")?;
        for entry in &report.entries {
            writer
                .write_record([
                    entry.date.format("%Y-%m-%d").to_string(),
                    entry.hour.format("%H:%M").to_string(),
                    entry.duration.to_string(),
                    format!("{:.2}", entry.price),
                ])
                .context("Failed to write report row")?;
        }
        let total = format!("{:.2}", report.total_price());
        writer
            .write_record(["total", "", "", total.as_str()])
            .context("Failed to write report total")?;
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush report: {}", e))?;
        let csv_content = String::from_utf8(bytes).context("Report is not valid UTF-8")?;

        let filename = format!(
            "{}_lessons_{}.csv",
            report.student_name.trim().replace(' ', "_").to_lowercase(),
            today.format("%Y%m%d")
        );

        info!(
            "Exported {} lessons for {} as {} ({} bytes)",
            report.entries.len(),
            report.student_name,
            filename,
            csv_content.len()
        );
        Ok(ReportExport {
            csv_content,
            filename,
            lesson_count: report.entries.len(),
            student_name: report.student_name,
        })
    }

    /// Write an export into `directory`, or the user's Documents folder
    pub fn write_export(&self, export: &ReportExport, directory: Option<&Path>) -> TrackerResult<PathBuf> {
        let export_dir = match directory {
            Some(dir) => dir.to_path_buf(),
            None => dirs::document_dir()
                .or_else(dirs::home_dir)
                .ok_or_else(|| anyhow!("Could not determine a default export directory"))?,
        };

        fs::create_dir_all(&export_dir)
            .with_context(|| format!("Failed to create export directory {}", export_dir.display()))?;
        let file_path = export_dir.join(&export.filename);
        fs::write(&file_path, &export.csv_content).map_err(|e| {
            error!("Failed to write export file {}: {}", file_path.display(), e);
            anyhow!("Failed to write export file {}: {}", file_path.display(), e)
        })?;

        info!("Wrote report for {} to {}", export.student_name, file_path.display());
        Ok(file_path)
    }
}
