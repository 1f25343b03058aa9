use crate::domain::equipment::SummaryStats;
use crate::domain::error::{AppError, Result};
use crate::domain::history::NewHistoryEntry;
use crate::infrastructure::csv::EquipmentCsvParser;
use crate::infrastructure::db::HistoryRepository;
use crate::infrastructure::report::PdfReportRenderer;
use crate::infrastructure::stats::summarize;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// What the caller gets back after a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub stats: SummaryStats,
    /// Relative path to the generated PDF report.
    pub pdf_report: String,
    /// Data rows dropped for missing or non-numeric values.
    pub skipped_rows: usize,
}

/// End-to-end handling of one CSV upload: validate, summarize, render the
/// PDF, persist a history entry and trim. The only place that sequences
/// side effects; everything before the history insert leaves no state, so a
/// failed upload never shows up in history.
pub struct UploadUseCase {
    parser: EquipmentCsvParser,
    renderer: PdfReportRenderer,
    repository: Arc<HistoryRepository>,
    max_upload_bytes: usize,
}

impl UploadUseCase {
    pub fn new(
        renderer: PdfReportRenderer,
        repository: Arc<HistoryRepository>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            parser: EquipmentCsvParser::new(),
            renderer,
            repository,
            max_upload_bytes,
        }
    }

    /// `caller` is an opaque identity handed in by the web layer; it is
    /// logged but never inspected.
    pub async fn execute(
        &self,
        caller: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<UploadOutcome> {
        if bytes.is_empty() {
            return Err(AppError::MissingFile);
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::ValidationError(format!(
                "Upload exceeds the {} byte limit.",
                self.max_upload_bytes
            )));
        }

        let parsed = self.parser.parse_bytes(bytes)?;
        let stats = summarize(&parsed.records);

        let pdf_report = self.renderer.render(&stats, original_filename)?;

        let entry = self
            .repository
            .record(NewHistoryEntry {
                original_filename: original_filename.to_string(),
                summary: stats.summary_line(),
                pdf_path: pdf_report.clone(),
                uploaded_at: chrono::Utc::now().timestamp_millis(),
            })
            .await?;

        info!(
            caller,
            entry_id = entry.id,
            rows = stats.total_count,
            skipped = parsed.skipped_rows,
            report = %pdf_report,
            "Processed CSV upload"
        );

        Ok(UploadOutcome {
            stats,
            pdf_report,
            skipped_rows: parsed.skipped_rows,
        })
    }
}
