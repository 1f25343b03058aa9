use serde::{Deserialize, Serialize};

/// Persisted record of one past upload, capped at the most recent few by the
/// history repository. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub original_filename: String,
    /// Short description of the statistics from this upload.
    pub summary: String,
    /// Relative path to the generated PDF report.
    pub pdf_path: String,
    /// UTC milliseconds at creation time.
    pub uploaded_at: i64,
}

/// Data for a history entry before the database has assigned an id.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub original_filename: String,
    pub summary: String,
    pub pdf_path: String,
    pub uploaded_at: i64,
}
