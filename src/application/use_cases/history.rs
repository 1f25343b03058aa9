use crate::domain::error::Result;
use crate::domain::history::HistoryEntry;
use crate::infrastructure::db::HistoryRepository;
use std::sync::Arc;

/// Read side of the upload history, feeding the "Recent uploads" panels on
/// the web and desktop frontends.
pub struct HistoryUseCase {
    repository: Arc<HistoryRepository>,
}

impl HistoryUseCase {
    pub fn new(repository: Arc<HistoryRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_recent(&self) -> Result<Vec<HistoryEntry>> {
        self.repository.list_recent().await
    }
}
