use crate::domain::error::{AppError, Result};
use crate::domain::history::{HistoryEntry, NewHistoryEntry};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// SQLite-backed store of past uploads.
///
/// The retention limit is an invariant of `record`, not a separate cleanup
/// job: insert and trim commit in one transaction, so the table never holds
/// more than `retain` rows at rest.
pub struct HistoryRepository {
    pool: SqlitePool,
    retain: i64,
}

impl HistoryRepository {
    pub async fn connect(db_path: &Path, retain: i64) -> Result<Self> {
        Self::init(&db_path_to_url(db_path)?, retain).await
    }

    pub async fn init(database_url: &str, retain: i64) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse connection string: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_filename TEXT NOT NULL,
                summary TEXT NOT NULL,
                pdf_path TEXT NOT NULL,
                uploaded_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create history table: {}", e)))?;

        Ok(Self { pool, retain })
    }

    /// Persist one entry and trim everything older than the `retain` most
    /// recent rows, atomically. Returns the entry with its assigned id.
    pub async fn record(&self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            "INSERT INTO history (original_filename, summary, pdf_path, uploaded_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.original_filename)
        .bind(&entry.summary)
        .bind(&entry.pdf_path)
        .bind(entry.uploaded_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert history entry: {}", e)))?;

        let id = result.last_insert_rowid();

        sqlx::query(
            "DELETE FROM history WHERE id NOT IN (
                SELECT id FROM history ORDER BY uploaded_at DESC, id DESC LIMIT ?
            )",
        )
        .bind(self.retain)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to trim history: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit history entry: {}", e)))?;

        Ok(HistoryEntry {
            id,
            original_filename: entry.original_filename,
            summary: entry.summary,
            pdf_path: entry.pdf_path,
            uploaded_at: entry.uploaded_at,
        })
    }

    /// Newest-first, at most the retention limit. Ties on `uploaded_at` are
    /// broken by id so ordering is stable within one millisecond.
    pub async fn list_recent(&self) -> Result<Vec<HistoryEntry>> {
        sqlx::query_as::<_, HistoryEntity>(
            "SELECT id, original_filename, summary, pdf_path, uploaded_at
             FROM history ORDER BY uploaded_at DESC, id DESC LIMIT ?",
        )
        .bind(self.retain)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM history")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count history: {}", e)))?;
        Ok(count)
    }
}

fn db_path_to_url(db_path: &Path) -> Result<String> {
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| AppError::DatabaseError("Database path is not valid UTF-8".to_string()))?;
    Ok(format!("sqlite://{}", db_path_str.replace("\\", "/")))
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct HistoryEntity {
    id: i64,
    original_filename: String,
    summary: String,
    pdf_path: String,
    uploaded_at: i64,
}

impl From<HistoryEntity> for HistoryEntry {
    fn from(e: HistoryEntity) -> Self {
        Self {
            id: e.id,
            original_filename: e.original_filename,
            summary: e.summary,
            pdf_path: e.pdf_path,
            uploaded_at: e.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn temp_repository(retain: i64) -> (HistoryRepository, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("equipviz-db-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let db_path = dir.join("history.db");
        let repo = HistoryRepository::connect(&db_path, retain).await.unwrap();
        (repo, dir)
    }

    fn entry(filename: &str, uploaded_at: i64) -> NewHistoryEntry {
        NewHistoryEntry {
            original_filename: filename.to_string(),
            summary: "Total: 1, Avg Flowrate: 1.00, Avg Pressure: 1.00, Avg Temperature: 1.00"
                .to_string(),
            pdf_path: format!("reports/{}.pdf", filename),
            uploaded_at,
        }
    }

    #[tokio::test]
    async fn test_record_assigns_increasing_ids() {
        let (repo, dir) = temp_repository(5).await;

        let first = repo.record(entry("a.csv", 1_000)).await.unwrap();
        let second = repo.record(entry("b.csv", 2_000)).await.unwrap();
        assert!(second.id > first.id);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first() {
        let (repo, dir) = temp_repository(5).await;

        for (name, ts) in [("a.csv", 1_000), ("b.csv", 3_000), ("c.csv", 2_000)] {
            repo.record(entry(name, ts)).await.unwrap();
        }

        let recent = repo.list_recent().await.unwrap();
        let names: Vec<&str> = recent.iter().map(|e| e.original_filename.as_str()).collect();
        assert_eq!(names, vec!["b.csv", "c.csv", "a.csv"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_retention_holds_after_every_record() {
        let (repo, dir) = temp_repository(5).await;

        for i in 0..8i64 {
            repo.record(entry(&format!("{}.csv", i), 1_000 + i)).await.unwrap();
            assert!(repo.count().await.unwrap() <= 5);
        }

        let recent = repo.list_recent().await.unwrap();
        assert_eq!(recent.len(), 5);
        // The five newest survive, the three oldest are gone.
        let timestamps: Vec<i64> = recent.iter().map(|e| e.uploaded_at).collect();
        assert_eq!(timestamps, vec![1_007, 1_006, 1_005, 1_004, 1_003]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_timestamp_ties_break_by_id() {
        let (repo, dir) = temp_repository(2).await;

        repo.record(entry("first.csv", 1_000)).await.unwrap();
        repo.record(entry("second.csv", 1_000)).await.unwrap();
        repo.record(entry("third.csv", 1_000)).await.unwrap();

        let recent = repo.list_recent().await.unwrap();
        let names: Vec<&str> = recent.iter().map(|e| e.original_filename.as_str()).collect();
        assert_eq!(names, vec!["third.csv", "second.csv"]);

        let _ = std::fs::remove_dir_all(dir);
    }
}
