//! Local diagnosis ledger
//!
//! Append-only, capped, most-recent-first history of mock diagnosis
//! results. Records never touch the database: they live in a single
//! local JSON file and are not synchronized anywhere.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use super::models::DiagnosisRecord;
use crate::error::AppError;

/// Maximum entries retained; the oldest is evicted past this
pub const LEDGER_CAPACITY: usize = 20;

/// Capped diagnosis history backed by a JSON file
pub struct DiagnosisLedger {
    path: PathBuf,
    entries: RwLock<Vec<DiagnosisRecord>>,
}

impl DiagnosisLedger {
    /// Open the ledger at `path`, loading any existing history.
    ///
    /// A missing or unreadable file reads as an empty ledger; a
    /// corrupt file is logged and discarded rather than failing
    /// startup.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
        }

        let entries = match tokio::fs::read(path).await {
            Ok(raw) => match serde_json::from_slice::<Vec<DiagnosisRecord>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(LEDGER_CAPACITY);
                    entries
                }
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "Diagnosis ledger file is corrupt; starting empty"
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        crate::metrics::LEDGER_SIZE.set(entries.len() as i64);

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        })
    }

    /// Prepend a record, evicting past the 20-entry cap, and persist.
    pub async fn append(&self, record: DiagnosisRecord) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.insert(0, record);
        entries.truncate(LEDGER_CAPACITY);

        let raw = serde_json::to_vec_pretty(&*entries)
            .map_err(|e| AppError::Internal(e.into()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        crate::metrics::LEDGER_SIZE.set(entries.len() as i64);

        Ok(())
    }

    /// Full history, most recent first
    pub async fn list(&self) -> Vec<DiagnosisRecord> {
        self.entries.read().await.clone()
    }

    /// Lookup by record id (linear scan; the list is at most 20 long)
    pub async fn get(&self, id: &str) -> Option<DiagnosisRecord> {
        self.entries
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::DiagnosisStage;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_record(id: &str) -> DiagnosisRecord {
        DiagnosisRecord {
            id: id.to_string(),
            stage: DiagnosisStage::Caution,
            confidence: 0.82,
            created_at: Utc::now(),
            summary: "watch for early signs".to_string(),
            guide_summary: "see the caution-stage guide".to_string(),
        }
    }

    #[tokio::test]
    async fn append_prepends_and_caps_at_twenty() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = DiagnosisLedger::open(&temp_dir.path().join("diagnoses.json"))
            .await
            .unwrap();

        for i in 0..21 {
            ledger.append(sample_record(&format!("diag_{i}"))).await.unwrap();
        }

        let entries = ledger.list().await;
        assert_eq!(entries.len(), LEDGER_CAPACITY);
        // Most recent first; the very first record has been evicted.
        assert_eq!(entries[0].id, "diag_20");
        assert_eq!(entries[19].id, "diag_1");
        assert!(!entries.iter().any(|r| r.id == "diag_0"));
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("diagnoses.json");

        {
            let ledger = DiagnosisLedger::open(&path).await.unwrap();
            ledger.append(sample_record("diag_1")).await.unwrap();
            ledger.append(sample_record("diag_2")).await.unwrap();
        }

        let reopened = DiagnosisLedger::open(&path).await.unwrap();
        let entries = reopened.list().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "diag_2");
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("diagnoses.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let ledger = DiagnosisLedger::open(&path).await.unwrap();
        assert!(ledger.list().await.is_empty());
    }

    #[tokio::test]
    async fn get_finds_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = DiagnosisLedger::open(&temp_dir.path().join("diagnoses.json"))
            .await
            .unwrap();

        ledger.append(sample_record("diag_a")).await.unwrap();
        ledger.append(sample_record("diag_b")).await.unwrap();

        assert!(ledger.get("diag_a").await.is_some());
        assert!(ledger.get("diag_missing").await.is_none());
    }
}
