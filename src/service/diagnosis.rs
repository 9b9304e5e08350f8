//! Mock diagnosis service
//!
//! The "AI" analysis is a randomized classifier behind a timer: it
//! validates that both photos are present, suspends for the
//! configured latency, picks a uniformly random stage with a
//! confidence fraction, and appends the result to the capped local
//! ledger. No image data ever leaves the process.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::data::{DiagnosisLedger, DiagnosisRecord, DiagnosisStage};
use crate::error::AppError;

const STAGES: [DiagnosisStage; 3] = [
    DiagnosisStage::Normal,
    DiagnosisStage::Caution,
    DiagnosisStage::Risk,
];

fn summary_for_stage(stage: DiagnosisStage) -> &'static str {
    match stage {
        DiagnosisStage::Normal => {
            "Your scalp appears to be in good condition. Keep up your current care routine."
        }
        DiagnosisStage::Caution => {
            "Early signs of hair loss detected. Review the tailored care guide and product recommendations."
        }
        DiagnosisStage::Risk => {
            "Professional consultation is recommended. Please consider visiting a clinic."
        }
    }
}

fn guide_summary_for_stage(stage: DiagnosisStage) -> &'static str {
    match stage {
        DiagnosisStage::Normal => "See the healthy scalp maintenance guide.",
        DiagnosisStage::Caution => "See the caution-stage care guide and recommended products.",
        DiagnosisStage::Risk => "See the risk-stage care guide and expert referrals.",
    }
}

/// Mock diagnosis service
pub struct DiagnosisService {
    ledger: Arc<DiagnosisLedger>,
    analysis_delay: Duration,
}

impl DiagnosisService {
    /// Create new diagnosis service
    pub fn new(ledger: Arc<DiagnosisLedger>, analysis_delay: Duration) -> Self {
        Self {
            ledger,
            analysis_delay,
        }
    }

    /// Run the mock analysis over the two scalp photos.
    ///
    /// # Side Effects
    /// - Suspends for the configured analysis latency
    /// - Prepends the result to the local ledger (capped at 20)
    pub async fn analyze(
        &self,
        crown_photo: &[u8],
        hairline_photo: &[u8],
    ) -> Result<DiagnosisRecord, AppError> {
        if crown_photo.is_empty() || hairline_photo.is_empty() {
            return Err(AppError::Validation(
                "both crown and hairline photos are required".to_string(),
            ));
        }

        tokio::time::sleep(self.analysis_delay).await;

        let (stage, confidence) = {
            let mut rng = rand::thread_rng();
            let stage = STAGES[rng.gen_range(0..STAGES.len())];
            (stage, 0.75 + rng.gen_range(0.0..0.2))
        };

        let created_at = chrono::Utc::now();
        let record = DiagnosisRecord {
            id: format!("diag_{}", created_at.timestamp_millis()),
            stage,
            confidence,
            created_at,
            summary: summary_for_stage(stage).to_string(),
            guide_summary: guide_summary_for_stage(stage).to_string(),
        };

        self.ledger.append(record.clone()).await?;
        crate::metrics::DIAGNOSES_TOTAL
            .with_label_values(&[stage.as_str()])
            .inc();

        tracing::info!(
            id = %record.id,
            stage = %stage.as_str(),
            confidence = record.confidence,
            "Mock diagnosis completed"
        );

        Ok(record)
    }

    /// Full diagnosis history, most recent first
    pub async fn history(&self) -> Vec<DiagnosisRecord> {
        self.ledger.list().await
    }

    /// Lookup a past diagnosis by id
    pub async fn get(&self, id: &str) -> Result<DiagnosisRecord, AppError> {
        self.ledger.get(id).await.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_service() -> (DiagnosisService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Arc::new(
            DiagnosisLedger::open(&temp_dir.path().join("diagnoses.json"))
                .await
                .unwrap(),
        );
        (
            DiagnosisService::new(ledger, Duration::from_millis(0)),
            temp_dir,
        )
    }

    #[tokio::test]
    async fn analyze_requires_both_photos() {
        let (service, _temp_dir) = create_service().await;

        let missing_crown = service.analyze(&[], &[1, 2, 3]).await.unwrap_err();
        assert!(matches!(missing_crown, AppError::Validation(_)));

        let missing_hairline = service.analyze(&[1, 2, 3], &[]).await.unwrap_err();
        assert!(matches!(missing_hairline, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn analyze_produces_a_ledgered_record() {
        let (service, _temp_dir) = create_service().await;

        let record = service.analyze(&[1], &[2]).await.unwrap();
        assert!(record.id.starts_with("diag_"));
        assert!((0.75..=0.95).contains(&record.confidence));
        assert!(!record.summary.is_empty());

        let history = service.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, record.id);

        let fetched = service.get(&record.id).await.unwrap();
        assert_eq!(fetched.stage, record.stage);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (service, _temp_dir) = create_service().await;
        let error = service.get("diag_missing").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound));
    }
}
