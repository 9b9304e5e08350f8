//! Diagnosis endpoints
//!
//! The mock analysis flow plus the local history. Photos arrive as
//! multipart fields; nothing from them is persisted or inspected.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, post},
};
use serde::Serialize;

use crate::AppState;
use crate::data::catalog::{ManagementGuide, Product};
use crate::data::{DiagnosisRecord, DiagnosisStage, catalog};
use crate::error::AppError;
use crate::service::DiagnosisService;

fn diagnosis_service(state: &AppState) -> DiagnosisService {
    DiagnosisService::new(
        state.ledger.clone(),
        std::time::Duration::from_millis(state.config.diagnosis.analysis_delay_ms),
    )
}

/// POST /api/diagnosis
///
/// Multipart fields: `crown` and `hairline` (both required).
async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DiagnosisRecord>, AppError> {
    let mut crown = Vec::new();
    let mut hairline = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(ToOwned::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart payload: {}", e)))?;

        match name.as_deref() {
            Some("crown") => crown = data.to_vec(),
            Some("hairline") => hairline = data.to_vec(),
            _ => {}
        }
    }

    let record = diagnosis_service(&state).analyze(&crown, &hairline).await?;
    Ok(Json(record))
}

/// GET /api/diagnosis
async fn history(State(state): State<AppState>) -> Json<Vec<DiagnosisRecord>> {
    Json(diagnosis_service(&state).history().await)
}

#[derive(Debug, Serialize)]
struct DiagnosisReport {
    record: DiagnosisRecord,
    guide: ManagementGuide,
    recommendations: Vec<Product>,
}

/// GET /api/diagnosis/:id
///
/// The full report: the stored record plus the stage guide and
/// product recommendations.
async fn report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DiagnosisReport>, AppError> {
    let record = diagnosis_service(&state).get(&id).await?;
    let guide = catalog::guide_for_stage(record.stage);
    let recommendations = catalog::recommendations_for_stage(record.stage);

    Ok(Json(DiagnosisReport {
        record,
        guide,
        recommendations,
    }))
}

/// GET /api/guides/:stage
async fn stage_guide(Path(stage): Path<String>) -> Result<Json<ManagementGuide>, AppError> {
    let stage = DiagnosisStage::parse(&stage).ok_or_else(|| {
        AppError::Validation("stage must be one of: normal, caution, risk".to_string())
    })?;
    Ok(Json(catalog::guide_for_stage(stage)))
}

/// GET /api/recommendations/:stage
async fn stage_recommendations(Path(stage): Path<String>) -> Result<Json<Vec<Product>>, AppError> {
    let stage = DiagnosisStage::parse(&stage).ok_or_else(|| {
        AppError::Validation("stage must be one of: normal, caution, risk".to_string())
    })?;
    Ok(Json(catalog::recommendations_for_stage(stage)))
}

/// Create diagnosis router
pub fn diagnosis_router() -> Router<AppState> {
    Router::new()
        .route("/diagnosis", post(analyze).get(history))
        .route("/diagnosis/:id", get(report))
        .route("/guides/:stage", get(stage_guide))
        .route("/recommendations/:stage", get(stage_recommendations))
}
