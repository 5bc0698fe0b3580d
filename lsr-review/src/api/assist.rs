//! Optional collaborators: text refinement and remote backup
//!
//! Neither touches the session's items. Refinement output is returned to
//! the reviewer only; backup uploads a snapshot of the annotation file.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::dataset::loaded;
use crate::backup::BackupReceipt;
use crate::refiner::{ASSISTANT_PROMPT, REFINE_PROMPT};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineMode {
    /// Sentence refiner
    #[default]
    Refine,
    /// Free-form request
    Assistant,
}

impl RefineMode {
    fn system_prompt(self) -> &'static str {
        match self {
            RefineMode::Refine => REFINE_PROMPT,
            RefineMode::Assistant => ASSISTANT_PROMPT,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub text: String,
    #[serde(default)]
    pub mode: RefineMode,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub text: String,
}

/// POST /api/refine
///
/// **Request:** `{"text": "...", "mode": "refine" | "assistant"}`
pub async fn refine(
    State(state): State<AppState>,
    Json(payload): Json<RefineRequest>,
) -> ApiResult<Json<RefineResponse>> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Enter the content to refine before submitting".to_string(),
        ));
    }

    let text = state
        .refiner
        .refine(&payload.text, payload.mode.system_prompt())
        .await
        .map_err(|e| {
            warn!("Refinement failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(RefineResponse { text }))
}

/// POST /api/backup
///
/// Uploads the current annotation file to the configured remote folder.
/// The session lock is released before the network call.
pub async fn backup(State(state): State<AppState>) -> ApiResult<Json<BackupReceipt>> {
    let (file_name, bytes) = {
        let guard = state.session.read().await;
        let session = loaded(&guard)?;
        let file_name = session
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}_annotation.json", session.name()));
        (file_name, session.to_json_bytes()?)
    };

    let receipt = state.backup.upload(&file_name, bytes).await.map_err(|e| {
        warn!("Backup of {} failed: {}", file_name, e);
        ApiError::from(e)
    })?;

    info!(
        "Backed up {} to {} (HTTP {})",
        file_name, receipt.remote_path, receipt.status
    );
    Ok(Json(receipt))
}
