//! Dataset loading, navigation, status and download

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lsr_common::model::IssueCategory;
use lsr_common::status::{self, StatusSummary};
use lsr_common::{ChoiceConfig, Navigation, ReviewSession};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, ApiResult, AppState};

/// Borrow the loaded session or fail with 404
pub(crate) fn loaded(session: &Option<ReviewSession>) -> ApiResult<&ReviewSession> {
    session.as_ref().ok_or(ApiError::NoDataset)
}

/// Mutably borrow the loaded session or fail with 404
pub(crate) fn loaded_mut(session: &mut Option<ReviewSession>) -> ApiResult<&mut ReviewSession> {
    session.as_mut().ok_or(ApiError::NoDataset)
}

/// Choice sets plus fixed category names
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub choices: ChoiceConfig,
    pub aspect_names: Vec<&'static str>,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        choices: state.config.choices(),
        aspect_names: IssueCategory::ALL.iter().map(|c| c.display_name()).collect(),
    })
}

/// Upload payload: original file name and its raw text
#[derive(Debug, Deserialize)]
pub struct LoadDatasetRequest {
    pub file_name: String,
    pub content: String,
}

/// Session overview
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub dataset_name: String,
    pub annotation_path: String,
    pub current_index: usize,
    pub total: usize,
    pub resumed: bool,
}

impl SessionResponse {
    fn from_session(session: &ReviewSession) -> Self {
        Self {
            dataset_name: session.name().to_string(),
            annotation_path: session.path().display().to_string(),
            current_index: session.current_index(),
            total: session.len(),
            resumed: session.resumed(),
        }
    }
}

/// POST /api/dataset
///
/// **Request:** `{"file_name": "chem.json", "content": "[...]"}`
///
/// Resumes from `<data_dir>/<name>/<name>_annotation.json` when it exists,
/// otherwise creates it from the uploaded content. Replaces any session
/// already loaded.
pub async fn load_dataset(
    State(state): State<AppState>,
    Json(payload): Json<LoadDatasetRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let data_dir = state.config.data_dir.clone();
    let choices = state.config.choices();
    let new_session = tokio::task::spawn_blocking(move || {
        ReviewSession::load(
            &payload.file_name,
            payload.content.as_bytes(),
            &data_dir,
            choices,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Dataset load task failed: {}", e)))??;

    let response = SessionResponse::from_session(&new_session);
    *state.session.write().await = Some(new_session);

    info!(
        "Dataset '{}' ready ({} items, resumed={})",
        response.dataset_name, response.total, response.resumed
    );
    Ok(Json(response))
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> ApiResult<Json<SessionResponse>> {
    let guard = state.session.read().await;
    Ok(Json(SessionResponse::from_session(loaded(&guard)?)))
}

/// Navigation action
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigateAction {
    Next,
    Previous,
    Jump,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub action: NavigateAction,
    pub index: Option<usize>,
}

/// POST /api/navigate
///
/// **Request:** `{"action": "next"}`, `{"action": "previous"}` or
/// `{"action": "jump", "index": 3}`
pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavigateRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let nav = match (payload.action, payload.index) {
        (NavigateAction::Next, _) => Navigation::Next,
        (NavigateAction::Previous, _) => Navigation::Previous,
        (NavigateAction::Jump, Some(index)) => Navigation::Jump(index),
        (NavigateAction::Jump, None) => {
            return Err(ApiError::BadRequest("jump requires an index".to_string()))
        }
    };

    let mut guard = state.session.write().await;
    let session = loaded_mut(&mut guard)?;
    session.navigate(nav)?;
    Ok(Json(SessionResponse::from_session(session)))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<StatusSummary>> {
    let guard = state.session.read().await;
    let session = loaded(&guard)?;
    Ok(Json(status::summarize(session.items())))
}

/// GET /api/download
///
/// Annotation file contents as a JSON attachment
pub async fn download(State(state): State<AppState>) -> ApiResult<Response> {
    let guard = state.session.read().await;
    let session = loaded(&guard)?;
    let bytes = session.to_json_bytes()?;
    let disposition = format!(
        "attachment; filename=\"{}_annotation.json\"",
        session.name()
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
