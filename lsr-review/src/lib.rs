//! lsr-review library - Lab Safety Review service
//!
//! HTTP JSON API over one review session. A front end loads a dataset,
//! opens items, and sends one request per field edit; each edit is written
//! to the annotation file before the response returns.

use axum::Router;
use lsr_common::{ReviewConfig, ReviewSession};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod backup;
pub mod error;
pub mod refiner;

pub use crate::error::{ApiError, ApiResult};

use crate::backup::BackupClient;
use crate::refiner::{OpenAiRefiner, TextRefiner};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration (data folder, choice sets, collaborators)
    pub config: Arc<ReviewConfig>,
    /// The single review session; `None` until a dataset is loaded
    pub session: Arc<RwLock<Option<ReviewSession>>>,
    /// Text-refinement collaborator
    pub refiner: Arc<dyn TextRefiner>,
    /// Remote backup uploader
    pub backup: Arc<BackupClient>,
}

impl AppState {
    pub fn new(config: ReviewConfig, refiner: Arc<dyn TextRefiner>, backup: BackupClient) -> Self {
        Self {
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
            refiner,
            backup: Arc::new(backup),
        }
    }

    /// Production state with HTTP collaborators built from `config`
    pub fn from_config(config: ReviewConfig) -> anyhow::Result<Self> {
        let refiner = OpenAiRefiner::new(config.refiner.clone())?;
        let backup = BackupClient::new(config.backup.clone())?;
        Ok(Self::new(config, Arc::new(refiner), backup))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    Router::new()
        .route("/api/config", get(api::get_config))
        .route("/api/dataset", post(api::load_dataset))
        .route("/api/session", get(api::get_session))
        .route("/api/navigate", post(api::navigate))
        .route("/api/status", get(api::get_status))
        .route("/api/download", get(api::download))
        .route("/api/items/:item", get(api::open_item))
        .route("/api/items/:item/scenario/:field", put(api::update_scenario))
        .route(
            "/api/items/:item/aspects/:aspect/points",
            post(api::add_missing_points),
        )
        .route(
            "/api/items/:item/aspects/:aspect/points/:point/:field",
            put(api::update_point),
        )
        .route(
            "/api/items/:item/situations/:situation/:field",
            put(api::update_situation),
        )
        .route("/api/refine", post(api::refine))
        .route("/api/backup", post(api::backup))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
