//! Item viewing and field update endpoints
//!
//! Every PUT/POST here maps to one controller operation; the annotation file
//! has been rewritten by the time the response is sent. Responses carry the
//! updated item so the client can re-render from it.

use axum::{
    extract::{Path, State},
    Json,
};
use lsr_common::model::DatasetItem;
use lsr_common::{AspectKey, PointKey, ReviewSession, ScenarioKey, SituationKey};
use serde::{Deserialize, Serialize};

use super::dataset::loaded_mut;
use crate::{ApiResult, AppState};

/// One item as shown to the reviewer
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub index: usize,
    pub total: usize,
    /// Rewritten scenario if present, else the original
    pub effective_scenario: String,
    /// False when the item lacks four decisions; situation edits then fail
    pub situations_ready: bool,
    pub item: DatasetItem,
}

impl ItemResponse {
    fn from_session(session: &ReviewSession, index: usize) -> ApiResult<Self> {
        let item = session.item(index)?;
        Ok(Self {
            index,
            total: session.len(),
            effective_scenario: item.effective_scenario().to_string(),
            situations_ready: item.has_situations(),
            item: item.clone(),
        })
    }
}

/// Field edit payload
#[derive(Debug, Deserialize)]
pub struct FieldValue {
    pub value: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioField {
    Choice,
    Modified,
    Comment,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointField {
    Choice,
    Modified,
    Comment,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SituationField {
    Choice,
    ModifiedDecision,
    ModifiedConsequence,
    Comment,
}

/// GET /api/items/:item
///
/// Expands the item on first view and makes it the current item
pub async fn open_item(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<Json<ItemResponse>> {
    let mut guard = state.session.write().await;
    let session = loaded_mut(&mut guard)?;
    session.open_item(index)?;
    Ok(Json(ItemResponse::from_session(session, index)?))
}

/// PUT /api/items/:item/scenario/:field
pub async fn update_scenario(
    State(state): State<AppState>,
    Path((item, field)): Path<(usize, ScenarioField)>,
    Json(payload): Json<FieldValue>,
) -> ApiResult<Json<ItemResponse>> {
    let mut guard = state.session.write().await;
    let session = loaded_mut(&mut guard)?;
    let key = ScenarioKey { item };

    match field {
        ScenarioField::Choice => session.set_scenario_choice(key, &payload.value)?,
        ScenarioField::Modified => session.set_scenario_modified(key, &payload.value)?,
        ScenarioField::Comment => session.set_scenario_comment(key, &payload.value)?,
    }

    Ok(Json(ItemResponse::from_session(session, item)?))
}

/// PUT /api/items/:item/aspects/:aspect/points/:point/:field
pub async fn update_point(
    State(state): State<AppState>,
    Path((item, aspect, point, field)): Path<(usize, usize, usize, PointField)>,
    Json(payload): Json<FieldValue>,
) -> ApiResult<Json<ItemResponse>> {
    let mut guard = state.session.write().await;
    let session = loaded_mut(&mut guard)?;
    let key = PointKey { item, aspect, point };

    match field {
        PointField::Choice => session.set_point_choice(key, &payload.value)?,
        PointField::Modified => session.set_point_modified(key, &payload.value)?,
        PointField::Comment => session.set_point_comment(key, &payload.value)?,
    }

    Ok(Json(ItemResponse::from_session(session, item)?))
}

/// Missing points payload: one point per non-blank line
#[derive(Debug, Deserialize)]
pub struct MissingPointsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MissingPointsResponse {
    pub added: usize,
    #[serde(flatten)]
    pub item: ItemResponse,
}

/// POST /api/items/:item/aspects/:aspect/points
pub async fn add_missing_points(
    State(state): State<AppState>,
    Path((item, aspect)): Path<(usize, usize)>,
    Json(payload): Json<MissingPointsRequest>,
) -> ApiResult<Json<MissingPointsResponse>> {
    let mut guard = state.session.write().await;
    let session = loaded_mut(&mut guard)?;

    let added = session.add_missing_points(AspectKey { item, aspect }, &payload.text)?;

    Ok(Json(MissingPointsResponse {
        added,
        item: ItemResponse::from_session(session, item)?,
    }))
}

/// PUT /api/items/:item/situations/:situation/:field
pub async fn update_situation(
    State(state): State<AppState>,
    Path((item, situation, field)): Path<(usize, usize, SituationField)>,
    Json(payload): Json<FieldValue>,
) -> ApiResult<Json<ItemResponse>> {
    let mut guard = state.session.write().await;
    let session = loaded_mut(&mut guard)?;
    let key = SituationKey { item, situation };

    match field {
        SituationField::Choice => session.set_situation_choice(key, &payload.value)?,
        SituationField::ModifiedDecision => {
            session.set_situation_modified_decision(key, &payload.value)?
        }
        SituationField::ModifiedConsequence => {
            session.set_situation_modified_consequence(key, &payload.value)?
        }
        SituationField::Comment => session.set_situation_comment(key, &payload.value)?,
    }

    Ok(Json(ItemResponse::from_session(session, item)?))
}
