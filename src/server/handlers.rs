//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::{ApiError, ApiResult, AppState};
use crate::models::{BacklogItem, FeedbackCluster, FeedbackItem, RoadmapPlan};

pub(super) async fn root() -> Json<Value> {
    Json(json!({ "message": "Smart PM Agent API is running" }))
}

pub(super) async fn health() -> &'static str {
    "OK"
}

pub(super) async fn groom(
    State(state): State<AppState>,
    body: Result<Json<BacklogItem>, JsonRejection>,
) -> ApiResult<Json<BacklogItem>> {
    let Json(item) = body.map_err(reject)?;
    let groomed = state.agents.groomer.groom(&item).await?;
    Ok(Json(groomed))
}

pub(super) async fn cluster_feedback(
    State(state): State<AppState>,
    body: Result<Json<Vec<FeedbackItem>>, JsonRejection>,
) -> ApiResult<Json<Vec<FeedbackCluster>>> {
    let Json(items) = body.map_err(reject)?;
    let clusters = state.agents.analyst.cluster(&items).await?;
    Ok(Json(clusters))
}

pub(super) async fn roadmap(
    State(state): State<AppState>,
    body: Result<Json<Vec<BacklogItem>>, JsonRejection>,
) -> ApiResult<Json<RoadmapPlan>> {
    let Json(items) = body.map_err(reject)?;
    let plan = state.agents.strategist.plan(&items).await?;
    Ok(Json(plan))
}

fn reject(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected request body");
    ApiError::BadRequest { status: rejection.status(), message: rejection.body_text() }
}
