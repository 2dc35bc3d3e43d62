use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::engine::{ClassComparison, Distribution, HypothesisTests};
use crate::models::{CorrelationResult, HypothesisTest, Leaderboard, Metric, PlayerId, Snapshot};

pub async fn descriptive(State(state): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = state.engine.get_snapshot(Utc::now()).await?;
    Ok(Json(Snapshot::clone(&snapshot)))
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = state.engine.refresh_snapshot(Utc::now()).await?;
    Ok(Json(Snapshot::clone(&snapshot)))
}

pub async fn class_comparison(
    State(state): State<AppState>,
) -> Result<Json<ClassComparison>, ApiError> {
    Ok(Json(state.engine.get_class_comparison(Utc::now()).await?))
}

pub async fn correlation(
    State(state): State<AppState>,
) -> Result<Json<HypothesisTest<CorrelationResult>>, ApiError> {
    Ok(Json(state.engine.get_correlation(Utc::now())?))
}

pub async fn distribution(State(state): State<AppState>) -> Result<Json<Distribution>, ApiError> {
    Ok(Json(state.engine.get_distribution(Utc::now()).await?))
}

pub async fn hypothesis_tests(
    State(state): State<AppState>,
) -> Result<Json<HypothesisTests>, ApiError> {
    Ok(Json(state.engine.get_all_hypothesis_tests(Utc::now())?))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub player_id: Option<String>,
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<Leaderboard>, ApiError> {
    let category = match params.category.as_deref() {
        Some(raw) => raw.parse::<Metric>().map_err(ApiError::BadRequest)?,
        None => Metric::PowerLevel,
    };
    let player_id = params.player_id.map(PlayerId::from);

    let board = state
        .engine
        .get_leaderboard(category, params.limit, player_id.as_ref())?;
    Ok(Json(board))
}
