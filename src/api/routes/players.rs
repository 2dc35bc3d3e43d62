use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::engine::PlayerProfile;
use crate::models::{Badge, PlayerId};

#[derive(Debug, Serialize)]
pub struct PlayerBadgesResponse {
    pub player_id: PlayerId,
    pub badges: Vec<Badge>,
}

pub async fn player_statistics(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerProfile>, ApiError> {
    let player_id = PlayerId::from(player_id);
    let profile = state
        .engine
        .player_profile(&player_id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Player {} not found", player_id)))?;
    Ok(Json(profile))
}

pub async fn player_badges(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerBadgesResponse>, ApiError> {
    let player_id = PlayerId::from(player_id);
    let badges = state
        .engine
        .compute_badges(&player_id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Player {} not found", player_id)))?;
    Ok(Json(PlayerBadgesResponse { player_id, badges }))
}
