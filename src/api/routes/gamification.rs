use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::models::Badge;

#[derive(Debug, Serialize)]
pub struct BadgeCatalogResponse {
    pub badges: Vec<Badge>,
    pub current_power_cap: Option<u32>,
}

pub async fn badge_catalog(State(state): State<AppState>) -> Json<BadgeCatalogResponse> {
    Json(BadgeCatalogResponse {
        badges: state.engine.badge_catalog(),
        current_power_cap: state.engine.settings().current_power_cap,
    })
}

#[cfg(test)]
mod tests {
    use crate::api::routes::test_support::{get_json, test_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_badge_catalog() {
        let (status, json) = get_json(test_app(), "/api/gamification/badges").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["current_power_cap"], 2010);

        let badges = json["badges"].as_array().unwrap();
        assert_eq!(badges.len(), 7);
        assert_eq!(badges[0]["id"], "brightest");
        assert!(badges[0]["description"].as_str().unwrap().contains("2010"));
        assert_eq!(badges[0]["category"], "rank");
    }
}
