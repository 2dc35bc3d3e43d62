use std::sync::Arc;

use crate::engine::StatsEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<StatsEngine>,
    pub cors_origin: String,
}

impl AppState {
    pub fn new(engine: Arc<StatsEngine>, cors_origin: impl Into<String>) -> Self {
        Self {
            engine,
            cors_origin: cors_origin.into(),
        }
    }
}
