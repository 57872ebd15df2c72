//! HTTP serving layer
//!
//! Thin axum front over the league registry. The registry is immutable for
//! the process lifetime and carries only plain-array classifier weights, so
//! handlers share it behind an `Arc` with no locking. Unknown leagues and
//! teams come back as the neutral fallback forecast; this endpoint never
//! 5xxs on data gaps.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::predict::{Forecast, LeagueRegistry};
use crate::{Config, Result};

struct AppState {
    registry: LeagueRegistry,
    default_league: String,
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    league: Option<String>,
    home_team: String,
    away_team: String,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "leagues": state.registry.len(),
    }))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Json<Forecast> {
    let league = request
        .league
        .unwrap_or_else(|| state.default_league.clone());
    log::debug!(
        "predict league={} home={} away={}",
        league,
        request.home_team,
        request.away_team
    );
    Json(
        state
            .registry
            .predict(&league, &request.home_team, &request.away_team),
    )
}

/// Run the prediction server until shutdown.
pub async fn run(registry: LeagueRegistry, config: &Config) -> Result<()> {
    let state = Arc::new(AppState {
        registry,
        default_league: config.data.default_league.to_lowercase(),
    });

    // Permissive CORS: the frontend is served from a different origin
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/predict", post(predict))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
