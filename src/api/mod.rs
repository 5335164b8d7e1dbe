use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::analytics::{ModelMetrics, NamedCount, Overview, SeasonTrend};
use crate::engine::UpcomingPrediction;
use crate::error::PredictError;
use crate::service::{CrossLeaguePrediction, HeadToHeadPrediction, PredictionService};

#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub allowed_leagues: Vec<String>,
}

/// Status code plus `{"detail": ...}` body.
pub type ApiError = (StatusCode, Json<Value>);

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct HeadToHeadRequest {
    pub league: String,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Deserialize)]
pub struct CrossLeagueRequest {
    pub league_a: String,
    pub team_a: String,
    pub league_b: String,
    pub team_b: String,
}

#[derive(Debug, Serialize)]
pub struct HeadToHeadResponse {
    pub success: bool,
    pub predictions: HeadToHeadPrediction,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Serialize)]
pub struct CrossLeagueResponse {
    pub success: bool,
    pub predictions: CrossLeaguePrediction,
    pub team_a: String,
    pub team_b: String,
    pub league_a: String,
    pub league_b: String,
}

#[derive(Debug, Serialize)]
pub struct TeamsResponse {
    pub success: bool,
    pub teams: Vec<String>,
}

/// Build the Axum router for the prediction API.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/leagues", get(leagues_handler))
        .route("/api/predict/head-to-head", post(head_to_head_handler))
        .route("/api/predict/cross-league", post(cross_league_handler))
        .route("/api/teams/:league", get(teams_handler))
        .route("/api/upcoming_matches/:league", get(upcoming_handler))
        .route("/api/analytics/model_metrics/:league", get(model_metrics_handler))
        .route("/api/analytics/overview/:league", get(overview_handler))
        .route("/api/analytics/season_trends/:league", get(season_trends_handler))
        .route(
            "/api/analytics/result_distribution/:league",
            get(result_distribution_handler),
        )
        .route(
            "/api/analytics/home_away_performance/:league",
            get(home_away_performance_handler),
        )
        .route(
            "/api/analytics/goals_distribution/:league",
            get(goals_distribution_handler),
        )
        .layer(cors)
        .with_state(Arc::new(state))
}

/// CORS for a single origin; `*` allows any origin.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    if origin.trim() == "*" {
        return Ok(CorsLayer::permissive());
    }
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid CORS origin {origin}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

fn detail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "detail": message.into() })))
}

/// Map an engine error onto its HTTP status.
fn error_response(context: &str, e: PredictError) -> ApiError {
    let status = match &e {
        PredictError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("{} failed: {:#}", context, e);
        detail(status, format!("Internal server error: {e}"))
    } else {
        warn!("{} rejected: {}", context, e);
        detail(status, e.to_string())
    }
}

fn check_league(state: &AppState, league: &str) -> Result<(), ApiError> {
    if state.allowed_leagues.iter().any(|l| l == league) {
        Ok(())
    } else {
        Err(detail(
            StatusCode::BAD_REQUEST,
            format!("League must be one of: {}", state.allowed_leagues.join(", ")),
        ))
    }
}

/// GET /api/health
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/leagues
async fn leagues_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    state
        .service
        .leagues()
        .await
        .map(Json)
        .map_err(|e| error_response("list leagues", e))
}

/// POST /api/predict/head-to-head
async fn head_to_head_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HeadToHeadRequest>,
) -> ApiResult<HeadToHeadResponse> {
    check_league(&state, &req.league)?;
    info!(
        "Head-to-head request: {} {} vs {}",
        req.league, req.home_team, req.away_team
    );
    let predictions = state
        .service
        .head_to_head(&req.league, &req.home_team, &req.away_team)
        .await
        .map_err(|e| error_response("head-to-head", e))?;
    Ok(Json(HeadToHeadResponse {
        success: true,
        predictions,
        home_team: req.home_team,
        away_team: req.away_team,
    }))
}

/// POST /api/predict/cross-league
async fn cross_league_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CrossLeagueRequest>,
) -> ApiResult<CrossLeagueResponse> {
    check_league(&state, &req.league_a)?;
    check_league(&state, &req.league_b)?;
    info!(
        "Cross-league request: {} ({}) vs {} ({})",
        req.team_a, req.league_a, req.team_b, req.league_b
    );
    let predictions = state
        .service
        .cross_league(&req.league_a, &req.team_a, &req.league_b, &req.team_b)
        .await
        .map_err(|e| error_response("cross-league", e))?;
    Ok(Json(CrossLeagueResponse {
        success: true,
        predictions,
        team_a: req.team_a,
        team_b: req.team_b,
        league_a: req.league_a,
        league_b: req.league_b,
    }))
}

/// GET /api/teams/:league
async fn teams_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<TeamsResponse> {
    check_league(&state, &league)?;
    let teams = state
        .service
        .teams(&league)
        .await
        .map_err(|e| error_response("list teams", e))?;
    Ok(Json(TeamsResponse {
        success: true,
        teams,
    }))
}

/// GET /api/upcoming_matches/:league
async fn upcoming_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<Vec<UpcomingPrediction>> {
    check_league(&state, &league)?;
    state
        .service
        .upcoming(&league, Utc::now().date_naive())
        .await
        .map(Json)
        .map_err(|e| error_response("upcoming matches", e))
}

/// GET /api/analytics/model_metrics/:league
async fn model_metrics_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<ModelMetrics> {
    check_league(&state, &league)?;
    state
        .service
        .model_metrics(&league)
        .await
        .map(Json)
        .map_err(|e| error_response("model metrics", e))
}

/// GET /api/analytics/overview/:league
async fn overview_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<Overview> {
    check_league(&state, &league)?;
    state
        .service
        .overview(&league)
        .await
        .map(Json)
        .map_err(|e| error_response("overview", e))
}

/// GET /api/analytics/season_trends/:league
async fn season_trends_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<Vec<SeasonTrend>> {
    check_league(&state, &league)?;
    state
        .service
        .season_trends(&league)
        .await
        .map(Json)
        .map_err(|e| error_response("season trends", e))
}

/// GET /api/analytics/result_distribution/:league
async fn result_distribution_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<Vec<NamedCount<String>>> {
    check_league(&state, &league)?;
    state
        .service
        .result_distribution(&league)
        .await
        .map(Json)
        .map_err(|e| error_response("result distribution", e))
}

/// GET /api/analytics/home_away_performance/:league
async fn home_away_performance_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<Vec<NamedCount<String>>> {
    check_league(&state, &league)?;
    state
        .service
        .home_away_performance(&league)
        .await
        .map(Json)
        .map_err(|e| error_response("home/away performance", e))
}

/// GET /api/analytics/goals_distribution/:league
async fn goals_distribution_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> ApiResult<Vec<NamedCount<u32>>> {
    check_league(&state, &league)?;
    state
        .service
        .goals_distribution(&league)
        .await
        .map(Json)
        .map_err(|e| error_response("goals distribution", e))
}
