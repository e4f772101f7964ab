use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use wager_settlement::config::Config;
use wager_settlement::data::load_from_cache;
use wager_settlement::fade::{calculate_fade_bet_with, FadeBet, FadePricing, WagerInput};
use wager_settlement::models::{Game, Wager};
use wager_settlement::outcome::{calculate_outcome, Outcome};
use wager_settlement::settlement::{settle_game, SettlementReport, SettlementSummary};
use wager_settlement::SettlementError;

struct AppState {
    games: Vec<Game>,
    fade_pricing: FadePricing,
}

// Shared state holding the loaded game board
type SharedState = Arc<AppState>;

enum ApiError {
    Settlement(SettlementError),
    NotFound(String),
}

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        ApiError::Settlement(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Settlement(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Use the game sent with the request, else the loaded one for the wager
fn resolve_game(state: &AppState, game: Option<Game>, wager: &Wager) -> Result<Game, ApiError> {
    if let Some(game) = game {
        return Ok(game);
    }
    state
        .games
        .iter()
        .find(|g| g.id == wager.game_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("No game with id {}", wager.game_id)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeRequest {
    wager: Wager,
    game: Option<Game>,
    home_score: Option<u32>,
    away_score: Option<u32>,
}

async fn outcome(
    State(state): State<SharedState>,
    Json(request): Json<OutcomeRequest>,
) -> Result<Json<Outcome>, ApiError> {
    let game = resolve_game(&state, request.game, &request.wager)?;
    let (home_score, away_score) = match (request.home_score, request.away_score) {
        (Some(home), Some(away)) => (home, away),
        _ => game.final_score()?,
    };
    let outcome = calculate_outcome(&request.wager, &game, home_score, away_score)?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FadeRequest {
    wager: Wager,
    game: Option<Game>,
    stake: Option<i64>,
    pricing: Option<FadePricing>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FadeResponse {
    fade: FadeBet,
    display: String,
    implied_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    wager_input: Option<WagerInput>,
}

async fn fade(
    State(state): State<SharedState>,
    Json(request): Json<FadeRequest>,
) -> Result<Json<FadeResponse>, ApiError> {
    let game = resolve_game(&state, request.game, &request.wager)?;
    let pricing = request.pricing.unwrap_or(state.fade_pricing);

    let fade = calculate_fade_bet_with(&request.wager, &game, pricing)?;
    let wager_input = match request.stake {
        Some(stake) => Some(fade.clone().into_wager_input(stake)?),
        None => None,
    };

    Ok(Json(FadeResponse {
        display: fade.to_string(),
        implied_probability: fade.implied_probability(),
        fade,
        wager_input,
    }))
}

#[derive(Deserialize)]
struct SettleRequest {
    game: Game,
    wagers: Vec<Wager>,
}

#[derive(Serialize)]
struct SettleResponse {
    report: SettlementReport,
    summary: SettlementSummary,
    wagers: Vec<Wager>,
}

async fn settle(Json(request): Json<SettleRequest>) -> Result<Json<SettleResponse>, ApiError> {
    let mut wagers = request.wagers;
    let report = settle_game(&request.game, &mut wagers, Utc::now())?;
    Ok(Json(SettleResponse {
        summary: report.summary()?,
        report,
        wagers,
    }))
}

async fn games(State(state): State<SharedState>) -> Json<Vec<Game>> {
    Json(state.games.clone())
}

async fn health() -> &'static str {
    "ok"
}

fn app(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/games", get(games))
        .route("/api/outcome", post(outcome))
        .route("/api/fade", post(fade))
        .route("/api/settle", post(settle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.logging.init();

    // Serve whatever board the cli last fetched
    let games_file = config.games_cache_file();
    let games: Vec<Game> = if games_file.exists() {
        match load_from_cache(&games_file) {
            Ok(games) => games,
            Err(e) => {
                error!("Error loading {}: {:#}", games_file.display(), e);
                Vec::new()
            }
        }
    } else {
        warn!(
            "No game cache at {}; requests must include the game",
            games_file.display()
        );
        Vec::new()
    };
    info!("Loaded {} games", games.len());

    let state = Arc::new(AppState {
        games,
        fade_pricing: config.fade_pricing,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Starting web server at http://{}", config.bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
