mod cache;
mod config;
mod control;
mod datasource;
mod error;
mod gradient;
mod image_processing;
mod kmeans;
mod narration;
mod nhl;
mod palette;
mod session;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::config::Config;
use crate::control::{ControlToken, Visibility};
use crate::datasource::SessionRegistry;
use crate::error::AppError;
use crate::gradient::{Side, TeamGradient};
use crate::narration::Narration;
use crate::session::ScoreboardView;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    registry: Arc<SessionRegistry>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scoreboard Overlay API",
        description = "Game proxy, logo gradients and overlay state for a live scoreboard",
        version = "0.1.0"
    ),
    tags(
        (name = "Proxy", description = "Pass-through NHL API routes"),
        (name = "Overlay", description = "Scoreboard overlay sessions")
    ),
    paths(
        health,
        proxy_player,
        proxy_game,
        proxy_landing,
        proxy_image,
        convert_svg_to_png,
        get_colors,
        start_game,
        stop_game,
        get_overlay,
        post_control
    ),
    components(schemas(GameSettings, ScoreboardView, TeamGradient, Side, Narration, Visibility))
)]
struct ApiDoc;

/// Settings applied when a game is (re)started
#[derive(Debug, Default, Deserialize, ToSchema)]
struct GameSettings {
    /// Display delay in milliseconds, to line up with a delayed broadcast
    #[serde(default)]
    delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ImageQuery {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SvgQuery {
    #[serde(rename = "svgUrl")]
    svg_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ColorQuery {
    url: Option<String>,
    side: Option<Side>,
}

fn required_url(url: Option<String>, name: &'static str) -> Result<String, AppError> {
    url.filter(|u| !u.trim().is_empty())
        .ok_or(AppError::MissingParameter(name))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Using NHL API at {}", config.api_base);

    let client = Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(std::io::Error::other)?;
    let registry = Arc::new(SessionRegistry::new(client, &config));
    let state = AppState { registry };

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/proxy/{player_id}", get(proxy_player))
        .route("/proxyGame/{game_id}", get(proxy_game))
        .route("/proxyLanding/{game_id}", get(proxy_landing))
        .route("/proxyImage", get(proxy_image))
        .route("/convertSvgToPng", get(convert_svg_to_png))
        .route("/colors", get(get_colors))
        .route("/games/{game_id}", post(start_game).delete(stop_game))
        .route("/games/{game_id}/overlay", get(get_overlay))
        .route("/games/{game_id}/control", post(post_control))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/openapi.json", get(openapi_json))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health() -> &'static str {
    "ok"
}

/// Get OpenAPI JSON specification
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn json_response(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Player landing data
#[utoipa::path(
    get,
    path = "/proxy/{player_id}",
    tag = "Proxy",
    params(("player_id" = String, Path, description = "NHL player id")),
    responses(
        (status = 200, description = "Upstream player JSON", content_type = "application/json"),
        (status = 400, description = "Invalid id"),
        (status = 502, description = "Upstream failure")
    )
)]
async fn proxy_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Response, AppError> {
    let body = state.registry.nhl().player_raw(&player_id).await?;
    Ok(json_response(body))
}

/// Play-by-play data for a game
#[utoipa::path(
    get,
    path = "/proxyGame/{game_id}",
    tag = "Proxy",
    params(("game_id" = String, Path, description = "NHL game id")),
    responses(
        (status = 200, description = "Upstream play-by-play JSON", content_type = "application/json"),
        (status = 400, description = "Invalid id"),
        (status = 502, description = "Upstream failure")
    )
)]
async fn proxy_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Response, AppError> {
    let body = state.registry.nhl().play_by_play_raw(&game_id).await?;
    Ok(json_response(body))
}

/// Landing data for a game (clock and summary)
#[utoipa::path(
    get,
    path = "/proxyLanding/{game_id}",
    tag = "Proxy",
    params(("game_id" = String, Path, description = "NHL game id")),
    responses(
        (status = 200, description = "Upstream landing JSON", content_type = "application/json"),
        (status = 400, description = "Invalid id"),
        (status = 502, description = "Upstream failure")
    )
)]
async fn proxy_landing(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Response, AppError> {
    let body = state.registry.nhl().landing_raw(&game_id).await?;
    Ok(json_response(body))
}

/// Fetch an image through the server
#[utoipa::path(
    get,
    path = "/proxyImage",
    tag = "Proxy",
    params(("url" = String, Query, description = "Image URL")),
    responses(
        (status = 200, description = "Image bytes with upstream content type"),
        (status = 400, description = "Missing url"),
        (status = 502, description = "Upstream failure")
    )
)]
async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, AppError> {
    let url = required_url(query.url, "url")?;
    let image = state.registry.nhl().fetch_image(&url).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, image.content_type)],
        image.data,
    )
        .into_response())
}

/// Rasterize an SVG logo to PNG
#[utoipa::path(
    get,
    path = "/convertSvgToPng",
    tag = "Proxy",
    params(("svgUrl" = String, Query, description = "SVG URL")),
    responses(
        (status = 200, description = "PNG at the SVG's intrinsic size", content_type = "image/png"),
        (status = 400, description = "Missing svgUrl"),
        (status = 500, description = "Not an SVG or could not be rendered"),
        (status = 502, description = "Upstream failure")
    )
)]
async fn convert_svg_to_png(
    State(state): State<AppState>,
    Query(query): Query<SvgQuery>,
) -> Result<Response, AppError> {
    let url = required_url(query.svg_url, "svgUrl")?;
    let image = state.registry.nhl().fetch_image(&url).await?;
    if !image_processing::is_svg(&image.content_type, &image.data) {
        return Err(AppError::ImageProcessing(format!(
            "{} is not an SVG ({})",
            url, image.content_type
        )));
    }

    let png = tokio::task::spawn_blocking(move || {
        image_processing::rasterize_svg(&image.data).and_then(image_processing::encode_png)
    })
    .await
    .map_err(|e| AppError::ImageProcessing(format!("SVG conversion task failed: {}", e)))??;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Logo colors and gradient
///
/// Clusters the logo's non-white, non-transparent pixels into three colors.
#[utoipa::path(
    get,
    path = "/colors",
    tag = "Overlay",
    params(
        ("url" = String, Query, description = "Logo URL (PNG or JPEG)"),
        ("side" = Option<Side>, Query, description = "home (default) or away")
    ),
    responses(
        (status = 200, description = "Colors and CSS gradient", body = TeamGradient),
        (status = 400, description = "Missing url"),
        (status = 422, description = "Logo has fewer than three usable pixels"),
        (status = 500, description = "Logo could not be decoded")
    )
)]
async fn get_colors(
    State(state): State<AppState>,
    Query(query): Query<ColorQuery>,
) -> Result<Json<TeamGradient>, AppError> {
    let url = required_url(query.url, "url")?;
    let side = query.side.unwrap_or(Side::Home);
    let gradient = state.registry.team_gradient(&url, side).await?;
    Ok(Json(gradient))
}

/// Start or restart a game session
///
/// Polls the game's play-by-play every few seconds and applies each update
/// after the requested delay.
#[utoipa::path(
    post,
    path = "/games/{game_id}",
    tag = "Overlay",
    params(("game_id" = String, Path, description = "NHL game id")),
    request_body = GameSettings,
    responses(
        (status = 200, description = "Session started", body = ScoreboardView),
        (status = 400, description = "Invalid id")
    )
)]
async fn start_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(settings): Json<GameSettings>,
) -> Result<Json<ScoreboardView>, AppError> {
    let delay = settings.delay_ms.map(Duration::from_millis);
    let view = state.registry.start(&game_id, delay).await?;
    Ok(Json(view))
}

/// Stop a game session
///
/// Stops polling and forgets the session's state.
#[utoipa::path(
    delete,
    path = "/games/{game_id}",
    tag = "Overlay",
    params(("game_id" = String, Path, description = "NHL game id")),
    responses(
        (status = 204, description = "Session stopped"),
        (status = 404, description = "Game not started")
    )
)]
async fn stop_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.stop(&game_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current overlay state for a game
#[utoipa::path(
    get,
    path = "/games/{game_id}/overlay",
    tag = "Overlay",
    params(("game_id" = String, Path, description = "NHL game id")),
    responses(
        (status = 200, description = "Overlay state", body = ScoreboardView),
        (status = 404, description = "Game not started")
    )
)]
async fn get_overlay(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(state.registry.view(&game_id).await?))
}

/// Send a video control token
///
/// Body is one of `spressed`, `lpressed` or `all_stop`.
#[utoipa::path(
    post,
    path = "/games/{game_id}/control",
    tag = "Overlay",
    params(("game_id" = String, Path, description = "NHL game id")),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Visibility after the token", body = Visibility),
        (status = 400, description = "Unknown token"),
        (status = 404, description = "Game not started")
    )
)]
async fn post_control(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    body: String,
) -> Result<Json<Visibility>, AppError> {
    let token: ControlToken = body.parse()?;
    Ok(Json(state.registry.control(&game_id, token).await?))
}
