//! NHL web API integration
//!
//! Fetches play-by-play and player data for the overlay. The raw fetches back
//! the pass-through proxy routes; the typed ones feed game sessions.

use reqwest::{header, Client, Response};
use serde::Deserialize;

use crate::error::AppError;

/// Default NHL web API base URL
pub const DEFAULT_API_BASE: &str = "https://api-web.nhle.com/v1";

/// Play-by-play payload (only the fields the overlay reads)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayByPlay {
    #[serde(default)]
    pub plays: Vec<Play>,
    pub home_team: Option<TeamStats>,
    pub away_team: Option<TeamStats>,
}

/// Team block of the play-by-play payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub abbrev: Option<String>,
    /// Missing before puck drop
    pub score: Option<u32>,
    /// Shots on goal
    pub sog: Option<u32>,
    pub logo: Option<String>,
}

/// A single play event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    pub event_id: u64,
    pub sort_order: i64,
    pub type_desc_key: String,
    pub time_remaining: Option<String>,
    #[serde(default)]
    pub details: PlayDetails,
}

/// Event details; which fields are present depends on the play type
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayDetails {
    pub scoring_player_id: Option<u64>,
    pub assist1_player_id: Option<u64>,
    pub assist2_player_id: Option<u64>,
    pub goalie_in_net_id: Option<u64>,
    pub blocking_player_id: Option<u64>,
    pub shooting_player_id: Option<u64>,
    pub winning_player_id: Option<u64>,
    pub losing_player_id: Option<u64>,
    pub player_id: Option<u64>,
    pub hitting_player_id: Option<u64>,
    pub hittee_player_id: Option<u64>,
    pub committed_by_player_id: Option<u64>,
    pub shot_type: Option<String>,
    pub desc_key: Option<String>,
}

/// Localized string, e.g. `{"default": "Aleksander"}`
#[derive(Debug, Clone, Deserialize)]
struct LocalizedName {
    default: String,
}

/// Player landing payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerLanding {
    first_name: LocalizedName,
    last_name: LocalizedName,
    sweater_number: Option<u32>,
    #[serde(default)]
    headshot: String,
    #[serde(default)]
    hero_image: String,
}

/// The player fields the narration uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub first_name: String,
    pub last_name: String,
    pub sweater_number: Option<u32>,
    pub headshot: String,
    pub hero_image: String,
}

/// Parse a player landing JSON document
pub fn parse_player(json: &str) -> Result<PlayerInfo, AppError> {
    let landing: PlayerLanding = serde_json::from_str(json)
        .map_err(|e| AppError::ExternalApi(format!("Bad player payload: {}", e)))?;
    Ok(PlayerInfo {
        first_name: landing.first_name.default,
        last_name: landing.last_name.default,
        sweater_number: landing.sweater_number,
        headshot: landing.headshot,
        hero_image: landing.hero_image,
    })
}

/// Game and player ids are plain digit strings
pub fn validate_id(id: &str) -> Result<&str, AppError> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id)
    } else {
        Err(AppError::InvalidId(id.to_string()))
    }
}

/// Fetched image with its upstream content type
pub struct FetchedImage {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Thin client over the NHL web API
#[derive(Clone)]
pub struct NhlClient {
    client: Client,
    base_url: String,
}

impl NhlClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_checked(&self, url: &str, accept: &str) -> Result<Response, AppError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "{} returned status: {}",
                url,
                response.status()
            )));
        }

        Ok(response)
    }

    async fn get_json_text(&self, path: &str) -> Result<String, AppError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Fetching {}", url);
        Ok(self.get_checked(&url, "application/json").await?.text().await?)
    }

    /// Raw play-by-play JSON
    pub async fn play_by_play_raw(&self, game_id: &str) -> Result<String, AppError> {
        let game_id = validate_id(game_id)?;
        self.get_json_text(&format!("/gamecenter/{}/play-by-play", game_id))
            .await
    }

    /// Raw game landing JSON (clock, summary)
    pub async fn landing_raw(&self, game_id: &str) -> Result<String, AppError> {
        let game_id = validate_id(game_id)?;
        self.get_json_text(&format!("/gamecenter/{}/landing", game_id))
            .await
    }

    /// Raw player landing JSON
    pub async fn player_raw(&self, player_id: &str) -> Result<String, AppError> {
        let player_id = validate_id(player_id)?;
        self.get_json_text(&format!("/player/{}/landing", player_id))
            .await
    }

    /// Typed play-by-play
    pub async fn play_by_play(&self, game_id: &str) -> Result<PlayByPlay, AppError> {
        let body = self.play_by_play_raw(game_id).await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::ExternalApi(format!("Bad play-by-play payload: {}", e)))
    }

    /// Typed player lookup
    pub async fn player(&self, player_id: u64) -> Result<PlayerInfo, AppError> {
        let body = self.player_raw(&player_id.to_string()).await?;
        parse_player(&body)
    }

    /// Fetch an arbitrary image (logos, proxied media)
    pub async fn fetch_image(&self, url: &str) -> Result<FetchedImage, AppError> {
        tracing::info!("Fetching image from {}", url);

        let response = self.get_checked(url, "image/*").await?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = response.bytes().await?.to_vec();

        Ok(FetchedImage { content_type, data })
    }
}
