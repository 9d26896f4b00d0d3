//! Game sessions and the sources that feed them
//!
//! The registry owns one session per game id, runs its polling task and
//! resolves players and logo colors through caches.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{LogoColorCache, PlayerCache, CACHE_TTL};
use crate::config::Config;
use crate::control::{ControlToken, Visibility};
use crate::error::AppError;
use crate::gradient::{Side, TeamColors, TeamGradient};
use crate::image_processing;
use crate::narration;
use crate::nhl::{self, NhlClient, PlayByPlay, PlayerInfo};
use crate::session::{GameSession, ScoreboardView};

/// Resolves player ids for narration
#[async_trait]
pub trait PlayerSource: Send + Sync {
    async fn player(&self, id: u64) -> Result<PlayerInfo, AppError>;
}

/// Player lookups against the NHL API, cached for 24 hours
pub struct CachedPlayers {
    nhl: NhlClient,
    cache: PlayerCache,
}

impl CachedPlayers {
    pub fn new(nhl: NhlClient) -> Self {
        Self {
            nhl,
            cache: PlayerCache::new(CACHE_TTL),
        }
    }
}

#[async_trait]
impl PlayerSource for CachedPlayers {
    async fn player(&self, id: u64) -> Result<PlayerInfo, AppError> {
        if let Some(player) = self.cache.get(&id).await {
            tracing::debug!("Using cached player {}", id);
            return Ok(player);
        }

        tracing::info!("Fetching player {} (cache miss)", id);
        let player = self.nhl.player(id).await?;
        self.cache.insert(id, player.clone()).await;

        Ok(player)
    }
}

/// A running game: its state plus the poller feeding it
pub struct GameHandle {
    session: Mutex<GameSession>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

/// Registry of active game sessions
pub struct SessionRegistry {
    nhl: NhlClient,
    players: Arc<dyn PlayerSource>,
    logo_colors: LogoColorCache,
    poll_interval: Duration,
    default_delay: Duration,
    color_seed: Option<u64>,
    games: RwLock<HashMap<String, Arc<GameHandle>>>,
}

impl SessionRegistry {
    pub fn new(client: Client, config: &Config) -> Self {
        let nhl = NhlClient::new(client, config.api_base.clone());
        let players = Arc::new(CachedPlayers::new(nhl.clone()));
        Self::with_players(nhl, players, config)
    }

    pub fn with_players(nhl: NhlClient, players: Arc<dyn PlayerSource>, config: &Config) -> Self {
        Self {
            nhl,
            players,
            logo_colors: LogoColorCache::new(CACHE_TTL),
            poll_interval: config.poll_interval,
            default_delay: config.default_delay,
            color_seed: config.color_seed,
            games: RwLock::new(HashMap::new()),
        }
    }

    pub fn nhl(&self) -> &NhlClient {
        &self.nhl
    }

    async fn game(&self, game_id: &str) -> Result<Arc<GameHandle>, AppError> {
        self.games
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| AppError::GameNotFound(game_id.to_string()))
    }

    /// Start or restart polling a game.
    ///
    /// Any previous poller for the game is stopped; the session state (last
    /// event, gradients, videos) is kept.
    pub async fn start(
        self: &Arc<Self>,
        game_id: &str,
        delay: Option<Duration>,
    ) -> Result<ScoreboardView, AppError> {
        let game_id = nhl::validate_id(game_id)?.to_string();
        let delay = delay.unwrap_or(self.default_delay);

        let game = {
            let mut games = self.games.write().await;
            games
                .entry(game_id.clone())
                .or_insert_with(|| {
                    Arc::new(GameHandle {
                        session: Mutex::new(GameSession::new(game_id.clone(), delay)),
                        poller: Mutex::new(None),
                    })
                })
                .clone()
        };
        game.session.lock().await.set_delay(delay);

        let registry = Arc::clone(self);
        let polled = Arc::clone(&game);
        let id = game_id.clone();
        let task = tokio::spawn(async move { registry.poll(id, polled).await });

        if let Some(previous) = game.poller.lock().await.replace(task) {
            previous.abort();
        }

        tracing::info!(
            "Started game {} (delay {}ms, every {}s)",
            game_id,
            delay.as_millis(),
            self.poll_interval.as_secs()
        );

        let view = game.session.lock().await.view(Instant::now());
        Ok(view)
    }

    /// Stop polling a game and drop its session
    pub async fn stop(&self, game_id: &str) -> Result<(), AppError> {
        let game = self
            .games
            .write()
            .await
            .remove(game_id)
            .ok_or_else(|| AppError::GameNotFound(game_id.to_string()))?;

        if let Some(poller) = game.poller.lock().await.take() {
            poller.abort();
        }
        tracing::info!("Stopped game {}", game_id);

        Ok(())
    }

    async fn poll(self: Arc<Self>, game_id: String, game: Arc<GameHandle>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut logos_loaded = false;

        loop {
            ticker.tick().await;

            let feed = match self.nhl.play_by_play(&game_id).await {
                Ok(feed) => feed,
                Err(e) => {
                    tracing::error!("Game {}: fetch failed: {}", game_id, e);
                    continue;
                }
            };

            if !logos_loaded {
                logos_loaded = self.load_gradients(&game, &feed);
            }

            let delay = game.session.lock().await.delay();
            let registry = Arc::clone(&self);
            let game = Arc::clone(&game);
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                registry.apply(&game, feed).await;
            });
        }
    }

    /// Apply a feed to a session and narrate the play it commits
    async fn apply(&self, game: &GameHandle, feed: PlayByPlay) {
        let committed = game.session.lock().await.apply_feed(&feed, Instant::now());
        let Some(play) = committed else {
            return;
        };

        match narration::describe(&play, self.players.as_ref()).await {
            Ok(narration) => game
                .session
                .lock()
                .await
                .set_narration(play.event_id, narration),
            Err(e) => tracing::warn!(
                "Could not narrate {} (event {}): {}",
                play.type_desc_key,
                play.event_id,
                e
            ),
        }
    }

    /// Kick off gradient extraction for both logos; false if the feed has none yet
    fn load_gradients(self: &Arc<Self>, game: &Arc<GameHandle>, feed: &PlayByPlay) -> bool {
        let logos = [
            (Side::Home, feed.home_team.as_ref().and_then(|t| t.logo.clone())),
            (Side::Away, feed.away_team.as_ref().and_then(|t| t.logo.clone())),
        ];
        if logos.iter().any(|(_, logo)| logo.is_none()) {
            return false;
        }

        let abbrev = |team: &Option<nhl::TeamStats>| {
            team.as_ref()
                .and_then(|t| t.abbrev.clone())
                .unwrap_or_else(|| "?".to_string())
        };
        tracing::info!(
            "Loading logo gradients for {} vs {}",
            abbrev(&feed.home_team),
            abbrev(&feed.away_team)
        );

        for (side, logo) in logos {
            let Some(url) = logo else { continue };
            let registry = Arc::clone(self);
            let game = Arc::clone(game);
            tokio::spawn(async move {
                let gradient = registry.team_gradient_or_fallback(&url, side).await;
                game.session.lock().await.set_gradient(gradient);
            });
        }

        true
    }

    /// Logo colors for `url`, from cache or by clustering the fetched image
    pub async fn team_colors(&self, url: &str) -> Result<TeamColors, AppError> {
        if let Some(colors) = self.logo_colors.get(&url.to_string()).await {
            tracing::debug!("Using cached colors for {}", url);
            return Ok(colors);
        }

        let image = self.nhl.fetch_image(url).await?;
        let seed = self.color_seed;
        let colors = tokio::task::spawn_blocking(move || {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            image_processing::extract_team_colors(&image.data, &mut rng)
        })
        .await
        .map_err(|e| AppError::ImageProcessing(format!("Color extraction task failed: {}", e)))??;

        self.logo_colors.insert(url.to_string(), colors).await;
        Ok(colors)
    }

    pub async fn team_gradient(&self, url: &str, side: Side) -> Result<TeamGradient, AppError> {
        let colors = self.team_colors(url).await?;
        Ok(TeamGradient::new(&colors, side))
    }

    async fn team_gradient_or_fallback(&self, url: &str, side: Side) -> TeamGradient {
        match self.team_gradient(url, side).await {
            Ok(gradient) => gradient,
            Err(e) => {
                tracing::warn!("Using fallback {} gradient for {}: {}", side, url, e);
                TeamGradient::fallback(side)
            }
        }
    }

    pub async fn view(&self, game_id: &str) -> Result<ScoreboardView, AppError> {
        let game = self.game(game_id).await?;
        let view = game.session.lock().await.view(Instant::now());
        Ok(view)
    }

    pub async fn control(&self, game_id: &str, token: ControlToken) -> Result<Visibility, AppError> {
        let game = self.game(game_id).await?;
        tracing::info!("Game {}: control {:?}", game_id, token);
        let visibility = game.session.lock().await.control(token, Instant::now());
        Ok(visibility)
    }
}
