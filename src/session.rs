//! Per-game overlay state
//!
//! A `GameSession` owns everything one overlay shows for one game: the last
//! narrated event, the goal lock, scoreboard numbers, team gradients and the
//! video state. Sessions for different games share nothing.

use serde::Serialize;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::control::{ControlToken, VideoOverlay, Visibility};
use crate::gradient::{Side, TeamGradient};
use crate::narration::Narration;
use crate::nhl::{Play, PlayByPlay};

/// After a goal, other plays are held back this long
pub const GOAL_LOCK: Duration = Duration::from_secs(45);

const UNKNOWN_CLOCK: &str = "--:--";

/// Snapshot returned to overlay clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardView {
    pub game_id: String,
    pub home_score: u32,
    pub away_score: u32,
    /// `Home Shots: N`
    pub home_shots: String,
    /// `Away Shots: N`
    pub away_shots: String,
    /// `Time Left: MM:SS`
    pub clock: String,
    pub narration: Narration,
    pub home_gradient: Option<TeamGradient>,
    pub away_gradient: Option<TeamGradient>,
    pub visibility: Visibility,
    pub delay_ms: u64,
}

/// Latest play by `sortOrder`; the earliest of equal entries wins
pub fn newest_play(plays: &[Play]) -> Option<&Play> {
    plays.iter().fold(None, |best: Option<&Play>, play| match best {
        Some(b) if play.sort_order <= b.sort_order => Some(b),
        _ => Some(play),
    })
}

pub struct GameSession {
    game_id: String,
    delay: Duration,
    last_event_id: Option<u64>,
    goal_lock_until: Option<Instant>,
    home_score: u32,
    away_score: u32,
    home_sog: u32,
    away_sog: u32,
    time_remaining: Option<String>,
    narration: Narration,
    home_gradient: Option<TeamGradient>,
    away_gradient: Option<TeamGradient>,
    overlay: VideoOverlay,
}

impl GameSession {
    pub fn new(game_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            game_id: game_id.into(),
            delay,
            last_event_id: None,
            goal_lock_until: None,
            home_score: 0,
            away_score: 0,
            home_sog: 0,
            away_sog: 0,
            time_remaining: None,
            narration: Narration::default(),
            home_gradient: None,
            away_gradient: None,
            overlay: VideoOverlay::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Apply a fetched feed at `now`.
    ///
    /// Returns the play that was just committed for narration, if any. The
    /// caller narrates it and hands the result to `set_narration`.
    pub fn apply_feed(&mut self, feed: &PlayByPlay, now: Instant) -> Option<Play> {
        if let Some(home) = &feed.home_team {
            self.home_score = home.score.unwrap_or(0);
            self.home_sog = home.sog.unwrap_or(0);
        }
        if let Some(away) = &feed.away_team {
            self.away_score = away.score.unwrap_or(0);
            self.away_sog = away.sog.unwrap_or(0);
        }

        let newest = newest_play(&feed.plays)?;
        self.time_remaining = newest.time_remaining.clone();

        if self.last_event_id == Some(newest.event_id) {
            return None;
        }

        let is_goal = newest.type_desc_key == "goal";
        let locked = self.goal_lock_until.is_some_and(|until| now < until);
        if locked && !is_goal {
            tracing::debug!(
                "Game {}: holding {} (event {}) during goal lock",
                self.game_id,
                newest.type_desc_key,
                newest.event_id
            );
            return None;
        }

        self.last_event_id = Some(newest.event_id);
        if is_goal {
            self.goal_lock_until = Some(now + GOAL_LOCK);
        }
        self.narration.headshots.clear();

        Some(newest.clone())
    }

    /// Store the narration for `event_id`.
    ///
    /// Ignored when a newer event has been committed since; `None` keeps the
    /// previous description.
    pub fn set_narration(&mut self, event_id: u64, narration: Option<Narration>) {
        if self.last_event_id != Some(event_id) {
            return;
        }
        if let Some(narration) = narration {
            self.narration = narration;
        }
    }

    pub fn set_gradient(&mut self, gradient: TeamGradient) {
        match gradient.side {
            Side::Home => self.home_gradient = Some(gradient),
            Side::Away => self.away_gradient = Some(gradient),
        }
    }

    pub fn control(&mut self, token: ControlToken, now: Instant) -> Visibility {
        self.overlay.apply(token, now);
        self.overlay.visibility(now)
    }

    pub fn view(&self, now: Instant) -> ScoreboardView {
        ScoreboardView {
            game_id: self.game_id.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
            home_shots: format!("Home Shots: {}", self.home_sog),
            away_shots: format!("Away Shots: {}", self.away_sog),
            clock: format!(
                "Time Left: {}",
                self.time_remaining.as_deref().unwrap_or(UNKNOWN_CLOCK)
            ),
            narration: self.narration.clone(),
            home_gradient: self.home_gradient.clone(),
            away_gradient: self.away_gradient.clone(),
            visibility: self.overlay.visibility(now),
            delay_ms: self.delay.as_millis() as u64,
        }
    }
}
