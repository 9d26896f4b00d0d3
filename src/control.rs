//! Remote video control
//!
//! A soundboard operator triggers goal videos with three text tokens. Playing
//! a video hides the scoreboard and, for a short while, the play-by-play
//! panel; stopping restores both.

use serde::Serialize;
use std::str::FromStr;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

use crate::error::AppError;

/// How long the play-by-play panel stays hidden after a video starts
pub const PLAY_BY_PLAY_HIDE: Duration = Duration::from_secs(10);

/// Control tokens sent by the soundboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlToken {
    /// `spressed`: primary team goal video
    PlayPrimary,
    /// `lpressed`: alternate team goal video
    PlayAlternate,
    /// `all_stop`
    StopAll,
}

impl FromStr for ControlToken {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "spressed" => Ok(ControlToken::PlayPrimary),
            "lpressed" => Ok(ControlToken::PlayAlternate),
            "all_stop" => Ok(ControlToken::StopAll),
            other => Err(AppError::UnknownToken(other.to_string())),
        }
    }
}

/// What the overlay should currently show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Visibility {
    pub scoreboard: bool,
    pub play_by_play: bool,
    pub primary_video: bool,
    pub alternate_video: bool,
}

/// Video state driven by control tokens
#[derive(Debug, Clone, Default)]
pub struct VideoOverlay {
    primary_playing: bool,
    alternate_playing: bool,
    /// Set while a video is up; the panel comes back at this instant
    play_by_play_returns_at: Option<Instant>,
}

impl VideoOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a token at `now`
    pub fn apply(&mut self, token: ControlToken, now: Instant) {
        match token {
            ControlToken::PlayPrimary => self.play(true, now),
            ControlToken::PlayAlternate => self.play(false, now),
            ControlToken::StopAll => *self = Self::default(),
        }
    }

    fn play(&mut self, primary: bool, now: Instant) {
        if primary {
            self.primary_playing = true;
        } else {
            self.alternate_playing = true;
        }
        // a new video restarts the timer
        self.play_by_play_returns_at = Some(now + PLAY_BY_PLAY_HIDE);
    }

    fn any_playing(&self) -> bool {
        self.primary_playing || self.alternate_playing
    }

    pub fn visibility(&self, now: Instant) -> Visibility {
        let play_by_play = match self.play_by_play_returns_at {
            Some(at) => now >= at,
            None => true,
        };

        Visibility {
            scoreboard: !self.any_playing(),
            play_by_play,
            primary_video: self.primary_playing,
            alternate_video: self.alternate_playing,
        }
    }
}
