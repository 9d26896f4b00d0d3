//! Play narration
//!
//! Turns a play event into a one-line description plus the player images to
//! show next to it.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datasource::PlayerSource;
use crate::error::AppError;
use crate::nhl::{Play, PlayerInfo};

/// Narrated play
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Narration {
    pub text: String,
    /// Image URLs in display order
    pub headshots: Vec<String>,
}

/// Play types with a narration, keyed by the feed's `typeDescKey`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayKind {
    Goal,
    BlockedShot,
    Faceoff,
    Takeaway,
    Giveaway,
    ShotOnGoal,
    MissedShot,
    Hit,
    Penalty,
    Stoppage,
}

impl PlayKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "goal" => Some(PlayKind::Goal),
            "blocked-shot" => Some(PlayKind::BlockedShot),
            "faceoff" => Some(PlayKind::Faceoff),
            "takeaway" => Some(PlayKind::Takeaway),
            "giveaway" => Some(PlayKind::Giveaway),
            "shot-on-goal" => Some(PlayKind::ShotOnGoal),
            "missed-shot" => Some(PlayKind::MissedShot),
            "hit" => Some(PlayKind::Hit),
            "penalty" => Some(PlayKind::Penalty),
            "stoppage" => Some(PlayKind::Stoppage),
            _ => None,
        }
    }
}

/// `#16 Aleksander Barkov`, or just the name when no number is known
fn tag(p: &PlayerInfo) -> String {
    match p.sweater_number {
        Some(n) => format!("#{} {} {}", n, p.first_name, p.last_name),
        None => format!("{} {}", p.first_name, p.last_name),
    }
}

fn required(id: Option<u64>, field: &'static str) -> Result<u64, AppError> {
    id.ok_or(AppError::MissingPlayer(field))
}

/// Collects image URLs, skipping players without one
#[derive(Default)]
struct Headshots(Vec<String>);

impl Headshots {
    fn head(&mut self, p: &PlayerInfo) -> &mut Self {
        if !p.headshot.is_empty() {
            self.0.push(p.headshot.clone());
        }
        self
    }

    fn hero(&mut self, p: &PlayerInfo) -> &mut Self {
        if !p.hero_image.is_empty() {
            self.0.push(p.hero_image.clone());
        }
        self
    }
}

/// Describe a play.
///
/// Returns `Ok(None)` for play types without a narration (e.g. period
/// start/end).
pub async fn describe(
    play: &Play,
    players: &dyn PlayerSource,
) -> Result<Option<Narration>, AppError> {
    let Some(kind) = PlayKind::from_key(&play.type_desc_key) else {
        return Ok(None);
    };
    let d = &play.details;
    let mut shots = Headshots::default();

    let text = match kind {
        PlayKind::Goal => {
            let scorer = players
                .player(required(d.scoring_player_id, "scoringPlayerId")?)
                .await?;
            let assist1 = match d.assist1_player_id {
                Some(id) => Some(players.player(id).await?),
                None => None,
            };
            let assist2 = match d.assist2_player_id {
                Some(id) => Some(players.player(id).await?),
                None => None,
            };
            // empty net when the goalie was pulled
            let goalie = match d.goalie_in_net_id {
                Some(id) => Some(players.player(id).await?),
                None => None,
            };

            let mut text = format!("Goal scored by {}", tag(&scorer));
            shots.head(&scorer).hero(&scorer);
            if let Some(a1) = &assist1 {
                text.push_str(&format!(", assisted by {}", tag(a1)));
                shots.head(a1).hero(a1);
            }
            if let Some(a2) = &assist2 {
                text.push_str(&format!(" and {}", tag(a2)));
                shots.head(a2).hero(a2);
            }
            if let Some(g) = &goalie {
                text.push_str(&format!(" on {}", tag(g)));
                shots.head(g).hero(g);
            }
            text.push('.');
            text
        }
        PlayKind::BlockedShot => {
            let blocker = players
                .player(required(d.blocking_player_id, "blockingPlayerId")?)
                .await?;
            let shooter = players
                .player(required(d.shooting_player_id, "shootingPlayerId")?)
                .await?;
            shots.head(&shooter).head(&blocker);
            format!("Shot blocked by {} on {}.", tag(&blocker), tag(&shooter))
        }
        PlayKind::Faceoff => {
            let winner = players
                .player(required(d.winning_player_id, "winningPlayerId")?)
                .await?;
            let loser = players
                .player(required(d.losing_player_id, "losingPlayerId")?)
                .await?;
            shots.head(&winner).head(&loser);
            format!("Faceoff won by {} against {}.", tag(&winner), tag(&loser))
        }
        PlayKind::Takeaway | PlayKind::Giveaway => {
            let p = players.player(required(d.player_id, "playerId")?).await?;
            shots.head(&p);
            let label = if kind == PlayKind::Takeaway {
                "Takeaway"
            } else {
                "Giveaway"
            };
            format!("{} by {}.", label, tag(&p))
        }
        PlayKind::ShotOnGoal | PlayKind::MissedShot => {
            let p = players
                .player(required(d.shooting_player_id, "shootingPlayerId")?)
                .await?;
            shots.head(&p);
            let shot = match &d.shot_type {
                Some(shot_type) => format!("{} shot by {}", shot_type, tag(&p)),
                None => format!("Shot by {}", tag(&p)),
            };
            if kind == PlayKind::MissedShot {
                format!("{} missed.", shot)
            } else {
                format!("{}.", shot)
            }
        }
        PlayKind::Hit => {
            let hitter = players
                .player(required(d.hitting_player_id, "hittingPlayerId")?)
                .await?;
            let hittee = players
                .player(required(d.hittee_player_id, "hitteePlayerId")?)
                .await?;
            shots.head(&hitter).head(&hittee);
            format!("{} hit on {}.", tag(&hitter), tag(&hittee))
        }
        PlayKind::Penalty => {
            let p = players
                .player(required(d.committed_by_player_id, "committedByPlayerId")?)
                .await?;
            shots.head(&p);
            match &d.desc_key {
                Some(infraction) => format!("Penalty on {} for {}.", tag(&p), infraction),
                None => format!("Penalty on {}.", tag(&p)),
            }
        }
        PlayKind::Stoppage => "Play has been stopped.".to_string(),
    };

    Ok(Some(Narration {
        text,
        headshots: shots.0,
    }))
}
