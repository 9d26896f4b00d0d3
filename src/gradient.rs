//! Team background gradients
//!
//! Each half of the scoreboard gets two stacked linear gradients built from
//! the three logo colors: a diagonal accent stripe over a horizontal blend.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::kmeans::ClusterError;
use crate::palette::Rgb;

/// Scoreboard half a team is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left half, blend runs to the right
    Home,
    /// Right half, blend runs to the left
    Away,
}

impl Side {
    fn direction(&self) -> &'static str {
        match self {
            Side::Home => "right",
            Side::Away => "left",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => write!(f, "home"),
            Side::Away => write!(f, "away"),
        }
    }
}

/// The three clustered logo colors, in cluster order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamColors {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub tertiary: Rgb,
}

impl TeamColors {
    /// Neutral greys used when a logo yields no usable colors
    pub const fn fallback() -> Self {
        Self {
            primary: Rgb::new(32, 32, 32),
            secondary: Rgb::new(64, 64, 64),
            tertiary: Rgb::new(96, 96, 96),
        }
    }

    /// Build from clusterer output (needs exactly three centroids)
    pub fn from_centroids(centroids: &[Rgb]) -> Result<Self, ClusterError> {
        match centroids {
            [primary, secondary, tertiary] => Ok(Self {
                primary: *primary,
                secondary: *secondary,
                tertiary: *tertiary,
            }),
            _ => Err(ClusterError::InsufficientData {
                available: centroids.len(),
                requested: 3,
            }),
        }
    }

    pub fn css(&self) -> [String; 3] {
        [
            self.primary.css(),
            self.secondary.css(),
            self.tertiary.css(),
        ]
    }

    /// CSS `background` value for the given half
    pub fn gradient(&self, side: Side) -> String {
        let [p, s, t] = self.css();
        format!(
            "linear-gradient(to bottom right, {s} 25%, transparent 40%, {t} 45%, transparent 50%),\
             linear-gradient(to {dir}, {p} 0%, {s} 50%)",
            dir = side.direction(),
        )
    }
}

/// Gradient payload returned to overlay clients
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamGradient {
    pub side: Side,
    /// `rgb(r,g,b)` strings in cluster order
    pub colors: Vec<String>,
    /// CSS background value
    pub gradient: String,
    /// True when the logo could not be analysed
    pub fallback: bool,
}

impl TeamGradient {
    pub fn new(colors: &TeamColors, side: Side) -> Self {
        Self {
            side,
            colors: colors.css().to_vec(),
            gradient: colors.gradient(side),
            fallback: false,
        }
    }

    pub fn fallback(side: Side) -> Self {
        Self {
            fallback: true,
            ..Self::new(&TeamColors::fallback(), side)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panthers() -> TeamColors {
        TeamColors {
            primary: Rgb::new(200, 16, 46),
            secondary: Rgb::new(4, 30, 66),
            tertiary: Rgb::new(185, 151, 91),
        }
    }

    #[test]
    fn test_home_gradient() {
        assert_eq!(
            panthers().gradient(Side::Home),
            "linear-gradient(to bottom right, rgb(4,30,66) 25%, transparent 40%, rgb(185,151,91) 45%, transparent 50%),\
             linear-gradient(to right, rgb(200,16,46) 0%, rgb(4,30,66) 50%)"
        );
    }

    #[test]
    fn test_away_gradient_runs_left() {
        let css = panthers().gradient(Side::Away);
        assert!(css.ends_with("linear-gradient(to left, rgb(200,16,46) 0%, rgb(4,30,66) 50%)"));
        assert!(css.starts_with("linear-gradient(to bottom right, rgb(4,30,66) 25%"));
    }

    #[test]
    fn test_from_centroids() {
        let centroids = [Rgb::new(1, 1, 1), Rgb::new(2, 2, 2), Rgb::new(3, 3, 3)];
        let colors = TeamColors::from_centroids(&centroids).unwrap();
        assert_eq!(colors.primary, Rgb::new(1, 1, 1));
        assert_eq!(colors.tertiary, Rgb::new(3, 3, 3));

        assert!(TeamColors::from_centroids(&centroids[..2]).is_err());
    }

    #[test]
    fn test_fallback_gradient() {
        let gradient = TeamGradient::fallback(Side::Away);
        assert!(gradient.fallback);
        assert_eq!(gradient.colors, vec!["rgb(32,32,32)", "rgb(64,64,64)", "rgb(96,96,96)"]);
        assert_eq!(gradient.gradient, TeamColors::fallback().gradient(Side::Away));
    }
}
