/// Logistic Elo update for one verdict.
use crate::constants::{DEFAULT_K_FACTOR, ELO_SCALE, INITIAL_ELO_RATING};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EloConfig {
    pub k_factor: f64,
    pub initial_rating: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            k_factor: DEFAULT_K_FACTOR,
            initial_rating: INITIAL_ELO_RATING,
        }
    }
}

/// Probability that a player rated `rating` beats one rated `opponent`.
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / ELO_SCALE))
}

/// New `(winner, loser)` ratings after `winner` beats `loser`.
pub fn update_elo(winner_rating: f64, loser_rating: f64, k: f64) -> (f64, f64) {
    let expected_win = expected_score(winner_rating, loser_rating);
    let expected_loss = expected_score(loser_rating, winner_rating);
    (
        winner_rating + k * (1.0 - expected_win),
        loser_rating + k * (0.0 - expected_loss),
    )
}
