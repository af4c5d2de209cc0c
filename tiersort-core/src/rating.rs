/// Continuous rating mode: sticky champion against random challengers.
///
/// Unlike the sorting modes this never finishes. Each verdict nudges two
/// ratings and the winner stays on as champion for the next pair.
use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::elo::{update_elo, EloConfig};
use crate::error::EngineError;
use crate::types::{ensure_unique, ItemId, Pair};

/// Ratings for every item a holder has judged. Unseen items read as the
/// initial rating; nothing is ever removed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingBook {
    ratings: HashMap<ItemId, f64>,
    initial_rating: f64,
}

impl RatingBook {
    pub fn new(initial_rating: f64) -> Self {
        RatingBook {
            ratings: HashMap::new(),
            initial_rating,
        }
    }

    pub fn rating(&self, id: ItemId) -> f64 {
        self.ratings.get(&id).copied().unwrap_or(self.initial_rating)
    }

    /// Apply one verdict and return the new `(winner, loser)` ratings.
    pub fn record(&mut self, winner: ItemId, loser: ItemId, k: f64) -> (f64, f64) {
        let (new_winner, new_loser) = update_elo(self.rating(winner), self.rating(loser), k);
        self.ratings.insert(winner, new_winner);
        self.ratings.insert(loser, new_loser);
        (new_winner, new_loser)
    }

    /// Every rated item, highest rating first; equal ratings by id.
    pub fn leaderboard(&self) -> Vec<(ItemId, f64)> {
        let mut board: Vec<(ItemId, f64)> = self.ratings.iter().map(|(&id, &r)| (id, r)).collect();
        board.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        board
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// Pick `(champion, challenger)` from `pool`.
///
/// The champion is kept if it is still in the pool, otherwise drawn at random.
/// The challenger is drawn uniformly from everyone else. Ids in `pool` must be
/// distinct, or the two sides could be the same item.
pub fn select_pair<R: Rng>(
    pool: &[ItemId],
    champion: Option<ItemId>,
    rng: &mut R,
) -> Result<Pair, EngineError> {
    if pool.len() < 2 {
        return Err(EngineError::InsufficientItems { got: pool.len() });
    }
    ensure_unique(pool)?;

    let champion_idx = champion
        .and_then(|c| pool.iter().position(|&id| id == c))
        .unwrap_or_else(|| rng.random_range(0..pool.len()));

    // Draw from the pool with the champion's slot skipped.
    let mut challenger_idx = rng.random_range(0..pool.len() - 1);
    if challenger_idx >= champion_idx {
        challenger_idx += 1;
    }

    Ok((pool[champion_idx], pool[challenger_idx]))
}

/// Result of one rating verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingOutcome {
    pub winner: ItemId,
    pub loser: ItemId,
    pub winner_rating: f64,
    pub loser_rating: f64,
}

/// Per-holder rating state: the book plus who is defending and what was asked.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingSession {
    config: EloConfig,
    book: RatingBook,
    champion: Option<ItemId>,
    pending: Option<Pair>,
}

impl RatingSession {
    pub fn new(config: EloConfig) -> Self {
        RatingSession {
            book: RatingBook::new(config.initial_rating),
            config,
            champion: None,
            pending: None,
        }
    }

    /// Hand out the next pair and remember it as the one awaiting a verdict.
    pub fn next_pair<R: Rng>(&mut self, pool: &[ItemId], rng: &mut R) -> Result<Pair, EngineError> {
        let pair = select_pair(pool, self.champion, rng)?;
        self.pending = Some(pair);
        Ok(pair)
    }

    /// Apply a verdict on the pending pair. The winner becomes champion.
    pub fn submit(&mut self, winner: ItemId, loser: ItemId) -> Result<RatingOutcome, EngineError> {
        let (a, b) = self.pending.ok_or(EngineError::NoActiveComparison)?;
        if !((winner == a && loser == b) || (winner == b && loser == a)) {
            return Err(EngineError::InvalidComparison {
                expected: (a, b),
                winner,
                loser,
            });
        }

        let (winner_rating, loser_rating) = self.book.record(winner, loser, self.config.k_factor);
        debug!(winner, loser, winner_rating, loser_rating, "ratings updated");
        self.champion = Some(winner);
        self.pending = None;

        Ok(RatingOutcome {
            winner,
            loser,
            winner_rating,
            loser_rating,
        })
    }

    pub fn pending(&self) -> Option<Pair> {
        self.pending
    }

    pub fn champion(&self) -> Option<ItemId> {
        self.champion
    }

    pub fn book(&self) -> &RatingBook {
        &self.book
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }
}

impl Default for RatingSession {
    fn default() -> Self {
        RatingSession::new(EloConfig::default())
    }
}
