/// Round-robin scorer: every pair inside the set is judged exactly once.
///
/// The schedule is fixed at start (lexicographic over insertion order), so the
/// number of answers needed always equals the budget `k(k-1)/2`.
use std::collections::VecDeque;

use crate::error::EngineError;
use crate::types::{ensure_unique, IndexedPair, ItemId, Pair, Standing};

/// Matches needed for `n` items to meet each other once.
pub fn total_matches(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundRobinSession {
    items: Vec<ItemId>,
    /// Matches still to be played, as indices into `items`.
    schedule: VecDeque<IndexedPair>,
    /// Wins per item, same order as `items`.
    wins: Vec<u32>,
    done: usize,
    total: usize,
}

impl RoundRobinSession {
    pub fn start(ids: &[ItemId]) -> Result<Self, EngineError> {
        ensure_unique(ids)?;
        Ok(Self::from_unique(ids.to_vec()))
    }

    pub(crate) fn from_unique(items: Vec<ItemId>) -> Self {
        let n = items.len();
        let schedule: VecDeque<IndexedPair> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        RoundRobinSession {
            wins: vec![0; n],
            total: total_matches(n),
            schedule,
            items,
            done: 0,
        }
    }

    /// Ids for the next scheduled match. `None` when the schedule is empty or
    /// names an index outside `items`.
    fn next_match(&self) -> Option<(IndexedPair, Pair)> {
        let &(a, b) = self.schedule.front()?;
        let pair = (*self.items.get(a)?, *self.items.get(b)?);
        Some(((a, b), pair))
    }

    pub fn current_pair(&self) -> Option<Pair> {
        self.next_match().map(|(_, pair)| pair)
    }

    pub fn answer(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError> {
        let ((a, b), (id_a, id_b)) = self.next_match().ok_or(EngineError::NoActiveComparison)?;

        let winner_idx = if winner == id_a && loser == id_b {
            a
        } else if winner == id_b && loser == id_a {
            b
        } else {
            return Err(EngineError::InvalidComparison {
                expected: (id_a, id_b),
                winner,
                loser,
            });
        };

        match self.wins.get_mut(winner_idx) {
            Some(wins) => *wins += 1,
            None => return Err(EngineError::NoActiveComparison),
        }
        self.schedule.pop_front();
        self.done += 1;
        Ok(())
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.schedule.is_empty()
    }

    /// Items by wins descending; equal wins keep insertion order.
    pub fn standings(&self) -> Option<Vec<Standing>> {
        if !self.is_finished() {
            return None;
        }

        let opponents = self.items.len().saturating_sub(1);
        let wins_of = |idx: usize| self.wins.get(idx).copied().unwrap_or(0);
        let mut order: Vec<usize> = (0..self.items.len()).collect();
        order.sort_by_key(|&idx| std::cmp::Reverse(wins_of(idx)));

        Some(
            order
                .into_iter()
                .map(|idx| {
                    let wins = wins_of(idx);
                    Standing {
                        id: self.items[idx],
                        wins: Some(wins),
                        win_fraction: Some(if opponents == 0 {
                            0.0
                        } else {
                            f64::from(wins) / opponents as f64
                        }),
                    }
                })
                .collect(),
        )
    }
}
