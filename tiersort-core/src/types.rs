use std::collections::HashSet;

use crate::error::EngineError;
use crate::tiers::Tier;

/// Caller-provided item identifier. The engine never looks inside it.
pub type ItemId = i64;

/// Identity of whoever owns a session (one live session per holder per mode).
pub type HolderId = i64;

/// A pairing: two item IDs to be compared.
pub type Pair = (ItemId, ItemId);

/// Internal indexed pair (usize indices, not caller IDs).
pub(crate) type IndexedPair = (usize, usize);

/// One resolved position inside a stage, best first.
///
/// `wins` and `win_fraction` are only known when the stage was scored
/// round-robin; a merge-sorted stage orders by position alone.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Standing {
    pub id: ItemId,
    pub wins: Option<u32>,
    pub win_fraction: Option<f64>,
}

impl Standing {
    pub fn positional(id: ItemId) -> Self {
        Standing { id, wins: None, win_fraction: None }
    }

    /// Two standings tie only when both carry a win count and the counts match.
    pub fn ties_with(&self, other: &Standing) -> bool {
        matches!((self.wins, other.wins), (Some(a), Some(b)) if a == b)
    }
}

/// One row of a final ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankingEntry {
    pub id: ItemId,
    pub tier: Tier,
    /// 1-based position in the full ranking.
    pub rank: usize,
    /// Numeric score when the ordering produced one, `None` otherwise.
    pub score: Option<f64>,
}

/// Reject the first id that appears twice.
pub(crate) fn ensure_unique(ids: &[ItemId]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(&id) => Err(EngineError::DuplicateItem(id)),
        None => Ok(()),
    }
}
