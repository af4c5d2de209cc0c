/// Error kinds surfaced by every ranking mode.
///
/// All of them are raised before any state is touched, so a rejected call
/// leaves the session exactly as it was.
use thiserror::Error;

use crate::types::{HolderId, ItemId, Pair};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("need at least 2 items to rank, got {got}")]
    InsufficientItems { got: usize },

    #[error("no active session for holder {holder}")]
    NoActiveSession { holder: HolderId },

    #[error("no comparison is pending")]
    NoActiveComparison,

    #[error("verdict {winner} > {loser} does not match the pending pair {expected:?}")]
    InvalidComparison {
        expected: Pair,
        winner: ItemId,
        loser: ItemId,
    },

    #[error("duplicate item ID: {0}")]
    DuplicateItem(ItemId),
}
