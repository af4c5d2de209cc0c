/// A single ordering stage: whichever sub-engine resolves one set of items.
use crate::error::EngineError;
use crate::merge_sort::MergeSortSession;
use crate::round_robin::RoundRobinSession;
use crate::types::{ItemId, Pair, Standing};

/// How a stage orders its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Format {
    /// Strict total order from the fewest comparisons.
    #[default]
    MergeSort,
    /// Every pair once, ranked by win count. Ties are possible.
    RoundRobin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StageEngine {
    MergeSort(MergeSortSession),
    RoundRobin(RoundRobinSession),
}

impl StageEngine {
    /// `ids` must already be unique.
    pub(crate) fn new(format: Format, ids: Vec<ItemId>) -> Self {
        match format {
            Format::MergeSort => StageEngine::MergeSort(MergeSortSession::from_unique(ids)),
            Format::RoundRobin => StageEngine::RoundRobin(RoundRobinSession::from_unique(ids)),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            StageEngine::MergeSort(_) => Format::MergeSort,
            StageEngine::RoundRobin(_) => Format::RoundRobin,
        }
    }

    pub fn current_pair(&self) -> Option<Pair> {
        match self {
            StageEngine::MergeSort(s) => s.current_pair(),
            StageEngine::RoundRobin(s) => s.current_pair(),
        }
    }

    pub fn answer(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError> {
        match self {
            StageEngine::MergeSort(s) => s.answer(winner, loser),
            StageEngine::RoundRobin(s) => s.answer(winner, loser),
        }
    }

    pub fn done(&self) -> usize {
        match self {
            StageEngine::MergeSort(s) => s.done(),
            StageEngine::RoundRobin(s) => s.done(),
        }
    }

    pub fn total(&self) -> usize {
        match self {
            StageEngine::MergeSort(s) => s.total(),
            StageEngine::RoundRobin(s) => s.total(),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            StageEngine::MergeSort(s) => s.is_finished(),
            StageEngine::RoundRobin(s) => s.is_finished(),
        }
    }

    /// Resolved order, best first. `None` until the stage is finished.
    pub fn standings(&self) -> Option<Vec<Standing>> {
        match self {
            StageEngine::MergeSort(s) => s.standings(),
            StageEngine::RoundRobin(s) => s.standings(),
        }
    }
}
