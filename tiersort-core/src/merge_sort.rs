/// Bottom-up merge sort driven by an external comparator.
///
/// The sort never blocks: whenever it needs a human decision it stops with the
/// pending pair at the heads of `left` and `right`, and the whole session is a
/// plain value the caller can persist and hand back later.
use std::collections::VecDeque;

use tracing::debug;

use crate::error::EngineError;
use crate::types::{ensure_unique, ItemId, Pair, Standing};

/// Worst-case number of comparisons needed to sort `n` items.
///
/// Sums `left_len + right_len - 1` over every merge of every pass, with runs
/// doubling in width each pass. A lone trailing run is carried over for free.
pub fn total_comparisons(n: usize) -> usize {
    if n <= 1 {
        return 0;
    }

    let mut total = 0;
    let mut width = 1;
    while width < n {
        let mut start = 0;
        while start < n {
            let left_len = width.min(n - start);
            let right_len = width.min(n - start - left_len);
            if right_len > 0 {
                total += left_len + right_len - 1;
            }
            start += width * 2;
        }
        width *= 2;
    }
    total
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeSortSession {
    /// Sorted runs waiting to be merged, oldest first.
    pending: VecDeque<Vec<ItemId>>,
    /// The two runs currently being merged. Either both are non-empty or
    /// both are empty whenever the session is handed back to a caller.
    left: VecDeque<ItemId>,
    right: VecDeque<ItemId>,
    /// Ids already placed by the merge in progress.
    result: Vec<ItemId>,
    done: usize,
    total: usize,
    finished: bool,
    final_order: Option<Vec<ItemId>>,
}

impl MergeSortSession {
    /// Start sorting `ids`. Every id begins as its own sorted run; the first
    /// pair is ready as soon as this returns.
    pub fn start(ids: &[ItemId]) -> Result<Self, EngineError> {
        ensure_unique(ids)?;
        Ok(Self::from_unique(ids.to_vec()))
    }

    /// Same as `start` for ids already known to be unique.
    pub(crate) fn from_unique(ids: Vec<ItemId>) -> Self {
        let total = total_comparisons(ids.len());
        let mut session = MergeSortSession {
            pending: ids.into_iter().map(|id| vec![id]).collect(),
            left: VecDeque::new(),
            right: VecDeque::new(),
            result: Vec::new(),
            done: 0,
            total,
            finished: false,
            final_order: None,
        };
        session.advance();
        session
    }

    /// The pair the human must judge next, `None` once sorted.
    pub fn current_pair(&self) -> Option<Pair> {
        if self.finished {
            return None;
        }
        match (self.left.front(), self.right.front()) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Record that `winner` beats `loser` and move on to the next decision.
    ///
    /// The verdict must name exactly the pending pair, in either order.
    pub fn answer(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError> {
        let (left_head, right_head) = self.current_pair().ok_or(EngineError::NoActiveComparison)?;

        let side = if winner == left_head && loser == right_head {
            &mut self.left
        } else if winner == right_head && loser == left_head {
            &mut self.right
        } else {
            return Err(EngineError::InvalidComparison {
                expected: (left_head, right_head),
                winner,
                loser,
            });
        };

        if let Some(head) = side.pop_front() {
            self.result.push(head);
        }
        self.done += 1;
        self.advance();
        Ok(())
    }

    /// Drive the sort forward until a decision is needed or everything is merged.
    fn advance(&mut self) {
        loop {
            if !self.left.is_empty() && !self.right.is_empty() {
                return;
            }

            // One side drained: the rest of the other side follows without asking.
            if !self.left.is_empty() || !self.right.is_empty() {
                let mut merged = std::mem::take(&mut self.result);
                merged.extend(self.left.drain(..));
                merged.extend(self.right.drain(..));
                debug!(run_len = merged.len(), done = self.done, "merge complete");
                self.pending.push_back(merged);
            }

            match (self.pending.pop_front(), self.pending.pop_front()) {
                (Some(left), Some(right)) => {
                    self.left = left.into();
                    self.right = right.into();
                }
                (Some(last), None) => {
                    self.finish(last);
                    return;
                }
                (None, _) => {
                    self.finish(Vec::new());
                    return;
                }
            }
        }
    }

    fn finish(&mut self, order: Vec<ItemId>) {
        debug!(items = order.len(), done = self.done, total = self.total, "sort finished");
        self.finished = true;
        self.final_order = Some(order);
    }

    pub fn done(&self) -> usize {
        self.done
    }

    /// Worst-case comparison budget, fixed at start.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Best-to-worst order, once finished.
    pub fn final_order(&self) -> Option<&[ItemId]> {
        self.final_order.as_deref()
    }

    /// Positional standings of the finished sort.
    pub fn standings(&self) -> Option<Vec<Standing>> {
        self.final_order()
            .map(|order| order.iter().copied().map(Standing::positional).collect())
    }
}
