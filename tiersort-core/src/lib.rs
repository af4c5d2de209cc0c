/// tiersort-core: resumable pairwise ranking driven by human verdicts.
///
/// Give it a list of ids; it asks for one "which is better?" verdict at a time
/// and eventually returns a total order with S/A/B/C/D tiers. It never blocks
/// waiting for an answer: every pause is a plain value the caller persists and
/// hands back with the next verdict. No IO, no clock, no global state.
///
/// Three modes share the same ids and error kinds:
/// - `MergeSortSession`: external-comparator merge sort, at most
///   `total_comparisons(n)` questions.
/// - `TournamentSession`: rank each category group, promote the top 3 (plus
///   boundary ties), rank the finalists, eliminees fill tier D.
/// - `RatingSession`: open-ended Elo with a sticky champion.
///
/// # Quick start
///
/// ```rust
/// use tiersort_core::{MergeSortSession, Tier, assign_tiers};
///
/// let mut session = MergeSortSession::start(&[30, 10, 20]).unwrap();
///
/// // Lower id wins every time.
/// while let Some((a, b)) = session.current_pair() {
///     session.answer(a.min(b), a.max(b)).unwrap();
/// }
///
/// let order = session.final_order().unwrap();
/// assert_eq!(order, &[10, 20, 30]);
/// assert_eq!(assign_tiers(order)[0].tier, Tier::S);
/// ```

pub mod constants;
pub mod elo;
pub mod error;
pub mod merge_sort;
pub mod rating;
pub mod round_robin;
pub mod session;
pub mod stage;
pub mod store;
pub mod tiers;
pub mod tournament;
pub mod types;

// Re-export primary public API at crate root.
pub use elo::{expected_score, update_elo, EloConfig};
pub use error::EngineError;
pub use merge_sort::{total_comparisons, MergeSortSession};
pub use rating::{select_pair, RatingBook, RatingOutcome, RatingSession};
pub use round_robin::RoundRobinSession;
pub use session::{
    leaderboard, next_rating_pair, start_merge_sort, start_tournament, status, submit,
    submit_rating, Progress, RankingSession,
};
pub use stage::{Format, StageEngine};
pub use store::{Catalog, MemoryStore, SessionStore};
pub use tiers::{assign_tiers, band_sizes, Tier, TierEntry};
pub use tournament::{
    category_key, primary_category, promotion_cutoff, ActiveGroup, Eliminated, FinalStage,
    Group, Phase, TournamentConfig, TournamentSession,
};
pub use types::{HolderId, ItemId, Pair, RankingEntry, Standing};
