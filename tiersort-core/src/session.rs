/// Request/response operations over a holder's stored session.
///
/// Every call loads the holder's session from the store, validates, advances
/// and writes it back as one atomic update, then projects the result into a
/// `Progress` the boundary layer can hand to a client.
use rand::Rng;

use crate::elo::EloConfig;
use crate::error::EngineError;
use crate::merge_sort::MergeSortSession;
use crate::rating::{RatingOutcome, RatingSession};
use crate::store::SessionStore;
use crate::tiers::assign_tiers;
use crate::tournament::{ActiveGroup, Phase, TournamentConfig, TournamentSession};
use crate::types::{HolderId, ItemId, Pair, RankingEntry};

/// What a client sees after every call: same shape for every sorting mode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub finished: bool,
    pub pending_pair: Option<Pair>,
    /// Present once `finished` is true.
    pub final_ranking: Option<Vec<RankingEntry>>,
    /// Tournament phase; `None` for modes without phases.
    pub phase: Option<Phase>,
    /// Group being resolved, during a tournament's group phase.
    pub active_group: Option<ActiveGroup>,
}

/// A session that can be projected and answered through the common surface.
pub trait RankingSession: Clone {
    fn progress(&self) -> Progress;

    fn submit(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError>;
}

impl RankingSession for MergeSortSession {
    fn progress(&self) -> Progress {
        let final_ranking = self.final_order().map(|order| {
            assign_tiers(order)
                .into_iter()
                .enumerate()
                .map(|(i, entry)| RankingEntry {
                    id: entry.id,
                    tier: entry.tier,
                    rank: i + 1,
                    score: None,
                })
                .collect()
        });

        Progress {
            done: self.done(),
            total: self.total(),
            finished: self.is_finished(),
            pending_pair: self.current_pair(),
            final_ranking,
            phase: None,
            active_group: None,
        }
    }

    fn submit(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError> {
        self.answer(winner, loser)
    }
}

impl RankingSession for TournamentSession {
    fn progress(&self) -> Progress {
        Progress {
            done: self.done(),
            total: self.total(),
            finished: self.is_finished(),
            pending_pair: self.current_pair(),
            final_ranking: self.ranking().map(<[RankingEntry]>::to_vec),
            phase: Some(self.phase()),
            active_group: self.active_group(),
        }
    }

    fn submit(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError> {
        self.answer(winner, loser)
    }
}

fn require_items(count: usize) -> Result<(), EngineError> {
    if count < 2 {
        return Err(EngineError::InsufficientItems { got: count });
    }
    Ok(())
}

/// Start (or restart) the holder's merge-sort session.
pub fn start_merge_sort<St>(store: &St, holder: HolderId, item_ids: &[ItemId]) -> Result<Progress, EngineError>
where
    St: SessionStore<MergeSortSession>,
{
    require_items(item_ids.len())?;
    let session = MergeSortSession::start(item_ids)?;
    let progress = session.progress();
    store.replace(holder, session);
    Ok(progress)
}

/// Start (or restart) the holder's tournament over `(id, category)` pairs.
pub fn start_tournament<St, C>(
    store: &St,
    holder: HolderId,
    items: &[(ItemId, C)],
    config: TournamentConfig,
) -> Result<Progress, EngineError>
where
    St: SessionStore<TournamentSession>,
    C: AsRef<str>,
{
    require_items(items.len())?;
    let session = TournamentSession::start(items, config)?;
    let progress = session.progress();
    store.replace(holder, session);
    Ok(progress)
}

/// Read-only projection of the stored session.
pub fn status<S, St>(store: &St, holder: HolderId) -> Result<Progress, EngineError>
where
    S: RankingSession,
    St: SessionStore<S>,
{
    store
        .get(holder)
        .map(|session| session.progress())
        .ok_or(EngineError::NoActiveSession { holder })
}

/// Apply a verdict to the holder's session and report where it now stands.
pub fn submit<S, St>(store: &St, holder: HolderId, winner: ItemId, loser: ItemId) -> Result<Progress, EngineError>
where
    S: RankingSession,
    St: SessionStore<S>,
{
    store.update(holder, |session| {
        session.submit(winner, loser)?;
        Ok(session.progress())
    })
}

/// Next champion/challenger pair for the holder's rating session, creating
/// the session on first use. `pool` must hold at least two distinct ids.
pub fn next_rating_pair<St, R>(
    store: &St,
    holder: HolderId,
    pool: &[ItemId],
    config: EloConfig,
    rng: &mut R,
) -> Result<Pair, EngineError>
where
    St: SessionStore<RatingSession>,
    R: Rng,
{
    require_items(pool.len())?;
    store.upsert(holder, || RatingSession::new(config), |session| session.next_pair(pool, rng))
}

/// Record a verdict on the pair last handed out by `next_rating_pair`.
pub fn submit_rating<St>(store: &St, holder: HolderId, winner: ItemId, loser: ItemId) -> Result<RatingOutcome, EngineError>
where
    St: SessionStore<RatingSession>,
{
    store.update(holder, |session| session.submit(winner, loser))
}

/// The holder's ratings, best first.
pub fn leaderboard<St>(store: &St, holder: HolderId) -> Result<Vec<(ItemId, f64)>, EngineError>
where
    St: SessionStore<RatingSession>,
{
    store
        .get(holder)
        .map(|session| session.book().leaderboard())
        .ok_or(EngineError::NoActiveSession { holder })
}
