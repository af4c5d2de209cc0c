use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tiersort_core::{
    leaderboard, next_rating_pair, start_merge_sort, start_tournament, status, submit,
    submit_rating, Catalog, EloConfig, EngineError, ItemId, MemoryStore, MergeSortSession,
    Phase, Progress, RankingSession, RatingSession, SessionStore, Tier, TournamentConfig,
    TournamentSession,
};

const HOLDER: i64 = 42;

/// Answer the pending pair as `truth` dictates (earlier = better).
fn answer_from_truth<S, St>(store: &St, truth: &[ItemId], mut progress: Progress) -> Progress
where
    S: RankingSession,
    St: SessionStore<S>,
{
    let rank: HashMap<ItemId, usize> = truth.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    while let Some((a, b)) = progress.pending_pair {
        let (winner, loser) = if rank[&a] < rank[&b] { (a, b) } else { (b, a) };
        progress = submit::<S, St>(store, HOLDER, winner, loser).unwrap();
    }
    progress
}

#[test]
fn merge_sort_session_round_trip_recovers_truth() {
    let store: MemoryStore<MergeSortSession> = MemoryStore::new();
    let ids: Vec<ItemId> = (1..=25).collect();
    let mut truth = ids.clone();
    truth.shuffle(&mut StdRng::seed_from_u64(2024));

    let started = start_merge_sort(&store, HOLDER, &ids).unwrap();
    let total = started.total;
    let finished = answer_from_truth(&store, &truth, started);

    assert!(finished.finished);
    assert!(finished.done <= total);
    assert_eq!(finished.total, total);
    let ranked: Vec<ItemId> = finished.final_ranking.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ranked, truth);
}

#[test]
fn status_is_idempotent() {
    let store: MemoryStore<MergeSortSession> = MemoryStore::new();
    start_merge_sort(&store, HOLDER, &[5, 6, 7, 8]).unwrap();
    submit::<MergeSortSession, _>(&store, HOLDER, 6, 5).unwrap();

    let first = status::<MergeSortSession, _>(&store, HOLDER).unwrap();
    let second = status::<MergeSortSession, _>(&store, HOLDER).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.done, 1);
}

#[test]
fn rejected_submit_leaves_stored_session_alone() {
    let store: MemoryStore<MergeSortSession> = MemoryStore::new();
    start_merge_sort(&store, HOLDER, &[1, 2, 3]).unwrap();
    let before = store.get(HOLDER).unwrap();

    let err = submit::<MergeSortSession, _>(&store, HOLDER, 1, 3).unwrap_err();
    assert!(matches!(err, EngineError::InvalidComparison { expected: (1, 2), .. }));
    assert_eq!(store.get(HOLDER).unwrap(), before);

    assert_eq!(
        submit::<MergeSortSession, _>(&store, 7, 1, 2).unwrap_err(),
        EngineError::NoActiveSession { holder: 7 }
    );
}

#[test]
fn submit_after_finish_reports_no_active_comparison() {
    let store: MemoryStore<MergeSortSession> = MemoryStore::new();
    start_merge_sort(&store, HOLDER, &[1, 2]).unwrap();
    submit::<MergeSortSession, _>(&store, HOLDER, 1, 2).unwrap();
    assert_eq!(
        submit::<MergeSortSession, _>(&store, HOLDER, 1, 2).unwrap_err(),
        EngineError::NoActiveComparison
    );
}

#[test]
fn racing_verdicts_on_one_pair_only_one_lands() {
    let store: MemoryStore<MergeSortSession> = MemoryStore::new();
    start_merge_sort(&store, HOLDER, &[1, 2, 3, 4]).unwrap();

    // Two clients both saw (1, 2) and answered it.
    let first = submit::<MergeSortSession, _>(&store, HOLDER, 1, 2);
    let second = submit::<MergeSortSession, _>(&store, HOLDER, 2, 1);
    assert!(first.is_ok());
    assert!(matches!(second, Err(EngineError::InvalidComparison { .. })));
    assert_eq!(status::<MergeSortSession, _>(&store, HOLDER).unwrap().done, 1);
}

#[test]
fn tournament_session_walks_all_phases() {
    let store: MemoryStore<TournamentSession> = MemoryStore::new();
    let items: Vec<(ItemId, String)> = (1..=12)
        .map(|id| (id, ["Action", "Puzzle", " "][id as usize % 3].to_string()))
        .collect();
    let truth: Vec<ItemId> = (1..=12).collect();

    let started = start_tournament(&store, HOLDER, &items, TournamentConfig::default()).unwrap();
    assert_eq!(started.phase, Some(Phase::Groups));
    let group = started.active_group.clone().unwrap();
    assert_eq!(group.category, "Puzzle");
    assert_eq!(group.done, 0);

    let finished = answer_from_truth(&store, &truth, started);
    assert!(finished.finished);
    assert_eq!(finished.phase, Some(Phase::Finished));
    assert!(finished.active_group.is_none());

    let ranking = finished.final_ranking.unwrap();
    assert_eq!(ranking.len(), 12);
    // Three groups of four promote nine finalists; the three fourth-placed
    // items fill tier D in group order.
    let finalists: Vec<ItemId> = ranking[..9].iter().map(|r| r.id).collect();
    assert_eq!(finalists, (1..=9).collect::<Vec<_>>());
    let eliminated: Vec<(ItemId, Tier)> = ranking[9..].iter().map(|r| (r.id, r.tier)).collect();
    assert_eq!(eliminated, vec![(10, Tier::D), (11, Tier::D), (12, Tier::D)]);
}

#[test]
fn tournament_status_tracks_budget_growth() {
    let store: MemoryStore<TournamentSession> = MemoryStore::new();
    let items = vec![(1, "a"), (2, "a"), (3, "b"), (4, "b")];
    let started = start_tournament(&store, HOLDER, &items, TournamentConfig::default()).unwrap();
    assert_eq!(started.total, 2);

    submit::<TournamentSession, _>(&store, HOLDER, 1, 2).unwrap();
    let after_groups = submit::<TournamentSession, _>(&store, HOLDER, 3, 4).unwrap();
    assert_eq!(after_groups.phase, Some(Phase::Final));
    // Four finalists add a merge-sort budget of five.
    assert_eq!(after_groups.total, 7);
    assert_eq!(after_groups.done, 2);
}

#[test]
fn rating_mode_keeps_champion_and_updates_ratings() {
    let store: MemoryStore<RatingSession> = MemoryStore::new();
    let mut rng = StdRng::seed_from_u64(99);
    let pool = [100, 200, 300, 400];

    assert_eq!(
        leaderboard(&store, HOLDER).unwrap_err(),
        EngineError::NoActiveSession { holder: HOLDER }
    );
    assert_eq!(
        submit_rating(&store, HOLDER, 100, 200).unwrap_err(),
        EngineError::NoActiveSession { holder: HOLDER }
    );

    let (champion, challenger) = next_rating_pair(&store, HOLDER, &pool, EloConfig::default(), &mut rng).unwrap();
    let outcome = submit_rating(&store, HOLDER, champion, challenger).unwrap();
    assert_eq!(outcome.winner_rating, 1016.0);
    assert_eq!(outcome.loser_rating, 984.0);

    for _ in 0..20 {
        let (c, other) = next_rating_pair(&store, HOLDER, &pool, EloConfig::default(), &mut rng).unwrap();
        assert_eq!(c, champion);
        submit_rating(&store, HOLDER, c, other).unwrap();
    }

    let board = leaderboard(&store, HOLDER).unwrap();
    assert_eq!(board[0].0, champion);
    assert_eq!(
        submit_rating(&store, HOLDER, champion, challenger).unwrap_err(),
        EngineError::NoActiveComparison
    );
}

#[test]
fn rating_pool_needs_two_items() {
    let store: MemoryStore<RatingSession> = MemoryStore::new();
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(
        next_rating_pair(&store, HOLDER, &[1], EloConfig::default(), &mut rng).unwrap_err(),
        EngineError::InsufficientItems { got: 1 }
    );
}

struct Names(HashMap<ItemId, &'static str>);

impl Catalog for Names {
    type Payload = &'static str;

    fn resolve(&self, ids: &[ItemId]) -> HashMap<ItemId, &'static str> {
        ids.iter()
            .filter_map(|id| self.0.get(id).map(|name| (*id, *name)))
            .collect()
    }
}

#[test]
fn catalog_decorates_pending_pair() {
    let names = Names(HashMap::from([(1, "Celeste"), (2, "Hades")]));
    let store: MemoryStore<MergeSortSession> = MemoryStore::new();
    let progress = start_merge_sort(&store, HOLDER, &[1, 2]).unwrap();

    let (a, b) = progress.pending_pair.unwrap();
    let resolved = names.resolve(&[a, b, 3]);
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved[&a], "Celeste");
}
