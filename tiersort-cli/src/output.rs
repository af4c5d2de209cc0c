/// Output formatting: terminal table and JSON.
use serde::Serialize;
use std::collections::HashMap;
use tiersort_core::{ItemId, Phase, Progress, RankingEntry, Tier};

use crate::items::ItemRecord;

pub type Names = HashMap<ItemId, ItemRecord>;

fn name_of(names: &Names, id: ItemId) -> String {
    names.get(&id).map(|r| r.name.clone()).unwrap_or_else(|| format!("#{id}"))
}

fn category_of(names: &Names, id: ItemId) -> &str {
    names.get(&id).map(|r| r.category.as_str()).unwrap_or("")
}

#[derive(Serialize)]
struct JsonRankedItem {
    rank: usize,
    tier: Tier,
    name: String,
    category: String,
    score: Option<f64>,
}

#[derive(Serialize)]
struct JsonRanking {
    items: Vec<JsonRankedItem>,
    total_comparisons: usize,
}

#[derive(Serialize)]
struct JsonRatedItem {
    rank: usize,
    name: String,
    rating: f64,
}

/// Ranking as a terminal table, grouped visually by tier.
pub fn ranking_table(ranking: &[RankingEntry], names: &Names, comparisons: usize) -> String {
    let name_width = ranking
        .iter()
        .map(|r| name_of(names, r.id).len())
        .max()
        .unwrap_or(4)
        .max(4); // at least "Item"

    let mut out = String::new();
    out.push_str(&format!(" # | Tier | {:<name_width$} | Category\n", "Item"));
    out.push_str(&format!("---|------|-{}-|---------\n", "-".repeat(name_width)));
    for r in ranking {
        let score = r.score.map(|s| format!(" ({s} wins)")).unwrap_or_default();
        out.push_str(&format!(
            "{:>2} | {:^4} | {:<name_width$} | {}{score}\n",
            r.rank,
            r.tier.label(),
            name_of(names, r.id),
            category_of(names, r.id),
        ));
    }
    out.push_str(&format!("\n{} items ranked with {} comparisons\n", ranking.len(), comparisons));
    out
}

pub fn ranking_json(ranking: &[RankingEntry], names: &Names, comparisons: usize) -> serde_json::Result<String> {
    let items = ranking
        .iter()
        .map(|r| JsonRankedItem {
            rank: r.rank,
            tier: r.tier,
            name: name_of(names, r.id),
            category: category_of(names, r.id).to_string(),
            score: r.score,
        })
        .collect();
    serde_json::to_string_pretty(&JsonRanking {
        items,
        total_comparisons: comparisons,
    })
}

pub fn leaderboard_table(board: &[(ItemId, f64)], names: &Names) -> String {
    let name_width = board
        .iter()
        .map(|(id, _)| name_of(names, *id).len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    out.push_str(&format!(" # | {:<name_width$} |  Rating\n", "Item"));
    out.push_str(&format!("---|-{}-|--------\n", "-".repeat(name_width)));
    for (i, (id, rating)) in board.iter().enumerate() {
        out.push_str(&format!("{:>2} | {:<name_width$} | {:>7.1}\n", i + 1, name_of(names, *id), rating));
    }
    out
}

pub fn leaderboard_json(board: &[(ItemId, f64)], names: &Names) -> serde_json::Result<String> {
    let items: Vec<JsonRatedItem> = board
        .iter()
        .enumerate()
        .map(|(i, (id, rating))| JsonRatedItem {
            rank: i + 1,
            name: name_of(names, *id),
            rating: *rating,
        })
        .collect();
    serde_json::to_string_pretty(&items)
}

/// One-line summary used as the prompt header and by `status`.
pub fn progress_line(progress: &Progress) -> String {
    let mut line = format!("[{}/{}]", progress.done, progress.total);
    match (&progress.phase, &progress.active_group) {
        (Some(Phase::Groups), Some(group)) => {
            line.push_str(&format!(" group \"{}\" {}/{}", group.category, group.done, group.total));
        }
        (Some(Phase::Final), _) => line.push_str(" final"),
        _ => {}
    }
    if progress.finished {
        line.push_str(" finished");
    }
    line
}
