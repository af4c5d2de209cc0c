/// Two-phase tournament: rank each category group, promote its best, rank the finalists.
///
/// Phases only move forward: `Groups` → `Final` → `Finished`. Groups are
/// resolved one at a time in the order their category was first seen; the
/// final stage is only built once every group has been resolved, because the
/// number of finalists depends on how the groups came out.
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::constants::{FINALISTS_PER_GROUP, UNCATEGORISED};
use crate::error::EngineError;
use crate::stage::{Format, StageEngine};
use crate::tiers::{assign_tiers, Tier};
use crate::types::{ensure_unique, ItemId, Pair, RankingEntry, Standing};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TournamentConfig {
    pub group_format: Format,
    pub final_format: Format,
    /// Promoted per group before ties at the boundary are added.
    pub finalists_per_group: usize,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        TournamentConfig {
            group_format: Format::MergeSort,
            final_format: Format::MergeSort,
            finalists_per_group: FINALISTS_PER_GROUP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    Groups,
    Final,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    pub category: String,
    pub item_ids: Vec<ItemId>,
    engine: StageEngine,
    /// The group's resolved order; `None` until its stage finishes.
    resolved: Option<Vec<Standing>>,
}

impl Group {
    pub fn resolved(&self) -> Option<&[Standing]> {
        self.resolved.as_deref()
    }
}

/// An item that did not make the final, with what is needed to order it later.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eliminated {
    pub id: ItemId,
    /// 1-based position inside its group.
    pub group_rank: usize,
    /// Known only when the group was scored round-robin.
    pub win_fraction: Option<f64>,
    /// Index of the group in registration order.
    pub group_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinalStage {
    pub item_ids: Vec<ItemId>,
    engine: StageEngine,
    pub eliminated: Vec<Eliminated>,
}

/// Progress of the group currently awaiting verdicts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveGroup {
    pub category: String,
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TournamentSession {
    config: TournamentConfig,
    phase: Phase,
    groups: Vec<Group>,
    final_stage: Option<FinalStage>,
    done: usize,
    total: usize,
    ranking: Option<Vec<RankingEntry>>,
}

/// Trimmed category label; blank labels share one bucket.
pub fn category_key(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNCATEGORISED
    } else {
        trimmed
    }
}

/// First entry of a comma-separated category list, e.g. `"RPG, Action"` → `"RPG"`.
pub fn primary_category(raw: &str) -> &str {
    category_key(raw.split(',').next().unwrap_or_default())
}

/// How many of `standings` advance: the first `finalists`, plus every later
/// standing tied with the last of them.
pub fn promotion_cutoff(standings: &[Standing], finalists: usize) -> usize {
    if finalists == 0 {
        return 0;
    }
    if standings.len() <= finalists {
        return standings.len();
    }

    let boundary = standings[finalists - 1];
    let mut cutoff = finalists;
    while cutoff < standings.len() && standings[cutoff].ties_with(&boundary) {
        cutoff += 1;
    }
    cutoff
}

impl TournamentSession {
    /// Split `items` into category groups and start resolving the first one.
    pub fn start<S: AsRef<str>>(
        items: &[(ItemId, S)],
        config: TournamentConfig,
    ) -> Result<Self, EngineError> {
        let ids: Vec<ItemId> = items.iter().map(|(id, _)| *id).collect();
        ensure_unique(&ids)?;

        let mut group_index: HashMap<&str, usize> = HashMap::new();
        let mut buckets: Vec<(String, Vec<ItemId>)> = Vec::new();
        for (id, category) in items {
            let key = category_key(category.as_ref());
            let slot = *group_index.entry(key).or_insert_with(|| {
                buckets.push((key.to_string(), Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(*id);
        }

        let groups: Vec<Group> = buckets
            .into_iter()
            .map(|(category, item_ids)| Group {
                engine: StageEngine::new(config.group_format, item_ids.clone()),
                category,
                item_ids,
                resolved: None,
            })
            .collect();

        let total = groups.iter().map(|g| g.engine.total()).sum();
        debug!(groups = groups.len(), items = ids.len(), total, "tournament started");

        let mut session = TournamentSession {
            config,
            phase: Phase::Groups,
            groups,
            final_stage: None,
            done: 0,
            total,
            ranking: None,
        };
        session.advance();
        Ok(session)
    }

    fn active_group_index(&self) -> Option<usize> {
        self.groups.iter().position(|g| g.resolved.is_none())
    }

    pub fn current_pair(&self) -> Option<Pair> {
        match self.phase {
            Phase::Groups => self
                .active_group_index()
                .and_then(|idx| self.groups[idx].engine.current_pair()),
            Phase::Final => self.final_stage.as_ref().and_then(|f| f.engine.current_pair()),
            Phase::Finished => None,
        }
    }

    /// Hand the verdict to whichever stage is live, then move the phases on.
    pub fn answer(&mut self, winner: ItemId, loser: ItemId) -> Result<(), EngineError> {
        let engine = match self.phase {
            Phase::Groups => {
                let idx = self.active_group_index().ok_or(EngineError::NoActiveComparison)?;
                &mut self.groups[idx].engine
            }
            Phase::Final => match self.final_stage.as_mut() {
                Some(stage) => &mut stage.engine,
                None => return Err(EngineError::NoActiveComparison),
            },
            Phase::Finished => return Err(EngineError::NoActiveComparison),
        };

        engine.answer(winner, loser)?;
        self.done += 1;
        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        if self.phase == Phase::Groups {
            while let Some(idx) = self.active_group_index() {
                let group = &mut self.groups[idx];
                match group.engine.standings() {
                    Some(standings) => {
                        debug!(category = %group.category, items = standings.len(), "group resolved");
                        group.resolved = Some(standings);
                    }
                    None => return,
                }
            }
            self.start_final();
        }

        if self.phase == Phase::Final {
            let standings = self.final_stage.as_ref().and_then(|f| f.engine.standings());
            if let Some(standings) = standings {
                self.finish(&standings);
            }
        }
    }

    fn start_final(&mut self) {
        let mut finalists = Vec::new();
        let mut eliminated = Vec::new();

        for (group_index, group) in self.groups.iter().enumerate() {
            let standings = group.resolved.as_deref().unwrap_or_default();
            let cutoff = promotion_cutoff(standings, self.config.finalists_per_group);
            finalists.extend(standings[..cutoff].iter().map(|s| s.id));
            eliminated.extend(standings[cutoff..].iter().enumerate().map(|(offset, s)| Eliminated {
                id: s.id,
                group_rank: cutoff + offset + 1,
                win_fraction: s.win_fraction,
                group_index,
            }));
        }

        let engine = StageEngine::new(self.config.final_format, finalists.clone());
        self.total += engine.total();
        debug!(
            finalists = finalists.len(),
            eliminated = eliminated.len(),
            total = self.total,
            "final stage started"
        );

        self.final_stage = Some(FinalStage {
            item_ids: finalists,
            engine,
            eliminated,
        });
        self.phase = Phase::Final;
    }

    fn finish(&mut self, standings: &[Standing]) {
        let order: Vec<ItemId> = standings.iter().map(|s| s.id).collect();
        let mut ranking: Vec<RankingEntry> = assign_tiers(&order)
            .into_iter()
            .zip(standings)
            .enumerate()
            .map(|(i, (entry, standing))| RankingEntry {
                id: entry.id,
                tier: entry.tier,
                rank: i + 1,
                score: standing.wins.map(f64::from),
            })
            .collect();

        let mut eliminated = self
            .final_stage
            .as_ref()
            .map(|f| f.eliminated.clone())
            .unwrap_or_default();
        // Better group rank first; a known win fraction breaks ties; stable
        // sort keeps group order after that.
        eliminated.sort_by(|a, b| {
            a.group_rank.cmp(&b.group_rank).then_with(|| {
                b.win_fraction
                    .unwrap_or(0.0)
                    .total_cmp(&a.win_fraction.unwrap_or(0.0))
            })
        });

        let offset = ranking.len();
        ranking.extend(eliminated.iter().enumerate().map(|(j, e)| RankingEntry {
            id: e.id,
            tier: Tier::D,
            rank: offset + j + 1,
            score: None,
        }));

        debug!(ranked = ranking.len(), done = self.done, "tournament finished");
        self.ranking = Some(ranking);
        self.phase = Phase::Finished;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn done(&self) -> usize {
        self.done
    }

    /// Comparison budget so far. Grows once, when the final stage is built.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn final_stage(&self) -> Option<&FinalStage> {
        self.final_stage.as_ref()
    }

    pub fn ranking(&self) -> Option<&[RankingEntry]> {
        self.ranking.as_deref()
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// The group awaiting verdicts, while still in the group phase.
    pub fn active_group(&self) -> Option<ActiveGroup> {
        if self.phase != Phase::Groups {
            return None;
        }
        self.active_group_index().map(|idx| {
            let group = &self.groups[idx];
            ActiveGroup {
                category: group.category.clone(),
                done: group.engine.done(),
                total: group.engine.total(),
            }
        })
    }

    /// Every id in play, groups first, without duplicates.
    pub fn all_item_ids(&self) -> Vec<ItemId> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .flat_map(|g| g.item_ids.iter())
            .chain(self.final_stage.iter().flat_map(|f| f.item_ids.iter()))
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
