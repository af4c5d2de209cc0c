/// Percentile bucketing of a best-to-worst order into S/A/B/C/D tiers.
use std::fmt;

use crate::constants::TIER_BAND_PERCENTS;
use crate::types::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    /// All tiers, best first.
    pub const ALL: [Tier; 5] = [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D];

    pub fn label(self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierEntry {
    pub id: ItemId,
    pub tier: Tier,
}

/// Number of items in each tier for a list of `n`, in `Tier::ALL` order.
///
/// Each band takes `ceil(n * pct / 100)` clipped to what is still unplaced;
/// D absorbs the remainder. The sizes always sum to `n`.
pub fn band_sizes(n: usize) -> [usize; 5] {
    let mut sizes = [0usize; 5];
    let mut remaining = n;
    for (slot, &pct) in TIER_BAND_PERCENTS.iter().enumerate() {
        let wanted = (n * pct as usize).div_ceil(100);
        let take = wanted.min(remaining);
        sizes[slot] = take;
        remaining -= take;
    }
    sizes[4] = remaining;
    sizes
}

/// Label every id of a best-to-worst order with its tier.
/// The output has exactly one entry per input id, in input order.
pub fn assign_tiers(ordered_ids: &[ItemId]) -> Vec<TierEntry> {
    let sizes = band_sizes(ordered_ids.len());
    let mut labels = Tier::ALL
        .iter()
        .zip(sizes.iter())
        .flat_map(|(&tier, &count)| std::iter::repeat(tier).take(count));

    ordered_ids
        .iter()
        .map(|&id| TierEntry {
            id,
            tier: labels.next().unwrap_or(Tier::D),
        })
        .collect()
}
