/// Tier bands as percent of the ordered list, best first. Whatever is left
/// after these lands in D.
///
/// Percentages are integers so the ceiling is exact: 30 items × 10% is 3, not
/// the 4 that `(30.0 * 0.1).ceil()` yields.
pub const TIER_BAND_PERCENTS: [u32; 4] = [10, 20, 30, 25];

/// Items promoted from each group into the final, before tie extension.
pub const FINALISTS_PER_GROUP: usize = 3;

/// Group label for items whose category is empty or whitespace.
pub const UNCATEGORISED: &str = "Uncategorised";

/// Rating every item starts from the first time it is seen.
pub const INITIAL_ELO_RATING: f64 = 1000.0;

/// Maximum rating swing per verdict.
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Rating difference at which the favourite's expected score is 10:1.
pub const ELO_SCALE: f64 = 400.0;
