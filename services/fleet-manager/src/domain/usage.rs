//! Resource usage alert tiers.

const TIER_50: f64 = 50.0;
const TIER_70: f64 = 70.0;
const TIER_90: f64 = 90.0;

/// Cumulative alert tiers for one usage percentage.
///
/// Always monotonic: `ge90` implies `ge70` implies `ge50`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTiers {
    pub ge50: bool,
    pub ge70: bool,
    pub ge90: bool,
}

/// Classify a usage percentage into inclusive 50/70/90 tiers.
#[must_use]
pub fn classify_usage(pct: f64) -> UsageTiers {
    UsageTiers {
        ge50: pct >= TIER_50,
        ge70: pct >= TIER_70,
        ge90: pct >= TIER_90,
    }
}
