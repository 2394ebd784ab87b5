//! Percentile tiers and difficulty pools over an already-ranked list.
//!
//! Everything here is a relabeling pass: scores are never recomputed, so
//! thresholds and pool definitions can be changed and re-applied freely.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::ScoredCandidate;

/// Lowest (worst) tier.
pub const TIER_COUNT: u8 = 5;

/// Rank percentiles separating tiers 1–5. Applied in field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierParams {
    pub tier_1_pct: f64,
    pub tier_2_pct: f64,
    pub tier_3_pct: f64,
    pub tier_4_pct: f64,
}

impl Default for TierParams {
    fn default() -> Self {
        Self {
            tier_1_pct: 20.0,
            tier_2_pct: 40.0,
            tier_3_pct: 60.0,
            tier_4_pct: 80.0,
        }
    }
}

impl TierParams {
    /// Clamp into `0..=100`, non-finite values falling back to defaults.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let d = Self::default();
        let pick = |v: f64, fallback: f64| {
            if v.is_finite() { v.clamp(0.0, 100.0) } else { fallback }
        };
        Self {
            tier_1_pct: pick(self.tier_1_pct, d.tier_1_pct),
            tier_2_pct: pick(self.tier_2_pct, d.tier_2_pct),
            tier_3_pct: pick(self.tier_3_pct, d.tier_3_pct),
            tier_4_pct: pick(self.tier_4_pct, d.tier_4_pct),
        }
    }

    /// Rank cut points `floor(n * pct / 100)` for a list of `n` candidates.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn boundaries(&self, n: usize) -> [usize; 4] {
        [self.tier_1_pct, self.tier_2_pct, self.tier_3_pct, self.tier_4_pct].map(|pct| {
            let b = (n as f64 * pct.clamp(0.0, 100.0) / 100.0).floor();
            (b as usize).min(n)
        })
    }
}

/// Tier for the candidate at 0-indexed `rank`.
#[must_use]
pub fn tier_for(rank: usize, boundaries: &[usize; 4]) -> u8 {
    let mut tier = 1;
    for &b in boundaries {
        if rank < b {
            return tier;
        }
        tier += 1;
    }
    TIER_COUNT
}

/// Named pools, each a set of tier numbers.
pub type PoolDefs = BTreeMap<String, BTreeSet<u8>>;

/// Easy pools pair correct answers with distant tiers, hard ones with close tiers.
#[must_use]
pub fn default_pools() -> PoolDefs {
    [
        ("easy", [1, 4, 5]),
        ("medium", [1, 3, 4]),
        ("hard", [1, 2, 3]),
    ]
    .into_iter()
    .map(|(name, tiers)| (name.to_string(), tiers.into_iter().collect()))
    .collect()
}

/// A ranked candidate labelled with its tier.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TieredCandidate<'a> {
    #[serde(flatten)]
    pub candidate: &'a ScoredCandidate,
    pub rank: usize,
    pub tier: u8,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: u8,
    pub count: usize,
    pub max_fit: Option<f64>,
    pub min_fit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Buckets<'a> {
    /// Every candidate, in rank order.
    pub tiers: Vec<TieredCandidate<'a>>,
    pub pools: BTreeMap<String, Vec<TieredCandidate<'a>>>,
    pub summary: Vec<TierSummary>,
}

impl Buckets<'_> {
    /// Pool names per candidate rank. Candidates in no pool are absent.
    #[must_use]
    pub fn membership(&self) -> BTreeMap<usize, Vec<&str>> {
        let mut out: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (name, members) in &self.pools {
            for m in members {
                out.entry(m.rank).or_default().push(name.as_str());
            }
        }
        out
    }
}

/// Label each candidate of a list sorted by descending radio fit.
#[must_use]
pub fn assign_tiers<'a>(
    ranked: &'a [ScoredCandidate],
    params: &TierParams,
) -> Vec<TieredCandidate<'a>> {
    let boundaries = params.boundaries(ranked.len());
    ranked
        .iter()
        .enumerate()
        .map(|(rank, candidate)| {
            let tier = tier_for(rank, &boundaries);
            TieredCandidate {
                candidate,
                rank,
                tier,
                correct: tier == 1,
            }
        })
        .collect()
}

/// Count and radio fit range per tier.
#[must_use]
pub fn summarize(tiered: &[TieredCandidate<'_>]) -> Vec<TierSummary> {
    (1..=TIER_COUNT)
        .map(|tier| {
            let fits = tiered
                .iter()
                .filter(|t| t.tier == tier)
                .map(|t| t.candidate.radio_fit);
            let (count, max_fit, min_fit) =
                fits.fold((0, None::<f64>, None::<f64>), |(n, hi, lo), f| {
                    (n + 1, Some(hi.map_or(f, |h| h.max(f))), Some(lo.map_or(f, |l| l.min(f))))
                });
            TierSummary {
                tier,
                count,
                max_fit,
                min_fit,
            }
        })
        .collect()
}

/// Tier a ranked list and split it into the configured pools.
#[must_use]
pub fn bucket<'a>(
    ranked: &'a [ScoredCandidate],
    params: &TierParams,
    pools: &PoolDefs,
) -> Buckets<'a> {
    let tiers = assign_tiers(ranked, &params.normalized());
    let pools = pools
        .iter()
        .map(|(name, tier_set)| {
            let members = tiers
                .iter()
                .filter(|t| tier_set.contains(&t.tier))
                .copied()
                .collect();
            (name.clone(), members)
        })
        .collect();
    let summary = summarize(&tiers);
    Buckets {
        tiers,
        pools,
        summary,
    }
}
