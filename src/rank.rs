use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::models::{ScoredCandidate, Track};
use crate::score::{ScoringParams, Seed, score_candidate};

/// Dataset filters applied around scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Keep tracks flagged as remaster or alternate version.
    pub include_remasters: bool,
    /// Drop candidates with popularity below this.
    pub pop_floor: i32,
    /// Drop candidates with speechiness at or above this (spoken word).
    pub max_speechiness: f64,
    /// Drop candidates scoring below this after ranking.
    pub radio_fit_floor: f64,
    /// Result cap. Zero or negative means unlimited.
    pub limit: i64,
    /// Drop candidates whose radio fit is zero. Off by default.
    pub drop_zero_scores: bool,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            include_remasters: false,
            pop_floor: 0,
            max_speechiness: 0.66,
            radio_fit_floor: 0.0,
            limit: 2000,
            drop_zero_scores: false,
        }
    }
}

impl FilterParams {
    #[must_use]
    pub fn normalized(&self) -> Self {
        let d = Self::default();
        Self {
            max_speechiness: if self.max_speechiness.is_finite() {
                self.max_speechiness
            } else {
                d.max_speechiness
            },
            radio_fit_floor: if self.radio_fit_floor.is_finite() {
                self.radio_fit_floor
            } else {
                d.radio_fit_floor
            },
            ..self.clone()
        }
    }

    /// Effective cap on the result size.
    #[must_use]
    pub fn max_results(&self) -> Option<usize> {
        usize::try_from(self.limit).ok().filter(|&n| n > 0)
    }

    fn admits(&self, track: &Track) -> bool {
        if !self.include_remasters && (track.is_remaster || track.is_alt) {
            return false;
        }
        if track.popularity.unwrap_or(0) < self.pop_floor {
            return false;
        }
        track.features.speechiness.unwrap_or(0.0) < self.max_speechiness
    }
}

/// Everything a ranking request needs besides the seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankParams {
    pub scoring: ScoringParams,
    pub filters: FilterParams,
}

impl RankParams {
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            scoring: self.scoring.normalized(),
            filters: self.filters.normalized(),
        }
    }
}

/// Result of one ranking request.
#[derive(Debug, Clone, Serialize)]
pub struct RankedList {
    pub seed: Arc<Track>,
    /// The normalized parameters actually used.
    pub params: RankParams,
    /// Sorted by radio fit, highest first.
    pub tracks: Vec<ScoredCandidate>,
    /// Candidates that could not be scored.
    pub skipped: usize,
}

/// Score every eligible catalog track against the seed and rank them.
///
/// The seed itself is not removed from the candidates.
pub fn score_and_rank(
    catalog: &Catalog,
    seed_id: &str,
    params: &RankParams,
) -> Result<RankedList, EngineError> {
    let seed_id = seed_id.trim();
    if seed_id.is_empty() {
        return Err(EngineError::InvalidInput("seed id is empty".to_string()));
    }
    let params = params.normalized();
    let seed = Seed::new(catalog.find(seed_id)?)?;
    let filters = &params.filters;

    let mut skipped = 0;
    let mut scored: Vec<ScoredCandidate> = catalog
        .tracks()
        .iter()
        .filter(|t| filters.admits(t))
        .filter_map(|t| match score_candidate(&seed, t, &params.scoring) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Skipping candidate: {e}");
                skipped += 1;
                None
            }
        })
        .collect();
    let eligible = scored.len() + skipped;

    // Stable: ties keep catalog order
    scored.sort_by(|a, b| b.radio_fit.total_cmp(&a.radio_fit));

    scored.retain(|s| s.radio_fit >= filters.radio_fit_floor);
    if filters.drop_zero_scores {
        scored.retain(|s| s.radio_fit > 0.0);
    }
    if let Some(n) = filters.max_results() {
        scored.truncate(n);
    }

    debug!(
        "Ranked seed {}: {} eligible, {} kept, {} skipped",
        seed.track.id,
        eligible,
        scored.len(),
        skipped
    );

    Ok(RankedList {
        seed: seed.track,
        params,
        tracks: scored,
        skipped,
    })
}
