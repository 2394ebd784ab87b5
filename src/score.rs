//! Composite radio fit scoring of one candidate against a seed.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::features::normalized_features;
use crate::models::{ScoredCandidate, Track};
use crate::similarity::{
    cosine_sim, decay_sim, era_distance, genre_set, jaccard, popularity_distance,
};

/// Weights and decay constants of the composite score.
///
/// The four weights are expected to sum to roughly 1 so that the score sits
/// near `0..=1` before clamping, but nothing enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub audio_weight: f64,
    pub genre_weight: f64,
    pub era_weight: f64,
    pub pop_weight: f64,
    /// Years; smaller values punish era gaps harder.
    pub era_decay: f64,
    /// Popularity points.
    pub pop_decay: f64,
    /// Multiplier bonus scaled by genre overlap.
    pub genre_boost: f64,
    /// Flat adjustment when both tracks have genres but none shared.
    pub genre_penalty: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            audio_weight: 0.70,
            genre_weight: 0.15,
            era_weight: 0.10,
            pop_weight: 0.05,
            era_decay: 10.0,
            pop_decay: 30.0,
            genre_boost: 0.10,
            genre_penalty: -0.10,
        }
    }
}

impl ScoringParams {
    /// Replace non-finite values with their defaults.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let d = Self::default();
        let pick = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            audio_weight: pick(self.audio_weight, d.audio_weight),
            genre_weight: pick(self.genre_weight, d.genre_weight),
            era_weight: pick(self.era_weight, d.era_weight),
            pop_weight: pick(self.pop_weight, d.pop_weight),
            era_decay: pick(self.era_decay, d.era_decay),
            pop_decay: pick(self.pop_decay, d.pop_decay),
            genre_boost: pick(self.genre_boost, d.genre_boost),
            genre_penalty: pick(self.genre_penalty, d.genre_penalty),
        }
    }
}

/// A seed track with its per-request derived data computed once.
#[derive(Debug, Clone)]
pub struct Seed {
    pub track: Arc<Track>,
    vector: Vec<f64>,
    genres: HashSet<String>,
}

impl Seed {
    /// Fails with `InvalidInput` when the seed's own features are unusable.
    pub fn new(track: Arc<Track>) -> Result<Self, EngineError> {
        if !track.features.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "seed {} has non-finite audio features",
                track.id
            )));
        }
        let vector = normalized_features(&track);
        let genres = genre_set(&track.genres);
        Ok(Self {
            track,
            vector,
            genres,
        })
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Multiplier rewarding genre overlap or penalizing a confirmed mismatch.
///
/// Missing genre data on either side is neutral.
#[must_use]
pub fn genre_factor(
    genre_sim: f64,
    seed_has_genres: bool,
    cand_has_genres: bool,
    params: &ScoringParams,
) -> f64 {
    if genre_sim > 0.0 {
        1.0 + params.genre_boost * genre_sim
    } else if seed_has_genres && cand_has_genres {
        1.0 + params.genre_penalty
    } else {
        1.0
    }
}

/// Score one candidate against the seed.
///
/// Fails with `ComputationFailure` when the candidate record cannot be scored;
/// callers skip such candidates instead of aborting.
pub fn score_candidate(
    seed: &Seed,
    candidate: &Arc<Track>,
    params: &ScoringParams,
) -> Result<ScoredCandidate, EngineError> {
    if !candidate.features.is_finite() {
        return Err(EngineError::ComputationFailure {
            track_id: candidate.id.clone(),
            reason: "non-finite audio features".to_string(),
        });
    }

    let cand_vector = normalized_features(candidate);
    let audio_sim = finite_or_zero(cosine_sim(&seed.vector, &cand_vector));

    let cand_genres = genre_set(&candidate.genres);
    let genre_sim = finite_or_zero(jaccard(&seed.genres, &cand_genres));

    let era_dist = finite_or_zero(era_distance(&seed.track, candidate));
    let era_sim = finite_or_zero(decay_sim(era_dist, params.era_decay));
    let pop_dist = finite_or_zero(popularity_distance(&seed.track, candidate));
    let pop_sim = finite_or_zero(decay_sim(pop_dist, params.pop_decay));

    let genre_factor = finite_or_zero(genre_factor(
        genre_sim,
        !seed.genres.is_empty(),
        !cand_genres.is_empty(),
        params,
    ));

    let composite_raw = finite_or_zero(
        params.audio_weight * audio_sim
            + params.genre_weight * genre_sim
            + params.era_weight * era_sim
            + params.pop_weight * pop_sim,
    );
    let radio_fit = finite_or_zero(composite_raw * genre_factor).clamp(0.0, 1.0);

    Ok(ScoredCandidate {
        track: Arc::clone(candidate),
        audio_sim,
        genre_sim,
        era_dist,
        era_sim,
        pop_dist,
        pop_sim,
        genre_factor,
        composite_raw,
        radio_fit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioFeatures;

    fn make_track(
        id: &str,
        genres: &[&str],
        year: Option<i32>,
        popularity: Option<i32>,
    ) -> Arc<Track> {
        Arc::new(Track {
            id: id.to_string(),
            genres: genres.iter().map(|g| (*g).to_string()).collect(),
            year,
            popularity,
            features: AudioFeatures {
                danceability: Some(0.6),
                energy: Some(0.8),
                valence: Some(0.4),
                acousticness: Some(0.1),
                instrumentalness: Some(0.0),
                liveness: Some(0.2),
                speechiness: Some(0.05),
                tempo: Some(128.0),
                loudness: Some(-6.0),
                mode: Some(1.0),
            },
            ..Track::default()
        })
    }

    fn seed(track: &Arc<Track>) -> Seed {
        Seed::new(Arc::clone(track)).unwrap()
    }

    #[test]
    fn test_genre_mismatch_penalty() {
        let s = make_track("s", &["rock", "indie"], Some(2000), Some(50));
        let c = make_track("c", &["pop"], Some(2000), Some(50));
        let scored = score_candidate(&seed(&s), &c, &ScoringParams::default()).unwrap();
        assert!(scored.genre_sim.abs() < f64::EPSILON);
        assert!((scored.genre_factor - 0.90).abs() < 1e-12);
    }

    #[test]
    fn test_genre_overlap_boost() {
        let s = make_track("s", &["rock", "indie"], None, None);
        let c = make_track("c", &["Rock"], None, None);
        let scored = score_candidate(&seed(&s), &c, &ScoringParams::default()).unwrap();
        assert!((scored.genre_sim - 0.5).abs() < 1e-12);
        assert!((scored.genre_factor - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_missing_genres_neutral() {
        let s = make_track("s", &["rock"], None, None);
        let c = make_track("c", &[], None, None);
        let scored = score_candidate(&seed(&s), &c, &ScoringParams::default()).unwrap();
        assert!((scored.genre_factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_audio_sim_symmetric() {
        let a = make_track("a", &[], None, None);
        let b = Arc::new(Track {
            id: "b".to_string(),
            features: AudioFeatures {
                danceability: Some(0.2),
                energy: Some(0.3),
                acousticness: Some(0.9),
                tempo: Some(72.0),
                loudness: Some(-18.0),
                ..AudioFeatures::default()
            },
            ..Track::default()
        });
        let params = ScoringParams::default();
        let ab = score_candidate(&seed(&a), &b, &params).unwrap();
        let ba = score_candidate(&seed(&b), &a, &params).unwrap();
        assert_eq!(ab.audio_sim.to_bits(), ba.audio_sim.to_bits());
    }

    #[test]
    fn test_era_scenario() {
        let s = make_track("s", &[], Some(1995), None);
        let c = make_track("c", &[], Some(2005), None);
        let scored = score_candidate(&seed(&s), &c, &ScoringParams::default()).unwrap();
        assert!((scored.era_dist - 10.0).abs() < f64::EPSILON);
        assert!((scored.era_sim - 0.367_879_441).abs() < 1e-6);
    }

    #[test]
    fn test_identical_track_scores_one() {
        let s = make_track("s", &["rock"], Some(1999), Some(60));
        let scored = score_candidate(&seed(&s), &s, &ScoringParams::default()).unwrap();
        assert!((scored.audio_sim - 1.0).abs() < 1e-9);
        // 1.0 raw * 1.1 boost clamps to 1
        assert!((scored.composite_raw - 1.0).abs() < 1e-9);
        assert!((scored.radio_fit - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_zero_candidate_is_finite() {
        let s = make_track("s", &[], None, None);
        let c = Arc::new(Track {
            id: "zero".to_string(),
            ..Track::default()
        });
        let scored = score_candidate(&seed(&s), &c, &ScoringParams::default()).unwrap();
        assert!(scored.audio_sim.is_finite());
        assert!((-1.0..=1.0).contains(&scored.audio_sim));
        assert!((0.0..=1.0).contains(&scored.radio_fit));
    }

    #[test]
    fn test_negative_raw_clamps_to_zero() {
        let s = make_track("s", &[], None, None);
        let c = make_track("c", &[], None, None);
        let params = ScoringParams {
            audio_weight: -5.0,
            ..ScoringParams::default()
        };
        let scored = score_candidate(&seed(&s), &c, &params).unwrap();
        assert!(scored.composite_raw < 0.0);
        assert!(scored.radio_fit.abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_candidate_fails() {
        let s = make_track("s", &[], None, None);
        let bad = Arc::new(Track {
            id: "bad".to_string(),
            features: AudioFeatures {
                energy: Some(f64::NAN),
                ..AudioFeatures::default()
            },
            ..Track::default()
        });
        let err = score_candidate(&seed(&s), &bad, &ScoringParams::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ComputationFailure { ref track_id, .. } if track_id == "bad"
        ));
    }

    #[test]
    fn test_non_finite_seed_rejected() {
        let bad = Arc::new(Track {
            id: "bad".to_string(),
            features: AudioFeatures {
                tempo: Some(f64::INFINITY),
                ..AudioFeatures::default()
            },
            ..Track::default()
        });
        assert!(matches!(Seed::new(bad), Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_params_normalized_replaces_non_finite() {
        let params = ScoringParams {
            era_decay: f64::NAN,
            pop_weight: f64::INFINITY,
            audio_weight: 0.5,
            ..ScoringParams::default()
        }
        .normalized();
        assert!((params.era_decay - 10.0).abs() < f64::EPSILON);
        assert!((params.pop_weight - 0.05).abs() < f64::EPSILON);
        assert!((params.audio_weight - 0.5).abs() < f64::EPSILON);
    }
}
