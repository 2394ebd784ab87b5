use crate::models::{FEATURE_DIM, Track};

/// Tempo (BPM) mapped to 1.0.
const MAX_TEMPO: f64 = 240.0;
/// Loudness floor in dB, mapped to 0.0.
const LOUDNESS_FLOOR: f64 = -60.0;

/// Fixed-order audio feature vector for a track.
///
/// Order: danceability, energy, valence, acousticness, instrumentalness,
/// liveness, speechiness, tempo, loudness, mode. Tempo and loudness are
/// scaled into `0..=1`; missing values are zero.
#[must_use]
pub fn feature_vector(track: &Track) -> [f64; FEATURE_DIM] {
    let f = &track.features;
    let tempo = f.tempo.unwrap_or(0.0);
    let loudness = f.loudness.unwrap_or(0.0);
    [
        f.danceability.unwrap_or(0.0),
        f.energy.unwrap_or(0.0),
        f.valence.unwrap_or(0.0),
        f.acousticness.unwrap_or(0.0),
        f.instrumentalness.unwrap_or(0.0),
        f.liveness.unwrap_or(0.0),
        f.speechiness.unwrap_or(0.0),
        (tempo / MAX_TEMPO).clamp(0.0, 1.0),
        ((loudness - LOUDNESS_FLOOR) / -LOUDNESS_FLOOR).clamp(0.0, 1.0),
        f.mode.unwrap_or(0.0),
    ]
}

/// Z-score a vector against its own mean and population standard deviation.
///
/// This standardizes across the components of one vector, not across a
/// catalog. A zero deviation is replaced by 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn standardize(vec: &[f64]) -> Vec<f64> {
    if vec.is_empty() {
        return Vec::new();
    }
    let n = vec.len() as f64;
    let mean = vec.iter().sum::<f64>() / n;
    let variance = vec.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let deviation = variance.sqrt();
    let deviation = if deviation == 0.0 || !deviation.is_finite() {
        1.0
    } else {
        deviation
    };
    vec.iter().map(|v| (v - mean) / deviation).collect()
}

/// Standardized feature vector, ready for cosine comparison.
#[must_use]
pub fn normalized_features(track: &Track) -> Vec<f64> {
    standardize(&feature_vector(track))
}
