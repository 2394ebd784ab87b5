use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Length of the per-track audio feature vector.
pub const FEATURE_DIM: usize = 10;

/// Raw audio analysis values. Absent values count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
    /// Beats per minute.
    pub tempo: Option<f64>,
    /// Decibels, usually in `-60..=0`.
    pub loudness: Option<f64>,
    /// 1 for major, 0 for minor.
    pub mode: Option<f64>,
}

impl AudioFeatures {
    /// Whether every present value is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.danceability,
            self.energy,
            self.valence,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.speechiness,
            self.tempo,
            self.loudness,
            self.mode,
        ]
        .into_iter()
        .flatten()
        .all(f64::is_finite)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub id: String,
    /// Secondary identifier, e.g. `spotify:track:...`.
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub year: Option<i32>,
    /// Popularity score in `0..=100`.
    pub popularity: Option<i32>,
    pub genres: Vec<String>,
    #[serde(flatten)]
    pub features: AudioFeatures,
    pub is_remaster: bool,
    pub is_alt: bool,
}

impl Track {
    /// Exact match against the id or the uri.
    #[must_use]
    pub fn matches(&self, ident: &str) -> bool {
        self.id == ident || (!self.uri.is_empty() && self.uri == ident)
    }

    #[must_use]
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map_or("", String::as_str)
    }

    #[must_use]
    pub fn artists_display(&self) -> String {
        self.artists.join(", ")
    }
}

/// A candidate track scored against a seed. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub track: Arc<Track>,
    pub audio_sim: f64,
    pub genre_sim: f64,
    pub era_dist: f64,
    pub era_sim: f64,
    pub pop_dist: f64,
    pub pop_sim: f64,
    pub genre_factor: f64,
    pub composite_raw: f64,
    pub radio_fit: f64,
}

impl ScoredCandidate {
    /// Format as TSV line: radio fit, id, artists, name, year.
    #[must_use]
    pub fn to_tsv(&self) -> String {
        format!(
            "{:.4}\t{}\t{}\t{}\t{}",
            self.radio_fit,
            self.track.id,
            self.track.artists_display(),
            self.track.name,
            self.track.year.map_or_else(String::new, |y| y.to_string()),
        )
    }
}
