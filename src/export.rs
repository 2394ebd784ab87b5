//! Profile documents: a ranked, tiered and pooled result ready for downstream use.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::Track;
use crate::rank::{RankParams, RankedList};
use crate::tiers::{Buckets, PoolDefs, TierParams};

/// Identity of the seed a profile was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedInfo {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub year: Option<i32>,
    pub popularity: Option<i32>,
    pub genres: Vec<String>,
}

impl From<&Track> for SeedInfo {
    fn from(t: &Track) -> Self {
        Self {
            id: t.id.clone(),
            uri: t.uri.clone(),
            name: t.name.clone(),
            artists: t.artists.clone(),
            year: t.year,
            popularity: t.popularity,
            genres: t.genres.clone(),
        }
    }
}

/// Every knob that shaped a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    #[serde(flatten)]
    pub rank: RankParams,
    pub tiers: TierParams,
    pub pools: PoolDefs,
}

impl ProfileParams {
    /// Short content hash identifying this parameter set.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_vec(self).context("serialize params")?;
        let hash = Sha256::digest(&json);
        Ok(hex::encode(&hash[..8]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTrack {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub year: Option<i32>,
    pub popularity: Option<i32>,
    pub genres: Vec<String>,
    pub rank: usize,
    pub tier: u8,
    pub correct: bool,
    pub radio_fit: f64,
    pub audio_sim: f64,
    pub genre_sim: f64,
    pub era_sim: f64,
    pub pop_sim: f64,
    pub genre_factor: f64,
    /// Sorted names of the pools this track belongs to.
    pub pools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub name: String,
    pub seed: SeedInfo,
    pub params: ProfileParams,
    pub params_fingerprint: String,
    pub tracks: Vec<ExportTrack>,
    pub exported_at: String,
}

fn slug(s: &str) -> String {
    let lowered = s.to_lowercase().replace(' ', "-");
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    let mut out = String::with_capacity(kept.len());
    for c in kept.chars() {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<artist>-<name>` slug used for profile names and file names.
#[must_use]
pub fn profile_name(track: &Track) -> String {
    format!("{}-{}", slug(track.primary_artist()), slug(&track.name))
}

/// Flatten pools into one track list, each track once, in rank order.
///
/// The first (best ranked) occurrence of a track id keeps its rank and
/// scores; pool names of later occurrences are merged into it. Tracks that
/// belong to no pool are left out.
#[must_use]
pub fn flatten_pools(buckets: &Buckets<'_>) -> Vec<ExportTrack> {
    let membership = buckets.membership();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<ExportTrack> = Vec::with_capacity(membership.len());

    for tiered in &buckets.tiers {
        let Some(pools) = membership.get(&tiered.rank) else {
            continue;
        };
        let c = tiered.candidate;
        if let Some(&i) = index.get(c.track.id.as_str()) {
            let merged = &mut out[i].pools;
            merged.extend(pools.iter().map(|p| (*p).to_string()));
            merged.sort();
            merged.dedup();
            continue;
        }
        index.insert(c.track.id.as_str(), out.len());
        out.push(ExportTrack {
            id: c.track.id.clone(),
            uri: c.track.uri.clone(),
            name: c.track.name.clone(),
            artists: c.track.artists.clone(),
            year: c.track.year,
            popularity: c.track.popularity,
            genres: c.track.genres.clone(),
            rank: tiered.rank,
            tier: tiered.tier,
            correct: tiered.correct,
            radio_fit: c.radio_fit,
            audio_sim: c.audio_sim,
            genre_sim: c.genre_sim,
            era_sim: c.era_sim,
            pop_sim: c.pop_sim,
            genre_factor: c.genre_factor,
            pools: pools.iter().map(|p| (*p).to_string()).collect(),
        });
    }

    out
}

/// Assemble the profile document for a ranked and bucketed seed.
pub fn build_profile(
    ranked: &RankedList,
    buckets: &Buckets<'_>,
    tiers: &TierParams,
    pools: &PoolDefs,
    now: DateTime<Utc>,
) -> Result<ProfileDocument> {
    let params = ProfileParams {
        rank: ranked.params.clone(),
        tiers: tiers.normalized(),
        pools: pools.clone(),
    };
    Ok(ProfileDocument {
        name: profile_name(&ranked.seed),
        seed: SeedInfo::from(ranked.seed.as_ref()),
        params_fingerprint: params.fingerprint()?,
        params,
        tracks: flatten_pools(buckets),
        exported_at: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    })
}

/// Write a profile as pretty JSON.
pub fn write_profile(doc: &ProfileDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
