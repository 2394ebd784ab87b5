use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::error::EngineError;
use crate::models::Track;

/// Read-only, load-once track catalog shared by all scoring requests.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Arc<Track>>,
}

/// Default catalog location in the user data directory.
pub fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("radiofit")
        .join("catalog.json")
}

impl Catalog {
    /// Build a catalog from in-memory tracks, rejecting records without an id.
    pub fn new(tracks: Vec<Track>) -> Result<Self, EngineError> {
        if let Some(idx) = tracks.iter().position(|t| t.id.trim().is_empty()) {
            return Err(EngineError::InvalidInput(format!(
                "track record {idx} has no id"
            )));
        }
        Ok(Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
        })
    }

    /// Load a JSON array of track records.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        let tracks: Vec<Track> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
        let catalog = Self::new(tracks)
            .with_context(|| format!("Invalid catalog: {}", path.display()))?;
        info!("Loaded {} tracks from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Tracks in catalog order.
    #[must_use]
    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Find a track by exact id or uri. The first match wins.
    pub fn find(&self, ident: &str) -> Result<Arc<Track>, EngineError> {
        self.tracks
            .iter()
            .find(|t| t.matches(ident))
            .cloned()
            .ok_or_else(|| EngineError::NotFound(ident.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn make_track(id: &str, uri: &str) -> Track {
        Track {
            id: id.to_string(),
            uri: uri.to_string(),
            ..Track::default()
        }
    }

    #[test]
    fn test_find_by_id_or_uri() {
        let catalog = Catalog::new(vec![
            make_track("a", "spotify:track:a"),
            make_track("b", "spotify:track:b"),
        ])
        .unwrap();
        assert_eq!(catalog.find("b").unwrap().id, "b");
        assert_eq!(catalog.find("spotify:track:a").unwrap().id, "a");
    }

    #[test]
    fn test_find_is_exact() {
        let catalog = Catalog::new(vec![make_track("Abc", "")]).unwrap();
        assert_eq!(
            catalog.find("abc").unwrap_err(),
            EngineError::NotFound("abc".to_string())
        );
        // An empty uri never matches an empty identifier
        assert!(catalog.find("").is_err());
    }

    #[test]
    fn test_rejects_blank_id() {
        let err = Catalog::new(vec![make_track("a", ""), make_track(" ", "")]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(msg) if msg.contains('1')));
    }

    #[test]
    fn test_load_json_with_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "t1", "name": "One", "artists": ["A"], "year": 1999,
                  "genres": ["Rock"], "energy": 0.8, "tempo": 120.0, "is_remaster": true}},
                {{"id": "t2"}}
            ]"#
        )
        .unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        let t1 = catalog.find("t1").unwrap();
        assert_eq!(t1.features.energy, Some(0.8));
        assert_eq!(t1.features.danceability, None);
        assert!(t1.is_remaster);
        let t2 = catalog.find("t2").unwrap();
        assert!(t2.genres.is_empty());
        assert_eq!(t2.year, None);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Catalog::load(&dir.path().join("nope.json")).is_err());
    }
}
