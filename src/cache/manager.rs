use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Artist, AvailabilitySlot};

/// Consider cache stale after 1 hour.
/// Balances freshness with reducing unnecessary API calls for
/// slowly-changing data.
const CACHE_STALE_MINUTES: i64 = 60;

/// Artist listing cache file name
const ARTISTS_FILE: &str = "artists.json";

/// Availability listing cache file name
const AVAILABILITY_FILE: &str = "availability.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() >= CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn save_artists(&self, artists: &[Artist]) -> Result<()> {
        self.save(ARTISTS_FILE, &CachedData::new(artists))
    }

    pub fn load_artists(&self) -> Result<Option<CachedData<Vec<Artist>>>> {
        self.load(ARTISTS_FILE)
    }

    pub fn save_availability(&self, slots: &[AvailabilitySlot]) -> Result<()> {
        self.save(AVAILABILITY_FILE, &CachedData::new(slots))
    }

    pub fn load_availability(&self) -> Result<Option<CachedData<Vec<AvailabilitySlot>>>> {
        self.load(AVAILABILITY_FILE)
    }

    /// Remove all cached listings. The session record is not touched.
    pub fn clear(&self) -> Result<()> {
        for file in [ARTISTS_FILE, AVAILABILITY_FILE] {
            let path = self.cache_dir.join(file);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file {}", file))?;
            }
        }
        Ok(())
    }

    fn save<T: Serialize>(&self, file: &str, data: &T) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let path = self.cache_dir.join(file);
        let contents = serde_json::to_string(data)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file {}", file))?;
        debug!(file, "Cache updated");
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.cache_dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file {}", file))?;
        let data = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file {}", file))?;
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_artists() -> Vec<Artist> {
        vec![Artist {
            id: 7,
            name: "The Midnight Coil".to_string(),
            genre: Some("post-rock".to_string()),
            bio: None,
            contact_email: None,
        }]
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf());

        cache.save_artists(&sample_artists()).unwrap();
        let loaded = cache.load_artists().unwrap().unwrap();
        assert_eq!(loaded.data.len(), 1);
        assert_eq!(loaded.data[0].name, "The Midnight Coil");
        assert!(!loaded.is_stale());
    }

    #[test]
    fn test_missing_cache_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf());
        assert!(cache.load_availability().unwrap().is_none());
    }

    #[test]
    fn test_staleness() {
        let fresh = CachedData::new(vec![1, 2, 3]);
        assert!(!fresh.is_stale());

        let old = CachedData {
            data: vec![1, 2, 3],
            cached_at: Utc::now() - Duration::minutes(CACHE_STALE_MINUTES + 5),
        };
        assert!(old.is_stale());
    }

    #[test]
    fn test_clear_removes_listings() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf());
        cache.save_artists(&sample_artists()).unwrap();

        cache.clear().unwrap();
        assert!(cache.load_artists().unwrap().is_none());
    }
}
