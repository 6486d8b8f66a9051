use crate::models::MovieSummary;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Durable, process-wide set of favorited movies.
///
/// The ordered collection is mirrored by an id set for O(1) membership checks;
/// after every mutation the id set is exactly the ids of the collection. Each
/// toggle rewrites the whole JSON snapshot on disk, so a crash loses at most
/// the most recent toggle.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    movies: Vec<MovieSummary>,
    ids: HashSet<i64>,
}

impl Inner {
    fn rebuild_ids(&mut self) {
        self.ids = self.movies.iter().map(|m| m.id).collect();
    }
}

impl FavoritesStore {
    /// Load the snapshot at `path`. A missing file starts empty; an
    /// unparseable one is logged and treated as empty, never as an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let movies = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<MovieSummary>>(&raw) {
                Ok(movies) => movies,
                Err(e) => {
                    warn!(
                        "Ignoring unreadable favorites snapshot {}: {}",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        let mut inner = Inner {
            movies,
            ids: HashSet::new(),
        };
        inner.rebuild_ids();
        Self {
            path,
            inner: Mutex::new(inner),
        }
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.inner.lock().unwrap().ids.contains(&id)
    }

    /// Remove the movie if it is already a favorite, append it otherwise, then
    /// persist the full snapshot. Returns whether the movie is now a favorite.
    pub fn toggle(&self, movie: MovieSummary) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let id = movie.id;
        if inner.ids.contains(&id) {
            inner.movies.retain(|m| m.id != id);
        } else {
            inner.movies.push(movie);
        }
        inner.rebuild_ids();
        let now_favorite = inner.ids.contains(&id);
        if let Err(e) = self.persist(&inner.movies) {
            warn!("Failed to persist favorites: {:#}", e);
        }
        now_favorite
    }

    /// Ordered clone of the collection, oldest favorite first.
    pub fn all(&self) -> Vec<MovieSummary> {
        self.inner.lock().unwrap().movies.clone()
    }

    pub fn favorite_ids(&self) -> HashSet<i64> {
        self.inner.lock().unwrap().ids.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, movies: &[MovieSummary]) -> Result<()> {
        let raw = serde_json::to_string(movies)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing snapshot {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn movie(id: i64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/poster-{id}.jpg")),
            backdrop_path: None,
            release_date: Some("2024-06-01".to_string()),
            vote_average: 7.2,
            overview: "A movie.".to_string(),
        }
    }

    fn invariant_holds(store: &FavoritesStore) -> bool {
        let ids: HashSet<i64> = store.all().iter().map(|m| m.id).collect();
        ids == store.favorite_ids()
    }

    #[test]
    fn toggle_round_trip() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::load(dir.path().join("favorites.json"));

        assert!(!store.is_favorite(7));
        assert!(store.toggle(movie(7, "Seven")));
        assert!(store.is_favorite(7));
        assert!(!store.toggle(movie(7, "Seven")));
        assert!(!store.is_favorite(7));
        assert!(store.is_empty());
    }

    #[test]
    fn id_set_matches_collection_after_random_toggles() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::load(dir.path().join("favorites.json"));

        // Deterministic xorshift so the sequence is reproducible.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..200 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let id = (seed % 12) as i64;
            store.toggle(movie(id, "Any"));
            assert!(invariant_holds(&store));
        }
    }

    #[test]
    fn persist_then_reload_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let store = FavoritesStore::load(&path);
        store.toggle(movie(3, "Third"));
        store.toggle(movie(1, "First"));
        store.toggle(movie(2, "Second"));

        let reloaded = FavoritesStore::load(&path);
        let titles: Vec<String> = reloaded.all().into_iter().map(|m| m.title).collect();
        assert_eq!(titles, vec!["Third", "First", "Second"]);
        assert!(invariant_holds(&reloaded));
    }

    #[test]
    fn corrupt_snapshot_loads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{not json").unwrap();

        let store = FavoritesStore::load(&path);
        assert!(store.is_empty());

        // The store stays usable and overwrites the bad snapshot.
        store.toggle(movie(5, "Five"));
        assert_eq!(FavoritesStore::load(&path).len(), 1);
    }

    #[test]
    fn missing_snapshot_loads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FavoritesStore::load(dir.path().join("nope.json"));
        assert!(store.is_empty());
        assert!(!store.is_favorite(1));
    }
}
