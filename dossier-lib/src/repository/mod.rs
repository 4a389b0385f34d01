use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    Result,
    repository::{
        config::{Cfg, CoreConfig},
        store::FileBackend,
    },
};

pub mod config;
pub mod entities;
pub mod store;

pub use entities::{
    Coordinates, Education, LatitudeDirection, LongitudeDirection, Profile, ProfileDraft,
};
pub use store::{ChangeOrigin, ProfileStore, RecvError, StoreEvent, Subscription, Watcher};

/// Central access point for all persistent data.
///
/// The [`Repository`] wraps the profile store, the configuration file, and
/// the admin-facing operations built on top of them. It provides a single,
/// consistent interface for reading and writing the profile collection.
#[derive(Clone, Debug)]
pub struct Repository {
    store: ProfileStore,
    cfg: Cfg,
}

impl Repository {
    pub fn new() -> Self {
        let cfg: Cfg = Arc::new(RwLock::new(CoreConfig::load()));

        let dir = cfg
            .read()
            .storage_dir
            .clone()
            .unwrap_or_else(crate::fs::state_dir);
        std::fs::create_dir_all(&dir).unwrap();

        Self {
            store: ProfileStore::new(Arc::new(FileBackend::new(dir))),
            cfg,
        }
    }

    /// The full collection, in stored (display) order.
    pub fn profiles(&self) -> Result<Vec<Profile>> {
        self.store.get_all()
    }

    /// Overwrite the whole collection with the given snapshot.
    pub fn save_profiles(&self, profiles: &[Profile]) -> Result<()> {
        self.store.save_all(profiles)
    }

    /// Stamp the draft and append it to the collection.
    pub fn add_profile(&self, draft: ProfileDraft) -> Result<Vec<Profile>> {
        let profile = draft.stamp()?;
        debug!(id = profile.id, "created profile: {profile}");

        self.store.add(profile)
    }

    /// Replace the stored record with the edited one.
    ///
    /// `createdAt` and `status` are carried over from what is stored, not
    /// trusted from the edit form; the id selects the record and everything
    /// else is replaced wholesale.
    pub fn edit_profile(&self, mut profile: Profile) -> Result<Vec<Profile>> {
        if let Some(stored) = self
            .profiles()?
            .iter()
            .find(|stored| stored.id == profile.id)
        {
            profile.created_at = stored.created_at.clone();
            profile.status = stored.status.clone();
        }

        self.store.update(profile)
    }

    pub fn remove_profile(&self, id: i64) -> Result<Vec<Profile>> {
        debug!(id, "removing profile");

        self.store.remove(id)
    }

    /// Case-insensitive substring search over the browsable fields. An
    /// empty query returns everything.
    pub fn search(&self, query: &str) -> Result<Vec<Profile>> {
        let query = query.trim();
        let profiles = self.profiles()?;

        if query.is_empty() {
            return Ok(profiles);
        }

        Ok(profiles
            .into_iter()
            .filter(|profile| profile.matches(query))
            .collect())
    }

    /// Profiles that resolve to a signed coordinate pair, with the pair.
    pub fn located_profiles(&self) -> Result<Vec<(Profile, Coordinates)>> {
        Ok(self
            .profiles()?
            .into_iter()
            .filter_map(|profile| {
                let coordinates = profile.coordinates()?;
                Some((profile, coordinates))
            })
            .collect())
    }

    /// Midpoint of the bounding box of all located profiles, or `None` when
    /// no profile has coordinates.
    pub fn map_center(&self) -> Result<Option<Coordinates>> {
        let located = self.located_profiles()?;
        let mut coordinates = located.iter().map(|(_, coordinates)| *coordinates);

        let Some(first) = coordinates.next() else {
            return Ok(None);
        };

        let mut min = first;
        let mut max = first;
        for Coordinates {
            latitude,
            longitude,
        } in coordinates
        {
            min.latitude = min.latitude.min(latitude);
            max.latitude = max.latitude.max(latitude);
            min.longitude = min.longitude.min(longitude);
            max.longitude = max.longitude.max(longitude);
        }

        Ok(Some(Coordinates {
            latitude: (min.latitude + max.latitude) / 2.0,
            longitude: (min.longitude + max.longitude) / 2.0,
        }))
    }

    /// The full collection as a pretty-printed JSON document, ready to hand
    /// to the export download. There is no import path.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.profiles()?)?)
    }

    /// Static credential check gating the admin surface. The store itself
    /// performs no authorization.
    pub fn verify_admin(&self, username: &str, password: &str) -> bool {
        let cfg = self.cfg.read();

        cfg.admin.username == username && cfg.admin.password == password
    }

    /// Subscribe to collection changes from this repository's store.
    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe()
    }

    /// Start the external-change watcher at the configured poll interval.
    pub fn watch(&self) -> Watcher {
        let interval = self.cfg.read().poll_interval();

        self.store.watch(interval)
    }

    #[cfg(test)]
    /// Return a mock version of a [`Repository`] with an in-memory backend
    /// and default configuration.
    pub(crate) fn mock() -> Self {
        Self {
            store: ProfileStore::new(Arc::new(store::MemoryBackend::new())),
            cfg: Arc::new(RwLock::new(CoreConfig::mock())),
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn draft(name: &str, email: &str) -> ProfileDraft {
        ProfileDraft {
            name: name.to_string(),
            email: email.to_string(),
            ..ProfileDraft::default()
        }
    }

    fn located_draft(name: &str, lat: &str, lat_dir: LatitudeDirection, lon: &str) -> ProfileDraft {
        ProfileDraft {
            latitude_degree: Some(lat.to_string()),
            latitude_direction: Some(lat_dir),
            longitude_degree: Some(lon.to_string()),
            ..draft(name, "geo@example.com")
        }
    }

    #[test]
    fn test_add_profile_stamps_identity() {
        let repo = Repository::mock();

        let profiles = repo.add_profile(draft("Ada", "ada@example.com")).unwrap();

        let profile = profiles.first().unwrap();
        assert!(profile.id > 0);
        assert_eq!(profile.status, "active");
    }

    #[test]
    fn test_edit_preserves_creation_stamp() {
        let repo = Repository::mock();
        let profiles = repo.add_profile(draft("Ada", "ada@example.com")).unwrap();
        let stored = profiles.first().unwrap().clone();

        let mut edited = stored.clone();
        edited.name = "Ada Lovelace".to_string();
        edited.created_at = "tampered".to_string();
        edited.status = "tampered".to_string();

        let profiles = repo.edit_profile(edited).unwrap();

        let result = profiles.first().unwrap();
        assert_eq!(result.name, "Ada Lovelace");
        assert_eq!(result.created_at, stored.created_at);
        assert_eq!(result.status, stored.status);
    }

    #[test]
    fn test_search() {
        let repo = Repository::mock();
        repo.add_profile(draft("Ada Lovelace", "ada@example.com"))
            .unwrap();
        repo.add_profile(draft("Grace Hopper", "grace@example.com"))
            .unwrap();

        let hits = repo.search("grace").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().unwrap().name, "Grace Hopper");

        // An empty query is "show everything".
        assert_eq!(repo.search("  ").unwrap().len(), 2);
    }

    #[test]
    fn test_located_profiles_skips_incomplete_coordinates() {
        let repo = Repository::mock();
        repo.add_profile(draft("No geo", "none@example.com")).unwrap();
        repo.add_profile(located_draft("South", "10", LatitudeDirection::S, "20"))
            .unwrap();

        let located = repo.located_profiles().unwrap();

        assert_eq!(located.len(), 1);
        let (profile, coordinates) = located.first().unwrap();
        assert_eq!(profile.name, "South");
        assert_eq!(coordinates.latitude, -10.0);
        assert_eq!(coordinates.longitude, 20.0);
    }

    #[test]
    fn test_map_center_is_bounding_box_midpoint() {
        let repo = Repository::mock();
        assert!(repo.map_center().unwrap().is_none());

        repo.add_profile(located_draft("A", "10", LatitudeDirection::N, "20"))
            .unwrap();
        repo.add_profile(located_draft("B", "30", LatitudeDirection::N, "40"))
            .unwrap();

        let center = repo.map_center().unwrap().unwrap();
        assert_eq!(center.latitude, 20.0);
        assert_eq!(center.longitude, 30.0);
    }

    #[test]
    fn test_export_json_document() {
        let repo = Repository::mock();
        repo.add_profile(draft("Ada", "ada@example.com")).unwrap();

        let document = repo.export_json().unwrap();

        assert!(document.contains("\"name\": \"Ada\""));
        let parsed: Vec<Profile> = serde_json::from_str(&document).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_verify_admin() {
        let repo = Repository::mock();

        assert!(repo.verify_admin("admin", "admin123"));
        assert!(!repo.verify_admin("admin", "wrong"));
        assert!(!repo.verify_admin("root", "admin123"));
    }
}
