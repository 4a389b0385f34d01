//! The profile store: sole gateway to persisted profile data.
//!
//! Every read and write of the profile collection passes through here. The
//! store keeps no cache: each call is a fresh read-modify-write against
//! the backend, so independent consumers can each hold their own instance
//! and still agree on what is stored.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::repository::entities::{Profile, Result};

pub mod backend;
mod watch;

pub use backend::{FileBackend, Fingerprint, MemoryBackend, StorageBackend};
pub use watch::{ChangeOrigin, RecvError, StoreEvent, Subscription, Watcher};

/// The well-known key the profile collection lives under.
pub const PROFILES_KEY: &str = "user_profiles";

const EVENT_CAPACITY: usize = 16;

/// Gateway to the persisted profile collection.
///
/// Cloning is cheap and clones share the event hub, so a [`Watcher`]
/// spawned from one clone notifies subscribers of any clone.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    backend: Arc<dyn StorageBackend>,
    events: broadcast::Sender<StoreEvent>,
    last_local: Arc<Mutex<Option<Fingerprint>>>,
}

impl ProfileStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            backend,
            events,
            last_local: Arc::new(Mutex::new(None)),
        }
    }

    /// Read the full collection.
    ///
    /// Nothing stored yet reads as the empty collection. Unparseable stored
    /// content is quarantined out of the way and also reads as empty; the
    /// old data stays on disk under a `.corrupt` name, but consumers never
    /// see the failure.
    pub fn get_all(&self) -> Result<Vec<Profile>> {
        let Some(text) = self.backend.get(PROFILES_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&text) {
            Ok(profiles) => Ok(profiles),
            Err(err) => {
                warn!(%err, "stored profile collection is unreadable, starting empty");
                self.backend.quarantine(PROFILES_KEY)?;
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the entire persisted collection with the given snapshot.
    pub fn save_all(&self, profiles: &[Profile]) -> Result<()> {
        let text = serde_json::to_string(profiles)?;
        self.backend.set(PROFILES_KEY, &text)?;
        *self.last_local.lock() = Some(Fingerprint::of(&text));

        debug!(count = profiles.len(), "persisted profile collection");
        self.publish(ChangeOrigin::Local, profiles.to_vec());

        Ok(())
    }

    /// Append a pre-stamped profile and return the new collection.
    ///
    /// The caller is responsible for id uniqueness; ids are
    /// timestamp-derived, so a collision takes a clock anomaly or rapid
    /// programmatic calls.
    pub fn add(&self, profile: Profile) -> Result<Vec<Profile>> {
        let mut profiles = self.get_all()?;
        profiles.push(profile);
        self.save_all(&profiles)?;

        Ok(profiles)
    }

    /// Replace the entry whose id matches, wholesale.
    ///
    /// An unknown id leaves the stored collection untouched and returns it
    /// unchanged. That is deliberate permissiveness, not an error.
    pub fn update(&self, profile: Profile) -> Result<Vec<Profile>> {
        let mut profiles = self.get_all()?;

        match profiles
            .iter_mut()
            .find(|existing| existing.id == profile.id)
        {
            Some(slot) => {
                *slot = profile;
                self.save_all(&profiles)?;
            }
            None => debug!(id = profile.id, "update for unknown profile id, nothing replaced"),
        }

        Ok(profiles)
    }

    /// Drop any entry with the given id and return the new collection.
    /// Removing an absent id is not an error, and removing twice is the
    /// same as removing once.
    pub fn remove(&self, id: i64) -> Result<Vec<Profile>> {
        let mut profiles = self.get_all()?;
        profiles.retain(|profile| profile.id != id);
        self.save_all(&profiles)?;

        Ok(profiles)
    }

    /// Subscribe to collection changes, local and external alike.
    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    /// Start the polling watcher that turns out-of-band writes into
    /// [`StoreEvent`]s. Dropping the returned guard stops the poll thread.
    pub fn watch(&self, interval: Duration) -> Watcher {
        Watcher::spawn(self.clone(), interval)
    }

    pub(crate) fn fingerprint(&self) -> Result<Option<Fingerprint>> {
        self.backend.fingerprint(PROFILES_KEY)
    }

    pub(crate) fn last_local_fingerprint(&self) -> Option<Fingerprint> {
        *self.last_local.lock()
    }

    pub(crate) fn publish(&self, origin: ChangeOrigin, profiles: Vec<Profile>) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.events.send(StoreEvent { origin, profiles });
    }
}
