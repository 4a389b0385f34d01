//! Cross-context synchronization for the profile store.
//!
//! Consumers hold private snapshots and need to hear about two kinds of
//! change: mutations made through their own store (published directly by
//! [`ProfileStore`](super::ProfileStore)), and writes made by another
//! process sharing the same backend. The [`Watcher`] covers the second
//! kind by polling the stored key's fingerprint and re-reading when it
//! moves. Every event carries the full fresh snapshot; consumers replace
//! their local copy wholesale, no diffing.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::repository::{
    entities::Profile,
    store::{Fingerprint, ProfileStore},
};

/// Where a change came from, as seen by the receiving subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ChangeOrigin {
    /// A mutation made through this store instance.
    #[display("local")]
    Local,
    /// A write observed on the backend that this instance didn't make.
    #[display("external")]
    External,
}

/// A collection change, carrying the authoritative snapshot to render from.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub origin: ChangeOrigin,
    pub profiles: Vec<Profile>,
}

pub type Subscription = broadcast::Receiver<StoreEvent>;

pub use tokio::sync::broadcast::error::RecvError;

/// Guard for the polling thread. Dropping it stops the poll; keeping it
/// around is the consumer's statement that it is still on screen.
#[derive(Debug)]
pub struct Watcher {
    stop: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    pub(crate) fn spawn(store: ProfileStore, interval: Duration) -> Self {
        // Take the baseline before the thread starts, so anything written
        // after `watch()` returns is guaranteed to register as a change.
        let baseline = store.fingerprint().unwrap_or_default();

        let (stop, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("dossier-watch".to_string())
            .spawn(move || run(&store, baseline, interval, &stop_rx))
            .expect("spawning the watcher thread should not fail");

        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(
    store: &ProfileStore,
    mut last: Option<Fingerprint>,
    interval: Duration,
    stop: &mpsc::Receiver<()>,
) {
    loop {
        // The tick can't overlap itself: the read below finishes before the
        // next wait starts.
        match stop.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let current = match store.fingerprint() {
            Ok(fingerprint) => fingerprint,
            Err(err) => {
                warn!(%err, "watch tick could not read the backend");
                continue;
            }
        };

        if current == last {
            continue;
        }
        last = current;

        if current.is_some() && current == store.last_local_fingerprint() {
            // Our own write; the mutation already published a local event.
            continue;
        }

        match store.get_all() {
            Ok(profiles) => {
                debug!(count = profiles.len(), "external change to profile collection");
                store.publish(ChangeOrigin::External, profiles);
            }
            Err(err) => warn!(%err, "could not refresh after an external change"),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::repository::{entities::ProfileDraft, store::MemoryBackend};

    const TICK: Duration = Duration::from_millis(10);

    fn profile(name: &str) -> Profile {
        ProfileDraft {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            ..ProfileDraft::default()
        }
        .stamp()
        .unwrap()
    }

    #[test]
    fn test_external_write_publishes_event() {
        let backend = MemoryBackend::new();
        let watching = ProfileStore::new(Arc::new(backend.clone()));
        let other = ProfileStore::new(Arc::new(backend));

        let mut events = watching.subscribe();
        let _watcher = watching.watch(TICK);

        other.save_all(&[profile("Ada")]).unwrap();

        let event = events.blocking_recv().unwrap();
        assert_eq!(event.origin, ChangeOrigin::External);
        assert_eq!(event.profiles.len(), 1);
        assert_eq!(event.profiles.first().unwrap().name, "Ada");
    }

    #[test]
    fn test_own_write_is_not_reported_as_external() {
        let store = ProfileStore::new(Arc::new(MemoryBackend::new()));
        let mut events = store.subscribe();
        let _watcher = store.watch(TICK);

        store.add(profile("Ada")).unwrap();

        let first = events.blocking_recv().unwrap();
        assert_eq!(first.origin, ChangeOrigin::Local);

        // Give the watcher a few ticks; it must not echo the local write.
        thread::sleep(TICK.checked_mul(5).unwrap());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_dropping_the_watcher_stops_polling() {
        let backend = MemoryBackend::new();
        let watching = ProfileStore::new(Arc::new(backend.clone()));
        let other = ProfileStore::new(Arc::new(backend));

        let mut events = watching.subscribe();
        drop(watching.watch(TICK));

        other.save_all(&[profile("Ada")]).unwrap();
        thread::sleep(TICK.checked_mul(5).unwrap());

        assert!(events.try_recv().is_err());
    }
}
