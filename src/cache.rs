use crate::DigestScheme;
use http::Uri;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Entries {
    /// target -> (insertion sequence, scheme)
    schemes: HashMap<Uri, (u64, Arc<DigestScheme>)>,
    /// insertion sequence -> target, oldest first
    order: BTreeMap<u64, Uri>,
    next_seq: u64,
}

/// Bounded map from request target to the scheme negotiated for it.
///
/// Eviction is by insertion order, not access order: once an insert pushes the
/// size past capacity, the entry inserted longest ago is dropped. Replacing a
/// target counts as a fresh insert.
#[derive(Debug)]
pub struct SchemeCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl SchemeCache {
    /// Create a cache holding at most `capacity` targets (0 disables caching)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, target: &Uri) -> Option<Arc<DigestScheme>> {
        self.lock()
            .schemes
            .get(target)
            .map(|(_, scheme)| Arc::clone(scheme))
    }

    /// Insert or replace the scheme for `target`, evicting the oldest entries
    /// while over capacity.
    pub fn put(&self, target: Uri, scheme: Arc<DigestScheme>) {
        let mut entries = self.lock();

        let seq = entries.next_seq;
        entries.next_seq += 1;

        if let Some((old_seq, _)) = entries.schemes.insert(target.clone(), (seq, scheme)) {
            entries.order.remove(&old_seq);
        }
        entries.order.insert(seq, target);

        while entries.schemes.len() > self.capacity {
            let Some((_, oldest)) = entries.order.pop_first() else {
                break;
            };
            entries.schemes.remove(&oldest);
            tracing::debug!(uri = %oldest, "Evicted digest scheme");
        }
    }

    /// Forget the scheme for `target`, returning it if one was cached
    pub fn remove(&self, target: &Uri) -> Option<Arc<DigestScheme>> {
        let mut entries = self.lock();
        let (seq, scheme) = entries.schemes.remove(target)?;
        entries.order.remove(&seq);
        Some(scheme)
    }

    // Map and order index are never left out of step, so a poisoned lock is
    // still usable.
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
