//! Reconcile a local keyed collection against an authoritative list.
//!
//! Items are identified by a key accessor and compared by a fingerprint
//! accessor; an optional precondition can veto an item, which removes any
//! local copy of it.

use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    hash::Hash,
};

/// Receives the changes a [`DiffableMap::diff`] applies. Every method has a
/// no-op default.
pub trait DiffObserver<K, T> {
    fn on_add(&mut self, _key: &K, _item: &T) {}
    fn on_replace(&mut self, _key: &K, _previous: &T, _current: &T) {}
    fn on_remove(&mut self, _key: &K, _item: &T) {}
}

impl<K, T> DiffObserver<K, T> for () {}

/// What a diff did, by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport<K> {
    pub added: Vec<K>,
    pub changed: Vec<K>,
    pub unchanged: Vec<K>,
    pub removed: Vec<K>,
    pub skipped: Vec<K>,
}

impl<K> Default for DiffReport<K> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            changed: Vec::new(),
            unchanged: Vec::new(),
            removed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<K> DiffReport<K> {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

type Accessor<T, R> = Box<dyn Fn(&T) -> R + Send + Sync>;

pub struct DiffableMap<K, T, F> {
    items: HashMap<K, T>,
    key_of: Accessor<T, K>,
    fingerprint_of: Accessor<T, F>,
    precondition: Option<Accessor<T, bool>>,
}

impl<K, T, F> DiffableMap<K, T, F>
where
    K: Eq + Hash + Clone + Debug,
    F: PartialEq,
{
    pub fn new(
        key_of: impl Fn(&T) -> K + Send + Sync + 'static,
        fingerprint_of: impl Fn(&T) -> F + Send + Sync + 'static,
    ) -> Self {
        Self {
            items: HashMap::new(),
            key_of: Box::new(key_of),
            fingerprint_of: Box::new(fingerprint_of),
            precondition: None,
        }
    }

    /// Items failing `precondition` are neither added nor updated, and a
    /// local item with the same key is removed.
    pub fn with_precondition(mut self, precondition: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.precondition = Some(Box::new(precondition));
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.items.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Insert outside of a diff, returning the previous item for the key.
    pub fn insert(&mut self, item: T) -> Option<T> {
        let key = (self.key_of)(&item);
        self.items.insert(key, item)
    }

    pub fn remove(&mut self, key: &K) -> Option<T> {
        self.items.remove(key)
    }

    /// Bring the local collection in line with `authoritative`.
    ///
    /// Duplicate keys in the incoming list are logged and skipped after the
    /// first occurrence. Local keys absent from the incoming list are
    /// removed in a final sweep.
    pub fn diff<O>(&mut self, authoritative: impl IntoIterator<Item = T>, observer: &mut O) -> DiffReport<K>
    where
        O: DiffObserver<K, T> + ?Sized,
    {
        let mut report = DiffReport::default();
        let mut seen: HashSet<K> = HashSet::new();

        for item in authoritative {
            let key = (self.key_of)(&item);
            if !seen.insert(key.clone()) {
                tracing::warn!("skipping duplicate key {key:?} in authoritative list");
                report.skipped.push(key);
                continue;
            }

            if let Some(allowed) = &self.precondition {
                if !allowed(&item) {
                    if let Some(previous) = self.items.remove(&key) {
                        tracing::debug!("precondition vetoed {key:?}, removing local copy");
                        observer.on_remove(&key, &previous);
                        report.removed.push(key.clone());
                    }
                    report.skipped.push(key);
                    continue;
                }
            }

            match self.items.get(&key) {
                Some(existing) if (self.fingerprint_of)(existing) == (self.fingerprint_of)(&item) => {
                    report.unchanged.push(key);
                }
                Some(_) => {
                    if let Some(previous) = self.items.insert(key.clone(), item) {
                        if let Some(current) = self.items.get(&key) {
                            observer.on_replace(&key, &previous, current);
                        }
                    }
                    report.changed.push(key);
                }
                None => {
                    observer.on_add(&key, &item);
                    self.items.insert(key.clone(), item);
                    report.added.push(key);
                }
            }
        }

        let stale: Vec<K> = self
            .items
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(previous) = self.items.remove(&key) {
                observer.on_remove(&key, &previous);
                report.removed.push(key);
            }
        }

        tracing::debug!(
            "diff: {} added, {} changed, {} unchanged, {} removed, {} skipped",
            report.added.len(),
            report.changed.len(),
            report.unchanged.len(),
            report.removed.len(),
            report.skipped.len()
        );
        report
    }
}
