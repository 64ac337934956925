//! The authoritative in-memory collection of complaints.
//!
//! The [`ComplaintStore`] knows nothing about files or presentation. It owns
//! the complaints, the identifier counter and the lock that serializes every
//! write to either.

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use tracing::instrument;

use crate::domain::{Complaint, ComplaintId, ComplaintInput, Error, IdGenerator};

/// An in-memory, append-only collection of complaints.
///
/// Complaints are never removed. Identifiers come from a dedicated counter
/// that lives under the same lock as the collection, so concurrent
/// submissions can never be issued the same identifier and no reader ever
/// observes a half-applied update.
///
/// Readers receive owned copies: mutating what [`list`](Self::list) or
/// [`get`](Self::get) returns has no effect on the store.
#[derive(Debug, Default)]
pub struct ComplaintStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Complaints in insertion order, oldest first.
    complaints: Vec<Complaint>,

    /// Position of each complaint in `complaints`.
    index: HashMap<ComplaintId, usize>,

    ids: IdGenerator,
}

impl Inner {
    fn insert(&mut self, complaint: Complaint) -> Result<(), Error> {
        let id = complaint.id();
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        self.ids.observe(id);
        self.index.insert(id, self.complaints.len());
        self.complaints.push(complaint);
        Ok(())
    }
}

impl ComplaintStore {
    /// Creates an empty store. The first complaint will be `GRV-001`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for the given number of complaints.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                complaints: Vec::with_capacity(capacity),
                index: HashMap::with_capacity(capacity),
                ids: IdGenerator::new(),
            }),
        }
    }

    /// Rebuilds a store from existing complaints, most recent first (the order
    /// [`list`](Self::list) returns them in).
    ///
    /// New identifiers continue after the highest one restored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if two complaints share an identifier.
    pub fn restore(complaints: Vec<Complaint>) -> Result<Self, Error> {
        let mut inner = Inner {
            complaints: Vec::with_capacity(complaints.len()),
            index: HashMap::with_capacity(complaints.len()),
            ids: IdGenerator::new(),
        };

        for complaint in complaints.into_iter().rev() {
            inner.insert(complaint)?;
        }

        tracing::debug!(
            "Restored {} complaints, next ID after {}",
            inner.complaints.len(),
            inner.ids.last()
        );

        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Every mutation is committed whole, so a poisoned lock never guards a
    /// torn complaint and can be recovered.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new complaint.
    ///
    /// The complaint receives the next identifier, today's date, status
    /// `Pending` and a single "Complaint registered" history entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the citizen name, description or
    /// location is blank, or [`Error::IdsExhausted`] once the largest
    /// identifier has been issued. The store is left unchanged and no
    /// identifier is consumed.
    #[instrument(level = "debug", skip(self, input))]
    pub fn create(&self, input: ComplaintInput) -> Result<Complaint, Error> {
        let mut inner = self.write();

        let mut ids = inner.ids.clone();
        let id = ids.try_next().ok_or(Error::IdsExhausted)?;
        let complaint = Complaint::new(id, input, Utc::now())?;

        inner.ids = ids;
        inner.insert(complaint.clone())?;

        tracing::info!("Registered complaint {}", complaint.id());
        Ok(complaint)
    }

    /// Returns every complaint, most recently created first.
    #[must_use]
    pub fn list(&self) -> Vec<Complaint> {
        self.read().complaints.iter().rev().cloned().collect()
    }

    /// Returns the complaint with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such complaint.
    pub fn get(&self, id: ComplaintId) -> Result<Complaint, Error> {
        let inner = self.read();
        inner
            .index
            .get(&id)
            .map(|&position| inner.complaints[position].clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Whether a complaint with the given identifier exists.
    #[must_use]
    pub fn contains(&self, id: ComplaintId) -> bool {
        self.read().index.contains_key(&id)
    }

    /// Number of complaints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().complaints.len()
    }

    /// Whether the store holds no complaints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().complaints.is_empty()
    }

    /// The most recently issued identifier, or `None` if none has been.
    ///
    /// This can be higher than any stored complaint's identifier when
    /// identifiers were reserved on restore.
    #[must_use]
    pub fn last_issued(&self) -> Option<ComplaintId> {
        NonZeroUsize::new(self.read().ids.last()).map(ComplaintId::new)
    }

    /// Marks every identifier up to and including `id` as issued, so that
    /// none of them is handed out to a new complaint.
    pub(crate) fn reserve_through(&self, id: ComplaintId) {
        self.write().ids.observe(id);
    }

    /// Applies a mutation to one complaint under the write lock.
    ///
    /// The mutation works on a copy which replaces the stored complaint only
    /// if it returns `Ok`, so readers see either the old complaint or the new
    /// one and a failed mutation changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such complaint, or whatever
    /// error the mutation returns.
    pub(crate) fn apply<R>(
        &self,
        id: ComplaintId,
        mutation: impl FnOnce(&mut Complaint) -> Result<R, Error>,
    ) -> Result<(Complaint, R), Error> {
        let mut inner = self.write();

        let position = *inner
            .index
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut updated = inner.complaints[position].clone();
        let outcome = mutation(&mut updated)?;
        debug_assert_eq!(updated.id(), id, "mutations must not change the ID");

        inner.complaints[position] = updated.clone();
        Ok((updated, outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc, thread};

    use super::*;
    use crate::domain::{RequiredField, Status, complaint_id::MAX_NUMBER};

    fn input(name: &str) -> ComplaintInput {
        ComplaintInput::new(name, "Pothole", "Roads", "MG Road")
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let store = ComplaintStore::new();
        let first = store.create(input("Ramesh")).unwrap();
        let second = store.create(input("Sunita")).unwrap();

        assert_eq!(first.id().to_string(), "GRV-001");
        assert_eq!(second.id().to_string(), "GRV-002");
        assert_eq!(second.status(), Status::Pending);
    }

    #[test]
    fn list_is_most_recent_first() {
        let store = ComplaintStore::new();
        for name in ["a", "b", "c"] {
            store.create(input(name)).unwrap();
        }

        let names: Vec<_> = store
            .list()
            .iter()
            .map(|c| c.citizen_name().to_string())
            .collect();
        assert_eq!(names, ["c", "b", "a"]);
    }

    #[test]
    fn failed_create_changes_nothing() {
        let store = ComplaintStore::new();
        store.create(input("Ramesh")).unwrap();

        let error = store.create(input(" ")).unwrap_err();
        assert_eq!(
            error,
            Error::Validation {
                field: RequiredField::CitizenName
            }
        );
        assert_eq!(store.len(), 1);

        // the rejected submission did not burn an identifier
        let next = store.create(input("Sunita")).unwrap();
        assert_eq!(next.id().to_string(), "GRV-002");
    }

    #[test]
    fn get_unknown_is_not_found() {
        let store = ComplaintStore::new();
        let id = "GRV-999".parse().unwrap();
        assert_eq!(
            store.get(id),
            Err(Error::NotFound("GRV-999".to_string()))
        );
    }

    #[test]
    fn returned_copies_are_detached() {
        let store = ComplaintStore::new();
        let created = store.create(input("Ramesh")).unwrap();

        let mut listed = store.list();
        listed.clear();
        let mut fetched = store.get(created.id()).unwrap();
        fetched.history.record(Status::Resolved, Utc::now(), String::new());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(created.id()).unwrap(), created);
    }

    #[test]
    fn failed_apply_changes_nothing() {
        let store = ComplaintStore::new();
        let created = store.create(input("Ramesh")).unwrap();

        let result: Result<(Complaint, ()), _> = store.apply(created.id(), |complaint| {
            complaint
                .history
                .record(Status::Resolved, Utc::now(), String::new());
            Err(Error::NotFound("abandoned".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.get(created.id()).unwrap(), created);
    }

    #[test]
    fn restore_resumes_ids_and_keeps_order() {
        let source = ComplaintStore::new();
        for name in ["a", "b", "c"] {
            source.create(input(name)).unwrap();
        }

        let restored = ComplaintStore::restore(source.list()).unwrap();
        assert_eq!(restored.list(), source.list());

        let next = restored.create(input("d")).unwrap();
        assert_eq!(next.id().to_string(), "GRV-004");
    }

    #[test]
    fn create_fails_once_ids_run_out() {
        let store = ComplaintStore::new();
        let largest = ComplaintId::new(NonZeroUsize::new(MAX_NUMBER).unwrap());
        store.reserve_through(largest);

        assert_eq!(store.create(input("Ramesh")), Err(Error::IdsExhausted));
        assert!(store.is_empty());
        assert_eq!(store.last_issued(), Some(largest));
    }

    #[test]
    fn last_issued_tracks_the_counter() {
        let store = ComplaintStore::new();
        assert_eq!(store.last_issued(), None);

        let created = store.create(input("Ramesh")).unwrap();
        assert_eq!(store.last_issued(), Some(created.id()));

        store.reserve_through("GRV-010".parse().unwrap());
        assert_eq!(store.last_issued().unwrap().to_string(), "GRV-010");
    }

    #[test]
    fn restore_rejects_duplicates() {
        let source = ComplaintStore::new();
        let complaint = source.create(input("a")).unwrap();

        let error = ComplaintStore::restore(vec![complaint.clone(), complaint.clone()]).unwrap_err();
        assert_eq!(error, Error::DuplicateId(complaint.id()));
    }

    #[test]
    fn concurrent_creates_never_share_an_id() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;

        let store = Arc::new(ComplaintStore::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|i| store.create(input(&format!("{t}-{i}"))).unwrap().id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<_> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(ids.len(), THREADS * PER_THREAD);
        assert_eq!(store.len(), THREADS * PER_THREAD);
    }
}
