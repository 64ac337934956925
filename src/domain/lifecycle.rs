//! Status transitions and the audit trail they leave behind.

use chrono::Utc;
use tracing::instrument;

use crate::domain::{Complaint, ComplaintId, ComplaintStore, Error, HistoryEntry, Status};

/// The only path by which a complaint's status changes.
///
/// Every transition appends one [`HistoryEntry`] and commits it through the
/// store in a single step, so the complaint's status and the last entry of its
/// history always agree.
///
/// Any status may follow any other, including itself. Resolved and rejected
/// complaints can be reopened.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleEngine<'a> {
    store: &'a ComplaintStore,
}

impl<'a> LifecycleEngine<'a> {
    /// Creates an engine that writes to the given store.
    #[must_use]
    pub const fn new(store: &'a ComplaintStore) -> Self {
        Self { store }
    }

    /// Moves a complaint to a new status.
    ///
    /// The appended entry carries `note` exactly as given, or
    /// `"Status changed to {status}"` when there is no note at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such complaint. The store is
    /// unchanged on error.
    #[instrument(level = "debug", skip(self))]
    pub fn transition(
        &self,
        id: ComplaintId,
        status: Status,
        note: Option<&str>,
    ) -> Result<Complaint, Error> {
        let note = note.map_or_else(|| default_note(status), ToString::to_string);

        let (complaint, previous) = self.store.apply(id, |complaint| {
            let previous = complaint.status();
            complaint.history.record(status, Utc::now(), note);
            Ok(previous)
        })?;

        tracing::info!("{id}: {previous} -> {status}");
        Ok(complaint)
    }

    /// Moves a complaint to a new status, taking the identifier and status as
    /// submitted by a caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` is malformed or unknown, then
    /// [`Error::InvalidStatus`] if `status` is not one of the four lifecycle
    /// states. The store is unchanged on error.
    pub fn transition_str(
        &self,
        id: &str,
        status: &str,
        note: Option<&str>,
    ) -> Result<Complaint, Error> {
        let id = id
            .trim()
            .parse::<ComplaintId>()
            .ok()
            .filter(|&id| self.store.contains(id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let status = status.parse::<Status>()?;

        self.transition(id, status, note)
    }

    /// The most recent entry in a complaint's audit trail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if there is no such complaint.
    pub fn latest(&self, id: ComplaintId) -> Result<HistoryEntry, Error> {
        Ok(self.store.get(id)?.history().last().clone())
    }
}

fn default_note(status: Status) -> String {
    format!("Status changed to {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComplaintInput;

    fn seeded() -> (ComplaintStore, ComplaintId) {
        let store = ComplaintStore::new();
        let id = store
            .create(ComplaintInput::new("Ramesh", "Pothole", "Roads", "MG Road"))
            .unwrap()
            .id();
        (store, id)
    }

    #[test]
    fn transition_appends_entry_with_note() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        let updated = engine
            .transition(id, Status::InProgress, Some("Assigned to team"))
            .unwrap();

        assert_eq!(updated.status(), Status::InProgress);
        assert_eq!(updated.history().len(), 2);
        assert_eq!(updated.history().last().note(), "Assigned to team");
        assert_eq!(store.get(id).unwrap(), updated);
    }

    #[test]
    fn transition_without_note_uses_default() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        let updated = engine.transition(id, Status::InProgress, None).unwrap();
        assert_eq!(
            updated.history().last().note(),
            "Status changed to In Progress"
        );
    }

    #[test]
    fn given_note_is_kept_verbatim() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        let updated = engine.transition(id, Status::InProgress, Some("")).unwrap();
        assert_eq!(updated.history().last().note(), "");

        let updated = engine
            .transition(id, Status::Resolved, Some("  Fixed on site "))
            .unwrap();
        assert_eq!(updated.history().last().note(), "  Fixed on site ");
    }

    #[test]
    fn same_status_appends_redundant_entry() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        let updated = engine.transition(id, Status::Pending, None).unwrap();
        assert_eq!(updated.history().len(), 2);
        assert_eq!(updated.status(), Status::Pending);
    }

    #[test]
    fn resolved_complaints_can_be_reopened() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        engine.transition(id, Status::Resolved, None).unwrap();
        let reopened = engine.transition(id, Status::InProgress, None).unwrap();
        assert_eq!(reopened.status(), Status::InProgress);
        assert_eq!(reopened.history().len(), 3);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (store, _) = seeded();
        let engine = LifecycleEngine::new(&store);
        let before = store.list();

        let error = engine
            .transition("GRV-999".parse().unwrap(), Status::Resolved, None)
            .unwrap_err();

        assert_eq!(error, Error::NotFound("GRV-999".to_string()));
        assert_eq!(store.list(), before);
    }

    #[test]
    fn transition_str_checks_id_before_status() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        assert_eq!(
            engine.transition_str("GRV-999", "Closed", None),
            Err(Error::NotFound("GRV-999".to_string()))
        );
        assert_eq!(
            engine.transition_str("not-an-id", "Resolved", None),
            Err(Error::NotFound("not-an-id".to_string()))
        );
        assert!(matches!(
            engine.transition_str(&id.to_string(), "Closed", None),
            Err(Error::InvalidStatus(_))
        ));
        assert_eq!(store.get(id).unwrap().history().len(), 1);

        let updated = engine
            .transition_str(&id.to_string(), "in progress", None)
            .unwrap();
        assert_eq!(updated.status(), Status::InProgress);
    }

    #[test]
    fn latest_reflects_last_transition() {
        let (store, id) = seeded();
        let engine = LifecycleEngine::new(&store);

        engine.transition(id, Status::Rejected, Some("Duplicate")).unwrap();
        let latest = engine.latest(id).unwrap();
        assert_eq!(latest.status(), Status::Rejected);
        assert_eq!(latest.note(), "Duplicate");
    }
}
