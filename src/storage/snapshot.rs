//! A file snapshot of a complaint collection.
//!
//! The snapshot is YAML or JSON depending on the file extension. Complaints are
//! listed most recent first, exactly as [`ComplaintStore::list`] returns them.
//! Loading checks every lifecycle invariant before anything reaches the store.
//! Records that fail the check can be set aside and written back unchanged, and
//! the last issued identifier is stored so that no identifier is ever reissued.

use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, Utc};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Complaint, ComplaintId, ComplaintIdError, ComplaintStore, Error, History, HistoryEntry,
    HistoryError, Priority, RequiredField, Sentiment, Status,
    complaint::{self, Classification, DEFAULT_LANGUAGE, Details},
};

/// A complaint collection as stored in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotVersion", into = "SnapshotVersion")]
pub struct Snapshot {
    complaints: Vec<ComplaintRecord>,
    last_id: Option<ComplaintId>,
}

/// A complaint in the serialized format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRecord {
    #[serde(
        serialize_with = "id_as_string",
        deserialize_with = "id_from_string"
    )]
    id: ComplaintId,
    citizen_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    description: String,
    category: String,
    location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ward: Option<String>,
    #[serde(default = "default_language")]
    language: String,
    status: Status,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    sentiment: Sentiment,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    history: Vec<HistoryRecord>,
}

/// A history entry in the serialized format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    status: Status,
    timestamp: DateTime<Utc>,
    note: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Serialize a complaint ID as a string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn id_as_string<S>(id: &ComplaintId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(id)
}

/// Deserialize a complaint ID from a string.
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a complaint ID.
pub fn id_from_string<'de, D>(deserializer: D) -> Result<ComplaintId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(|e: ComplaintIdError| serde::de::Error::custom(e))
}

mod optional_id {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::domain::{ComplaintId, ComplaintIdError};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        id: &Option<ComplaintId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.collect_str(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ComplaintId>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| {
                s.parse()
                    .map_err(|e: ComplaintIdError| serde::de::Error::custom(e))
            })
            .transpose()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum SnapshotVersion {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        complaints: Vec<ComplaintRecord>,
        #[serde(
            default,
            rename = "lastId",
            skip_serializing_if = "Option::is_none",
            with = "optional_id"
        )]
        last_id: Option<ComplaintId>,
    },
}

impl From<SnapshotVersion> for Snapshot {
    fn from(version: SnapshotVersion) -> Self {
        match version {
            SnapshotVersion::V1 {
                complaints,
                last_id,
            } => Self {
                complaints,
                last_id,
            },
        }
    }
}

impl From<Snapshot> for SnapshotVersion {
    fn from(snapshot: Snapshot) -> Self {
        Self::V1 {
            complaints: snapshot.complaints,
            last_id: snapshot.last_id,
        }
    }
}

impl From<&Complaint> for ComplaintRecord {
    fn from(complaint: &Complaint) -> Self {
        Self {
            id: complaint.id(),
            citizen_name: complaint.citizen_name().to_string(),
            phone: complaint.phone().map(ToString::to_string),
            description: complaint.description().to_string(),
            category: complaint.category().to_string(),
            location: complaint.location().to_string(),
            ward: complaint.ward().map(ToString::to_string),
            language: complaint.language().to_string(),
            status: complaint.status(),
            priority: complaint.priority(),
            sentiment: complaint.sentiment(),
            date: complaint.date(),
            image_url: complaint.image_url().map(ToString::to_string),
            history: complaint
                .history()
                .iter()
                .map(|entry| HistoryRecord {
                    status: entry.status(),
                    timestamp: entry.timestamp(),
                    note: entry.note().to_string(),
                })
                .collect(),
        }
    }
}

impl ComplaintRecord {
    /// The identifier of the record.
    #[must_use]
    pub const fn id(&self) -> ComplaintId {
        self.id
    }
}

/// Why a stored complaint cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    /// A required field is blank.
    #[error("{0} must not be empty")]
    Blank(RequiredField),
    /// The history is empty, does not start with Pending, or goes back in time.
    #[error(transparent)]
    History(#[from] HistoryError),
    /// The recorded status disagrees with the last history entry.
    #[error("status is {status} but the last history entry is {last}")]
    StatusMismatch {
        /// The recorded status.
        status: Status,
        /// The status of the last history entry.
        last: Status,
    },
    /// Another complaint already has this identifier.
    #[error("duplicate complaint ID")]
    Duplicate,
}

impl TryFrom<ComplaintRecord> for Complaint {
    type Error = InvariantError;

    fn try_from(record: ComplaintRecord) -> Result<Self, Self::Error> {
        let details = Details {
            citizen_name: complaint::required(&record.citizen_name, RequiredField::CitizenName)
                .map_err(InvariantError::Blank)?,
            description: complaint::required(&record.description, RequiredField::Description)
                .map_err(InvariantError::Blank)?,
            location: complaint::required(&record.location, RequiredField::Location)
                .map_err(InvariantError::Blank)?,
            phone: complaint::optional(record.phone),
            ward: complaint::optional(record.ward),
            language: record.language,
            image_url: complaint::optional(record.image_url),
        };

        let history = History::from_entries(
            record
                .history
                .into_iter()
                .map(|entry| HistoryEntry::new(entry.status, entry.timestamp, entry.note))
                .collect(),
        )?;

        if history.current() != record.status {
            return Err(InvariantError::StatusMismatch {
                status: record.status,
                last: history.current(),
            });
        }

        Ok(Self {
            id: record.id,
            details,
            classification: Classification {
                category: record.category,
                priority: record.priority,
                sentiment: record.sentiment,
            },
            date: record.date,
            history,
        })
    }
}

/// A stored complaint that breaks an invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{id}: {error}")]
pub struct Violation {
    /// The complaint's identifier.
    pub id: ComplaintId,
    /// What is wrong with it.
    #[source]
    pub error: InvariantError,
}

/// Errors that can occur when loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The snapshot file was not found.
    #[error("snapshot {0} not found")]
    NotFound(PathBuf),
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The YAML could not be parsed.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    /// The JSON could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The file extension is neither YAML nor JSON.
    #[error("unsupported snapshot format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
    /// Some complaints break lifecycle invariants.
    #[error("{}", Violations(.0))]
    Invariants(Vec<Violation>),
    /// The complaints cannot form a store (for example, a duplicate ID).
    #[error(transparent)]
    Store(#[from] Error),
}

struct Violations<'a>(&'a [Violation]);

impl fmt::Display for Violations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} complaint(s) break lifecycle invariants:", self.0.len())?;
        for violation in self.0 {
            writeln!(f, "  - {violation}")?;
        }
        Ok(())
    }
}

/// A store rebuilt from a snapshot, with the records that could not be loaded.
#[derive(Debug, Default)]
pub struct Restored {
    /// The complaints that passed every check.
    pub store: ComplaintStore,
    /// Records that break an invariant, in file order. They stay out of the
    /// store but are written back by [`snapshot`](Self::snapshot).
    pub skipped: Vec<ComplaintRecord>,
}

impl From<ComplaintStore> for Restored {
    fn from(store: ComplaintStore) -> Self {
        Self {
            store,
            skipped: Vec::new(),
        }
    }
}

impl Restored {
    /// A snapshot of the store with the skipped records put back in place.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::from_store(&self.store);
        for record in &self.skipped {
            // most recent first, so a record goes before the first lower ID
            let position = snapshot
                .complaints
                .iter()
                .position(|other| other.id < record.id)
                .unwrap_or(snapshot.complaints.len());
            snapshot.complaints.insert(position, record.clone());
        }
        snapshot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Snapshot {
    /// A snapshot of the store's current contents.
    #[must_use]
    pub fn from_store(store: &ComplaintStore) -> Self {
        Self {
            complaints: store.list().iter().map(ComplaintRecord::from).collect(),
            last_id: store.last_issued(),
        }
    }

    /// The highest identifier ever issued: the stored high-water mark or the
    /// highest stored record, whichever is larger.
    fn highest_id(&self) -> Option<ComplaintId> {
        self.complaints
            .iter()
            .map(ComplaintRecord::id)
            .max()
            .max(self.last_id)
    }

    /// Parses a YAML snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads a snapshot file. Invariants are not checked until
    /// [`into_store`](Self::into_store) or [`violations`](Self::violations).
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, has an
    /// unsupported extension, or cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let format =
            Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.into()))?;

        let file = File::open(path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.into()),
            _ => LoadError::Io(io_error),
        })?;
        let reader = BufReader::new(file);

        let snapshot: Self = match format {
            Format::Yaml => serde_yaml::from_reader(reader)?,
            Format::Json => serde_json::from_reader(reader)?,
        };

        tracing::debug!(
            "Loaded {} complaints from {}",
            snapshot.complaints.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Writes the snapshot, choosing YAML or JSON from the file extension.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unsupported or the file cannot be
    /// written.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let format = Format::from_path(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                LoadError::UnsupportedFormat(path.into()).to_string(),
            )
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        match format {
            Format::Yaml => serde_yaml::to_writer(&mut writer, self).map_err(io::Error::other)?,
            Format::Json => {
                serde_json::to_writer_pretty(&mut writer, self).map_err(io::Error::other)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;

        tracing::debug!(
            "Saved {} complaints to {}",
            self.complaints.len(),
            path.display()
        );
        Ok(())
    }

    /// The stored complaints, most recent first.
    #[must_use]
    pub fn records(&self) -> &[ComplaintRecord] {
        &self.complaints
    }

    /// Number of stored complaints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.complaints.len()
    }

    /// Whether the snapshot holds no complaints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.complaints.is_empty()
    }

    /// Every invariant violation in the snapshot, including duplicate IDs.
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .complaints
            .clone()
            .into_par_iter()
            .filter_map(|record| {
                let id = record.id();
                Complaint::try_from(record)
                    .err()
                    .map(|error| Violation { id, error })
            })
            .collect();

        let mut seen = std::collections::HashSet::new();
        for record in &self.complaints {
            if !seen.insert(record.id()) {
                violations.push(Violation {
                    id: record.id(),
                    error: InvariantError::Duplicate,
                });
            }
        }

        violations
    }

    /// Checks every stored complaint and builds a store from them.
    ///
    /// If `allow_invalid` is `false`, any complaint that breaks an invariant
    /// fails the whole load. If it is `true`, such complaints are skipped with
    /// a warning and returned in [`Restored::skipped`]. Either way no
    /// identifier up to the highest one ever issued is handed out again.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Invariants`] for broken complaints (unless
    /// allowed), or [`LoadError::Store`] if two complaints share an ID.
    pub fn restore(self, allow_invalid: bool) -> Result<Restored, LoadError> {
        let highest = self.highest_id();

        let (complaints, skipped): (Vec<_>, Vec<_>) = self
            .complaints
            .into_par_iter()
            .map(|record| Complaint::try_from(record.clone()).map_err(|error| (record, error)))
            .partition(Result::is_ok);

        let complaints: Vec<Complaint> = complaints.into_iter().flatten().collect();
        let (skipped, violations): (Vec<ComplaintRecord>, Vec<Violation>) = skipped
            .into_iter()
            .filter_map(Result::err)
            .map(|(record, error)| {
                let id = record.id();
                (record, Violation { id, error })
            })
            .unzip();

        if !violations.is_empty() {
            if !allow_invalid {
                return Err(LoadError::Invariants(violations));
            }
            for violation in &violations {
                tracing::warn!("Skipping complaint {violation}");
            }
        }

        let store = ComplaintStore::restore(complaints)?;
        if let Some(highest) = highest {
            store.reserve_through(highest);
        }
        Ok(Restored { store, skipped })
    }

    /// Checks every stored complaint and builds a store from them, discarding
    /// any skipped records. See [`restore`](Self::restore).
    ///
    /// # Errors
    ///
    /// As for [`restore`](Self::restore).
    pub fn into_store(self, allow_invalid: bool) -> Result<ComplaintStore, LoadError> {
        Ok(self.restore(allow_invalid)?.store)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::{ComplaintInput, LifecycleEngine};

    fn populated() -> ComplaintStore {
        let store = ComplaintStore::new();
        let engine = LifecycleEngine::new(&store);
        let first = store
            .create(
                ComplaintInput::new("Ramesh", "Pothole", "Roads", "MG Road")
                    .with_ward("Ward 12")
                    .with_priority(Priority::High),
            )
            .unwrap();
        store
            .create(ComplaintInput::new("Sunita", "Garbage", "Sanitation", "Green Park"))
            .unwrap();
        engine
            .transition(first.id(), Status::InProgress, Some("Assigned"))
            .unwrap();
        store
    }

    fn record(status: Status, history: Vec<(Status, u32)>) -> ComplaintRecord {
        ComplaintRecord {
            id: "GRV-001".parse().unwrap(),
            citizen_name: "Ramesh".to_string(),
            phone: None,
            description: "Pothole".to_string(),
            category: "Roads".to_string(),
            location: "MG Road".to_string(),
            ward: None,
            language: default_language(),
            status,
            priority: Priority::Medium,
            sentiment: Sentiment::Neutral,
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            image_url: None,
            history: history
                .into_iter()
                .map(|(status, hour)| HistoryRecord {
                    status,
                    timestamp: Utc.with_ymd_and_hms(2026, 2, 1, hour, 0, 0).unwrap(),
                    note: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn yaml_file_roundtrip() {
        let store = populated();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data").join("complaints.yaml");

        Snapshot::from_store(&store).save(&path).unwrap();
        let restored = Snapshot::load(&path).unwrap().into_store(false).unwrap();

        assert_eq!(restored.list(), store.list());
    }

    #[test]
    fn json_file_uses_display_labels() {
        let store = populated();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("complaints.json");

        Snapshot::from_store(&store).save(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();

        assert!(raw.contains("\"_version\": \"1\""));
        assert!(raw.contains("\"status\": \"In Progress\""));
        assert!(raw.contains("\"citizenName\": \"Ramesh\""));
        assert!(raw.contains("\"id\": \"GRV-001\""));
        assert!(raw.contains("\"lastId\": \"GRV-002\""));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("complaints.txt");
        assert!(matches!(
            Snapshot::load(&path),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(Snapshot::from_store(&populated()).save(&path).is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("complaints.yaml");
        assert!(matches!(Snapshot::load(&path), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn status_must_match_last_entry() {
        let record = record(Status::Resolved, vec![(Status::Pending, 9)]);
        assert_eq!(
            Complaint::try_from(record),
            Err(InvariantError::StatusMismatch {
                status: Status::Resolved,
                last: Status::Pending,
            })
        );
    }

    #[test]
    fn history_must_be_ordered() {
        let record = record(
            Status::Resolved,
            vec![(Status::Pending, 9), (Status::Resolved, 8)],
        );
        assert_eq!(
            Complaint::try_from(record),
            Err(InvariantError::History(HistoryError::OutOfOrder {
                index: 1
            }))
        );
    }

    #[test]
    fn invalid_records_fail_the_load_unless_allowed() {
        let mut broken = record(Status::Pending, vec![]);
        broken.id = "GRV-007".parse().unwrap();
        let valid = record(Status::Pending, vec![(Status::Pending, 9)]);
        let snapshot = Snapshot {
            complaints: vec![broken, valid],
            last_id: None,
        };

        assert!(matches!(
            snapshot.clone().into_store(false),
            Err(LoadError::Invariants(v)) if v.len() == 1
        ));

        let store = snapshot.into_store(true).unwrap();
        assert_eq!(store.len(), 1);
        // the skipped complaint's ID is not reissued
        let next = store
            .create(ComplaintInput::new("a", "b", "c", "d"))
            .unwrap();
        assert_eq!(next.id().to_string(), "GRV-008");
    }

    #[test]
    fn skipped_records_survive_a_save() {
        let mut broken = record(Status::Pending, vec![(Status::Pending, 9)]);
        broken.id = "GRV-003".parse().unwrap();
        broken.citizen_name = " ".to_string();
        let valid = record(Status::Pending, vec![(Status::Pending, 9)]);

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("complaints.yaml");
        Snapshot {
            complaints: vec![broken.clone(), valid],
            last_id: None,
        }
        .save(&path)
        .unwrap();

        let restored = Snapshot::load(&path).unwrap().restore(true).unwrap();
        assert_eq!(restored.store.len(), 1);
        assert_eq!(restored.skipped, vec![broken.clone()]);

        LifecycleEngine::new(&restored.store)
            .transition("GRV-001".parse().unwrap(), Status::Resolved, None)
            .unwrap();
        restored.snapshot().save(&path).unwrap();

        let reloaded = Snapshot::load(&path).unwrap();
        let ids: Vec<_> = reloaded
            .records()
            .iter()
            .map(|record| record.id().to_string())
            .collect();
        assert_eq!(ids, ["GRV-003", "GRV-001"]);
        assert_eq!(reloaded.records()[0], broken);

        let next = reloaded
            .into_store(true)
            .unwrap()
            .create(ComplaintInput::new("a", "b", "c", "d"))
            .unwrap();
        assert_eq!(next.id().to_string(), "GRV-004");
    }

    #[test]
    fn stored_last_id_is_never_reissued() {
        let yaml = r#"
_version: "1"
lastId: GRV-010
complaints: []
"#;
        let store = Snapshot::from_yaml(yaml)
            .unwrap()
            .into_store(false)
            .unwrap();
        let next = store
            .create(ComplaintInput::new("a", "b", "c", "d"))
            .unwrap();
        assert_eq!(next.id().to_string(), "GRV-011");

        assert_eq!(
            Snapshot::from_store(&store).last_id,
            Some("GRV-011".parse().unwrap())
        );
    }

    #[test]
    fn out_of_range_id_is_rejected_on_load() {
        let yaml = r#"
_version: "1"
lastId: GRV-18446744073709551615
"#;
        assert!(matches!(Snapshot::from_yaml(yaml), Err(LoadError::Yaml(_))));
    }

    #[test]
    fn violations_include_duplicates() {
        let valid = record(Status::Pending, vec![(Status::Pending, 9)]);
        let snapshot = Snapshot {
            complaints: vec![valid.clone(), valid],
            last_id: None,
        };

        let violations = snapshot.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].error, InvariantError::Duplicate);
        assert!(matches!(
            snapshot.into_store(false),
            Err(LoadError::Store(Error::DuplicateId(_)))
        ));
    }
}
