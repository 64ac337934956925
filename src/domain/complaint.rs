use chrono::{DateTime, NaiveDate, Utc};
use non_empty_string::NonEmptyString;
use nonempty::NonEmpty;

use crate::domain::{ComplaintId, Error, Priority, RequiredField, Sentiment, Status};

/// The note attached to the first history entry of every complaint.
pub const REGISTERED_NOTE: &str = "Complaint registered";

/// The language recorded when a submission does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A single citizen-filed grievance and its full status audit trail.
///
/// A complaint's status is, by construction, the status of the last entry in
/// its history. The only way to change it is through
/// [`LifecycleEngine::transition`](crate::LifecycleEngine::transition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complaint {
    pub(crate) id: ComplaintId,
    pub(crate) details: Details,
    pub(crate) classification: Classification,
    /// Calendar date of filing.
    pub(crate) date: NaiveDate,
    pub(crate) history: History,
}

/// What the citizen submitted. Never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Details {
    pub(crate) citizen_name: NonEmptyString,
    pub(crate) phone: Option<String>,
    pub(crate) description: NonEmptyString,
    pub(crate) location: NonEmptyString,
    pub(crate) ward: Option<String>,
    pub(crate) language: String,
    /// Weak reference to evidence media owned elsewhere.
    pub(crate) image_url: Option<String>,
}

/// Labels assigned at submission, possibly by an external classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Classification {
    pub(crate) category: String,
    pub(crate) priority: Priority,
    pub(crate) sentiment: Sentiment,
}

/// The fields a submission supplies when registering a complaint.
///
/// `priority` and `sentiment` carry the results of an external classifier when
/// one ran; otherwise they default to [`Priority::Medium`] and
/// [`Sentiment::Neutral`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintInput {
    /// Name of the citizen filing the complaint. Required.
    pub citizen_name: String,
    /// Contact number.
    pub phone: Option<String>,
    /// What is wrong. Required.
    pub description: String,
    /// Department or kind of problem, e.g. "Roads".
    pub category: String,
    /// Where the problem is. Required.
    pub location: String,
    /// Administrative sub-area.
    pub ward: Option<String>,
    /// Language tag of the submission.
    pub language: Option<String>,
    /// Reference to evidence media.
    pub image_url: Option<String>,
    /// Classifier override.
    pub priority: Option<Priority>,
    /// Classifier override.
    pub sentiment: Option<Sentiment>,
}

impl ComplaintInput {
    /// A submission with the required fields and a category.
    #[must_use]
    pub fn new(
        citizen_name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            citizen_name: citizen_name.into(),
            description: description.into(),
            category: category.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    /// Sets the ward.
    #[must_use]
    pub fn with_ward(mut self, ward: impl Into<String>) -> Self {
        self.ward = Some(ward.into());
        self
    }

    /// Sets the contact number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the language tag.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the evidence reference.
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Overrides the default priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Overrides the default sentiment.
    #[must_use]
    pub const fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// Trims a required field, rejecting it if nothing is left.
pub(crate) fn required(value: &str, field: RequiredField) -> Result<NonEmptyString, RequiredField> {
    NonEmptyString::new(value.trim().to_string()).map_err(|_| field)
}

/// Trims an optional field. Blank counts as absent.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Complaint {
    /// Builds a freshly registered complaint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the citizen name, description or
    /// location is blank.
    pub(crate) fn new(
        id: ComplaintId,
        input: ComplaintInput,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let details = Details {
            citizen_name: required(&input.citizen_name, RequiredField::CitizenName)?,
            description: required(&input.description, RequiredField::Description)?,
            location: required(&input.location, RequiredField::Location)?,
            phone: optional(input.phone),
            ward: optional(input.ward),
            language: optional(input.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            image_url: optional(input.image_url),
        };

        let classification = Classification {
            category: input.category.trim().to_string(),
            priority: input.priority.unwrap_or_default(),
            sentiment: input.sentiment.unwrap_or_default(),
        };

        Ok(Self {
            id,
            details,
            classification,
            date: now.date_naive(),
            history: History::registered(now),
        })
    }

    /// The unique, immutable identifier.
    #[must_use]
    pub const fn id(&self) -> ComplaintId {
        self.id
    }

    /// Name of the citizen who filed the complaint.
    #[must_use]
    pub fn citizen_name(&self) -> &str {
        self.details.citizen_name.as_str()
    }

    /// Contact number, if given.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.details.phone.as_deref()
    }

    /// What is wrong.
    #[must_use]
    pub fn description(&self) -> &str {
        self.details.description.as_str()
    }

    /// Where the problem is.
    #[must_use]
    pub fn location(&self) -> &str {
        self.details.location.as_str()
    }

    /// The ward, if given.
    #[must_use]
    pub fn ward(&self) -> Option<&str> {
        self.details.ward.as_deref()
    }

    /// Language tag of the submission.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.details.language
    }

    /// Reference to evidence media. The media itself is not owned here.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.details.image_url.as_deref()
    }

    /// Department or kind of problem.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.classification.category
    }

    /// How urgently the complaint should be handled.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.classification.priority
    }

    /// The tone of the complaint.
    #[must_use]
    pub const fn sentiment(&self) -> Sentiment {
        self.classification.sentiment
    }

    /// The date the complaint was filed.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The current status. Always equal to the status of the last history
    /// entry.
    #[must_use]
    pub fn status(&self) -> Status {
        self.history.current()
    }

    /// The audit trail, oldest entry first.
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }
}

/// One immutable event in a complaint's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    status: Status,
    timestamp: DateTime<Utc>,
    note: String,
}

impl HistoryEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(status: Status, timestamp: DateTime<Utc>, note: impl Into<String>) -> Self {
        Self {
            status,
            timestamp,
            note: note.into(),
        }
    }

    /// The status the complaint entered.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// When it happened.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Human-readable description of the event.
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }
}

/// An append-only, never empty, time-ordered sequence of history entries
/// whose first entry is [`Status::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History(NonEmpty<HistoryEntry>);

/// Reasons a sequence of entries cannot form a [`History`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// There are no entries.
    #[error("history is empty")]
    Empty,
    /// The first entry is not `Pending`.
    #[error("history starts with {0}, expected Pending")]
    FirstNotPending(Status),
    /// An entry is older than the one before it.
    #[error("history entry {index} is older than the entry before it")]
    OutOfOrder {
        /// Position of the offending entry.
        index: usize,
    },
}

impl History {
    /// A history holding only the registration entry.
    pub(crate) fn registered(at: DateTime<Utc>) -> Self {
        Self(NonEmpty::new(HistoryEntry::new(
            Status::Pending,
            at,
            REGISTERED_NOTE,
        )))
    }

    /// Rebuilds a history from stored entries, checking its invariants.
    ///
    /// # Errors
    ///
    /// Fails if `entries` is empty, does not start with `Pending`, or has a
    /// timestamp earlier than its predecessor.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Result<Self, HistoryError> {
        let entries = NonEmpty::from_vec(entries).ok_or(HistoryError::Empty)?;

        if entries.head.status != Status::Pending {
            return Err(HistoryError::FirstNotPending(entries.head.status));
        }

        if let Some(index) = entries
            .iter()
            .zip(entries.iter().skip(1))
            .position(|(before, after)| after.timestamp < before.timestamp)
        {
            return Err(HistoryError::OutOfOrder { index: index + 1 });
        }

        Ok(Self(entries))
    }

    /// Appends an entry and returns it.
    ///
    /// If `at` is earlier than the last entry (the clock went backwards) the
    /// last entry's timestamp is used instead, keeping the sequence
    /// non-decreasing.
    pub(crate) fn record(
        &mut self,
        status: Status,
        at: DateTime<Utc>,
        note: String,
    ) -> &HistoryEntry {
        let timestamp = at.max(self.0.last().timestamp);
        self.0.push(HistoryEntry::new(status, timestamp, note));
        self.0.last()
    }

    /// The status of the last entry.
    #[must_use]
    pub fn current(&self) -> Status {
        self.0.last().status
    }

    /// The registration entry.
    #[must_use]
    pub fn first(&self) -> &HistoryEntry {
        self.0.first()
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> &HistoryEntry {
        self.0.last()
    }

    /// Number of entries. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.0.iter()
    }
}
