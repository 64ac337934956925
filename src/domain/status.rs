//! The closed vocabularies of a complaint: lifecycle status, priority and
//! sentiment.
//!
//! Values serialize with the labels shown to citizens and officials (for
//! example `"In Progress"`). Parsing is forgiving about case and separators so
//! that `in-progress`, `InProgress` and `in progress` are all accepted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lowercases and strips the separators that may appear in a label.
fn normalise(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Where a complaint is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Registered, not yet picked up.
    Pending,
    /// Assigned and being worked on.
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    /// The grievance has been addressed.
    Resolved,
    /// The grievance was declined.
    Rejected,
}

impl Status {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
    ];

    /// The display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A status value outside the four lifecycle states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status '{0}': expected one of Pending, In Progress, Resolved, Rejected")]
pub struct InvalidStatusError(pub String);

impl FromStr for Status {
    type Err = InvalidStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "pending" => Ok(Self::Pending),
            "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(InvalidStatusError(s.to_string())),
        }
    }
}

/// How urgently a complaint should be handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default when no classifier result is available.
    #[default]
    Medium,
    /// Should be handled soon.
    High,
    /// A hazard to health or safety.
    Urgent,
}

impl Priority {
    /// The display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A priority value outside `Low`, `Medium`, `High`, `Urgent`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority '{0}': expected one of Low, Medium, High, Urgent")]
pub struct InvalidPriorityError(pub String);

impl FromStr for Priority {
    type Err = InvalidPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(InvalidPriorityError(s.to_string())),
        }
    }
}

/// The tone of a complaint, as judged by an external classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    /// No strong feeling, or not classified.
    #[default]
    Neutral,
    /// Worried.
    Concerned,
    /// Losing patience.
    Frustrated,
    /// Angry.
    Angry,
}

impl Sentiment {
    /// The display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Concerned => "Concerned",
            Self::Frustrated => "Frustrated",
            Self::Angry => "Angry",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A sentiment value outside `Neutral`, `Concerned`, `Frustrated`, `Angry`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sentiment '{0}': expected one of Neutral, Concerned, Frustrated, Angry")]
pub struct InvalidSentimentError(pub String);

impl FromStr for Sentiment {
    type Err = InvalidSentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "neutral" => Ok(Self::Neutral),
            "concerned" => Ok(Self::Concerned),
            "frustrated" => Ok(Self::Frustrated),
            "angry" => Ok(Self::Angry),
            _ => Err(InvalidSentimentError(s.to_string())),
        }
    }
}
