use std::fmt;

use crate::domain::{ComplaintId, status::InvalidStatusError};

/// Errors surfaced by the complaint store and the lifecycle engine.
///
/// All of these are recoverable. An operation that fails leaves the store
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required submission field was empty or blank.
    #[error("{field} must not be empty")]
    Validation {
        /// The offending field.
        field: RequiredField,
    },

    /// No complaint has the given identifier.
    #[error("complaint {0} not found")]
    NotFound(String),

    /// A status value outside the four lifecycle states.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusError),

    /// Two complaints share an identifier.
    #[error("duplicate complaint ID {0}")]
    DuplicateId(ComplaintId),

    /// Every identifier up to the largest allowed one has been issued.
    #[error("no complaint IDs left to issue")]
    IdsExhausted,
}

impl From<RequiredField> for Error {
    fn from(field: RequiredField) -> Self {
        Self::Validation { field }
    }
}

/// The submission fields the store itself insists on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    /// The citizen's name.
    CitizenName,
    /// The description of the grievance.
    Description,
    /// Where the problem is.
    Location,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CitizenName => "citizen name",
            Self::Description => "description",
            Self::Location => "location",
        })
    }
}
