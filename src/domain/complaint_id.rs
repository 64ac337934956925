use std::{fmt, num::NonZeroUsize, str::FromStr};

/// The fixed prefix of every complaint identifier.
pub const PREFIX: &str = "GRV";

/// The minimum number of digits in the numeric part of an identifier.
///
/// Numbers are padded to this width with leading zeros. Wider numbers are
/// never truncated.
pub const MIN_DIGITS: usize = 3;

/// The largest numeric part an identifier may have.
pub const MAX_NUMBER: usize = 999_999_999;

/// A complaint identifier.
///
/// Format: `GRV-{NUMBER}`, where `NUMBER` is a positive non-zero integer
/// zero-padded to at least [`MIN_DIGITS`] digits. Parsing rejects numbers above
/// [`MAX_NUMBER`].
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use grievance::ComplaintId;
///
/// let id = ComplaintId::new(NonZeroUsize::new(42).unwrap());
/// assert_eq!(id.to_string(), "GRV-042");
///
/// let id = ComplaintId::new(NonZeroUsize::new(1042).unwrap());
/// assert_eq!(id.to_string(), "GRV-1042");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplaintId {
    number: NonZeroUsize,
}

impl ComplaintId {
    /// Create an identifier from its numeric part.
    #[must_use]
    pub const fn new(number: NonZeroUsize) -> Self {
        Self { number }
    }

    /// Returns the numeric part of the identifier.
    #[must_use]
    pub const fn number(&self) -> NonZeroUsize {
        self.number
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{PREFIX}-{:0width$}", self.number, width = MIN_DIGITS)
    }
}

/// Errors that can occur when parsing a complaint identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Malformed identifier structure.
    #[error("Invalid complaint ID format: {0}")]
    Syntax(String),

    /// The identifier does not start with the `GRV` prefix.
    #[error("Invalid complaint ID '{0}': expected prefix 'GRV'")]
    Prefix(String),

    /// The numeric part is not a non-zero integer.
    #[error("Invalid number in complaint ID '{0}': expected a non-zero integer, got {1}")]
    Number(String, String),

    /// The numeric part is larger than [`MAX_NUMBER`].
    #[error("Complaint ID '{0}' is out of range: the largest number is {max}", max = MAX_NUMBER)]
    Range(String),
}

impl FromStr for ComplaintId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((prefix, number_str)) = s.split_once('-') else {
            return Err(Error::Syntax(s.to_string()));
        };

        if prefix.is_empty() || number_str.is_empty() {
            return Err(Error::Syntax(s.to_string()));
        }

        if prefix != PREFIX {
            return Err(Error::Prefix(s.to_string()));
        }

        // `parse` would accept a leading '+'
        if !number_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Number(s.to_string(), number_str.to_string()));
        }

        let number = number_str
            .parse::<usize>()
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                if number_str.trim_start_matches('0').is_empty() {
                    Error::Number(s.to_string(), number_str.to_string())
                } else {
                    Error::Range(s.to_string())
                }
            })?;

        if number.get() > MAX_NUMBER {
            return Err(Error::Range(s.to_string()));
        }

        Ok(Self::new(number))
    }
}

impl TryFrom<&str> for ComplaintId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// Produces unique, strictly increasing complaint identifiers.
///
/// The generator is backed by its own counter rather than by the size of any
/// collection, so identifiers are never reused. It takes `&mut self`; callers
/// that share one across threads serialize access through the lock that guards
/// the collection it feeds (see [`ComplaintStore`](crate::ComplaintStore)).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGenerator {
    last: usize,
}

impl IdGenerator {
    /// A generator whose first identifier will be `GRV-001`.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// A generator that continues after the given number.
    #[must_use]
    pub const fn resuming_after(last: usize) -> Self {
        Self { last }
    }

    /// Returns the next identifier and advances the counter.
    ///
    /// # Panics
    ///
    /// Panics once [`MAX_NUMBER`] has been issued. Use
    /// [`try_next`](Self::try_next) where running out must be handled.
    pub fn next(&mut self) -> ComplaintId {
        self.try_next().expect("complaint IDs exhausted")
    }

    /// Returns the next identifier and advances the counter, or `None` (leaving
    /// the counter alone) once [`MAX_NUMBER`] has been issued.
    pub fn try_next(&mut self) -> Option<ComplaintId> {
        let number = NonZeroUsize::MIN
            .checked_add(self.last)
            .filter(|number| number.get() <= MAX_NUMBER)?;
        self.last = number.get();
        Some(ComplaintId::new(number))
    }

    /// Records an identifier that was issued elsewhere, so that it is never
    /// handed out again.
    pub fn observe(&mut self, id: ComplaintId) {
        self.last = self.last.max(id.number().get());
    }

    /// The number of the most recently issued (or observed) identifier.
    #[must_use]
    pub const fn last(&self) -> usize {
        self.last
    }
}
