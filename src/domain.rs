//! Domain models for grievance tracking.
//!
//! This module contains the core types: complaints and their audit trail,
//! identifiers, the store that owns them, the lifecycle engine that changes
//! their status, and the aggregator that reports on them.

/// Complaint record, history and submission input.
pub mod complaint;
pub use complaint::{Complaint, ComplaintInput, History, HistoryEntry, HistoryError};

/// Complaint identifiers and the generator that issues them.
pub mod complaint_id;
pub use complaint_id::{ComplaintId, Error as ComplaintIdError, IdGenerator};

mod config;
pub use config::{Config, DEFAULT_CONFIG_FILE};

mod error;
pub use error::{Error, RequiredField};

mod lifecycle;
pub use lifecycle::LifecycleEngine;

/// Filtered views and grouped statistics.
pub mod report;
pub use report::{
    Criteria, GroupBy, GroupStat, OverallStats, Percentage, Report, ReportAggregator,
    StatusSummary,
};

/// Lifecycle status, priority and sentiment.
pub mod status;
pub use status::{InvalidStatusError, Priority, Sentiment, Status};

mod store;
pub use store::ComplaintStore;
