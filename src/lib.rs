//! Citizen Grievance Tracking
//!
//! Complaints move through an auditable status lifecycle and are summarised
//! in grouped reports. The core is in-memory; the [`storage`] module provides
//! an optional file snapshot for tools that need one.

pub mod domain;
pub use domain::{
    Complaint, ComplaintId, ComplaintInput, ComplaintStore, Config, Criteria, Error, GroupBy,
    LifecycleEngine, Priority, ReportAggregator, Sentiment, Status,
};

/// Snapshot files and the bundled sample data set.
pub mod storage;
pub use storage::{LoadError, Snapshot};
