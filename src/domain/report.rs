//! Filtered views and grouped statistics over a snapshot of complaints.
//!
//! Nothing here mutates the store. Every operation works on a slice of owned
//! complaints (usually [`ComplaintStore::list`]), so reports can run in
//! parallel with each other and with writers.

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::NaiveDate;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{Complaint, ComplaintStore, Priority, Status};

/// The group a complaint without a ward falls into when grouping by ward.
pub const UNKNOWN_WARD: &str = "Unknown";

/// Which field complaints are grouped by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Department or kind of problem.
    #[default]
    Category,
    /// Administrative sub-area. Complaints without one form the group
    /// [`UNKNOWN_WARD`].
    #[serde(alias = "location")]
    Ward,
    /// Lifecycle status.
    Status,
    /// Priority.
    Priority,
}

impl GroupBy {
    /// Every grouping.
    pub const ALL: [Self; 4] = [Self::Category, Self::Ward, Self::Status, Self::Priority];

    /// The display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Ward => "Ward",
            Self::Status => "Status",
            Self::Priority => "Priority",
        }
    }

    /// The group key of a complaint.
    #[must_use]
    pub fn key(self, complaint: &Complaint) -> String {
        match self {
            Self::Category => complaint.category().to_string(),
            Self::Ward => complaint.ward().unwrap_or(UNKNOWN_WARD).to_string(),
            Self::Status => complaint.status().to_string(),
            Self::Priority => complaint.priority().to_string(),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A grouping other than category, ward (location), status or priority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grouping '{0}': expected one of category, ward, status, priority")]
pub struct InvalidGroupByError(String);

impl FromStr for GroupBy {
    type Err = InvalidGroupByError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(Self::Category),
            "ward" | "location" => Ok(Self::Ward),
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            _ => Err(InvalidGroupByError(s.to_string())),
        }
    }
}

/// Conditions a complaint must meet to be included in a view.
///
/// Every supplied condition must hold. Omitted conditions impose no
/// constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    /// Exact status.
    pub status: Option<Status>,
    /// Exact ward. Complaints without a ward never match.
    pub ward: Option<String>,
    /// Filed on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Filed on or before this date.
    pub date_to: Option<NaiveDate>,
    /// Exact category.
    pub category: Option<String>,
    /// Case-insensitive substring of the description or the identifier.
    pub search: Option<String>,
}

impl Criteria {
    /// Whether the complaint meets every supplied condition.
    #[must_use]
    pub fn matches(&self, complaint: &Complaint) -> bool {
        if self.status.is_some_and(|status| complaint.status() != status) {
            return false;
        }
        if self
            .ward
            .as_deref()
            .is_some_and(|ward| complaint.ward() != Some(ward))
        {
            return false;
        }
        if self.date_from.is_some_and(|from| complaint.date() < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| complaint.date() > to) {
            return false;
        }
        if self
            .category
            .as_deref()
            .is_some_and(|category| complaint.category() != category)
        {
            return false;
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            let in_description = complaint.description().to_lowercase().contains(&needle);
            let in_id = complaint
                .id()
                .to_string()
                .to_lowercase()
                .contains(&needle);
            if !in_description && !in_id {
                return false;
            }
        }
        true
    }
}

/// A percentage shown to one decimal place, e.g. `66.7`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Percentage {
    /// `part / whole * 100`. A `whole` of zero is treated as one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(part: usize, whole: usize) -> Self {
        Self(part as f64 / whole.max(1) as f64 * 100.0)
    }

    /// The unrounded value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    /// Ties round away from zero, so 6.25 shows as `6.3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", (self.0 * 10.0).round() / 10.0)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Statistics for one group of complaints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStat {
    /// The group key.
    pub name: String,
    /// Number of complaints in the group.
    pub count: usize,
    /// Of which pending.
    pub pending: usize,
    /// Of which in progress.
    pub in_progress: usize,
    /// Of which resolved.
    pub resolved: usize,
    /// Share of all filtered complaints.
    pub percentage: Percentage,
    /// Share of this group that is resolved.
    pub resolved_percentage: Percentage,
}

impl GroupStat {
    const fn empty(name: String) -> Self {
        Self {
            name,
            count: 0,
            pending: 0,
            in_progress: 0,
            resolved: 0,
            percentage: Percentage(0.0),
            resolved_percentage: Percentage(0.0),
        }
    }

    const fn add(&mut self, status: Status) {
        self.count += 1;
        match status {
            Status::Pending => self.pending += 1,
            Status::InProgress => self.in_progress += 1,
            Status::Resolved => self.resolved += 1,
            // rejected complaints count towards the group total only
            Status::Rejected => {}
        }
    }
}

/// Headline numbers over a filtered set of complaints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    /// Number of complaints.
    pub total: usize,
    /// Of which resolved.
    pub resolved: usize,
    /// Of which pending.
    pub pending: usize,
    /// Urgent complaints, whatever their status.
    pub urgent: usize,
    /// Share resolved. `None` when there are no complaints.
    #[serde(serialize_with = "rate_or_zero")]
    pub resolution_rate: Option<Percentage>,
}

impl OverallStats {
    /// The resolution rate as displayed: one decimal place, or `0` when there
    /// are no complaints.
    #[must_use]
    pub fn resolution_rate_label(&self) -> String {
        self.resolution_rate
            .map_or_else(|| "0".to_string(), |rate| rate.to_string())
    }
}

fn rate_or_zero<S: Serializer>(rate: &Option<Percentage>, serializer: S) -> Result<S::Ok, S::Error> {
    match rate {
        Some(rate) => serializer.collect_str(rate),
        None => serializer.serialize_str("0"),
    }
}

/// Status counts over an unfiltered collection, as shown on a dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    /// Number of complaints.
    pub total: usize,
    /// Of which pending.
    pub pending: usize,
    /// Of which in progress.
    pub in_progress: usize,
    /// Of which resolved.
    pub resolved: usize,
}

/// A complete grouped report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// The grouping used.
    pub group_by: GroupBy,
    /// One entry per group, largest first.
    pub groups: Vec<GroupStat>,
    /// Headline numbers over the filtered complaints.
    pub overall: OverallStats,
}

/// Computes filtered views and grouped statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAggregator;

impl ReportAggregator {
    /// The complaints that meet every supplied condition, in their original
    /// order.
    #[must_use]
    pub fn filter(complaints: &[Complaint], criteria: &Criteria) -> Vec<Complaint> {
        let filtered: Vec<Complaint> = complaints
            .par_iter()
            .filter(|complaint| criteria.matches(complaint))
            .cloned()
            .collect();

        tracing::debug!("Filtered {} of {} complaints", filtered.len(), complaints.len());
        filtered
    }

    /// Groups complaints by the chosen field and computes per-group
    /// statistics.
    ///
    /// Groups are sorted by descending count. Groups with equal counts keep the
    /// order in which their keys first appear in `filtered`.
    #[must_use]
    pub fn aggregate(filtered: &[Complaint], group_by: GroupBy) -> Vec<GroupStat> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<GroupStat> = Vec::new();

        for complaint in filtered {
            let key = group_by.key(complaint);
            let position = match positions.get(&key) {
                Some(&position) => position,
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push(GroupStat::empty(key));
                    groups.len() - 1
                }
            };
            groups[position].add(complaint.status());
        }

        let total = filtered.len();
        for group in &mut groups {
            group.percentage = Percentage::of(group.count, total);
            group.resolved_percentage = Percentage::of(group.resolved, group.count);
        }

        // stable, so ties keep first-seen order
        groups.sort_by(|a, b| b.count.cmp(&a.count));

        tracing::debug!("{} complaints in {} groups by {group_by}", total, groups.len());
        groups
    }

    /// Headline numbers over the given complaints.
    #[must_use]
    pub fn overall_stats(filtered: &[Complaint]) -> OverallStats {
        let total = filtered.len();
        let count_status =
            |status: Status| filtered.iter().filter(|c| c.status() == status).count();
        let resolved = count_status(Status::Resolved);

        OverallStats {
            total,
            resolved,
            pending: count_status(Status::Pending),
            urgent: filtered
                .iter()
                .filter(|c| c.priority() == Priority::Urgent)
                .count(),
            resolution_rate: (total > 0).then(|| Percentage::of(resolved, total)),
        }
    }

    /// Status counts for a dashboard header.
    #[must_use]
    pub fn status_summary(complaints: &[Complaint]) -> StatusSummary {
        complaints.iter().fold(
            StatusSummary {
                total: complaints.len(),
                ..StatusSummary::default()
            },
            |mut summary, complaint| {
                match complaint.status() {
                    Status::Pending => summary.pending += 1,
                    Status::InProgress => summary.in_progress += 1,
                    Status::Resolved => summary.resolved += 1,
                    Status::Rejected => {}
                }
                summary
            },
        )
    }

    /// The distinct wards, in the order they first appear.
    #[must_use]
    pub fn wards(complaints: &[Complaint]) -> Vec<String> {
        distinct(complaints.iter().filter_map(Complaint::ward))
    }

    /// The distinct non-empty categories, in the order they first appear.
    #[must_use]
    pub fn categories(complaints: &[Complaint]) -> Vec<String> {
        distinct(
            complaints
                .iter()
                .map(Complaint::category)
                .filter(|category| !category.is_empty()),
        )
    }

    /// Filters a snapshot of the store and builds a grouped report from it.
    #[must_use]
    pub fn report(store: &ComplaintStore, criteria: &Criteria, group_by: GroupBy) -> Report {
        let filtered = Self::filter(&store.list(), criteria);
        Report {
            group_by,
            groups: Self::aggregate(&filtered, group_by),
            overall: Self::overall_stats(&filtered),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for value in values {
        if !distinct.iter().any(|seen| seen == value) {
            distinct.push(value.to_string());
        }
    }
    distinct
}
