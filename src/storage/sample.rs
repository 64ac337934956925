use crate::storage::{LoadError, Snapshot};

/// The sample data set in its on-disk YAML form.
pub const SAMPLE_YAML: &str = include_str!("sample.yaml");

/// Six complaints across five wards in every lifecycle state but rejected,
/// useful for trying out reports.
///
/// # Errors
///
/// Returns an error if the bundled YAML cannot be parsed.
pub fn sample() -> Result<Snapshot, LoadError> {
    Snapshot::from_yaml(SAMPLE_YAML)
}
