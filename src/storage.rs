/// The bundled sample data set.
pub mod sample;
/// YAML/JSON snapshots of a complaint collection.
pub mod snapshot;

pub use sample::sample;
pub use snapshot::{ComplaintRecord, InvariantError, LoadError, Restored, Snapshot, Violation};
