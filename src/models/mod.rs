pub mod artifact;
pub mod backup;
pub mod customer;

pub use artifact::{ArtifactKind, BackupArtifact, ObjectDescriptor, Row, SkippedItem, TableExport};
pub use backup::{BackupLog, BackupLogRow, BackupStatus};
pub use customer::{CustomerRecord, CustomerRow, ProjectCredentials, Tier};
