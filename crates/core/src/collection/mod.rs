//! The owned-games collection and its persistence.

/// Storage backends.
pub mod storage;
/// The collection store and display ordering.
pub mod store;
/// Import validation and export.
pub mod transfer;

pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{sort_records, CollectionStore, SortOrder};
pub use transfer::{export_file_name, export_json, validate_import, write_export};
