/// State management module
///
/// This module handles all application state, including:
/// - Directory scanning and primary/sidecar grouping (library.rs)
/// - Shared data structures (data.rs)
/// - Lighting adjustments (edit.rs)
/// - Results of asynchronous GPU work (cache.rs)

pub mod cache;
pub mod data;
pub mod edit;
pub mod library;

pub use cache::{ResultCache, ResultKey};
pub use data::{FileHandle, FileItem};
pub use edit::LightingParams;
pub use library::{group_files, scan_directory};
