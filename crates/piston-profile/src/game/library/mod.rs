pub mod document;
pub mod download;
pub mod entry;
pub mod rules;
pub mod specifier;

// Re-export commonly used types
pub use document::LibraryDocument;
pub use download::{build_download_tasks, DirectoryStore, DownloadTask, LibraryStore};
pub use entry::{DependStrength, InsertMode, Library};
pub use rules::{evaluate, Rule, RuleAction};
pub use specifier::VersionSpecifier;
