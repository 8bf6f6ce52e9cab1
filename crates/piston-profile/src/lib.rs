//! Patch-stack profile resolution.
//!
//! A profile is described by an ordered stack of patch documents, each adding to,
//! overwriting or removing from the configuration of the ones before it. This
//! crate reads those documents, orders them and folds them into a single
//! [`ResolvedProfile`] that launch-command and download builders consume.

pub mod error;
pub mod game;
pub mod utils;

// Re-export commonly used types
pub use error::{Diagnostic, LookupWarning, ProfileError, VersionConflict};
pub use game::config::ResolverConfig;
pub use game::library::{
    build_download_tasks, DependStrength, DownloadTask, InsertMode, Library, LibraryDocument,
    LibraryStore, Rule, RuleAction, VersionSpecifier,
};
pub use game::patch::{load_patch, load_wonko_patch, ConfigurationPatch};
pub use game::profile::{ProfileResolver, Resolution, ResolvedProfile};
pub use utils::platform::OsType;
