//! Error and diagnostic types shared by the patch readers and the resolver.
//!
//! Anything that would corrupt a resolved profile is a [`ProfileError`] and aborts
//! the load or resolution it happened in. Intent that simply no longer applies
//! (a library to patch or remove that is not there, a duplicate entry) is a
//! [`LookupWarning`], logged and collected so the caller can show it next to a
//! successful result.

use crate::game::library::VersionSpecifier;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Failed to parse {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("{source_name} contains a {what} that doesn't have a '{field}' field")]
    MissingField {
        source_name: String,
        what: &'static str,
        field: &'static str,
    },

    #[error("Invalid library coordinate '{coordinate}': {reason}")]
    InvalidSpecifier { coordinate: String, reason: String },

    #[error("Patch {location} cannot be applied: {conflict}")]
    VersionConflict {
        patch: String,
        /// Patch id plus the file it came from, when known
        location: String,
        #[source]
        conflict: VersionConflict,
    },

    #[error("'{second}' has the same order ({order}) as '{first}'")]
    DuplicateOrder {
        order: i32,
        first: String,
        second: String,
    },

    #[error("{source_name} is in {format} format version {found}, newer than the supported {supported}")]
    FormatVersion {
        source_name: String,
        format: &'static str,
        found: i64,
        supported: i64,
    },

    #[error("Patch loaded as '{expected}' declares the id '{found}'")]
    IdMismatch { expected: String, found: String },

    #[error("Version '{version}' of '{uid}' is not available locally")]
    VersionIncomplete { uid: String, version: String },

    #[error("Some libraries marked as 'local' are missing their files:\n{}", .files.join("\n"))]
    MissingLocalLibraries { files: Vec<String> },
}

impl ProfileError {
    pub(crate) fn parse(source_name: &str, message: impl std::fmt::Display) -> Self {
        ProfileError::Parse {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }

    /// Id of the patch a resolution failure is attributed to, if any.
    pub fn patch_id(&self) -> Option<&str> {
        match self {
            ProfileError::VersionConflict { patch, .. } => Some(patch),
            _ => None,
        }
    }
}

/// Two libraries whose hard/soft constraints cannot both be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error resolving library dependencies between {existing} and {incoming}")]
pub struct VersionConflict {
    pub existing: VersionSpecifier,
    pub incoming: VersionSpecifier,
}

/// Non-fatal lookup problems found while merging libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupWarning {
    /// An `apply` library had nothing to apply to.
    LibraryNotFound { library: String },
    /// A `replace` library had nothing to replace.
    ReplaceTargetNotFound { target: String },
    /// A `-libraries` entry had nothing to remove.
    RemoveTargetNotFound { library: String },
    /// An overwrite list named the same library twice; the later entry was dropped.
    DuplicateLibrary { library: String },
    /// The active library list contained the same library twice; the later entry was skipped.
    DuplicateActiveLibrary { library: String },
}

impl std::fmt::Display for LookupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupWarning::LibraryNotFound { library } => {
                write!(f, "Couldn't find {} to apply to (skipping)", library)
            }
            LookupWarning::ReplaceTargetNotFound { target } => {
                write!(f, "Couldn't find {} to replace (skipping)", target)
            }
            LookupWarning::RemoveTargetNotFound { library } => {
                write!(f, "Couldn't find {} to remove (skipping)", library)
            }
            LookupWarning::DuplicateLibrary { library } => {
                write!(f, "Multiple libraries with name {} in overwrite list (keeping the first)", library)
            }
            LookupWarning::DuplicateActiveLibrary { library } => {
                write!(f, "Multiple libraries with name {} in library list!", library)
            }
        }
    }
}

/// A lookup warning attributed to the patch that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub patch: Option<String>,
    pub warning: LookupWarning,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.patch {
            Some(patch) => write!(f, "[{}] {}", patch, self.warning),
            None => write!(f, "{}", self.warning),
        }
    }
}
