//! Typed resource values as carried by Wonko documents.
//!
//! Each variant knows how to read itself from JSON, how to merge itself into
//! an accumulated value of the same kind and how to reset itself.

use crate::error::{LookupWarning, ProfileError, VersionConflict};
use crate::game::library::LibraryDocument;
use crate::game::patch::wonko::read_library_set;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A file to download, identified by its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Scalar,
    ScalarList,
    PathMap,
    Downloadable,
    /// `natives` marks sets whose entries are native libraries.
    LibrarySet { natives: bool },
}

impl ResourceKind {
    /// Kind a Wonko resource key is read as. Unknown keys are not resources.
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            "general.folders" => Some(ResourceKind::PathMap),
            "java.libraries" => Some(ResourceKind::LibrarySet { natives: false }),
            "java.natives" => Some(ResourceKind::LibrarySet { natives: true }),
            "java.mainClass" | "mc.appletClass" | "mc.assets" | "mc.arguments" => {
                Some(ResourceKind::Scalar)
            }
            "mc.tweakers" => Some(ResourceKind::ScalarList),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Resource {
    Scalar(String),
    ScalarList(Vec<String>),
    /// Folder path -> what the folder is used for
    PathMap(BTreeMap<String, Vec<String>>),
    Downloadable(Vec<Download>),
    LibrarySet(LibraryDocument),
}

impl Resource {
    pub fn parse(kind: ResourceKind, value: &Value, source_name: &str) -> Result<Self, ProfileError> {
        let invalid = |e: serde_json::Error| ProfileError::parse(source_name, e);
        let resource = match kind {
            ResourceKind::Scalar => Resource::Scalar(String::deserialize(value).map_err(invalid)?),
            ResourceKind::ScalarList => {
                Resource::ScalarList(Vec::<String>::deserialize(value).map_err(invalid)?)
            }
            ResourceKind::PathMap => Resource::PathMap(
                BTreeMap::<String, Vec<String>>::deserialize(value).map_err(invalid)?,
            ),
            ResourceKind::Downloadable => {
                Resource::Downloadable(Vec::<Download>::deserialize(value).map_err(invalid)?)
            }
            ResourceKind::LibrarySet { natives } => {
                Resource::LibrarySet(read_library_set(value, natives, source_name)?)
            }
        };
        Ok(resource)
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Scalar(_) => ResourceKind::Scalar,
            Resource::ScalarList(_) => ResourceKind::ScalarList,
            Resource::PathMap(_) => ResourceKind::PathMap,
            Resource::Downloadable(_) => ResourceKind::Downloadable,
            Resource::LibrarySet(doc) => ResourceKind::LibrarySet {
                natives: doc
                    .overwrite_set
                    .iter()
                    .chain(&doc.add_set)
                    .any(|lib| lib.is_native()),
            },
        }
    }

    /// Merge this resource into `target`.
    ///
    /// Plain values overwrite. Downloads are united by hash, keeping the target's
    /// entry on collision. Library sets run the library merge. A target of a
    /// different kind is replaced outright.
    pub fn merge_into(
        &self,
        target: &mut Resource,
        warnings: &mut Vec<LookupWarning>,
    ) -> Result<(), VersionConflict> {
        match (self, target) {
            (Resource::Downloadable(incoming), Resource::Downloadable(existing)) => {
                for download in incoming {
                    if !existing.iter().any(|d| d.sha256 == download.sha256) {
                        existing.push(download.clone());
                    }
                }
            }
            (Resource::LibrarySet(incoming), Resource::LibrarySet(existing)) => {
                existing.apply(incoming, warnings)?;
            }
            (incoming, target) => {
                if std::mem::discriminant(incoming) != std::mem::discriminant(target) {
                    log::debug!("Replacing {:?} resource with {:?}", target.kind(), incoming.kind());
                }
                *target = incoming.clone();
            }
        }
        Ok(())
    }

    /// Empty the resource, keeping its kind.
    pub fn clear(&mut self) {
        match self {
            Resource::Scalar(s) => s.clear(),
            Resource::ScalarList(list) => list.clear(),
            Resource::PathMap(map) => map.clear(),
            Resource::Downloadable(downloads) => downloads.clear(),
            Resource::LibrarySet(doc) => doc.clear(),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Resource::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Resource::ScalarList(list) => Some(list),
            _ => None,
        }
    }
}
