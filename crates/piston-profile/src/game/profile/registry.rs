/// Known packages and their versions, keyed by uid
use crate::error::ProfileError;
use crate::game::patch::ConfigurationPatch;
use crate::utils::version::compare_versions;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One version of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Owning package; look it up with [`PackageRegistry::package`].
    pub uid: String,
    pub version: String,
    pub version_type: String,
    pub time: Option<DateTime<Utc>>,
    pub requires: BTreeMap<String, String>,
    /// The full version document, once it has been loaded
    pub patch: Option<ConfigurationPatch>,
}

impl VersionEntry {
    pub fn is_release(&self) -> bool {
        self.version_type == "release"
    }

    pub fn is_loaded(&self) -> bool {
        self.patch.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub uid: String,
    pub name: String,
    /// Newest first
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct RawIndex {
    uid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    versions: Vec<RawIndexEntry>,
}

#[derive(Debug, Deserialize)]
struct RawIndexEntry {
    version: String,
    #[serde(rename = "type", default)]
    version_type: String,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    requires: Vec<RawRequire>,
}

#[derive(Debug, Deserialize)]
struct RawRequire {
    uid: String,
    #[serde(default)]
    version: Option<String>,
}

/// Newer entries sort first: by release time when both have one, else by version.
fn newest_first(a: &VersionEntry, b: &VersionEntry) -> Ordering {
    match (a.time, b.time) {
        (Some(ta), Some(tb)) if ta != tb => tb.cmp(&ta),
        _ => compare_versions(&b.version, &a.version),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, Package>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(&self, uid: &str) -> Option<&Package> {
        self.packages.get(uid)
    }

    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    fn package_mut(&mut self, uid: &str) -> &mut Package {
        self.packages
            .entry(uid.to_string())
            .or_insert_with(|| Package {
                uid: uid.to_string(),
                name: uid.to_string(),
                versions: Vec::new(),
            })
    }

    /// Load a version index document for `uid`. The index must describe `uid`.
    pub fn load_index(&mut self, uid: &str, doc: &Value) -> Result<(), ProfileError> {
        let source_name = format!("{} index", uid);
        let raw = RawIndex::deserialize(doc).map_err(|e| ProfileError::parse(&source_name, e))?;
        if raw.uid != uid {
            return Err(ProfileError::IdMismatch {
                expected: uid.to_string(),
                found: raw.uid,
            });
        }

        let count = raw.versions.len();
        if let Some(name) = raw.name {
            self.package_mut(uid).name = name;
        }
        for entry in raw.versions {
            let time = entry
                .time
                .and_then(|secs| Utc.timestamp_millis_opt((secs * 1000.0) as i64).single());
            let requires = entry
                .requires
                .into_iter()
                .map(|r| (r.uid, r.version.unwrap_or_default()))
                .collect();
            self.insert_version(VersionEntry {
                uid: uid.to_string(),
                version: entry.version,
                version_type: entry.version_type,
                time,
                requires,
                patch: None,
            });
        }

        log::debug!("Loaded {} versions of {}", count, uid);
        Ok(())
    }

    /// Add or update a version, keeping the list newest first.
    /// A loaded document already attached to the version is kept.
    pub fn insert_version(&mut self, mut entry: VersionEntry) {
        let package = self.package_mut(&entry.uid.clone());
        match package
            .versions
            .iter_mut()
            .find(|existing| existing.version == entry.version)
        {
            Some(existing) => {
                if entry.patch.is_none() {
                    entry.patch = existing.patch.take();
                }
                *existing = entry;
            }
            None => package.versions.push(entry),
        }
        package.versions.sort_by(newest_first);
    }

    /// Attach a loaded version document.
    pub fn attach_patch(&mut self, patch: ConfigurationPatch) {
        let entry = VersionEntry {
            uid: patch.id.clone(),
            version: patch.version_label.clone(),
            version_type: patch.patch_type.clone(),
            time: patch.release_time,
            requires: patch.dependencies.clone(),
            patch: Some(patch),
        };
        self.insert_version(entry);
    }

    pub fn find(&self, uid: &str, version: &str) -> Option<&VersionEntry> {
        self.package(uid)?
            .versions
            .iter()
            .find(|entry| entry.version == version)
    }

    /// Loaded document of a version, if available locally.
    pub fn patch_for(&self, uid: &str, version: &str) -> Option<&ConfigurationPatch> {
        self.find(uid, version)?.patch.as_ref()
    }

    pub fn latest_release(&self, uid: &str) -> Option<&VersionEntry> {
        self.package(uid)?.versions.iter().find(|v| v.is_release())
    }
}
