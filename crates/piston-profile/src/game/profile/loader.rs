//! Read-only loading of patch documents from disk.
//!
//! Files are read concurrently and all reads are joined before anything is
//! parsed into the result, so resolution never sees a partial scan. A document
//! that fails to parse is reported in the scan instead of failing the scan.

use crate::game::config::is_builtin_component;
use crate::game::patch::{load_patch, ConfigurationPatch, WonkoVersion};
use crate::game::profile::order::{arrange_patches, OrderFile};
use crate::game::profile::registry::PackageRegistry;
use crate::error::ProfileError;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A file that could not be used.
#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Everything found in an instance directory.
#[derive(Debug, Default)]
pub struct InstanceScan {
    /// Contents of `order.json`
    pub order: Vec<String>,
    /// Local documents for builtin components, by uid
    pub builtin_overrides: BTreeMap<String, ConfigurationPatch>,
    /// User patches, by file id
    pub user_patches: BTreeMap<String, ConfigurationPatch>,
    pub failures: Vec<ScanFailure>,
}

impl InstanceScan {
    /// Order the scanned documents for resolution.
    pub fn arrange(
        mut self,
        requested: &BTreeMap<String, String>,
        registry: &PackageRegistry,
    ) -> Result<Vec<ConfigurationPatch>, ProfileError> {
        arrange_patches(
            &mut self.builtin_overrides,
            requested,
            registry,
            &self.order,
            self.user_patches,
        )
    }
}

/// All `*.json` files directly inside `dir`, sorted by name. A missing directory is empty.
async fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e).with_context(|| format!("Read dir {:?}", dir)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Read dir {:?}", dir))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .with_context(|| format!("Stat {:?}", path))?;
        let is_file = if file_type.is_symlink() {
            tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false)
        } else {
            file_type.is_file()
        };
        if is_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every file concurrently.
async fn read_all(paths: Vec<PathBuf>) -> Vec<(PathBuf, std::io::Result<String>)> {
    let reads = paths.into_iter().map(|path| async move {
        let contents = tokio::fs::read_to_string(&path).await;
        (path, contents)
    });
    join_all(reads).await
}

fn file_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Scan an instance directory: `order.json` and `patches/*.json`.
pub async fn scan_instance(instance_root: &Path) -> Result<InstanceScan> {
    let mut scan = InstanceScan::default();

    let order_path = instance_root.join("order.json");
    match tokio::fs::read_to_string(&order_path).await {
        Ok(raw) => scan.order = OrderFile::parse(&raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read order file {:?}", order_path))
        }
    }

    let files = json_files(&instance_root.join("patches")).await?;
    log::info!("Reading {} patch files from {:?}", files.len(), instance_root);

    for (path, contents) in read_all(files).await {
        let id = file_id(&path);
        let filename = path.display().to_string();
        let builtin = is_builtin_component(&id);

        let parsed = contents
            .with_context(|| format!("Unable to open the patch file {:?}", path))
            .and_then(|raw| load_patch(&raw, &filename, !builtin).map_err(anyhow::Error::from));

        match parsed {
            Ok(patch) if builtin => {
                scan.builtin_overrides.insert(id, patch);
            }
            Ok(patch) => {
                scan.user_patches.insert(id, patch);
            }
            Err(error) => {
                log::warn!("Skipping {:?}: {:#}", path, error);
                scan.failures.push(ScanFailure { path, error });
            }
        }
    }

    Ok(scan)
}

/// Load one package from a metadata directory laid out as `<dir>/<uid>/index.json`
/// plus one Wonko document per version.
pub async fn load_package(
    metadata_dir: &Path,
    uid: &str,
    registry: &mut PackageRegistry,
) -> Result<Vec<ScanFailure>> {
    let package_dir = metadata_dir.join(uid);
    let files = json_files(&package_dir).await?;
    let mut failures = Vec::new();

    for (path, contents) in read_all(files).await {
        let filename = path.display().to_string();
        let result = contents
            .with_context(|| format!("Unable to open {:?}", path))
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).context("Failed to parse JSON"))
            .and_then(|doc| {
                if file_id(&path) == "index" {
                    registry.load_index(uid, &doc)?;
                } else {
                    let version = WonkoVersion::from_json(&doc, &filename, Some(uid))?;
                    if version.uid != uid {
                        return Err(ProfileError::IdMismatch {
                            expected: uid.to_string(),
                            found: version.uid,
                        }
                        .into());
                    }
                    registry.attach_patch(version.to_patch(&filename));
                }
                Ok(())
            });

        if let Err(error) = result {
            log::warn!("Skipping {:?}: {:#}", path, error);
            failures.push(ScanFailure { path, error });
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_directories_scan_empty() {
        let dir = TempDir::new().unwrap();
        let scan = scan_instance(dir.path()).await.unwrap();
        assert!(scan.order.is_empty());
        assert!(scan.user_patches.is_empty());
        assert!(scan.failures.is_empty());
    }

    #[tokio::test]
    async fn test_bad_files_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let patches = dir.path().join("patches");
        std::fs::create_dir_all(&patches).unwrap();
        std::fs::write(patches.join("broken.json"), "{ nope").unwrap();
        std::fs::write(
            patches.join("com.example.json"),
            r#"{"fileId":"com.example","order":3}"#,
        )
        .unwrap();
        std::fs::write(patches.join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir_all(patches.join("folder.json")).unwrap();

        let scan = scan_instance(dir.path()).await.unwrap();
        assert_eq!(scan.user_patches.len(), 1);
        assert_eq!(scan.user_patches["com.example"].order, 3);
        assert_eq!(scan.failures.len(), 1);
        assert!(scan.failures[0].path.ends_with("broken.json"));
    }
}
