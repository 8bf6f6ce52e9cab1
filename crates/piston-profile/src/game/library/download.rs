//! Maps active libraries to the files that have to be fetched.
//!
//! The merge itself never touches storage. Only this step needs to know what is
//! already present, and it asks through a [`LibraryStore`] handle passed in by the
//! caller.

use crate::error::ProfileError;
use crate::game::library::entry::Library;
use crate::utils::platform::{OsType, ARCH_BITS, ARCH_PLACEHOLDER};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Storage the download-task builder checks library files against.
pub trait LibraryStore {
    /// Whether a file exists at `storage_path` (relative to the library root).
    fn exists(&self, storage_path: &str) -> bool;

    /// Whether the file at `storage_path` has to be (re)downloaded.
    fn is_stale(&self, storage_path: &str) -> bool {
        !self.exists(storage_path)
    }
}

/// Library store backed by a plain directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, storage_path: &str) -> PathBuf {
        self.root.join(storage_path)
    }
}

impl LibraryStore for DirectoryStore {
    fn exists(&self, storage_path: &str) -> bool {
        self.path_for(storage_path).is_file()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DownloadTask {
    pub storage_path: String,
    pub url: String,
}

/// `(storage path, url)` for every file of `library` on `platform`, with `${arch}`
/// expanded to each pointer width.
pub fn library_downloads(library: &Library, platform: OsType) -> Vec<DownloadTask> {
    let raw_path = library.storage_path(platform);
    if !raw_path.contains(ARCH_PLACEHOLDER) {
        let url = library.url_for(&raw_path);
        return vec![DownloadTask {
            storage_path: raw_path,
            url,
        }];
    }

    ARCH_BITS
        .iter()
        .map(|bits| {
            let storage_path = raw_path.replace(ARCH_PLACEHOLDER, bits);
            let url = library
                .url_for(&storage_path)
                .replace(ARCH_PLACEHOLDER, bits);
            DownloadTask { storage_path, url }
        })
        .collect()
}

/// Download tasks for every stale file of `libraries`.
///
/// Libraries hinted `local` are never downloaded; if any of their files are
/// missing the whole call fails listing all of them.
pub fn build_download_tasks(
    libraries: &[Library],
    platform: OsType,
    store: &dyn LibraryStore,
) -> Result<Vec<DownloadTask>, ProfileError> {
    let mut tasks = Vec::new();
    let mut seen = HashSet::new();
    let mut missing_local = Vec::new();

    for library in libraries {
        if library.is_local() {
            for file in library.files(platform) {
                if !store.exists(&file) {
                    missing_local.push(file);
                }
            }
            continue;
        }

        for task in library_downloads(library, platform) {
            if !store.is_stale(&task.storage_path) {
                continue;
            }
            if seen.insert(task.storage_path.clone()) {
                log::debug!("Queued {} from {}", task.storage_path, task.url);
                tasks.push(task);
            }
        }
    }

    if !missing_local.is_empty() {
        log::error!("{} local libraries are missing", missing_local.len());
        return Err(ProfileError::MissingLocalLibraries {
            files: missing_local,
        });
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::library::specifier::VersionSpecifier;

    struct FakeStore(HashSet<String>);

    impl LibraryStore for FakeStore {
        fn exists(&self, storage_path: &str) -> bool {
            self.0.contains(storage_path)
        }
    }

    fn lib(name: &str) -> Library {
        Library::new(VersionSpecifier::parse(name).unwrap())
    }

    #[test]
    fn test_arch_expansion_in_paths_and_urls() {
        let mut natives = lib("tv.twitch:twitch-platform:5.16");
        natives
            .native_classifiers
            .insert(OsType::Windows, "natives-windows-${arch}".to_string());
        natives.absolute_url = Some("https://cdn.example/twitch-${arch}.jar".to_string());

        let tasks = library_downloads(&natives, OsType::Windows);
        assert_eq!(tasks.len(), 2);
        assert_eq!(
            tasks[0].storage_path,
            "tv/twitch/twitch-platform/5.16/twitch-platform-5.16-natives-windows-32.jar"
        );
        assert_eq!(tasks[0].url, "https://cdn.example/twitch-32.jar");
        assert_eq!(tasks[1].url, "https://cdn.example/twitch-64.jar");
    }

    #[test]
    fn test_only_stale_files_are_queued() {
        let present = lib("a:present:1");
        let absent = lib("a:absent:1");
        let store = FakeStore(HashSet::from([present.storage_path(OsType::Linux)]));

        let tasks =
            build_download_tasks(&[present, absent.clone(), absent], OsType::Linux, &store).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(
            tasks[0].url,
            "https://libraries.minecraft.net/a/absent/1/absent-1.jar"
        );
    }

    #[test]
    fn test_missing_local_libraries_are_reported_together() {
        let mut one = lib("local:one:1");
        one.hint = Some("local".to_string());
        let mut two = lib("local:two:1");
        two.hint = Some("local".to_string());
        let store = FakeStore(HashSet::new());

        match build_download_tasks(&[one, two], OsType::Linux, &store) {
            Err(ProfileError::MissingLocalLibraries { files }) => assert_eq!(files.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
