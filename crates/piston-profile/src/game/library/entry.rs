/// Library descriptor as it appears in a patch
use crate::game::config::LIBRARY_BASE_URL;
use crate::game::library::rules::{evaluate, Rule, RuleAction};
use crate::game::library::specifier::VersionSpecifier;
use crate::utils::platform::{expand_arch, OsType};
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

/// How a `+libraries` entry is merged into the accumulated library list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Patch fields of an existing entry.
    Apply,
    /// Add at the end, or reconcile versions with an existing entry.
    Append,
    /// Add at the front, or reconcile versions with an existing entry.
    #[default]
    Prepend,
    /// Swap out an existing entry (the insert target, or the same library).
    Replace,
}

impl InsertMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "apply" => Some(InsertMode::Apply),
            "append" => Some(InsertMode::Append),
            "prepend" => Some(InsertMode::Prepend),
            "replace" => Some(InsertMode::Replace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InsertMode::Apply => "apply",
            InsertMode::Append => "append",
            InsertMode::Prepend => "prepend",
            InsertMode::Replace => "replace",
        }
    }
}

/// Strength of a library's version requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependStrength {
    /// Needs an equal or newer version.
    #[default]
    Soft,
    /// Needs exactly this version.
    Hard,
}

impl DependStrength {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "soft" => Some(DependStrength::Soft),
            "hard" => Some(DependStrength::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependStrength::Soft => "soft",
            DependStrength::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    /// Maven coordinates
    pub name: VersionSpecifier,

    /// Maven repository the storage path is resolved against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Takes precedence over the repository URL when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_url: Option<String>,

    /// Type hint, e.g. "local" for files provided by the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    /// Native classifier per platform. Non-empty means the library is native.
    pub native_classifiers: BTreeMap<OsType, String>,

    /// True if the library had an extract section (even empty)
    pub apply_excludes: bool,
    pub extract_excludes: Vec<String>,

    /// True if the library had a rules section (even empty)
    pub apply_rules: bool,
    pub rules: Vec<Rule>,

    pub insert_mode: InsertMode,

    /// Coordinate replaced by a `replace` insert, when it differs from `name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_target: Option<String>,

    pub depend_strength: DependStrength,
}

impl Library {
    pub fn new(name: VersionSpecifier) -> Self {
        Self {
            name,
            base_url: None,
            absolute_url: None,
            hint: None,
            native_classifiers: BTreeMap::new(),
            apply_excludes: false,
            extract_excludes: Vec::new(),
            apply_rules: false,
            rules: Vec::new(),
            insert_mode: InsertMode::default(),
            insert_target: None,
            depend_strength: DependStrength::default(),
        }
    }

    /// Version-independent identity (`group:artifact[:classifier]`).
    pub fn key(&self) -> String {
        self.name.key()
    }

    pub fn version(&self) -> &str {
        self.name.version()
    }

    pub fn same_library(&self, other: &Library) -> bool {
        self.name.same_library(&other.name)
    }

    pub fn is_native(&self) -> bool {
        !self.native_classifiers.is_empty()
    }

    pub fn is_local(&self) -> bool {
        self.hint.as_deref() == Some("local")
    }

    /// Rules allow the library on `platform` and, for natives, a classifier exists for it.
    pub fn is_active(&self, platform: OsType) -> bool {
        if evaluate(&self.rules, platform) != RuleAction::Allow {
            return false;
        }
        !self.is_native() || self.native_classifiers.contains_key(&platform)
    }

    /// Relative path the library is stored at. Natives use the classifier for
    /// `platform` (or `INVALID` when there is none) and may still contain `${arch}`.
    pub fn storage_path(&self, platform: OsType) -> String {
        if !self.is_native() {
            return self.name.to_path();
        }

        let classifier = self
            .native_classifiers
            .get(&platform)
            .map(String::as_str)
            .unwrap_or("INVALID");
        self.name.with_classifier(classifier).to_path()
    }

    /// Every file this library stands for on `platform`, with `${arch}` expanded.
    pub fn files(&self, platform: OsType) -> Vec<String> {
        expand_arch(&self.storage_path(platform))
    }

    /// Download URL for one of this library's files.
    pub fn url_for(&self, relative_path: &str) -> String {
        if let Some(absolute) = &self.absolute_url {
            return absolute.clone();
        }

        let base = self.base_url.as_deref().unwrap_or(LIBRARY_BASE_URL);
        join_url(base, relative_path)
    }

    /// Field-merge this library onto `existing`, producing the merged value.
    /// Only fields this library actually specifies override.
    pub fn apply_to(&self, existing: &Library) -> Library {
        let mut merged = existing.clone();
        if self.base_url.is_some() {
            merged.base_url = self.base_url.clone();
        }
        if self.absolute_url.is_some() {
            merged.absolute_url = self.absolute_url.clone();
        }
        if self.hint.is_some() {
            merged.hint = self.hint.clone();
        }
        if self.apply_excludes {
            merged.apply_excludes = true;
            merged.extract_excludes = self.extract_excludes.clone();
        }
        if self.is_native() {
            merged.native_classifiers = self.native_classifiers.clone();
        }
        if self.apply_rules {
            merged.apply_rules = true;
            merged.rules = self.rules.clone();
        }
        merged
    }
}

fn join_url(base: &str, relative_path: &str) -> String {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };

    match Url::parse(&base).and_then(|b| b.join(relative_path)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::debug!("Could not resolve {} against {}: {}", relative_path, base, e);
            format!("{}{}", base, relative_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(name: &str) -> Library {
        Library::new(VersionSpecifier::parse(name).unwrap())
    }

    #[test]
    fn test_native_storage_path_uses_platform_classifier() {
        let mut l = lib("org.lwjgl.lwjgl:lwjgl-platform:2.9.1");
        l.native_classifiers
            .insert(OsType::Windows, "natives-windows-${arch}".to_string());
        l.native_classifiers
            .insert(OsType::Linux, "natives-linux".to_string());

        assert!(l.is_native());
        assert_eq!(
            l.storage_path(OsType::Linux),
            "org/lwjgl/lwjgl/lwjgl-platform/2.9.1/lwjgl-platform-2.9.1-natives-linux.jar"
        );
        assert_eq!(
            l.files(OsType::Windows),
            vec![
                "org/lwjgl/lwjgl/lwjgl-platform/2.9.1/lwjgl-platform-2.9.1-natives-windows-32.jar",
                "org/lwjgl/lwjgl/lwjgl-platform/2.9.1/lwjgl-platform-2.9.1-natives-windows-64.jar",
            ]
        );
        assert!(l.storage_path(OsType::MacOS).ends_with("-INVALID.jar"));
        assert!(!l.is_active(OsType::MacOS));
    }

    #[test]
    fn test_url_resolution() {
        let mut l = lib("net.minecraft:launchwrapper:1.12");
        let path = l.storage_path(OsType::Linux);
        assert_eq!(
            l.url_for(&path),
            "https://libraries.minecraft.net/net/minecraft/launchwrapper/1.12/launchwrapper-1.12.jar"
        );

        l.base_url = Some("https://maven.minecraftforge.net".to_string());
        assert_eq!(
            l.url_for(&path),
            "https://maven.minecraftforge.net/net/minecraft/launchwrapper/1.12/launchwrapper-1.12.jar"
        );

        l.absolute_url = Some("https://example.com/lw.jar".to_string());
        assert_eq!(l.url_for(&path), "https://example.com/lw.jar");
    }

    #[test]
    fn test_apply_to_only_overrides_specified_fields() {
        let mut existing = lib("a:b:1.0");
        existing.base_url = Some("https://repo.one/".to_string());
        existing.hint = Some("local".to_string());

        let mut patch = lib("a:b:9.9");
        patch.absolute_url = Some("https://cdn/b.jar".to_string());
        patch.apply_rules = true;

        let merged = patch.apply_to(&existing);
        assert_eq!(merged.name.version(), "1.0");
        assert_eq!(merged.base_url.as_deref(), Some("https://repo.one/"));
        assert_eq!(merged.absolute_url.as_deref(), Some("https://cdn/b.jar"));
        assert_eq!(merged.hint.as_deref(), Some("local"));
        assert!(merged.apply_rules);
        assert!(merged.rules.is_empty());
    }
}
