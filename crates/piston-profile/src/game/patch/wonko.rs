//! Wonko version documents (`formatVersion`, metadata plus `client`/`common` resources).

use crate::error::ProfileError;
use crate::game::config::CURRENT_WONKO_VERSION;
use crate::game::library::{Library, LibraryDocument, Rule, RuleAction, VersionSpecifier};
use crate::game::patch::resource::{Resource, ResourceKind};
use crate::game::patch::types::ConfigurationPatch;
use crate::utils::platform::OsType;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

static NATIVES_CLASSIFIER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"natives[^.]*").ok());

const ALL_PLATFORMS: [&str; 6] = ["win32", "win64", "lin32", "lin64", "osx32", "osx64"];

/// Metadata and resources of one Wonko version.
#[derive(Debug, Clone, PartialEq)]
pub struct WonkoVersion {
    pub uid: String,
    pub version: String,
    pub time: Option<DateTime<Utc>>,
    pub version_type: String,
    pub requires: BTreeMap<String, String>,
    pub resources: BTreeMap<String, Resource>,
}

#[derive(Debug, Deserialize)]
struct RawWonkoLibrary {
    name: String,
    url: Option<String>,
    #[serde(rename = "mavenBaseUrl")]
    maven_base_url: Option<String>,
    platforms: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRemoval {
    Name(String),
    Object { name: String },
}

impl RawRemoval {
    fn name(&self) -> &str {
        match self {
            RawRemoval::Name(name) | RawRemoval::Object { name } => name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawLibrarySet {
    libraries: Option<Vec<RawWonkoLibrary>>,
    #[serde(rename = "+libraries")]
    add_libraries: Option<Vec<RawWonkoLibrary>>,
    #[serde(rename = "-libraries")]
    remove_libraries: Option<Vec<RawRemoval>>,
}

fn platform_os(name: &str) -> OsType {
    if name.starts_with("win") {
        OsType::Windows
    } else if name.starts_with("lin") {
        OsType::Linux
    } else if name.starts_with("osx") {
        OsType::MacOS
    } else {
        OsType::Other
    }
}

/// Native classifier encoded in a download URL, with the pointer width replaced by `${arch}`.
fn classifier_from_url(url: &str) -> Option<String> {
    let regex = NATIVES_CLASSIFIER.as_ref()?;
    let found = regex.find(url)?.as_str();
    Some(found.replace("32", "${arch}").replace("64", "${arch}"))
}

fn convert_library(raw: RawWonkoLibrary, natives: bool, source_name: &str) -> Result<Library, ProfileError> {
    let mut lib = Library::new(VersionSpecifier::parse(&raw.name)?);
    lib.absolute_url = raw.url.filter(|u| !u.is_empty());
    lib.base_url = raw.maven_base_url.filter(|u| !u.is_empty());

    let declared: BTreeSet<String> = raw
        .platforms
        .unwrap_or_else(|| ALL_PLATFORMS.iter().map(|p| p.to_string()).collect())
        .into_iter()
        .collect();
    let all: BTreeSet<String> = ALL_PLATFORMS.iter().map(|p| p.to_string()).collect();
    let systems: BTreeSet<OsType> = declared.iter().map(|p| platform_os(p)).collect();

    if !declared.is_empty() && declared != all {
        lib.apply_rules = true;
        lib.rules.push(Rule::Implicit {
            action: RuleAction::Disallow,
        });
        lib.rules.extend(systems.iter().map(|os| Rule::Os {
            action: RuleAction::Allow,
            os: *os,
            version_regex: None,
        }));
    }

    if natives {
        match lib.absolute_url.as_deref().and_then(classifier_from_url) {
            Some(classifier) if !classifier.is_empty() => {
                for os in &systems {
                    lib.native_classifiers.insert(*os, classifier.clone());
                }
                lib.apply_excludes = true;
                lib.extract_excludes = vec!["META-INF/".to_string()];
            }
            _ => log::warn!(
                "Native library {} in {} has no recognizable classifier",
                lib.name,
                source_name
            ),
        }
    }

    Ok(lib)
}

/// Convert a list, folding entries with the same coordinate into one library.
fn convert_libraries(
    raw: Vec<RawWonkoLibrary>,
    natives: bool,
    source_name: &str,
) -> Result<Vec<Library>, ProfileError> {
    let mut result: Vec<Library> = Vec::new();
    for entry in raw {
        let mut converted = convert_library(entry, natives, source_name)?;
        match result.iter_mut().find(|lib| lib.name == converted.name) {
            Some(existing) => {
                existing
                    .native_classifiers
                    .append(&mut converted.native_classifiers);
                if !converted.rules.is_empty() {
                    // Drop the leading implicit disallow; the existing entry has one.
                    converted.rules.remove(0);
                }
                existing.rules.append(&mut converted.rules);
            }
            None => result.push(converted),
        }
    }
    Ok(result)
}

/// Read a library set: either a plain list (replacing the accumulated libraries)
/// or an object with `libraries`, `+libraries` and `-libraries`.
pub fn read_library_set(value: &Value, natives: bool, source_name: &str) -> Result<LibraryDocument, ProfileError> {
    let raw = match value {
        Value::Array(_) => RawLibrarySet {
            libraries: Some(
                Vec::<RawWonkoLibrary>::deserialize(value)
                    .map_err(|e| ProfileError::parse(source_name, e))?,
            ),
            ..Default::default()
        },
        _ => RawLibrarySet::deserialize(value).map_err(|e| ProfileError::parse(source_name, e))?,
    };

    let mut doc = LibraryDocument::default();
    if let Some(list) = raw.libraries {
        doc.should_overwrite = true;
        doc.overwrite_set = convert_libraries(list, natives, source_name)?;
    }
    if let Some(list) = raw.add_libraries {
        doc.add_set = convert_libraries(list, natives, source_name)?;
    }
    for removal in raw.remove_libraries.unwrap_or_default() {
        doc.remove(VersionSpecifier::parse(removal.name())?);
    }
    Ok(doc)
}

fn required_str<'a>(obj: &'a serde_json::Map<String, Value>, key: &'static str, source_name: &str) -> Result<&'a str, ProfileError> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ProfileError::MissingField {
            source_name: source_name.to_string(),
            what: "version",
            field: key,
        })
}

impl WonkoVersion {
    /// Read a version document. `uid_hint` is used when the document omits its uid.
    pub fn from_json(doc: &Value, source_name: &str, uid_hint: Option<&str>) -> Result<Self, ProfileError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| ProfileError::parse(source_name, "document is not an object"))?;

        let format = obj
            .get("formatVersion")
            .and_then(Value::as_i64)
            .ok_or(ProfileError::MissingField {
                source_name: source_name.to_string(),
                what: "version",
                field: "formatVersion",
            })?;
        if format > CURRENT_WONKO_VERSION {
            return Err(ProfileError::FormatVersion {
                source_name: source_name.to_string(),
                format: "Wonko",
                found: format,
                supported: CURRENT_WONKO_VERSION,
            });
        }

        let uid = match (obj.get("uid").and_then(Value::as_str), uid_hint) {
            (Some(uid), _) => uid.to_string(),
            (None, Some(hint)) => hint.to_string(),
            (None, None) => required_str(obj, "uid", source_name)?.to_string(),
        };
        let version = required_str(obj, "version", source_name)?.to_string();

        let seconds = obj
            .get("time")
            .and_then(Value::as_f64)
            .ok_or(ProfileError::MissingField {
                source_name: source_name.to_string(),
                what: "version",
                field: "time",
            })?;
        let time = Utc.timestamp_millis_opt((seconds * 1000.0) as i64).single();

        let version_type = obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut requires = BTreeMap::new();
        if let Some(list) = obj.get("requires") {
            let list = list
                .as_array()
                .ok_or_else(|| ProfileError::parse(source_name, "'requires' is not an array"))?;
            for item in list {
                let item = item
                    .as_object()
                    .ok_or_else(|| ProfileError::parse(source_name, "'requires' entry is not an object"))?;
                let dep_uid = required_str(item, "uid", source_name)?;
                let dep_version = item.get("version").and_then(Value::as_str).unwrap_or_default();
                requires.insert(dep_uid.to_string(), dep_version.to_string());
            }
        }

        let section = obj.get("client").or_else(|| obj.get("common"));
        let mut resources = BTreeMap::new();
        if let Some(section) = section {
            let section = section
                .as_object()
                .ok_or_else(|| ProfileError::parse(source_name, "resource section is not an object"))?;
            for (key, value) in section {
                match ResourceKind::for_key(key) {
                    Some(kind) => {
                        resources.insert(key.clone(), Resource::parse(kind, value, source_name)?);
                    }
                    None => log::debug!("Ignoring unknown resource '{}' in {}", key, source_name),
                }
            }
        }

        Ok(Self {
            uid,
            version,
            time,
            version_type,
            requires,
            resources,
        })
    }

    fn scalar(&self, key: &str) -> Option<String> {
        self.resources
            .get(key)
            .and_then(Resource::as_scalar)
            .map(str::to_string)
    }

    /// Convert into a patch the resolver can fold.
    pub fn to_patch(&self, source_name: &str) -> ConfigurationPatch {
        let mut patch = ConfigurationPatch::new(self.uid.clone());
        patch.display_name = self.uid.clone();
        patch.version_label = self.version.clone();
        patch.patch_type = self.version_type.clone();
        patch.release_time = self.time;
        patch.dependencies = self.requires.clone();
        patch.source_file = Some(source_name.to_string());

        if let Some(Resource::PathMap(folders)) = self.resources.get("general.folders") {
            let pack_trait = if folders.contains_key("minecraft/texturepacks") {
                "texturepacks"
            } else if folders.contains_key("minecraft/resourcepacks") {
                "resourcepacks"
            } else {
                "no-texturepacks"
            };
            patch.traits_added.insert(pack_trait.to_string());
        }

        if let Some(Resource::LibrarySet(set)) = self.resources.get("java.libraries") {
            patch.libraries = set.clone();
        }
        if let Some(Resource::LibrarySet(set)) = self.resources.get("java.natives") {
            patch.natives = set.clone();
        }

        patch.main_class = self.scalar("java.mainClass");
        patch.applet_class = self.scalar("mc.appletClass");
        patch.asset_group = self.scalar("mc.assets");
        patch.arguments.add = self.scalar("mc.arguments");
        if let Some(tweakers) = self.resources.get("mc.tweakers").and_then(Resource::as_list) {
            patch.tweakers.add = tweakers.to_vec();
        }

        patch
    }
}

/// Parse a Wonko document straight into a patch.
pub fn load_wonko_patch(raw: &str, source_name: &str) -> Result<ConfigurationPatch, ProfileError> {
    let doc: Value = serde_json::from_str(raw).map_err(|e| ProfileError::parse(source_name, e))?;
    let version = WonkoVersion::from_json(&doc, source_name, None)?;
    log::debug!("Read Wonko version {} {} from {}", version.uid, version.version, source_name);
    Ok(version.to_patch(source_name))
}
