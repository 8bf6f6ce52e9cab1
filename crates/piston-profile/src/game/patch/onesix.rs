//! OneSix patch documents (`patches/<uid>.json`, `version.json`).
//!
//! Reading goes through serde into raw structs first and is then checked and
//! normalised into a [`ConfigurationPatch`]. Writing produces the same layout.

use crate::error::ProfileError;
use crate::game::config::{
    CURRENT_MINIMUM_LAUNCHER_VERSION, LEGACY_VERSION_JAR_URL, LIBRARY_BASE_URL,
};
use crate::game::library::rules::parse_rules;
use crate::game::library::{DependStrength, InsertMode, Library, LibraryDocument, VersionSpecifier};
use crate::game::patch::types::{ConfigurationPatch, JarMod};
use crate::utils::platform::OsType;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Artifact the `id` shorthand expands to.
const MINECRAFT_ARTIFACT: &str = "net.minecraft:minecraft";

/// Base URLs that are the default anyway and are not written back.
const DEFAULT_BASE_URLS: [&str; 3] = [
    "http://s3.amazonaws.com/Minecraft.Download/libraries/",
    "https://s3.amazonaws.com/Minecraft.Download/libraries/",
    LIBRARY_BASE_URL,
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPatch {
    order: Option<i32>,
    name: Option<String>,
    file_id: Option<String>,
    uid: Option<String>,
    version: Option<String>,
    mc_version: Option<String>,
    requires: Option<Vec<RawRequire>>,
    main_class: Option<String>,
    applet_class: Option<String>,
    minecraft_arguments: Option<String>,
    process_arguments: Option<String>,
    #[serde(rename = "+minecraftArguments")]
    add_minecraft_arguments: Option<String>,
    #[serde(rename = "-minecraftArguments")]
    remove_minecraft_arguments: Option<String>,
    #[serde(rename = "type")]
    patch_type: Option<String>,
    release_time: Option<String>,
    assets: Option<String>,
    minimum_launcher_version: Option<i64>,
    tweakers: Option<Vec<String>>,
    #[serde(rename = "+tweakers")]
    add_tweakers: Option<Vec<String>>,
    #[serde(rename = "-tweakers")]
    remove_tweakers: Option<Vec<String>>,
    #[serde(rename = "+traits")]
    add_traits: Option<Vec<String>>,
    libraries: Option<Vec<RawLibrary>>,
    id: Option<String>,
    #[serde(rename = "+jarMods")]
    add_jar_mods: Option<Vec<RawJarMod>>,
    #[serde(rename = "+libraries")]
    add_libraries: Option<Vec<RawLibrary>>,
    #[serde(rename = "-libraries")]
    remove_libraries: Option<Vec<RawRemoval>>,
}

#[derive(Debug, Deserialize)]
struct RawRequire {
    uid: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawJarMod {
    name: Option<String>,
    #[serde(rename = "originalName")]
    original_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRemoval {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawExtract {
    #[serde(default)]
    exclude: Vec<String>,
}

/// Library entry. The URL-ish fields stay loose: a non-string value is skipped
/// with a warning instead of failing the document.
#[derive(Debug, Deserialize)]
struct RawLibrary {
    name: Option<String>,
    url: Option<Value>,
    #[serde(rename = "MMC-hint")]
    hint: Option<Value>,
    #[serde(rename = "MMC-absulute_url")]
    absolute_url_misspelled: Option<Value>,
    #[serde(rename = "MMC-absoluteUrl")]
    absolute_url_mmc: Option<Value>,
    #[serde(rename = "absoluteUrl")]
    absolute_url: Option<Value>,
    extract: Option<RawExtract>,
    natives: Option<Map<String, Value>>,
    rules: Option<Value>,
    insert: Option<Value>,
    #[serde(rename = "MMC-depend")]
    depend: Option<String>,
}

/// Argument string for the old `processArguments` presets.
fn process_arguments_preset(preset: &str) -> Option<&'static str> {
    match preset.to_lowercase().as_str() {
        "legacy" => Some(" ${auth_player_name} ${auth_session}"),
        "username_session" => Some("--username ${auth_player_name} --session ${auth_session}"),
        "username_session_version" => Some(
            "--username ${auth_player_name} --session ${auth_session} --version ${profile_name}",
        ),
        _ => None,
    }
}

/// Parse a OneSix patch from its JSON text.
///
/// `require_order` is set for patches that take part in ordering; a missing
/// `order` is then logged and the patch gets order 0.
pub fn load_patch(
    raw: &str,
    filename: &str,
    require_order: bool,
) -> Result<ConfigurationPatch, ProfileError> {
    let doc: Value = serde_json::from_str(raw).map_err(|e| ProfileError::parse(filename, e))?;
    patch_from_value(doc, filename, require_order)
}

pub fn patch_from_value(
    doc: Value,
    filename: &str,
    require_order: bool,
) -> Result<ConfigurationPatch, ProfileError> {
    match &doc {
        Value::Null => return Err(ProfileError::parse(filename, "document is empty or null")),
        Value::Object(map) if map.is_empty() => {
            return Err(ProfileError::parse(filename, "document is empty or null"))
        }
        Value::Object(_) => {}
        _ => return Err(ProfileError::parse(filename, "document is not an object")),
    }

    let raw: RawPatch = serde_json::from_value(doc).map_err(|e| ProfileError::parse(filename, e))?;

    if let Some(found) = raw.minimum_launcher_version {
        if found > CURRENT_MINIMUM_LAUNCHER_VERSION {
            return Err(ProfileError::FormatVersion {
                source_name: filename.to_string(),
                format: "OneSix minimumLauncherVersion",
                found,
                supported: CURRENT_MINIMUM_LAUNCHER_VERSION,
            });
        }
    }

    let mut patch = ConfigurationPatch::new(raw.file_id.or(raw.uid).unwrap_or_default());
    patch.source_file = Some(filename.to_string());
    patch.display_name = raw.name.unwrap_or_default();
    patch.version_label = raw.version.unwrap_or_default();
    patch.patch_type = raw.patch_type.unwrap_or_default();

    if require_order {
        match raw.order {
            Some(order) => patch.order = order,
            None => log::error!("{} doesn't contain an order field", filename),
        }
    }

    for require in raw.requires.unwrap_or_default() {
        patch
            .dependencies
            .insert(require.uid, require.version.unwrap_or_default());
    }
    if let Some(mc_version) = raw.mc_version.filter(|v| !v.is_empty()) {
        patch
            .dependencies
            .insert("net.minecraft".to_string(), mc_version);
    }

    patch.release_time = raw
        .release_time
        .as_deref()
        .filter(|t| !t.is_empty())
        .and_then(|t| match DateTime::parse_from_rfc3339(t) {
            Ok(time) => Some(time.with_timezone(&Utc)),
            Err(e) => {
                log::warn!("Ignoring invalid releaseTime '{}' in {}: {}", t, filename, e);
                None
            }
        });

    patch.main_class = raw.main_class;
    patch.applet_class = raw.applet_class;
    patch.asset_group = raw.assets;

    let overwrite_arguments = raw
        .minecraft_arguments
        .filter(|args| !args.is_empty())
        .or_else(|| {
            raw.process_arguments
                .as_deref()
                .and_then(process_arguments_preset)
                .map(str::to_string)
        });
    patch.arguments.overwrite = overwrite_arguments;
    patch.arguments.add = raw.add_minecraft_arguments;
    patch.arguments.remove = raw.remove_minecraft_arguments;

    if let Some(tweakers) = raw.tweakers {
        patch.tweakers.should_overwrite = true;
        patch.tweakers.overwrite = tweakers;
    }
    patch.tweakers.add = raw.add_tweakers.unwrap_or_default();
    patch.tweakers.remove = raw.remove_tweakers.unwrap_or_default();
    patch.traits_added = raw.add_traits.unwrap_or_default().into_iter().collect();

    let mut libraries = LibraryDocument::default();
    if let Some(list) = raw.libraries {
        libraries.should_overwrite = true;
        for entry in list {
            libraries.overwrite_set.push(read_library(entry, filename)?);
        }
    }

    if let Some(mc_version) = raw.id.filter(|id| !id.is_empty()) {
        libraries.add_set.push(minecraft_library(&mc_version)?);
    }

    for entry in raw.add_jar_mods.unwrap_or_default() {
        let name = entry.name.ok_or_else(|| ProfileError::MissingField {
            source_name: filename.to_string(),
            what: "jar mod",
            field: "name",
        })?;
        patch.jar_mods.push(JarMod {
            name,
            original_name: entry.original_name,
        });
    }

    for entry in raw.add_libraries.unwrap_or_default() {
        libraries.add_set.push(read_library_plus(entry, filename)?);
    }

    for entry in raw.remove_libraries.unwrap_or_default() {
        libraries.remove(VersionSpecifier::parse(&entry.name)?);
    }

    patch.libraries = libraries;
    Ok(patch)
}

/// The game jar itself, as described by the `id` shorthand.
fn minecraft_library(mc_version: &str) -> Result<Library, ProfileError> {
    let name = VersionSpecifier::parse(&format!("{}:{}", MINECRAFT_ARTIFACT, mc_version))?;
    let mut lib = Library::new(name);
    lib.absolute_url = Some(format!(
        "{}/{}/{}.jar",
        LEGACY_VERSION_JAR_URL, mc_version, mc_version
    ));
    Ok(lib)
}

fn loose_string(value: Option<Value>, key: &str, filename: &str) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        _ => {
            log::warn!("{} is not a string in {} (skipping)", key, filename);
            None
        }
    }
}

fn read_library(raw: RawLibrary, filename: &str) -> Result<Library, ProfileError> {
    let Some(name) = raw.name else {
        return Err(ProfileError::MissingField {
            source_name: filename.to_string(),
            what: "library",
            field: "name",
        });
    };

    // Only `+libraries` entries carry merge instructions.
    if raw.insert.is_some() || raw.depend.is_some() {
        log::warn!(
            "{}: 'insert' and 'MMC-depend' on library {} only apply in '+libraries' (ignored)",
            filename,
            name
        );
    }

    let mut lib = Library::new(VersionSpecifier::parse(&name)?);
    lib.base_url = loose_string(raw.url, "url", filename);
    lib.hint = loose_string(raw.hint, "MMC-hint", filename);

    // Later spellings win.
    for (key, value) in [
        ("MMC-absulute_url", raw.absolute_url_misspelled),
        ("MMC-absoluteUrl", raw.absolute_url_mmc),
        ("absoluteUrl", raw.absolute_url),
    ] {
        if let Some(url) = loose_string(value, key, filename) {
            lib.absolute_url = Some(url);
        }
    }

    if let Some(extract) = raw.extract {
        lib.apply_excludes = true;
        lib.extract_excludes = extract.exclude;
    }

    if let Some(natives) = raw.natives {
        for (os_name, classifier) in natives {
            let os = OsType::from_name(&os_name);
            match (os, classifier) {
                (OsType::Other, _) => {
                    log::debug!("Ignoring natives for unknown OS '{}' in {}", os_name, filename)
                }
                (os, Value::String(classifier)) => {
                    lib.native_classifiers.insert(os, classifier);
                }
                _ => log::warn!("{} contains an invalid native (skipping)", filename),
            }
        }
    }

    if let Some(rules) = raw.rules {
        lib.apply_rules = true;
        lib.rules = parse_rules(&rules);
    }

    Ok(lib)
}

/// `+libraries` entries additionally carry merge settings.
fn read_library_plus(mut raw: RawLibrary, filename: &str) -> Result<Library, ProfileError> {
    let insert = raw.insert.take();
    let depend = raw.depend.take();
    let mut lib = read_library(raw, filename)?;

    match insert {
        None => {}
        Some(Value::String(mode)) => {
            lib.insert_mode = InsertMode::from_name(&mode).ok_or_else(|| {
                ProfileError::parse(
                    filename,
                    format!("a '+' library contains an invalid insert type '{}'", mode),
                )
            })?;
        }
        Some(Value::Object(compound)) => {
            let Some((kind, target)) = compound.iter().next() else {
                return Err(ProfileError::parse(filename, "empty compound insert rule"));
            };
            if kind != "replace" {
                return Err(ProfileError::parse(
                    filename,
                    "compound insert rule is not 'replace'",
                ));
            }
            lib.insert_mode = InsertMode::Replace;
            lib.insert_target = target.as_str().map(str::to_string);
        }
        Some(_) => {
            return Err(ProfileError::parse(
                filename,
                "a '+' library contains an unknown/invalid insert rule",
            ))
        }
    }

    if let Some(depend) = depend {
        lib.depend_strength = DependStrength::from_name(&depend).ok_or_else(|| {
            ProfileError::parse(
                filename,
                format!("a '+' library contains an invalid depend type '{}'", depend),
            )
        })?;
    }

    Ok(lib)
}

/// Serialize a library entry. Merge settings are written only when they differ
/// from the defaults.
pub fn library_to_json(lib: &Library) -> Value {
    let mut obj = Map::new();
    obj.insert("name".to_string(), json!(lib.name.to_string()));
    if let Some(url) = &lib.absolute_url {
        obj.insert("MMC-absoluteUrl".to_string(), json!(url));
    }
    if let Some(hint) = &lib.hint {
        obj.insert("MMC-hint".to_string(), json!(hint));
    }
    if let Some(base) = lib
        .base_url
        .as_deref()
        .filter(|base| !base.is_empty() && !DEFAULT_BASE_URLS.contains(base))
    {
        obj.insert("url".to_string(), json!(base));
    }
    if lib.is_native() {
        let natives: Map<String, Value> = lib
            .native_classifiers
            .iter()
            .map(|(os, classifier)| (os.as_str().to_string(), json!(classifier)))
            .collect();
        obj.insert("natives".to_string(), Value::Object(natives));
    }
    if lib.apply_excludes {
        obj.insert(
            "extract".to_string(),
            json!({ "exclude": lib.extract_excludes }),
        );
    }
    if lib.apply_rules {
        let rules: Vec<Value> = lib.rules.iter().map(|rule| rule.to_json()).collect();
        obj.insert("rules".to_string(), Value::Array(rules));
    }
    match (&lib.insert_mode, &lib.insert_target) {
        (InsertMode::Replace, Some(target)) => {
            obj.insert("insert".to_string(), json!({ "replace": target }));
        }
        (InsertMode::Prepend, _) => {}
        (mode, _) => {
            obj.insert("insert".to_string(), json!(mode.as_str()));
        }
    }
    if lib.depend_strength != DependStrength::Soft {
        obj.insert(
            "MMC-depend".to_string(),
            json!(lib.depend_strength.as_str()),
        );
    }
    Value::Object(obj)
}

fn write_string(root: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        root.insert(key.to_string(), json!(value));
    }
}

fn write_string_list(root: &mut Map<String, Value>, key: &str, values: &[String]) {
    if !values.is_empty() {
        root.insert(key.to_string(), json!(values));
    }
}

/// Serialize a patch as a OneSix document.
pub fn patch_to_json(patch: &ConfigurationPatch, save_order: bool) -> Value {
    if !patch.natives.is_empty() {
        log::warn!(
            "OneSix has no separate natives list, natives of {} are not written",
            patch.describe()
        );
    }

    let mut root = Map::new();
    if save_order {
        root.insert("order".to_string(), json!(patch.order));
    }
    write_string(&mut root, "name", Some(&patch.display_name));
    write_string(&mut root, "fileId", Some(&patch.id));
    write_string(&mut root, "version", Some(&patch.version_label));
    write_string(
        &mut root,
        "mcVersion",
        patch.dependencies.get("net.minecraft").map(String::as_str),
    );
    let requires: Vec<Value> = patch
        .dependencies
        .iter()
        .filter(|(uid, _)| uid.as_str() != "net.minecraft")
        .map(|(uid, version)| {
            if version.is_empty() {
                json!({ "uid": uid })
            } else {
                json!({ "uid": uid, "version": version })
            }
        })
        .collect();
    if !requires.is_empty() {
        root.insert("requires".to_string(), Value::Array(requires));
    }

    write_string(&mut root, "mainClass", patch.main_class.as_deref());
    write_string(&mut root, "appletClass", patch.applet_class.as_deref());
    write_string(&mut root, "minecraftArguments", patch.arguments.overwrite.as_deref());
    write_string(&mut root, "+minecraftArguments", patch.arguments.add.as_deref());
    write_string(&mut root, "-minecraftArguments", patch.arguments.remove.as_deref());
    write_string(&mut root, "type", Some(&patch.patch_type));
    write_string(&mut root, "assets", patch.asset_group.as_deref());
    if let Some(time) = patch.release_time {
        root.insert(
            "releaseTime".to_string(),
            json!(time.to_rfc3339_opts(SecondsFormat::Secs, false)),
        );
    }
    root.insert(
        "minimumLauncherVersion".to_string(),
        json!(CURRENT_MINIMUM_LAUNCHER_VERSION),
    );

    if patch.tweakers.should_overwrite {
        root.insert("tweakers".to_string(), json!(patch.tweakers.overwrite));
    }
    write_string_list(&mut root, "+tweakers", &patch.tweakers.add);
    write_string_list(&mut root, "-tweakers", &patch.tweakers.remove);
    let traits: Vec<String> = patch.traits_added.iter().cloned().collect();
    write_string_list(&mut root, "+traits", &traits);

    let libraries = &patch.libraries;
    if libraries.should_overwrite {
        let list: Vec<Value> = libraries.overwrite_set.iter().map(library_to_json).collect();
        root.insert("libraries".to_string(), Value::Array(list));
    }

    let mut add = Vec::new();
    for lib in &libraries.add_set {
        // The game jar goes back to the old shorthand.
        if lib.name.artifact_prefix() == MINECRAFT_ARTIFACT {
            write_string(&mut root, "id", Some(lib.version()));
            continue;
        }
        add.push(library_to_json(lib));
    }
    if !add.is_empty() {
        root.insert("+libraries".to_string(), Value::Array(add));
    }

    if !libraries.remove_set.is_empty() {
        let removals: Vec<Value> = libraries
            .remove_set
            .values()
            .map(|name| json!({ "name": name.to_string() }))
            .collect();
        root.insert("-libraries".to_string(), Value::Array(removals));
    }

    if patch.has_jar_mods() {
        let mods: Vec<Value> = patch
            .jar_mods
            .iter()
            .map(|m| match &m.original_name {
                Some(original) => json!({ "name": m.name, "originalName": original }),
                None => json!({ "name": m.name }),
            })
            .collect();
        root.insert("+jarMods".to_string(), Value::Array(mods));
    }

    Value::Object(root)
}

/// A new patch that adds a single jar mod.
///
/// Returns the patch together with the file name the jar has to be stored under
/// in the instance's jar mod folder.
pub fn create_jar_mod_patch(source: &Path) -> (ConfigurationPatch, String) {
    let id = uuid::Uuid::new_v4().to_string();
    let target_filename = format!("{}.jar", id);
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| target_filename.clone());

    let mut patch = ConfigurationPatch::new(format!("piston.jarmod.{}", id));
    patch.display_name = format!("{} (jar mod)", stem);
    patch.jar_mods.push(JarMod {
        name: target_filename.clone(),
        original_name: source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned()),
    });

    log::info!("Created jar mod patch {} for {}", patch.id, source.display());
    (patch, target_filename)
}
