//! Turning a set of patch documents into the ordered list the resolver folds.
//!
//! Builtin components always come first, in a fixed order. User patches follow,
//! first those listed in the instance's order file, then the rest by their
//! declared `order`.

use crate::error::ProfileError;
use crate::game::config::{is_builtin_component, BUILTIN_COMPONENTS, ORDER_FILE_VERSION};
use crate::game::patch::ConfigurationPatch;
use crate::game::profile::registry::PackageRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Version label given to local builtin overrides that don't declare one.
pub const CUSTOM_VERSION_LABEL: &str = "Custom";

/// Contents of `order.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFile {
    pub version: u32,
    pub order: Vec<String>,
}

impl OrderFile {
    pub fn new(order: Vec<String>) -> Self {
        Self {
            version: ORDER_FILE_VERSION,
            order,
        }
    }

    /// Parse an order file. Unreadable or unknown-version files are ignored
    /// and yield an empty order.
    pub fn parse(raw: &str) -> Vec<String> {
        match serde_json::from_str::<OrderFile>(raw) {
            Ok(file) if file.version == ORDER_FILE_VERSION => file.order,
            Ok(file) => {
                log::warn!("Ignoring order file with unsupported version {}", file.version);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable order file: {}", e);
                Vec::new()
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Pick the patch for one builtin component.
///
/// A local override document wins and gets the builtin's id and name forced on
/// it. Otherwise the requested version is taken from the registry; a requested
/// version that isn't available is an error. No override and no request means
/// the component isn't part of the profile.
pub fn builtin_patch(
    uid: &str,
    name: &str,
    local_override: Option<ConfigurationPatch>,
    requested_version: Option<&str>,
    registry: &PackageRegistry,
) -> Result<Option<ConfigurationPatch>, ProfileError> {
    if let Some(mut patch) = local_override {
        patch.id = uid.to_string();
        patch.display_name = name.to_string();
        if patch.version_label.is_empty() {
            patch.version_label = CUSTOM_VERSION_LABEL.to_string();
        }
        log::debug!("Using local override for {}", uid);
        return Ok(Some(patch));
    }

    let Some(version) = requested_version.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let mut patch = registry
        .patch_for(uid, version)
        .cloned()
        .ok_or_else(|| ProfileError::VersionIncomplete {
            uid: uid.to_string(),
            version: version.to_string(),
        })?;

    // Mojang documents still list LWJGL themselves; the LWJGL component owns it.
    if uid == "net.minecraft" {
        patch.strip_lwjgl();
    }
    Ok(Some(patch))
}

/// User patches ordered for resolution.
///
/// `patches` maps the file id (file name without `.json`) to its parsed document.
pub fn arrange_user_patches(
    order: &[String],
    mut patches: BTreeMap<String, ConfigurationPatch>,
) -> Result<Vec<ConfigurationPatch>, ProfileError> {
    let mut result = Vec::new();
    let mut listed = HashSet::new();

    for id in order {
        if is_builtin_component(id) {
            continue;
        }
        let Some(patch) = patches.remove(id) else {
            log::debug!("Patch {} from the order file no longer exists", id);
            continue;
        };
        if &patch.id != id {
            return Err(ProfileError::IdMismatch {
                expected: id.clone(),
                found: patch.id,
            });
        }
        listed.insert(id.clone());
        result.push(patch);
    }

    let mut by_order: BTreeMap<i32, ConfigurationPatch> = BTreeMap::new();
    for (_, patch) in patches {
        if is_builtin_component(&patch.id) || listed.contains(&patch.id) {
            continue;
        }
        if let Some(first) = by_order.get(&patch.order) {
            return Err(ProfileError::DuplicateOrder {
                order: patch.order,
                first: first.id.clone(),
                second: patch.id,
            });
        }
        by_order.insert(patch.order, patch);
    }

    result.extend(by_order.into_values());
    Ok(result)
}

/// Full patch list: builtins, then user patches.
///
/// `overrides` holds local documents for builtin uids, `requested` the builtin
/// versions the instance asks for.
pub fn arrange_patches(
    overrides: &mut BTreeMap<String, ConfigurationPatch>,
    requested: &BTreeMap<String, String>,
    registry: &PackageRegistry,
    order: &[String],
    user_patches: BTreeMap<String, ConfigurationPatch>,
) -> Result<Vec<ConfigurationPatch>, ProfileError> {
    let mut result = Vec::new();
    for (uid, name) in BUILTIN_COMPONENTS {
        let local = overrides.remove(uid);
        let version = requested.get(uid).map(String::as_str);
        if let Some(patch) = builtin_patch(uid, name, local, version, registry)? {
            result.push(patch);
        }
    }

    result.extend(arrange_user_patches(order, user_patches)?);
    let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();
    log::debug!("Patch order: {}", ids.join(", "));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(id: &str, order: i32) -> ConfigurationPatch {
        let mut p = ConfigurationPatch::new(id);
        p.order = order;
        p
    }

    fn user(patches: Vec<ConfigurationPatch>) -> BTreeMap<String, ConfigurationPatch> {
        patches.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn ids(patches: &[ConfigurationPatch]) -> Vec<&str> {
        patches.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_order_file_parsing() {
        assert_eq!(
            OrderFile::parse(r#"{"version":1,"order":["b","a"]}"#),
            vec!["b", "a"]
        );
        assert!(OrderFile::parse(r#"{"version":2,"order":["b"]}"#).is_empty());
        assert!(OrderFile::parse("not json").is_empty());

        let written = OrderFile::new(vec!["x".to_string()]).to_json().unwrap();
        assert_eq!(OrderFile::parse(&written), vec!["x"]);
    }

    #[test]
    fn test_listed_patches_first_then_by_order() {
        let arranged = arrange_user_patches(
            &["zeta".to_string(), "gone".to_string(), "net.minecraft".to_string()],
            user(vec![patch("alpha", 20), patch("beta", 10), patch("zeta", 99)]),
        )
        .unwrap();
        assert_eq!(ids(&arranged), vec!["zeta", "beta", "alpha"]);
    }

    #[test]
    fn test_duplicate_order_names_both() {
        let err = arrange_user_patches(&[], user(vec![patch("a", 5), patch("b", 5)])).unwrap_err();
        match err {
            ProfileError::DuplicateOrder { order, first, second } => {
                assert_eq!(order, 5);
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_listed_id_must_match_document() {
        let mut patches = BTreeMap::new();
        patches.insert("renamed".to_string(), patch("original", 1));
        assert!(matches!(
            arrange_user_patches(&["renamed".to_string()], patches),
            Err(ProfileError::IdMismatch { .. })
        ));
    }

    #[test]
    fn test_builtins() {
        let mut registry = PackageRegistry::new();
        let mut mc = patch("net.minecraft", 0);
        mc.version_label = "1.7.10".to_string();
        registry.attach_patch(mc);

        let mut overrides = BTreeMap::new();
        overrides.insert("org.lwjgl".to_string(), patch("whatever", 0));
        let mut requested = BTreeMap::new();
        requested.insert("net.minecraft".to_string(), "1.7.10".to_string());

        let arranged = arrange_patches(
            &mut overrides,
            &requested,
            &registry,
            &[],
            user(vec![patch("com.example", 1)]),
        )
        .unwrap();
        assert_eq!(ids(&arranged), vec!["net.minecraft", "org.lwjgl", "com.example"]);
        assert_eq!(arranged[1].display_name, "LWJGL");
        assert_eq!(arranged[1].version_label, CUSTOM_VERSION_LABEL);

        requested.insert("net.minecraftforge".to_string(), "10.13".to_string());
        assert!(matches!(
            arrange_patches(&mut BTreeMap::new(), &requested, &registry, &[], BTreeMap::new()),
            Err(ProfileError::VersionIncomplete { .. })
        ));
    }
}
