use crate::game::config::is_builtin_component;
use crate::game::library::{Library, LibraryDocument};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Libraries a Mojang-style patch ships that the LWJGL component provides instead.
pub const LWJGL_ARTIFACTS: [&str; 6] = [
    "net.java.jinput:jinput",
    "net.java.jinput:jinput-platform",
    "net.java.jutils:jutils",
    "org.lwjgl.lwjgl:lwjgl",
    "org.lwjgl.lwjgl:lwjgl_util",
    "org.lwjgl.lwjgl:lwjgl-platform",
];

/// Changes a patch makes to the launch argument string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArgumentsDelta {
    pub overwrite: Option<String>,
    pub add: Option<String>,
    pub remove: Option<String>,
}

/// Changes a patch makes to the tweaker class list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweakersDelta {
    pub should_overwrite: bool,
    pub overwrite: Vec<String>,
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

/// A file merged into the game jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JarMod {
    /// File name inside the instance's jar mod folder
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

/// One patch document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPatch {
    /// Component uid (`fileId`/`uid`)
    pub id: String,
    pub display_name: String,
    pub version_label: String,
    pub patch_type: String,
    pub order: i32,
    pub release_time: Option<DateTime<Utc>>,
    /// uid -> required version (may be empty)
    pub dependencies: BTreeMap<String, String>,

    pub main_class: Option<String>,
    pub applet_class: Option<String>,
    pub arguments: ArgumentsDelta,
    pub tweakers: TweakersDelta,
    pub traits_added: BTreeSet<String>,
    pub asset_group: Option<String>,
    pub jar_mods: Vec<JarMod>,
    pub libraries: LibraryDocument,
    /// Native libraries kept apart from `libraries`, so a full natives list
    /// only replaces earlier natives.
    pub natives: LibraryDocument,

    /// File the patch was read from, for error reporting
    #[serde(skip)]
    pub source_file: Option<String>,
}

impl ConfigurationPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn is_builtin(&self) -> bool {
        is_builtin_component(&self.id)
    }

    pub fn has_jar_mods(&self) -> bool {
        !self.jar_mods.is_empty()
    }

    /// Name used when reporting problems with this patch.
    pub fn describe(&self) -> String {
        match &self.source_file {
            Some(file) => format!("{} ({})", self.id, file),
            None => self.id.clone(),
        }
    }

    /// Drop the LWJGL/JInput libraries from both library lists.
    pub fn strip_lwjgl(&mut self) {
        let is_lwjgl = |lib: &Library| LWJGL_ARTIFACTS.contains(&lib.name.artifact_prefix().as_str());

        let mut removed = 0;
        for doc in [&mut self.libraries, &mut self.natives] {
            let before = doc.overwrite_set.len() + doc.add_set.len();
            doc.overwrite_set.retain(|lib| !is_lwjgl(lib));
            doc.add_set.retain(|lib| !is_lwjgl(lib));
            removed += before - (doc.overwrite_set.len() + doc.add_set.len());
        }

        if removed > 0 {
            log::debug!("Removed {} LWJGL libraries from {}", removed, self.id);
        }
    }
}
