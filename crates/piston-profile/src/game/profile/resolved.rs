/// The configuration produced by folding every patch
use crate::error::{LookupWarning, VersionConflict};
use crate::game::config::LEGACY_ASSET_GROUP;
use crate::game::library::document::collect_active;
use crate::game::library::{Library, LibraryDocument};
use crate::game::patch::{ConfigurationPatch, JarMod};
use crate::utils::platform::OsType;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Suffix of the April fools' asset groups.
const APRIL_FOOLS_SUFFIX: &str = "_af";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProfile {
    platform: OsType,
    main_class: String,
    applet_class: String,
    minecraft_arguments: String,
    tweakers: Vec<String>,
    traits: BTreeSet<String>,
    asset_group: String,
    jar_mods: Vec<JarMod>,
    libraries: LibraryDocument,
    natives: LibraryDocument,
    /// Ids of the applied patches, in application order
    patches: Vec<String>,
}

impl ResolvedProfile {
    pub fn new(platform: OsType) -> Self {
        Self {
            platform,
            main_class: String::new(),
            applet_class: String::new(),
            minecraft_arguments: String::new(),
            tweakers: Vec::new(),
            traits: BTreeSet::new(),
            asset_group: String::new(),
            jar_mods: Vec::new(),
            libraries: LibraryDocument::default(),
            natives: LibraryDocument::default(),
            patches: Vec::new(),
        }
    }

    /// Fold one patch into the profile.
    pub(crate) fn apply_patch(
        &mut self,
        patch: &ConfigurationPatch,
        warnings: &mut Vec<LookupWarning>,
    ) -> Result<(), VersionConflict> {
        set_if_present(&mut self.main_class, &patch.main_class);
        set_if_present(&mut self.applet_class, &patch.applet_class);
        set_if_present(&mut self.asset_group, &patch.asset_group);

        let arguments = &patch.arguments;
        if let Some(overwrite) = &arguments.overwrite {
            self.minecraft_arguments = overwrite.clone();
        }
        if let Some(add) = &arguments.add {
            self.minecraft_arguments.push_str(add);
        }
        if let Some(remove) = arguments.remove.as_deref().filter(|r| !r.is_empty()) {
            self.minecraft_arguments = self.minecraft_arguments.replace(remove, "");
        }

        let tweakers = &patch.tweakers;
        if tweakers.should_overwrite {
            self.tweakers = tweakers.overwrite.clone();
        }
        self.tweakers.extend(tweakers.add.iter().cloned());
        for removed in &tweakers.remove {
            self.tweakers.retain(|t| t != removed);
        }

        self.traits.extend(patch.traits_added.iter().cloned());
        self.jar_mods.extend(patch.jar_mods.iter().cloned());

        self.libraries.apply(&patch.libraries, warnings)?;
        self.natives.apply(&patch.natives, warnings)?;
        self.patches.push(patch.id.clone());
        Ok(())
    }

    /// Normalise the asset group once every patch is applied.
    pub fn finalize(&mut self, today: NaiveDate) {
        self.asset_group = finalize_asset_group(&self.asset_group, today);
    }

    pub fn platform(&self) -> OsType {
        self.platform
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    pub fn applet_class(&self) -> &str {
        &self.applet_class
    }

    /// The finalized `minecraftArguments` string.
    pub fn minecraft_arguments(&self) -> &str {
        &self.minecraft_arguments
    }

    /// Argument string split into tokens, honouring shell quoting.
    pub fn argument_tokens(&self) -> Vec<String> {
        shlex::split(&self.minecraft_arguments).unwrap_or_else(|| {
            log::warn!("Launch arguments have unbalanced quotes, splitting on whitespace");
            self.minecraft_arguments
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
    }

    pub fn tweakers(&self) -> &[String] {
        &self.tweakers
    }

    pub fn traits(&self) -> &BTreeSet<String> {
        &self.traits
    }

    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.contains(name)
    }

    pub fn asset_group(&self) -> &str {
        &self.asset_group
    }

    pub fn jar_mods(&self) -> &[JarMod] {
        &self.jar_mods
    }

    pub fn libraries(&self) -> &LibraryDocument {
        &self.libraries
    }

    /// Natives contributed through dedicated natives lists.
    pub fn natives(&self) -> &LibraryDocument {
        &self.natives
    }

    pub fn applied_patches(&self) -> &[String] {
        &self.patches
    }

    pub fn active_libraries(&self) -> Vec<Library> {
        self.collect_active_libraries(&mut Vec::new())
    }

    pub fn active_normal_libraries(&self) -> Vec<Library> {
        self.active_libraries()
            .into_iter()
            .filter(|lib| !lib.is_native())
            .collect()
    }

    pub fn active_native_libraries(&self) -> Vec<Library> {
        self.active_libraries()
            .into_iter()
            .filter(Library::is_native)
            .collect()
    }

    /// Active libraries followed by active natives, reporting duplicates.
    pub(crate) fn collect_active_libraries(&self, warnings: &mut Vec<LookupWarning>) -> Vec<Library> {
        let libs = self
            .libraries
            .overwrite_set
            .iter()
            .chain(&self.natives.overwrite_set);
        collect_active(libs, self.platform, warnings)
    }
}

fn set_if_present(field: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        *field = value.to_string();
    }
}

/// Empty groups become `legacy`; `_af` groups only survive on April 1st.
pub fn finalize_asset_group(group: &str, today: NaiveDate) -> String {
    let april_first = today.month() == 4 && today.day() == 1;
    let group = match group.strip_suffix(APRIL_FOOLS_SUFFIX) {
        Some(base) if !april_first => base,
        _ => group,
    };

    if group.is_empty() {
        LEGACY_ASSET_GROUP.to_string()
    } else {
        group.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::patch::{ArgumentsDelta, TweakersDelta};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_asset_group_finalize() {
        assert_eq!(finalize_asset_group("", date(2015, 6, 1)), "legacy");
        assert_eq!(finalize_asset_group("foo_af", date(2015, 6, 1)), "foo");
        assert_eq!(finalize_asset_group("foo_af", date(2015, 4, 1)), "foo_af");
        assert_eq!(finalize_asset_group("1.8", date(2015, 4, 1)), "1.8");
        assert_eq!(finalize_asset_group("_af", date(2015, 6, 1)), "legacy");
        assert_eq!(finalize_asset_group("_af", date(2015, 4, 1)), "_af");
    }

    #[test]
    fn test_scalar_argument_and_tweaker_folding() {
        let mut profile = ResolvedProfile::new(OsType::Linux);
        let mut warnings = Vec::new();

        let mut base = ConfigurationPatch::new("net.minecraft");
        base.main_class = Some("net.minecraft.client.Minecraft".to_string());
        base.arguments = ArgumentsDelta {
            overwrite: Some("--username ${auth_player_name} --demo".to_string()),
            ..Default::default()
        };
        base.tweakers = TweakersDelta {
            should_overwrite: true,
            overwrite: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };

        let mut modded = ConfigurationPatch::new("com.example");
        modded.main_class = Some(String::new());
        modded.arguments = ArgumentsDelta {
            add: Some(" --tweakClass x.Y".to_string()),
            remove: Some(" --demo".to_string()),
            ..Default::default()
        };
        modded.tweakers = TweakersDelta {
            add: vec!["a".to_string()],
            remove: vec!["b".to_string()],
            ..Default::default()
        };
        modded.traits_added.insert("legacyFML".to_string());

        profile.apply_patch(&base, &mut warnings).unwrap();
        profile.apply_patch(&modded, &mut warnings).unwrap();

        assert_eq!(profile.main_class(), "net.minecraft.client.Minecraft");
        assert_eq!(
            profile.minecraft_arguments(),
            "--username ${auth_player_name} --tweakClass x.Y"
        );
        assert_eq!(profile.tweakers(), &["a".to_string(), "a".to_string()]);
        assert!(profile.has_trait("legacyFML"));
        assert_eq!(profile.applied_patches(), &["net.minecraft", "com.example"]);
    }

    #[test]
    fn test_argument_tokens() {
        let mut profile = ResolvedProfile::new(OsType::Linux);
        profile.minecraft_arguments = "--username ${auth_player_name} --title \"My Pack\"".to_string();
        assert_eq!(
            profile.argument_tokens(),
            vec!["--username", "${auth_player_name}", "--title", "My Pack"]
        );

        profile.minecraft_arguments = "--broken \"quote".to_string();
        assert_eq!(profile.argument_tokens(), vec!["--broken", "\"quote"]);
    }
}
