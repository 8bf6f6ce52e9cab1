//! The overwrite/add/remove library triad carried by every patch, and the merge
//! that folds one patch's triad into the accumulated library list.

use crate::error::{LookupWarning, VersionConflict};
use crate::game::library::entry::{DependStrength, InsertMode, Library};
use crate::game::library::specifier::VersionSpecifier;
use crate::utils::platform::OsType;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDocument {
    /// Set when the patch supplies a full `libraries` list.
    pub should_overwrite: bool,
    pub overwrite_set: Vec<Library>,
    pub add_set: Vec<Library>,
    /// Libraries to remove, by same-library key, with the coordinate as written.
    pub remove_set: BTreeMap<String, VersionSpecifier>,
}

impl LibraryDocument {
    pub fn is_empty(&self) -> bool {
        !self.should_overwrite && self.add_set.is_empty() && self.remove_set.is_empty()
    }

    pub fn clear(&mut self) {
        *self = LibraryDocument::default();
    }

    /// Mark every version of `name`'s library for removal.
    pub fn remove(&mut self, name: VersionSpecifier) {
        self.remove_set.insert(name.key(), name);
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.overwrite_set.iter().position(|lib| lib.key() == key)
    }

    /// Merge `incoming` into this (accumulated) document.
    ///
    /// Non-fatal lookup problems are pushed onto `warnings`. A hard/soft version
    /// conflict aborts the merge; the document is left partially merged and must
    /// be discarded by the caller.
    pub fn apply(
        &mut self,
        incoming: &LibraryDocument,
        warnings: &mut Vec<LookupWarning>,
    ) -> Result<(), VersionConflict> {
        if incoming.should_overwrite {
            self.overwrite_set = dedupe_overwrite_set(&incoming.overwrite_set, warnings);
        }

        for lib in &incoming.add_set {
            match lib.insert_mode {
                InsertMode::Apply => match self.position(&lib.key()) {
                    Some(index) => {
                        let merged = lib.apply_to(&self.overwrite_set[index]);
                        self.overwrite_set[index] = merged;
                    }
                    None => warn(
                        warnings,
                        LookupWarning::LibraryNotFound {
                            library: lib.name.to_string(),
                        },
                    ),
                },
                InsertMode::Append | InsertMode::Prepend => match self.position(&lib.key()) {
                    Some(index) => {
                        if let Some(replacement) = reconcile(&self.overwrite_set[index], lib)? {
                            self.overwrite_set[index] = replacement;
                        }
                    }
                    None if lib.insert_mode == InsertMode::Append => {
                        self.overwrite_set.push(lib.clone())
                    }
                    None => self.overwrite_set.insert(0, lib.clone()),
                },
                InsertMode::Replace => {
                    let target = match &lib.insert_target {
                        Some(target) => target_key(target),
                        None => lib.key(),
                    };
                    match self.position(&target) {
                        Some(index) => self.overwrite_set[index] = lib.clone(),
                        None => warn(warnings, LookupWarning::ReplaceTargetNotFound { target }),
                    }
                }
            }
        }

        for key in incoming.remove_set.keys() {
            match self.position(key) {
                Some(index) => {
                    self.overwrite_set.remove(index);
                }
                None => warn(
                    warnings,
                    LookupWarning::RemoveTargetNotFound {
                        library: key.clone(),
                    },
                ),
            }
        }

        Ok(())
    }

    /// Libraries whose rules allow them on `platform`, first occurrence per key.
    pub fn active_libraries(
        &self,
        platform: OsType,
        warnings: &mut Vec<LookupWarning>,
    ) -> Vec<Library> {
        collect_active(&self.overwrite_set, platform, warnings)
    }

    /// Active libraries that go on the classpath.
    pub fn active_normal_libraries(
        &self,
        platform: OsType,
        warnings: &mut Vec<LookupWarning>,
    ) -> Vec<Library> {
        self.active_libraries(platform, warnings)
            .into_iter()
            .filter(|lib| !lib.is_native())
            .collect()
    }

    /// Active libraries that get extracted into the natives directory.
    pub fn active_native_libraries(
        &self,
        platform: OsType,
        warnings: &mut Vec<LookupWarning>,
    ) -> Vec<Library> {
        self.active_libraries(platform, warnings)
            .into_iter()
            .filter(Library::is_native)
            .collect()
    }
}

/// Libraries from `libs` whose rules allow them on `platform`, first occurrence per key.
pub(crate) fn collect_active<'a>(
    libs: impl IntoIterator<Item = &'a Library>,
    platform: OsType,
    warnings: &mut Vec<LookupWarning>,
) -> Vec<Library> {
    let mut seen = HashSet::new();
    let mut active = Vec::new();
    for lib in libs {
        if !lib.is_active(platform) {
            continue;
        }
        if !seen.insert(lib.key()) {
            warn(
                warnings,
                LookupWarning::DuplicateActiveLibrary {
                    library: lib.name.to_string(),
                },
            );
            continue;
        }
        active.push(lib.clone());
    }
    active
}

fn warn(warnings: &mut Vec<LookupWarning>, warning: LookupWarning) {
    log::warn!("{}", warning);
    warnings.push(warning);
}

fn target_key(target: &str) -> String {
    VersionSpecifier::parse(target)
        .map(|spec| spec.key())
        .unwrap_or_else(|_| target.to_string())
}

fn dedupe_overwrite_set(libs: &[Library], warnings: &mut Vec<LookupWarning>) -> Vec<Library> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(libs.len());
    for lib in libs {
        if seen.insert(lib.key()) {
            result.push(lib.clone());
        } else {
            warn(
                warnings,
                LookupWarning::DuplicateLibrary {
                    library: lib.name.to_string(),
                },
            );
        }
    }
    result
}

/// Decide what happens when an appended/prepended library is already present.
/// `Some` is the entry that takes the existing slot, `None` keeps the existing entry.
fn reconcile(existing: &Library, incoming: &Library) -> Result<Option<Library>, VersionConflict> {
    let ordering = incoming.name.compare_version(&existing.name);
    let conflict = || VersionConflict {
        existing: existing.name.clone(),
        incoming: incoming.name.clone(),
    };

    match existing.depend_strength {
        DependStrength::Hard => {
            if ordering == Ordering::Greater {
                return Err(conflict());
            }
            if incoming.depend_strength == DependStrength::Hard && ordering != Ordering::Equal {
                return Err(conflict());
            }
            Ok(None)
        }
        DependStrength::Soft => match ordering {
            Ordering::Greater => Ok(Some(incoming.clone())),
            Ordering::Less if incoming.depend_strength == DependStrength::Hard => Err(conflict()),
            _ => Ok(None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::library::rules::{Rule, RuleAction};

    fn lib(name: &str, mode: InsertMode, strength: DependStrength) -> Library {
        let mut lib = Library::new(VersionSpecifier::parse(name).unwrap());
        lib.insert_mode = mode;
        lib.depend_strength = strength;
        lib
    }

    fn base(libs: Vec<Library>) -> LibraryDocument {
        LibraryDocument {
            should_overwrite: true,
            overwrite_set: libs,
            ..Default::default()
        }
    }

    fn adding(libs: Vec<Library>) -> LibraryDocument {
        LibraryDocument {
            add_set: libs,
            ..Default::default()
        }
    }

    fn versions(doc: &LibraryDocument) -> Vec<String> {
        doc.overwrite_set.iter().map(|l| l.name.to_string()).collect()
    }

    #[test]
    fn test_overwrite_dedupes_keeping_first() {
        let mut doc = LibraryDocument::default();
        let mut warnings = Vec::new();
        let incoming = base(vec![
            lib("a:b:1.0", InsertMode::Prepend, DependStrength::Soft),
            lib("a:b:2.0", InsertMode::Prepend, DependStrength::Soft),
            lib("a:c:1.0", InsertMode::Prepend, DependStrength::Soft),
        ]);

        doc.apply(&incoming, &mut warnings).unwrap();
        assert_eq!(versions(&doc), vec!["a:b:1.0", "a:c:1.0"]);
        assert_eq!(
            warnings,
            vec![LookupWarning::DuplicateLibrary {
                library: "a:b:2.0".to_string()
            }]
        );
    }

    #[test]
    fn test_append_and_prepend_positions() {
        let mut doc = base(vec![lib("x:mid:1", InsertMode::Prepend, DependStrength::Soft)]);
        let mut warnings = Vec::new();
        let incoming = adding(vec![
            lib("x:tail:1", InsertMode::Append, DependStrength::Soft),
            lib("x:head:1", InsertMode::Prepend, DependStrength::Soft),
        ]);

        doc.apply(&incoming, &mut warnings).unwrap();
        assert_eq!(versions(&doc), vec!["x:head:1", "x:mid:1", "x:tail:1"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_hard_existing_rules() {
        let existing = || base(vec![lib("a:b:1.0", InsertMode::Prepend, DependStrength::Hard)]);
        let mut warnings = Vec::new();

        // Lower incoming version is a conflict when either side is hard.
        let mut doc = existing();
        let err = doc
            .apply(
                &adding(vec![lib("a:b:0.9", InsertMode::Append, DependStrength::Hard)]),
                &mut warnings,
            )
            .unwrap_err();
        assert_eq!(err.existing.version(), "1.0");
        assert_eq!(err.incoming.version(), "0.9");

        // Equal version is a silent no-op.
        let mut doc = existing();
        doc.apply(
            &adding(vec![lib("a:b:1.0", InsertMode::Append, DependStrength::Hard)]),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(versions(&doc), vec!["a:b:1.0"]);

        // Higher version violates the pin.
        let mut doc = existing();
        assert!(doc
            .apply(
                &adding(vec![lib("a:b:1.1", InsertMode::Append, DependStrength::Soft)]),
                &mut warnings,
            )
            .is_err());

        // Lower soft version yields to the pin.
        let mut doc = existing();
        doc.apply(
            &adding(vec![lib("a:b:0.9", InsertMode::Append, DependStrength::Soft)]),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(versions(&doc), vec!["a:b:1.0"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_soft_existing_rules() {
        let existing = || base(vec![lib("a:b:1.2", InsertMode::Prepend, DependStrength::Soft)]);
        let mut warnings = Vec::new();

        let mut doc = existing();
        doc.apply(
            &adding(vec![lib("a:b:1.10", InsertMode::Append, DependStrength::Soft)]),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(versions(&doc), vec!["a:b:1.10"]);

        let mut doc = existing();
        doc.apply(
            &adding(vec![lib("a:b:1.1", InsertMode::Append, DependStrength::Soft)]),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(versions(&doc), vec!["a:b:1.2"]);

        let mut doc = existing();
        assert!(doc
            .apply(
                &adding(vec![lib("a:b:1.1", InsertMode::Append, DependStrength::Hard)]),
                &mut warnings,
            )
            .is_err());
    }

    #[test]
    fn test_apply_replace_and_remove() {
        let mut doc = base(vec![
            lib("a:b:1.0", InsertMode::Prepend, DependStrength::Soft),
            lib("a:c:1.0", InsertMode::Prepend, DependStrength::Soft),
        ]);
        let mut warnings = Vec::new();

        let mut patched = lib("a:b:5.0", InsertMode::Apply, DependStrength::Soft);
        patched.apply_rules = true;
        patched.rules = vec![Rule::Implicit {
            action: RuleAction::Disallow,
        }];
        let mut replacement = lib("z:new:2.0", InsertMode::Replace, DependStrength::Soft);
        replacement.insert_target = Some("a:c:1.0".to_string());

        let mut incoming = adding(vec![
            patched,
            replacement,
            lib("q:missing:1", InsertMode::Apply, DependStrength::Soft),
            lib("q:gone:1", InsertMode::Replace, DependStrength::Soft),
        ]);
        incoming.remove(VersionSpecifier::parse("not:there").unwrap());

        doc.apply(&incoming, &mut warnings).unwrap();
        assert_eq!(versions(&doc), vec!["a:b:1.0", "z:new:2.0"]);
        assert!(!doc.overwrite_set[0].is_active(OsType::Linux));
        assert_eq!(
            warnings,
            vec![
                LookupWarning::LibraryNotFound {
                    library: "q:missing:1".to_string()
                },
                LookupWarning::ReplaceTargetNotFound {
                    target: "q:gone".to_string()
                },
                LookupWarning::RemoveTargetNotFound {
                    library: "not:there".to_string()
                },
            ]
        );

        let mut removal = LibraryDocument::default();
        removal.remove(VersionSpecifier::parse("a:b:1.0").unwrap());
        doc.apply(&removal, &mut warnings).unwrap();
        assert_eq!(versions(&doc), vec!["z:new:2.0"]);
    }

    #[test]
    fn test_active_libraries_split_and_dedupe() {
        let mut native = lib("org.lwjgl:platform:2.9", InsertMode::Prepend, DependStrength::Soft);
        native
            .native_classifiers
            .insert(OsType::Linux, "natives-linux".to_string());
        let doc = LibraryDocument {
            should_overwrite: true,
            overwrite_set: vec![
                lib("a:b:1.0", InsertMode::Prepend, DependStrength::Soft),
                native,
                lib("a:b:2.0", InsertMode::Prepend, DependStrength::Soft),
            ],
            ..Default::default()
        };

        let mut warnings = Vec::new();
        let normal = doc.active_normal_libraries(OsType::Linux, &mut warnings);
        assert_eq!(normal.len(), 1);
        assert_eq!(normal[0].version(), "1.0");
        assert_eq!(warnings.len(), 1);

        let mut warnings = Vec::new();
        assert_eq!(doc.active_native_libraries(OsType::Linux, &mut warnings).len(), 1);
        assert!(doc.active_native_libraries(OsType::Windows, &mut warnings).is_empty());
    }
}
