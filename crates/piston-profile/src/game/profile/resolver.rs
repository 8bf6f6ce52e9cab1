//! Folds an ordered patch list into a [`ResolvedProfile`].
//!
//! Resolution is a synchronous, all-or-nothing pass: any version conflict aborts
//! it and no partial profile escapes. [`ProfileResolver::reapply`] keeps the last
//! successful result around so callers always have a consistent snapshot.

use crate::error::{Diagnostic, ProfileError};
use crate::game::config::ResolverConfig;
use crate::game::patch::ConfigurationPatch;
use crate::game::profile::resolved::ResolvedProfile;
use serde::Serialize;
use std::sync::Arc;

/// A resolved profile together with the lookup warnings collected on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub profile: ResolvedProfile,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct ProfileResolver {
    config: ResolverConfig,
    last_good: Option<Arc<Resolution>>,
}

impl ProfileResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            last_good: None,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `patches` in the given order.
    pub fn resolve(&self, patches: &[ConfigurationPatch]) -> Result<Resolution, ProfileError> {
        let platform = self.config.platform;
        let mut profile = ResolvedProfile::new(platform);
        let mut diagnostics = Vec::new();

        for patch in patches {
            log::debug!("Applying patch {}", patch.describe());
            let mut warnings = Vec::new();

            if let Err(conflict) = profile.apply_patch(patch, &mut warnings) {
                let location = patch.describe();
                log::error!("Resolution failed in patch {}: {}", location, conflict);
                return Err(ProfileError::VersionConflict {
                    patch: patch.id.clone(),
                    location,
                    conflict,
                });
            }

            diagnostics.extend(warnings.into_iter().map(|warning| Diagnostic {
                patch: Some(patch.id.clone()),
                warning,
            }));
        }

        profile.finalize(self.config.today());

        let mut warnings = Vec::new();
        profile.collect_active_libraries(&mut warnings);
        diagnostics.extend(warnings.into_iter().map(|warning| Diagnostic {
            patch: None,
            warning,
        }));

        log::info!(
            "Resolved profile from {} patches ({} warnings)",
            patches.len(),
            diagnostics.len()
        );
        Ok(Resolution {
            profile,
            diagnostics,
        })
    }

    /// Resolve from scratch and remember the result.
    ///
    /// On failure the previous resolution stays current and the error is returned.
    pub fn reapply(&mut self, patches: &[ConfigurationPatch]) -> Result<Arc<Resolution>, ProfileError> {
        match self.resolve(patches) {
            Ok(resolution) => {
                let resolution = Arc::new(resolution);
                self.last_good = Some(resolution.clone());
                Ok(resolution)
            }
            Err(e) => {
                if self.last_good.is_some() {
                    log::warn!("Keeping the previous profile after failed resolution");
                }
                Err(e)
            }
        }
    }

    /// Last successful resolution, if any.
    pub fn current(&self) -> Option<Arc<Resolution>> {
        self.last_good.clone()
    }
}
