//! Centralized resolver settings.
//! Static constants shared by the readers and the download-task builder, plus the
//! small amount of per-resolution configuration the resolver needs.

use crate::utils::platform::OsType;
use chrono::NaiveDate;

// URL Constants
pub const LIBRARY_BASE_URL: &str = "https://libraries.minecraft.net/";
pub const LEGACY_VERSION_JAR_URL: &str = "http://s3.amazonaws.com/Minecraft.Download/versions";

/// Newest OneSix `minimumLauncherVersion` this crate understands.
pub const CURRENT_MINIMUM_LAUNCHER_VERSION: i64 = 14;

/// Newest Wonko `formatVersion` this crate understands.
pub const CURRENT_WONKO_VERSION: i64 = 0;

/// The only order file version ever written.
pub const ORDER_FILE_VERSION: u32 = 1;

/// Asset group used when no patch names one.
pub const LEGACY_ASSET_GROUP: &str = "legacy";

/// Builtin components, applied before any user patch in this order.
pub const BUILTIN_COMPONENTS: [(&str, &str); 4] = [
    ("net.minecraft", "Minecraft"),
    ("org.lwjgl", "LWJGL"),
    ("net.minecraftforge", "Forge"),
    ("com.mumfrey.liteloader", "LiteLoader"),
];

pub fn is_builtin_component(uid: &str) -> bool {
    BUILTIN_COMPONENTS.iter().any(|(id, _)| *id == uid)
}

/// Per-resolution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Platform used for rule evaluation and native classifier selection.
    pub platform: OsType,

    /// Calendar date used when finalizing the asset group.
    /// `None` reads the local date at finalize time.
    pub today: Option<NaiveDate>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            platform: OsType::current(),
            today: None,
        }
    }
}

impl ResolverConfig {
    pub fn for_platform(platform: OsType) -> Self {
        Self {
            platform,
            ..Default::default()
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
