pub mod onesix;
pub mod resource;
pub mod types;
pub mod wonko;

// Re-export commonly used types
pub use onesix::{create_jar_mod_patch, load_patch, patch_from_value, patch_to_json};
pub use resource::{Download, Resource, ResourceKind};
pub use types::{ArgumentsDelta, ConfigurationPatch, JarMod, TweakersDelta};
pub use wonko::{load_wonko_patch, WonkoVersion};
