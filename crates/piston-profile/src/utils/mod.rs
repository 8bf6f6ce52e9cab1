pub mod platform;
pub mod version;

pub use platform::{expand_arch, OsType};
pub use version::{compare_versions, Version};
