pub mod loader;
pub mod order;
pub mod registry;
pub mod resolved;
pub mod resolver;

// Re-export commonly used types
pub use loader::{load_package, scan_instance, InstanceScan, ScanFailure};
pub use order::{arrange_patches, arrange_user_patches, builtin_patch, OrderFile};
pub use registry::{Package, PackageRegistry, VersionEntry};
pub use resolved::{finalize_asset_group, ResolvedProfile};
pub use resolver::{ProfileResolver, Resolution};
