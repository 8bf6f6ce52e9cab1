pub mod config;
pub mod library;
pub mod patch;
pub mod profile;

pub use config::ResolverConfig;
