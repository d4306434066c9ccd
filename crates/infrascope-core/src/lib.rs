// Core discovery logic lives here - the brain of the operation
pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod format;
pub mod models;
pub mod providers;

pub use config::Config;
pub use discovery::{DiscoverOptions, DiscoveryEngine};
pub use error::Error;
pub use format::OutputFormat;
pub use models::{Environment, FilterSpec, RepoKind, RepoRecord};
pub use providers::{GitHubSource, RepoSource};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
