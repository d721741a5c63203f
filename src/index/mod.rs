pub mod indexer;
pub mod manifest;
pub mod plan;
pub mod prune;
pub mod range;
pub mod registry;
pub mod runner;
pub mod stats;
pub mod tool;
pub mod types;

pub use indexer::Indexer;
pub use manifest::{Manifest, ManifestStore};
pub use plan::{CacheMode, IndexPlan};
pub use registry::ExtensionRegistry;
pub use runner::{ProcessRunner, ToolRunner};
pub use tool::ToolLocator;
pub use types::*;
