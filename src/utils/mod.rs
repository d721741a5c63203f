//! Utility functions and shared plumbing.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration file in the application data directory
//! - [`log_sink`] - Per-call log record capture
//! - [`naming`] - Random file names for artifacts and manifests
//! - [`progress`] - Spinner shown while an indexer runs
//! - [`tokenizer`] - Tool option string splitting
//!
//! ## Key Functions
//!
//! ```no_run
//! use mediaidx::utils::{option_value, split_options};
//!
//! // Split an option string the way a shell would
//! let args = split_options(r#"--input-range "limited"  --single-input"#);
//! // Returns: ["--input-range", "limited", "--single-input"]
//!
//! // Pick out one option's value
//! let range = option_value("--input-range full", "--input-range");
//! // Returns: Some("full")
//! ```

pub mod app_data;
pub mod log_sink;
pub mod naming;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use log_sink::*;
pub use naming::*;
pub use tokenizer::*;
