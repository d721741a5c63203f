//! # mediaidx - Index artifact cache for video sources
//!
//! Frame-accurate video filters need an index of the source before they can
//! seek into it. mediaidx runs the external indexer for a source file
//! (`d2vwitch` for MPEG-2 streams, `ffmsindex` for everything else), decides
//! where the artifact lives, and reuses it on later calls.
//!
//! ## Architecture
//!
//! - [`index`] - Tool lookup, artifact placement, manifests, range patching
//! - [`output`] - Colored reporting of log records and outcomes
//! - [`utils`] - Configuration, log capture, option tokenizing, naming
//! - [`error`] - Precondition errors raised before a tool runs
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediaidx::index::{Indexer, IndexingPolicy, IndexKind};
//! use mediaidx::utils::LogSink;
//! use std::path::Path;
//!
//! let policy = IndexingPolicy::new(IndexKind::D2v).cache_dir("/var/cache/video");
//! let mut log = LogSink::new();
//!
//! let outcome = Indexer::d2vwitch()
//!     .index(Path::new("/media/show/episode1.mpg"), &policy, &mut log)
//!     .unwrap();
//!
//! match outcome.path() {
//!     Some(path) => println!("index: {}", path.display()),
//!     None => eprintln!("indexing failed"),
//! }
//! ```
//!
//! ## Cache layout
//!
//! Without a cache directory the artifact sits next to the source as
//! `<stem>.<ext>`. With one, artifacts get random names under
//! `<cache>/indexing/<parent dir name>/`, and a manifest file in the same
//! directory maps each source basename to its artifact.

pub mod error;
pub mod index;
pub mod output;
pub mod utils;

pub use error::{IndexError, Result};
