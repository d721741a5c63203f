use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Precondition failures raised before any subprocess is spawned.
///
/// A tool that runs and fails is not an error: it is reported as
/// [`IndexOutcome::Failed`](crate::index::IndexOutcome::Failed).
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("not a file: {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("cache directory is not a directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("invalid indexing policy: {0}")]
    InvalidPolicy(String),

    #[error("no directory given for {tool} and it was not found in PATH")]
    ToolNotFound { tool: String },

    #[error("{tool} executable is not in {}", .dir.display())]
    InvalidToolPath { tool: String, dir: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
