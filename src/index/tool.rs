//! Locating external indexer executables

use crate::error::{IndexError, Result};
use crate::utils::LogSink;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Resolves indexer executables from an explicit directory, PATH, or a fallback directory
#[derive(Debug, Clone)]
pub struct ToolLocator {
    search_path: Option<OsString>,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ToolLocator {
    /// Search the process PATH
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Search the given PATH-style list instead of the process environment
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Resolve `tool` to an executable path.
    ///
    /// Without an explicit directory PATH is searched first, then
    /// `fallback_dir`. A directory that does not hold the tool is
    /// [`IndexError::InvalidToolPath`]; nothing given and nothing found is
    /// [`IndexError::ToolNotFound`].
    pub fn resolve(
        &self,
        explicit_dir: Option<&Path>,
        tool: &str,
        fallback_dir: Option<&Path>,
        log: &mut LogSink,
    ) -> Result<PathBuf> {
        let dir = match explicit_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                if let Some(found) = self.lookup(tool) {
                    if !is_executable(&found) {
                        log.warn(format!(
                            "{} found in PATH at {} but might not have permission to run",
                            tool,
                            found.display()
                        ));
                    }
                    return Ok(found);
                }
                match fallback_dir {
                    Some(dir) if dir.is_dir() => {
                        log.info(format!(
                            "no directory passed for {} and not found in PATH, \
                             using fallback directory {}",
                            tool,
                            dir.display()
                        ));
                        dir.to_path_buf()
                    }
                    _ => {
                        return Err(IndexError::ToolNotFound {
                            tool: tool.to_string(),
                        });
                    }
                }
            }
        };

        if !dir.is_dir() {
            return Err(IndexError::InvalidToolPath {
                tool: tool.to_string(),
                dir,
            });
        }

        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Ok(candidate);
        }

        let suffix = std::env::consts::EXE_SUFFIX;
        if !suffix.is_empty() {
            let candidate = dir.join(format!("{}{}", tool, suffix));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(IndexError::InvalidToolPath {
            tool: tool.to_string(),
            dir,
        })
    }

    fn lookup(&self, tool: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        let cwd = std::env::current_dir().ok()?;
        which::which_in(tool, Some(search_path), cwd)
            .ok()
            .filter(|path| path.is_file())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    match CString::new(path.as_os_str().as_bytes()) {
        Ok(c_path) => unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 },
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
