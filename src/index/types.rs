use crate::error::{IndexError, Result};
use crate::utils::{option_value, split_options};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default d2vwitch options: limited range input, one source file
pub const D2VWITCH_OPTIONS: &str = r#"--input-range "limited"  --single-input"#;

/// Default ffmsindex options: overwrite an existing index
pub const FFMSINDEX_OPTIONS: &str = "-f";

/// Option that carries the requested color range in d2vwitch options
pub const INPUT_RANGE_FLAG: &str = "--input-range";

/// Artifact kinds this crate can produce, one per external indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// MPEG-2 project file written by d2vwitch
    D2v,
    /// FFMS2 index written by ffmsindex
    FfIndex,
}

impl IndexKind {
    pub const ALL: [IndexKind; 2] = [IndexKind::D2v, IndexKind::FfIndex];

    /// File extension of the artifact (without dot)
    pub fn extension(&self) -> &'static str {
        match self {
            IndexKind::D2v => "d2v",
            IndexKind::FfIndex => "ffindex",
        }
    }

    /// Executable name of the indexer
    pub fn tool_name(&self) -> &'static str {
        match self {
            IndexKind::D2v => "d2vwitch",
            IndexKind::FfIndex => "ffmsindex",
        }
    }

    /// Prefix shared by every manifest file of this kind
    pub fn manifest_prefix(&self) -> String {
        format!("{}list", self.extension())
    }

    /// Whether artifacts need the color range byte patch
    pub fn needs_range_correction(&self) -> bool {
        matches!(self, IndexKind::D2v)
    }

    pub fn default_options(&self) -> &'static str {
        match self {
            IndexKind::D2v => D2VWITCH_OPTIONS,
            IndexKind::FfIndex => FFMSINDEX_OPTIONS,
        }
    }

    pub fn default_extensions(&self) -> &'static str {
        match self {
            IndexKind::D2v => "m2t mp2 vob mpg mpv m2v",
            IndexKind::FfIndex => "avi mkv 264 h264 265 h265 dv webm",
        }
    }

    /// Build the argument vector for one indexing run
    pub fn command(
        &self,
        tool: &Path,
        options: &str,
        source: &Path,
        artifact: &Path,
    ) -> ToolCommand {
        let mut args: Vec<OsString> = split_options(options)
            .into_iter()
            .map(OsString::from)
            .collect();
        match self {
            IndexKind::D2v => {
                args.push("--output".into());
                args.push(artifact.as_os_str().to_owned());
                args.push(source.as_os_str().to_owned());
            }
            IndexKind::FfIndex => {
                args.push(source.as_os_str().to_owned());
                args.push(artifact.as_os_str().to_owned());
            }
        }
        ToolCommand {
            program: tool.to_path_buf(),
            args,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for IndexKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "d2v" | "d2vwitch" | "mpeg2" => Ok(IndexKind::D2v),
            "ffindex" | "ffmsindex" | "ffms2" => Ok(IndexKind::FfIndex),
            other => Err(IndexError::InvalidPolicy(format!("unknown index kind '{}'", other))),
        }
    }
}

/// Pixel value range recorded in a d2v artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorRange {
    #[default]
    Limited,
    Full,
}

impl ColorRange {
    /// Byte stored after `YUVRGB_Scale=`
    pub fn flag(&self) -> u8 {
        match self {
            ColorRange::Limited => b'1',
            ColorRange::Full => b'0',
        }
    }

    /// Range requested by d2vwitch options; limited when the option is absent
    pub fn from_tool_options(options: &str) -> Result<Self> {
        match option_value(options, INPUT_RANGE_FLAG) {
            Some(value) => value.parse(),
            None => Ok(ColorRange::Limited),
        }
    }
}

impl fmt::Display for ColorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorRange::Limited => f.write_str("limited"),
            ColorRange::Full => f.write_str("full"),
        }
    }
}

impl FromStr for ColorRange {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "limited" => Ok(ColorRange::Limited),
            "full" => Ok(ColorRange::Full),
            other => Err(IndexError::InvalidPolicy(format!(
                "{} must be 'limited' or 'full', got '{}'",
                INPUT_RANGE_FLAG, other
            ))),
        }
    }
}

/// Parse a reuse flag given as text (config overrides, CLI)
pub fn parse_reuse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(IndexError::InvalidPolicy(format!(
            "reuse flag must be true or false, got '{}'",
            other
        ))),
    }
}

/// Caching and tool settings for one indexing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingPolicy {
    /// Return an existing artifact instead of regenerating it
    pub reuse: bool,
    /// Shared cache directory; `None` places artifacts next to the source
    pub cache_dir: Option<PathBuf>,
    /// Directory holding the tool; `None` searches PATH
    pub tool_dir: Option<PathBuf>,
    /// Directory tried when the tool is not on PATH
    pub fallback_tool_dir: Option<PathBuf>,
    /// Options passed through to the tool
    pub tool_options: String,
}

impl IndexingPolicy {
    /// Policy with reuse enabled, co-located artifacts and the kind's default options
    pub fn new(kind: IndexKind) -> Self {
        Self {
            reuse: true,
            cache_dir: None,
            tool_dir: None,
            fallback_tool_dir: None,
            tool_options: kind.default_options().to_string(),
        }
    }

    pub fn reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = non_empty(dir.into());
        self
    }

    pub fn tool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tool_dir = non_empty(dir.into());
        self
    }

    pub fn fallback_tool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_tool_dir = non_empty(dir.into());
        self
    }

    pub fn tool_options(mut self, options: impl Into<String>) -> Self {
        self.tool_options = options.into();
        self
    }
}

/// Treat an empty path as "not given"
pub fn non_empty(path: PathBuf) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// A fully resolved tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of an indexing call that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// An existing artifact was returned without running the tool
    Reused(PathBuf),
    /// The tool ran and produced the artifact
    Created(PathBuf),
    /// The tool failed or wrote nothing; details are in the log
    Failed,
}

impl IndexOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            IndexOutcome::Reused(path) | IndexOutcome::Created(path) => Some(path),
            IndexOutcome::Failed => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            IndexOutcome::Reused(path) | IndexOutcome::Created(path) => Some(path),
            IndexOutcome::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, IndexOutcome::Failed)
    }
}
