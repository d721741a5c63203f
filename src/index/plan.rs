//! Deciding where an artifact lives and whether it must be regenerated

use crate::error::{IndexError, Result};
use crate::index::manifest::{Manifest, ManifestStore};
use crate::index::tool::ToolLocator;
use crate::index::types::{IndexKind, IndexingPolicy};
use crate::utils::{artifact_file_name, LogSink};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the subdirectory created inside a cache directory
pub const NAMESPACE_DIR: &str = "indexing";

/// Where artifacts for a source are kept
#[derive(Debug, Clone)]
pub enum CacheMode {
    /// Random names under `cache/indexing/<parent>/`, tracked by a manifest
    Namespaced {
        store: ManifestStore,
        /// Manifest file the entries came from, if one was found or created
        manifest: Option<String>,
        /// Entries loaded for this call; `None` when reuse was disabled
        entries: Option<Manifest>,
    },
    /// `<source dir>/<stem>.<ext>`
    CoLocated,
}

/// A validated indexing request: tool, artifact path, and whether the tool must run
#[derive(Debug, Clone)]
pub struct IndexPlan {
    pub kind: IndexKind,
    /// Absolute source path as given; symlinks are not resolved
    pub source: PathBuf,
    pub artifact: PathBuf,
    pub needs_indexing: bool,
    pub tool: PathBuf,
    pub mode: CacheMode,
}

impl IndexPlan {
    /// Validate the request and decide where the artifact goes.
    ///
    /// All precondition errors are raised before anything is created on disk.
    pub fn prepare(
        kind: IndexKind,
        source: &Path,
        policy: &IndexingPolicy,
        locator: &ToolLocator,
        log: &mut LogSink,
    ) -> Result<Self> {
        if !source.is_file() {
            return Err(IndexError::InvalidSource(source.to_path_buf()));
        }
        let source = std::path::absolute(source)?;

        if let Some(cache_dir) = &policy.cache_dir {
            if !cache_dir.is_dir() {
                return Err(IndexError::InvalidDirectory(cache_dir.clone()));
            }
        }

        let tool = locator.resolve(
            policy.tool_dir.as_deref(),
            kind.tool_name(),
            policy.fallback_tool_dir.as_deref(),
            log,
        )?;

        let (artifact, needs_indexing, mode) = match &policy.cache_dir {
            Some(cache_dir) => {
                let dir = namespace_dir(cache_dir, &source);
                if !dir.is_dir() {
                    fs::create_dir_all(&dir)?;
                    log.info(format!("created directory: {}", dir.display()));
                }
                plan_namespaced(kind, &source, dir, policy.reuse, log)
            }
            None => {
                let (artifact, needs_indexing) = plan_co_located(kind, &source, policy.reuse, log);
                (artifact, needs_indexing, CacheMode::CoLocated)
            }
        };

        Ok(Self {
            kind,
            source,
            artifact,
            needs_indexing,
            tool,
            mode,
        })
    }

    /// Basename the manifest keys this source under
    pub fn source_name(&self) -> String {
        source_name(&self.source)
    }

    /// Record the freshly created artifact in the manifest (namespaced mode only)
    pub fn remember(&self, log: &mut LogSink) {
        let CacheMode::Namespaced {
            store,
            manifest,
            entries,
        } = &self.mode
        else {
            return;
        };

        let (old, mut entries) = match entries {
            Some(entries) => (manifest.clone(), entries.clone()),
            None => {
                // reuse was off: nothing was loaded while planning
                let old = store.find();
                let entries = old
                    .as_deref()
                    .map(|name| store.load(name, log))
                    .unwrap_or_default();
                (old, entries)
            }
        };

        store.update(
            old.as_deref(),
            &mut entries,
            &self.source_name(),
            &self.artifact,
            log,
        );
    }
}

/// `cache/indexing/<name of the source's parent directory>`
pub fn namespace_dir(cache_dir: &Path, source: &Path) -> PathBuf {
    let parent = source
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    cache_dir.join(NAMESPACE_DIR).join(parent)
}

fn source_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn plan_namespaced(
    kind: IndexKind,
    source: &Path,
    dir: PathBuf,
    reuse: bool,
    log: &mut LogSink,
) -> (PathBuf, bool, CacheMode) {
    let store = ManifestStore::new(&dir, kind);

    if !reuse {
        log.info(format!("re_use_indexing is disabled, new {} file will be created", kind));
        let artifact = dir.join(artifact_file_name(kind.extension()));
        let mode = CacheMode::Namespaced {
            store,
            manifest: None,
            entries: None,
        };
        return (artifact, true, mode);
    }

    log.info(format!(
        "re_use_indexing is enabled, looking for {} file in {}",
        kind,
        dir.display()
    ));
    let manifest = store.find().or_else(|| store.create_empty(log));
    let mut entries = manifest
        .as_deref()
        .map(|name| store.load(name, log))
        .unwrap_or_default();

    let name = source_name(source);
    let existing = match entries.get(&name).cloned() {
        Some(path) if path.exists() => {
            log.info(format!("{}_file=\"{}\"", kind, path.display()));
            Some(path)
        }
        Some(_) => {
            log.info(format!(
                "index file found in manifest, but actual {} file does not exist, will be created",
                kind
            ));
            entries.remove(&name);
            None
        }
        None => {
            log.info(format!(
                "'{}' not found in manifest, new {} file will be created",
                name, kind
            ));
            None
        }
    };

    let needs_indexing = existing.is_none();
    let artifact = existing.unwrap_or_else(|| dir.join(artifact_file_name(kind.extension())));
    let mode = CacheMode::Namespaced {
        store,
        manifest,
        entries: Some(entries),
    };
    (artifact, needs_indexing, mode)
}

fn plan_co_located(
    kind: IndexKind,
    source: &Path,
    reuse: bool,
    log: &mut LogSink,
) -> (PathBuf, bool) {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let artifact = source.with_file_name(format!("{}.{}", stem, kind.extension()));

    if !reuse {
        log.info(format!("re_use_indexing is disabled, new {} file will be created", kind));
        return (artifact, true);
    }

    if artifact.is_file() {
        log.info(format!("{}_file=\"{}\"", kind, artifact.display()));
        (artifact, false)
    } else {
        log.info(format!("index file not found, new {} file will be created", kind));
        (artifact, true)
    }
}
