use crate::index::manifest::ManifestStore;
use crate::index::plan::NAMESPACE_DIR;
use crate::index::types::IndexKind;
use crate::utils::{artifact_pattern, is_allocated_artifact_name, LogSink};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Files removed (or that would be removed) by a prune
#[derive(Debug, Default, Clone)]
pub struct PruneReport {
    pub artifacts: Vec<PathBuf>,
    pub manifests: Vec<PathBuf>,
    pub bytes: u64,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty() && self.manifests.is_empty()
    }

    fn merge(&mut self, other: PruneReport) {
        self.artifacts.extend(other.artifacts);
        self.manifests.extend(other.manifests);
        self.bytes += other.bytes;
    }
}

/// Prune every namespace directory under `cache_dir/indexing`
pub fn prune_cache(cache_dir: &Path, dry_run: bool, log: &mut LogSink) -> Result<PruneReport> {
    let root = cache_dir.join(NAMESPACE_DIR);
    let mut report = PruneReport::default();
    if !root.is_dir() {
        return Ok(report);
    }

    let entries = fs::read_dir(&root)
        .with_context(|| format!("Failed to read {}", root.display()))?;
    for entry in entries {
        let dir = entry?.path();
        if !dir.is_dir() {
            continue;
        }
        for kind in IndexKind::ALL {
            report.merge(prune_namespace(&dir, kind, dry_run, log));
        }
    }

    Ok(report)
}

/// Remove superseded manifests and artifacts the live manifest no longer references.
///
/// Only files whose names match the random artifact pattern are considered,
/// so anything placed in the directory by hand is left alone. If the live
/// manifest cannot be read, artifacts are kept.
pub fn prune_namespace(
    dir: &Path,
    kind: IndexKind,
    dry_run: bool,
    log: &mut LogSink,
) -> PruneReport {
    let store = ManifestStore::new(dir, kind);
    let mut report = PruneReport::default();

    let manifests = store.list();
    let referenced: HashSet<OsString> = match manifests.first() {
        Some(live) => match store.try_load(live) {
            Ok(entries) => entries
                .values()
                .filter_map(|path| path.file_name().map(|n| n.to_os_string()))
                .collect(),
            Err(e) => {
                log.error(format!(
                    "manifest {} is unreadable ({}), keeping all artifacts in {}",
                    live,
                    e,
                    dir.display()
                ));
                return report;
            }
        },
        None => HashSet::new(),
    };

    for stale in manifests.iter().skip(1) {
        remove(&dir.join(stale), dry_run, &mut report.manifests, &mut report.bytes, log);
    }

    if artifact_pattern().is_none() {
        log.error(format!(
            "artifact name pattern is unavailable, keeping all artifacts in {}",
            dir.display()
        ));
        return report;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return report;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let Some(name_str) = name.to_str() else {
            continue;
        };
        if !is_allocated_artifact_name(name_str, kind.extension()) || referenced.contains(&name) {
            continue;
        }
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            remove(&entry.path(), dry_run, &mut report.artifacts, &mut report.bytes, log);
        }
    }

    report
}

fn remove(
    path: &Path,
    dry_run: bool,
    removed: &mut Vec<PathBuf>,
    bytes: &mut u64,
    log: &mut LogSink,
) {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if !dry_run {
        if let Err(e) = fs::remove_file(path) {
            log.warn(format!("failed to remove {}: {}", path.display(), e));
            return;
        }
        log.info(format!("removed {}", path.display()));
    }
    removed.push(path.to_path_buf());
    *bytes += size;
}
