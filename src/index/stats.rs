use crate::index::manifest::ManifestStore;
use crate::index::plan::NAMESPACE_DIR;
use crate::index::types::IndexKind;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// One manifest entry and the state of its artifact
#[derive(Debug, Clone)]
pub struct EntryStatus {
    pub source: String,
    pub artifact: PathBuf,
    /// Artifact size, `None` if it no longer exists
    pub size: Option<u64>,
}

/// Manifest state of one kind in one namespace directory
#[derive(Debug, Clone)]
pub struct NamespaceSummary {
    pub dir: PathBuf,
    pub kind: IndexKind,
    pub manifest: String,
    /// Manifest files beyond the live one (left by an interrupted update)
    pub superseded: usize,
    pub entries: Vec<EntryStatus>,
    /// Error if the live manifest could not be read
    pub load_error: Option<String>,
}

/// Collect manifest summaries for every namespace under `cache_dir/indexing`
pub fn scan_cache(cache_dir: &Path) -> Result<Vec<NamespaceSummary>> {
    let root = cache_dir.join(NAMESPACE_DIR);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    let entries =
        std::fs::read_dir(&root).with_context(|| format!("Failed to read {}", root.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut summaries = Vec::new();
    for dir in dirs {
        for kind in IndexKind::ALL {
            let store = ManifestStore::new(&dir, kind);
            let manifests = store.list();
            let Some(live) = manifests.first() else {
                continue;
            };

            let (entries, load_error) = match store.try_load(live) {
                Ok(manifest) => {
                    let entries = manifest
                        .into_iter()
                        .map(|(source, artifact)| {
                            let size = std::fs::metadata(&artifact).ok().map(|m| m.len());
                            EntryStatus { source, artifact, size }
                        })
                        .collect();
                    (entries, None)
                }
                Err(e) => (Vec::new(), Some(e.to_string())),
            };

            summaries.push(NamespaceSummary {
                dir: dir.clone(),
                kind,
                manifest: live.clone(),
                superseded: manifests.len() - 1,
                entries,
                load_error,
            });
        }
    }

    Ok(summaries)
}

/// Print every manifest in the cache and the state of its artifacts
pub fn show_cache(cache_dir: &Path) -> Result<()> {
    let summaries = scan_cache(cache_dir)?;

    if summaries.is_empty() {
        println!("No manifests found under {}.", cache_dir.join(NAMESPACE_DIR).display());
        return Ok(());
    }

    println!("Index Cache");
    println!("===========");
    println!();

    let mut total_size = 0;
    let mut missing = 0;
    for summary in &summaries {
        println!("  {} [{}]", summary.dir.display(), summary.kind);
        println!("    Manifest: {}", summary.manifest);
        if summary.superseded > 0 {
            println!("    ({} superseded manifest(s), run 'mediaidx prune')", summary.superseded);
        }
        if let Some(err) = &summary.load_error {
            println!("    Unreadable: {}", err);
        }
        for entry in &summary.entries {
            match entry.size {
                Some(size) => {
                    total_size += size;
                    println!(
                        "    {:30} {} ({})",
                        entry.source,
                        entry.artifact.display(),
                        format_size(size)
                    );
                }
                None => {
                    missing += 1;
                    println!("    {:30} {} [missing]", entry.source, entry.artifact.display());
                }
            }
        }
        println!();
    }

    println!("Artifact size:    {}", format_size(total_size));
    if missing > 0 {
        println!("Missing:          {} (regenerated on next use)", missing);
    }

    Ok(())
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
