//! Reference manifests: per-directory maps from source basename to artifact path.
//!
//! A manifest lives in a file named `<ext>list<random>`. Each update writes a
//! complete new file, reads it back, and only then removes the previous one,
//! so a crash never leaves the directory without a readable manifest.

use crate::index::types::IndexKind;
use crate::utils::{manifest_file_name, LogSink};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Source basename -> artifact path
pub type Manifest = BTreeMap<String, PathBuf>;

/// Manifest files of one kind inside one namespace directory
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
    kind: IndexKind,
}

impl ManifestStore {
    pub fn new(dir: impl Into<PathBuf>, kind: IndexKind) -> Self {
        Self {
            dir: dir.into(),
            kind,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All manifest files of this kind, newest first
    pub fn list(&self) -> Vec<String> {
        let prefix = self.kind.manifest_prefix();
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut found: Vec<(SystemTime, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if !name.starts_with(&prefix) {
                    return None;
                }
                let mtime = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                Some((mtime, name))
            })
            .collect();

        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        found.into_iter().map(|(_, name)| name).collect()
    }

    /// The live manifest file, if any.
    ///
    /// Normally there is exactly one. After a crash between writing a new
    /// manifest and deleting the old one, the newest is taken.
    pub fn find(&self) -> Option<String> {
        self.list().into_iter().next()
    }

    /// Read a manifest; unreadable or malformed files yield an empty map
    pub fn load(&self, name: &str, log: &mut LogSink) -> Manifest {
        match self.try_load(name) {
            Ok(manifest) => manifest,
            Err(e) => {
                log.error(format!(
                    "failed to load manifest {}: {}",
                    self.dir.join(name).display(),
                    e
                ));
                Manifest::new()
            }
        }
    }

    /// Read a manifest, reporting I/O and parse errors
    pub fn try_load(&self, name: &str) -> io::Result<Manifest> {
        let content = fs::read(self.dir.join(name))?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Create an empty manifest under a new random name
    pub fn create_empty(&self, log: &mut LogSink) -> Option<String> {
        let name = manifest_file_name(&self.kind.manifest_prefix());
        match write_verified(&self.dir.join(&name), &Manifest::new()) {
            Ok(()) => Some(name),
            Err(e) => {
                log.error(format!(
                    "failed to create empty manifest for {} references in {}: {}",
                    self.kind,
                    self.dir.display(),
                    e
                ));
                None
            }
        }
    }

    /// Record `source_name -> artifact` and replace the manifest file.
    ///
    /// Returns the new file name. On failure the previous manifest is left
    /// in place and `None` is returned.
    pub fn update(
        &self,
        old: Option<&str>,
        manifest: &mut Manifest,
        source_name: &str,
        artifact: &Path,
        log: &mut LogSink,
    ) -> Option<String> {
        manifest.insert(source_name.to_string(), artifact.to_path_buf());

        let name = manifest_file_name(&self.kind.manifest_prefix());
        if let Err(e) = write_verified(&self.dir.join(&name), manifest) {
            log.error(format!(
                "failed to store updated manifest in {}: {}",
                self.dir.display(),
                e
            ));
            // don't leave a half-written file behind for the prefix scan
            let _ = fs::remove_file(self.dir.join(&name));
            return None;
        }
        log.info(format!("manifest updated for {}", source_name));

        if let Some(old) = old {
            let old_path = self.dir.join(old);
            if old_path.is_file() {
                if let Err(e) = fs::remove_file(&old_path) {
                    log.warn(format!(
                        "failed to remove superseded manifest {}: {}",
                        old_path.display(),
                        e
                    ));
                }
            }
        }

        Some(name)
    }
}

/// Write `manifest` to a new file and confirm it reads back identically
fn write_verified(path: &Path, manifest: &Manifest) -> io::Result<()> {
    let bytes = serde_json::to_vec(manifest)?;
    let mut file = File::create_new(path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);

    let written: Manifest = serde_json::from_slice(&fs::read(path)?)?;
    if &written != manifest {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "manifest read back differs from what was written",
        ));
    }
    Ok(())
}
