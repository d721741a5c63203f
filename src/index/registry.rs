use crate::error::{IndexError, Result};
use crate::index::types::IndexKind;
use crate::utils::AppConfig;
use std::collections::HashMap;
use std::path::Path;

/// Indexer selected for a file extension, with its configured options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerEntry {
    pub kind: IndexKind,
    pub tool_options: String,
}

/// File extension -> indexer, resolved once from configuration
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    by_extension: HashMap<String, IndexerEntry>,
}

impl ExtensionRegistry {
    /// Build the registry from the `indexers` table of a config.
    ///
    /// An extension claimed by two indexers is rejected.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::default();
        for kind in IndexKind::ALL {
            let settings = config.indexers.get(kind);
            for ext in settings.extensions.split_whitespace() {
                registry.insert(ext, kind, &settings.options)?;
            }
        }
        Ok(registry)
    }

    fn insert(&mut self, ext: &str, kind: IndexKind, options: &str) -> Result<()> {
        let ext = normalize(ext);
        if let Some(existing) = self.by_extension.get(&ext) {
            if existing.kind != kind {
                return Err(IndexError::InvalidPolicy(format!(
                    "extension '{}' is assigned to both {} and {}",
                    ext, existing.kind, kind
                )));
            }
            return Ok(());
        }
        self.by_extension.insert(
            ext,
            IndexerEntry {
                kind,
                tool_options: options.to_string(),
            },
        );
        Ok(())
    }

    pub fn get(&self, ext: &str) -> Option<&IndexerEntry> {
        self.by_extension.get(&normalize(ext))
    }

    /// Indexer for a source path, chosen by its extension
    pub fn lookup(&self, path: &Path) -> Option<&IndexerEntry> {
        let ext = path.extension()?.to_str()?;
        self.get(ext)
    }

    /// Extensions handled by `kind`, sorted
    pub fn extensions(&self, kind: IndexKind) -> Vec<&str> {
        let mut exts: Vec<&str> = self
            .by_extension
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(ext, _)| ext.as_str())
            .collect();
        exts.sort_unstable();
        exts
    }

    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::D2VWITCH_OPTIONS;

    #[test]
    fn test_default_registry() {
        let registry = ExtensionRegistry::from_config(&AppConfig::default()).unwrap();

        let entry = registry.lookup(Path::new("/media/Clip.MPG")).unwrap();
        assert_eq!(entry.kind, IndexKind::D2v);
        assert_eq!(entry.tool_options, D2VWITCH_OPTIONS);

        assert_eq!(registry.get(".mkv").unwrap().kind, IndexKind::FfIndex);
        assert!(registry.lookup(Path::new("movie.mp4")).is_none());
        assert!(registry.lookup(Path::new("noext")).is_none());
        assert_eq!(
            registry.extensions(IndexKind::D2v),
            vec!["m2t", "m2v", "mp2", "mpg", "mpv", "vob"]
        );
    }

    #[test]
    fn test_conflicting_extension_rejected() {
        let mut config = AppConfig::default();
        config.indexers.ffindex.extensions = "mkv vob".to_string();

        let err = ExtensionRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, IndexError::InvalidPolicy(ref msg) if msg.contains("vob")));
    }

    #[test]
    fn test_duplicate_within_kind_is_fine() {
        let mut config = AppConfig::default();
        config.indexers.d2v.extensions = "mpg MPG .mpg".to_string();
        config.indexers.ffindex.extensions = String::new();

        let registry = ExtensionRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
