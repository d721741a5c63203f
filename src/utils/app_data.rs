use crate::index::types::{non_empty, IndexKind, IndexingPolicy};
use crate::utils::LogSink;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "mediaidx";
const CONFIG_FILE: &str = "config.json";

/// Extensions handled by one indexer and the options passed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerSettings {
    /// Space separated file extensions, without dots
    pub extensions: String,
    /// Option string passed verbatim to the tool
    pub options: String,
}

impl IndexerSettings {
    fn defaults_for(kind: IndexKind) -> Self {
        Self {
            extensions: kind.default_extensions().to_string(),
            options: kind.default_options().to_string(),
        }
    }
}

/// Per-kind indexer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerTable {
    pub d2v: IndexerSettings,
    pub ffindex: IndexerSettings,
}

impl IndexerTable {
    pub fn get(&self, kind: IndexKind) -> &IndexerSettings {
        match kind {
            IndexKind::D2v => &self.d2v,
            IndexKind::FfIndex => &self.ffindex,
        }
    }

    fn get_mut(&mut self, kind: IndexKind) -> &mut IndexerSettings {
        match kind {
            IndexKind::D2v => &mut self.d2v,
            IndexKind::FfIndex => &mut self.ffindex,
        }
    }
}

impl Default for IndexerTable {
    fn default() -> Self {
        Self {
            d2v: IndexerSettings::defaults_for(IndexKind::D2v),
            ffindex: IndexerSettings::defaults_for(IndexKind::FfIndex),
        }
    }
}

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared cache directory for artifacts; empty places them next to each source
    pub indexing_dir: PathBuf,

    /// Reuse existing artifacts instead of re-running the indexer
    pub re_use_indexing: bool,

    /// Directory holding d2vwitch; empty searches PATH
    pub d2vwitch_dir: PathBuf,

    /// Directory holding ffmsindex; empty searches PATH
    pub ffmsindex_dir: PathBuf,

    /// Directory tried when a tool is neither configured nor on PATH
    pub fallback_tool_dir: PathBuf,

    /// Extension and option settings per indexer
    pub indexers: IndexerTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            indexing_dir: std::env::temp_dir(),
            re_use_indexing: true,
            d2vwitch_dir: PathBuf::new(),
            ffmsindex_dir: PathBuf::new(),
            fallback_tool_dir: PathBuf::new(),
            indexers: IndexerTable::default(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory
    pub fn load(log: &mut LogSink) -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path, log)
    }

    /// Load config from `path`, writing defaults there if the file does not exist
    pub fn load_from(path: &Path, log: &mut LogSink) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            return Self::from_json(&content, log);
        }

        log.info(format!("{} not found, using default values", path.display()));
        let config = Self::default();
        if let Err(e) = config.save_to(path) {
            log.error(format!("failed to store default config: {:#}", e));
        }
        Ok(config)
    }

    /// Parse config text; keys holding a value of the wrong type fall back to their default
    pub fn from_json(content: &str, log: &mut LogSink) -> Result<Self> {
        let value: Value = serde_json::from_str(content).context("Failed to parse config file")?;
        let object = value
            .as_object()
            .context("Config file must contain a JSON object")?;

        let mut config = Self::default();
        take_key(object, "indexing_dir", &mut config.indexing_dir, log);
        take_key(object, "re_use_indexing", &mut config.re_use_indexing, log);
        take_key(object, "d2vwitch_dir", &mut config.d2vwitch_dir, log);
        take_key(object, "ffmsindex_dir", &mut config.ffmsindex_dir, log);
        take_key(object, "fallback_tool_dir", &mut config.fallback_tool_dir, log);

        if let Some(indexers) = object.get("indexers") {
            match indexers.as_object() {
                Some(indexers) => {
                    for kind in IndexKind::ALL {
                        let Some(entry) = indexers.get(kind.extension()) else {
                            continue;
                        };
                        let Some(entry) = entry.as_object() else {
                            log.warn(format!(
                                "config key 'indexers.{}' must be an object, using default",
                                kind
                            ));
                            continue;
                        };
                        let settings = config.indexers.get_mut(kind);
                        take_key(entry, "extensions", &mut settings.extensions, log);
                        take_key(entry, "options", &mut settings.options, log);
                    }
                }
                None => log.warn("config key 'indexers' must be an object, using default"),
            }
        }

        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Configured tool directory for an indexer kind
    pub fn tool_dir(&self, kind: IndexKind) -> &Path {
        match kind {
            IndexKind::D2v => &self.d2vwitch_dir,
            IndexKind::FfIndex => &self.ffmsindex_dir,
        }
    }

    /// Indexing policy for `kind` built from these settings
    pub fn policy_for(&self, kind: IndexKind) -> IndexingPolicy {
        IndexingPolicy {
            reuse: self.re_use_indexing,
            cache_dir: non_empty(self.indexing_dir.clone()),
            tool_dir: non_empty(self.tool_dir(kind).to_path_buf()),
            fallback_tool_dir: non_empty(self.fallback_tool_dir.clone()),
            tool_options: self.indexers.get(kind).options.clone(),
        }
    }
}

fn take_key<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
    slot: &mut T,
    log: &mut LogSink,
) {
    let Some(value) = object.get(key) else {
        return;
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => *slot = parsed,
        Err(e) => log.warn(format!(
            "config key '{}' has the wrong type ({}), using default",
            key, e
        )),
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.re_use_indexing);
        assert_eq!(config.indexing_dir, std::env::temp_dir());
        assert!(config.d2vwitch_dir.as_os_str().is_empty());
        assert_eq!(config.indexers.d2v.options, crate::index::types::D2VWITCH_OPTIONS);
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.re_use_indexing = false;
        config.ffmsindex_dir = PathBuf::from("/opt/ffms");

        let json = serde_json::to_string(&config).unwrap();
        let mut log = LogSink::new();
        let parsed = AppConfig::from_json(&json, &mut log).unwrap();

        assert_eq!(parsed, config);
        assert!(log.is_empty());
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json =
            r#"{"re_use_indexing": false, "indexers": {"d2v": {"options": "--single-input"}}}"#;
        let mut log = LogSink::new();
        let config = AppConfig::from_json(json, &mut log).unwrap();

        assert!(!config.re_use_indexing);
        assert_eq!(config.indexers.d2v.options, "--single-input");
        assert_eq!(config.indexers.d2v.extensions, IndexKind::D2v.default_extensions());
        assert_eq!(config.indexers.ffindex, IndexerSettings::defaults_for(IndexKind::FfIndex));
    }

    #[test]
    fn test_app_config_empty_json() {
        let mut log = LogSink::new();
        let config = AppConfig::from_json("{}", &mut log).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let json = r#"{"re_use_indexing": "yes", "d2vwitch_dir": "/opt/d2v", "indexers": 3}"#;
        let mut log = LogSink::new();
        let config = AppConfig::from_json(json, &mut log).unwrap();

        assert!(config.re_use_indexing);
        assert_eq!(config.d2vwitch_dir, PathBuf::from("/opt/d2v"));
        assert_eq!(config.indexers, IndexerTable::default());
        assert_eq!(log.records().len(), 2);
        assert!(log.contains("re_use_indexing"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut log = LogSink::new();
        assert!(AppConfig::from_json("{not json", &mut log).is_err());
        assert!(AppConfig::from_json("[1, 2]", &mut log).is_err());
    }

    #[test]
    fn test_load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut log = LogSink::new();

        let config = AppConfig::load_from(&path, &mut log).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.is_file());

        let reloaded = AppConfig::load_from(&path, &mut log).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_policy_for_kind() {
        let mut config = AppConfig::default();
        config.indexing_dir = PathBuf::new();
        config.d2vwitch_dir = PathBuf::from("/opt/d2v");

        let policy = config.policy_for(IndexKind::D2v);
        assert_eq!(policy.cache_dir, None);
        assert_eq!(policy.tool_dir, Some(PathBuf::from("/opt/d2v")));
        assert_eq!(policy.tool_options, crate::index::types::D2VWITCH_OPTIONS);

        let policy = config.policy_for(IndexKind::FfIndex);
        assert_eq!(policy.tool_dir, None);
        assert_eq!(policy.tool_options, "-f");
    }
}
