use serde::{Deserialize, Serialize};

use super::defaults;

/// Model persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit model root. When unset, conventional install directories are searched.
    pub root: Option<String>,
    /// Backup directories retained after pruning.
    pub max_backups: usize,
    /// Copy the current model files aside before every save.
    pub backup_before_save: bool,
    /// Gzip model files on disk. Plain files still load either way.
    pub compress_models: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_backups: defaults::DEFAULT_MAX_BACKUPS,
            backup_before_save: true,
            compress_models: defaults::DEFAULT_COMPRESS_MODELS,
        }
    }
}
