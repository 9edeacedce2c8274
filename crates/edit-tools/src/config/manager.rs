//! Loading and saving editor settings

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::EditorSettings;

/// Shared configuration manager type
pub type SharedConfig = Arc<RwLock<ConfigManager>>;

/// Configuration error types
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Owns the editor settings and, when file-backed, the file they persist to
pub struct ConfigManager {
    settings: EditorSettings,
    /// `None` for in-memory settings, which are never written
    config_path: Option<PathBuf>,
    dirty: bool,
}

impl ConfigManager {
    /// Load from the OS config directory, or use defaults
    pub fn new() -> Self {
        Self::from_path(Self::default_path())
    }

    /// Load from `path`, or use defaults when it is missing or unparsable
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let settings = match Self::load_from_path(&config_path) {
            Ok(settings) => settings,
            Err(ConfigError::Io(_)) => {
                tracing::info!("No settings file found, using defaults");
                EditorSettings::default()
            }
            Err(e) => {
                tracing::warn!("Failed to parse settings file: {}", e);
                EditorSettings::default()
            }
        };

        Self {
            settings,
            config_path: Some(config_path),
            dirty: false,
        }
    }

    /// In-memory settings; `save` leaves the disk alone
    pub fn with_settings(settings: EditorSettings) -> Self {
        Self {
            settings,
            config_path: None,
            dirty: false,
        }
    }

    fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("edit-tools")
            .join("settings.ron")
    }

    fn load_from_path(path: &Path) -> Result<EditorSettings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let settings =
            ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Mutable access, marks the settings dirty
    pub fn settings_mut(&mut self) -> &mut EditorSettings {
        self.dirty = true;
        &mut self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the settings were loaded from, and save to, a file
    pub fn is_persistent(&self) -> bool {
        self.config_path.is_some()
    }

    /// Write the settings back if they changed and are file-backed
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(config_path) = &self.config_path else {
            tracing::debug!("In-memory settings, nothing to save");
            return Ok(());
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = ron::ser::to_string_pretty(&self.settings, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(config_path, &content).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::info!("Saved settings to {:?}", config_path);
        self.dirty = false;
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        self.settings = EditorSettings::default();
        self.dirty = true;
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a shared manager around the given in-memory settings
pub fn create_shared_config(settings: EditorSettings) -> SharedConfig {
    Arc::new(RwLock::new(ConfigManager::with_settings(settings)))
}

/// Create a shared manager backed by the settings file at `path`
pub fn load_shared_config(path: impl Into<PathBuf>) -> SharedConfig {
    Arc::new(RwLock::new(ConfigManager::from_path(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformSpace;

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.ron");

        let mut manager = ConfigManager::from_path(&path);
        assert!(!manager.is_dirty());
        manager.settings_mut().snaps_enabled = true;
        manager.settings_mut().transform_space = TransformSpace::Local;
        manager.save().unwrap();
        assert!(!manager.is_dirty());

        let reloaded = ConfigManager::from_path(&path);
        assert!(reloaded.settings().snaps_enabled);
        assert_eq!(reloaded.settings().transform_space, TransformSpace::Local);
    }

    #[test]
    fn test_unparsable_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "not ron at all {").unwrap();

        let manager = ConfigManager::from_path(&path);
        assert_eq!(manager.settings(), &EditorSettings::default());
    }

    #[test]
    fn test_in_memory_settings_are_not_written() {
        let mut manager = ConfigManager::with_settings(EditorSettings::default());
        manager.settings_mut().snaps_enabled = true;
        manager.save().unwrap();

        assert!(!manager.is_persistent());
        assert!(manager.config_file_path().is_none());
        assert!(manager.is_dirty());
    }

    #[test]
    fn test_save_skips_clean_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");

        let mut manager = ConfigManager::from_path(&path);
        manager.save().unwrap();
        assert!(!path.exists());
    }
}
