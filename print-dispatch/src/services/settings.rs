//! Local settings store
//!
//! 本地打印设置：选中的打印机、自动打印开关、餐厅名称。
//! Read synchronously before every transport call, persisted as JSON.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Restaurant name printed when none is configured
pub const DEFAULT_RESTAURANT_NAME: &str = "OSHXONA";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// 打印设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintSettings {
    pub selected_printer: Option<String>,
    pub auto_print: bool,
    pub restaurant_name: String,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            selected_printer: None,
            auto_print: true,
            restaurant_name: DEFAULT_RESTAURANT_NAME.to_string(),
        }
    }
}

/// Settings store backed by an optional JSON file
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: RwLock<PrintSettings>,
}

impl SettingsStore {
    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let raw = std::fs::read(&path)?;
            serde_json::from_slice(&raw)?
        } else {
            tracing::info!(path = %path.display(), "No settings file, using defaults");
            PrintSettings::default()
        };

        Ok(Self {
            path: Some(path),
            current: RwLock::new(settings),
        })
    }

    /// Non-persistent store (tests, embedded use)
    pub fn in_memory(settings: PrintSettings) -> Self {
        Self {
            path: None,
            current: RwLock::new(settings),
        }
    }

    pub fn get(&self) -> PrintSettings {
        self.current.read().clone()
    }

    /// Replace settings, writing through to disk first.
    pub fn update(&self, settings: PrintSettings) -> SettingsResult<()> {
        if let Some(path) = &self.path {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(path, serde_json::to_vec_pretty(&settings)?)?;
        }
        *self.current.write() = settings;
        Ok(())
    }

    pub fn select_printer(&self, printer: impl Into<String>) -> SettingsResult<()> {
        let mut settings = self.get();
        settings.selected_printer = Some(printer.into());
        self.update(settings)
    }
}
