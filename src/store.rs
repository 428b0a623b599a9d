//! On-disk store of processor configs.
//!
//! One pretty-printed JSON file per config, named `{id}.json`, all in a single
//! directory. A file whose object has a `processor_ids` key holds a
//! [`CompositeProcessorConfig`]; any other file holds a [`ProcessorConfig`].
//!
//! Listing is lenient: a file that cannot be read or parsed is skipped with a
//! warning so one broken file does not hide the rest. Loading a specific id is
//! strict and reports the parse error.

use crate::processor_config::{CompositeProcessorConfig, ProcessorConfig, ProcessorConfigError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ProcessorConfigError),
    #[error("No stored processor with id '{0}'")]
    NotFound(String),
}

/// Anything the store can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredConfig {
    Single(ProcessorConfig),
    Composite(CompositeProcessorConfig),
}

impl StoredConfig {
    pub fn id(&self) -> &str {
        match self {
            StoredConfig::Single(c) => &c.id,
            StoredConfig::Composite(c) => &c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StoredConfig::Single(c) => &c.name,
            StoredConfig::Composite(c) => &c.name,
        }
    }

    /// Category tag, or `"composite"`.
    pub fn kind(&self) -> &'static str {
        match self {
            StoredConfig::Single(c) => c.category().as_str(),
            StoredConfig::Composite(_) => "composite",
        }
    }

    pub fn to_json(&self) -> Result<String, ProcessorConfigError> {
        match self {
            StoredConfig::Single(c) => c.to_json(),
            StoredConfig::Composite(c) => c.to_json(),
        }
    }

    fn from_value(value: &Value) -> Result<Self, ProcessorConfigError> {
        if CompositeProcessorConfig::is_composite_dict(value) {
            Ok(StoredConfig::Composite(CompositeProcessorConfig::from_dict(value)?))
        } else {
            Ok(StoredConfig::Single(ProcessorConfig::from_dict(value)?))
        }
    }
}

/// Directory of `{id}.json` files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Use `dir` as the store, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `id`. Ids become file names, so path syntax is refused.
    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(ProcessorConfigError::Invalid(format!("'{id}' is not a usable id")).into());
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    pub fn save(&self, config: &ProcessorConfig) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&config.id)?;
        fs::write(&path, config.to_json()?)?;
        log::debug!("Saved processor config {} to {}", config.id, path.display());
        Ok(path)
    }

    pub fn save_composite(&self, config: &CompositeProcessorConfig) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&config.id)?;
        fs::write(&path, config.to_json()?)?;
        log::debug!("Saved composite config {} to {}", config.id, path.display());
        Ok(path)
    }

    pub fn save_stored(&self, config: &StoredConfig) -> Result<PathBuf, StoreError> {
        match config {
            StoredConfig::Single(c) => self.save(c),
            StoredConfig::Composite(c) => self.save_composite(c),
        }
    }

    /// Copy a config file from anywhere into the store under its own id.
    /// An existing config with that id is replaced.
    pub fn import(&self, file: &Path) -> Result<StoredConfig, StoreError> {
        let config = read_config(file)?;
        self.save_stored(&config)?;
        log::info!("Imported {} from {}", config.id(), file.display());
        Ok(config)
    }

    /// Write the config stored under `id` to `file`.
    pub fn export(&self, id: &str, file: &Path) -> Result<(), StoreError> {
        let config = self.load(id)?;
        fs::write(file, config.to_json()?)?;
        Ok(())
    }

    /// Stamp `updated_at` and rewrite the file.
    pub fn update(&self, config: &mut ProcessorConfig) -> Result<PathBuf, StoreError> {
        config.touch();
        self.save(config)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.path_for(id).is_ok_and(|p| p.is_file())
    }

    /// Load the config stored under `id`.
    pub fn load(&self, id: &str) -> Result<StoredConfig, StoreError> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        read_config(&path)
    }

    /// Every readable config, sorted by id.
    pub fn list(&self) -> Result<Vec<StoredConfig>, StoreError> {
        let mut configs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_config(&path) {
                Ok(config) => configs.push(config),
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }
        configs.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(configs)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<StoredConfig, StoreError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text).map_err(ProcessorConfigError::from)?;
    Ok(StoredConfig::from_value(&value)?)
}
