//! Flash storage adapter.
//!
//! Implements [`StoragePort`], [`SettingsPort`] and [`ConfigPort`] over one
//! of two backends:
//!
//! - **Directory**: `<root>/<namespace>/<key>` files.  On ESP-IDF the root
//!   is the mounted `/fs` partition; on a host it is any directory.
//! - **Memory**: a shared map, for tests and simulation.
//!
//! # Durability
//!
//! - Validation: settings and config are range-checked before persistence.
//! - Atomic writes: each blob is written to `<key>.tmp`, synced, then
//!   renamed over the old one.  A power cut leaves either blob intact.
//! - Namespace isolation: each subsystem uses its own directory.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};

use crate::app::ports::{
    ConfigError, ConfigPort, SettingsError, SettingsPort, StorageError, StoragePort,
};
use crate::config::NodeConfig;
use crate::settings::SettingsBlock;

const SETTINGS_NAMESPACE: &str = "settings";
const SETTINGS_KEY: &str = "radio_cb";
const CONFIG_NAMESPACE: &str = "node";
const CONFIG_KEY: &str = "config";

/// Upper bound on a single blob.
const MAX_BLOB_SIZE: usize = 4000;

/// Environment override for the host storage root.
pub const FS_ROOT_ENV: &str = "MESHNODE_FS_ROOT";

/// Where the node's filesystem is mounted.
#[cfg(target_os = "espidf")]
pub fn default_root() -> PathBuf {
    PathBuf::from("/fs")
}

/// Where the node's filesystem is mounted.
#[cfg(not(target_os = "espidf"))]
pub fn default_root() -> PathBuf {
    std::env::var_os(FS_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./fs"))
}

type MemoryMap = Arc<Mutex<HashMap<String, Vec<u8>>>>;

#[derive(Debug, Clone)]
enum Backend {
    Memory(MemoryMap),
    Directory(PathBuf),
}

/// Namespaced blob store.  Clones share the same backing storage.
#[derive(Debug, Clone)]
pub struct FlashStore {
    backend: Backend,
}

impl FlashStore {
    /// Volatile store, empty on creation.
    pub fn in_memory() -> Self {
        info!("FlashStore: memory backend");
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    /// Directory-backed store rooted at `root`, created if missing.
    pub fn mount(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!("FlashStore: mounted at {}", root.display());
        Ok(Self {
            backend: Backend::Directory(root),
        })
    }

    /// Root directory, if directory-backed.
    pub fn root(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Directory(root) => Some(root),
            Backend::Memory(_) => None,
        }
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    fn blob_path(root: &Path, namespace: &str, key: &str) -> Result<PathBuf, StorageError> {
        for part in [namespace, key] {
            if part.is_empty() || part.contains(['/', '\\']) || part.starts_with('.') {
                return Err(StorageError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("bad storage name \"{}\"", part),
                )));
            }
        }
        Ok(root.join(namespace).join(key))
    }
}

fn lock_map(map: &MemoryMap) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StoragePort for FlashStore {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        match &self.backend {
            Backend::Memory(map) => lock_map(map)
                .get(&Self::composite_key(namespace, key))
                .cloned()
                .ok_or(StorageError::NotFound),
            Backend::Directory(root) => {
                let path = Self::blob_path(root, namespace, key)?;
                Ok(fs::read(path)?)
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        match &self.backend {
            Backend::Memory(map) => {
                lock_map(map).insert(Self::composite_key(namespace, key), data.to_vec());
            }
            Backend::Directory(root) => {
                let path = Self::blob_path(root, namespace, key)?;
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir)?;
                }
                let tmp = path.with_extension("tmp");
                {
                    let mut file = fs::File::create(&tmp)?;
                    file.write_all(data)?;
                    file.sync_all()?;
                }
                fs::rename(&tmp, &path)?;
            }
        }
        debug!("FlashStore: wrote {}/{} ({} bytes)", namespace, key, data.len());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Memory(map) => {
                lock_map(map).remove(&Self::composite_key(namespace, key));
                Ok(())
            }
            Backend::Directory(root) => {
                let path = Self::blob_path(root, namespace, key)?;
                match fs::remove_file(path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        match &self.backend {
            Backend::Memory(map) => {
                lock_map(map).contains_key(&Self::composite_key(namespace, key))
            }
            Backend::Directory(root) => Self::blob_path(root, namespace, key)
                .map(|p| p.is_file())
                .unwrap_or(false),
        }
    }
}

impl SettingsPort for FlashStore {
    fn load_settings(&self) -> Result<SettingsBlock, SettingsError> {
        match self.read(SETTINGS_NAMESPACE, SETTINGS_KEY) {
            Ok(bytes) => {
                let block: SettingsBlock =
                    postcard::from_bytes(&bytes).map_err(|_| SettingsError::Corrupted)?;
                block.validate()?;
                info!("FlashStore: loaded settings");
                Ok(block)
            }
            Err(StorageError::NotFound) => {
                info!("FlashStore: no stored settings, using defaults");
                Ok(SettingsBlock::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_settings(&mut self, settings: &SettingsBlock) -> Result<(), SettingsError> {
        settings.validate()?;
        let bytes = postcard::to_allocvec(settings).map_err(|_| SettingsError::Corrupted)?;
        self.write(SETTINGS_NAMESPACE, SETTINGS_KEY, &bytes)?;
        debug!("FlashStore: settings saved");
        Ok(())
    }
}

impl ConfigPort for FlashStore {
    fn load_config(&self) -> Result<NodeConfig, ConfigError> {
        match self.read(CONFIG_NAMESPACE, CONFIG_KEY) {
            Ok(bytes) => {
                let cfg: NodeConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("FlashStore: loaded config");
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("FlashStore: no stored config, using defaults");
                Ok(NodeConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_config(&mut self, config: &NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;
        self.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)?;
        info!("FlashStore: config saved");
        Ok(())
    }
}
