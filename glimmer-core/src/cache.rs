use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Persisted per-provider cache.
///
/// One JSON file holding a mapping from provider identity to whatever that
/// provider chose to cache (application entries, bookmark tables). The file
/// is an implementation-private optimization, not a contract: a missing or
/// corrupt file, or an unknown key, triggers regeneration from source via
/// the builder, and a builder that finds nothing yields an empty dataset
/// rather than a startup failure.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::cache_dir().context("no cache directory for this user")?;
        Ok(base.join("glimmer").join("providers.json"))
    }

    /// Return the cached value under `key`, or build, persist and return a
    /// fresh one.
    pub fn load_or_build<T, F>(&self, key: &str, build: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let mut map = self.read_map();

        if let Some(value) = map.get(key) {
            match serde_json::from_value(value.clone()) {
                Ok(cached) => {
                    debug!("loaded '{key}' from cache");
                    return cached;
                }
                Err(err) => {
                    warn!("cached '{key}' is unreadable, rebuilding: {err}");
                }
            }
        }

        debug!("building '{key}' cache");
        let built = build();
        match serde_json::to_value(&built) {
            Ok(value) => {
                map.insert(key.to_string(), value);
                if let Err(err) = self.write_map(&map) {
                    warn!("could not persist '{key}' cache: {err:#}");
                }
            }
            Err(err) => warn!("could not serialize '{key}' cache: {err}"),
        }
        built
    }

    /// Remove the cache file. Providers rebuilt afterwards regenerate their
    /// data from source.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("could not remove {}", self.path.display()))
            }
        }
    }

    fn read_map(&self) -> Map<String, Value> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(err) => {
                warn!("could not read cache at {}: {err}", self.path.display());
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("cache at {} is corrupt, regenerating", self.path.display());
                Map::new()
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(map)?)?;
        Ok(())
    }
}
