//! Persistence of the active [`WeatherRegion`].

use crate::types::region::WeatherRegion;
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::task;

const CONFIG_DIR_NAME: &str = "aviwx";
const REGION_FILE_NAME: &str = "region.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to determine configuration directory")]
    ConfigDirResolution,

    #[error("Failed to read region file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write region file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Region file '{0}' is not valid")]
    Parse(PathBuf, #[source] serde_json::Error),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// The stored region, kept as `region.json` in a configuration directory.
#[derive(Debug, Clone)]
pub struct RegionConfig {
    path: PathBuf,
}

impl RegionConfig {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(REGION_FILE_NAME),
        }
    }

    /// Uses `aviwx` inside the platform configuration directory.
    pub fn default_location() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::ConfigDirResolution)?;
        Ok(Self::new(&dir.join(CONFIG_DIR_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured region, `None` when none has been saved.
    pub async fn load(&self) -> Result<Option<WeatherRegion>, ConfigError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No region configured at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(ConfigError::Read(self.path.clone(), e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ConfigError::Parse(self.path.clone(), e))
    }

    /// Stores `region`, replacing the file atomically.
    pub async fn save(&self, region: &WeatherRegion) -> Result<(), ConfigError> {
        let path = self.path.clone();
        let region = *region;
        task::spawn_blocking(move || write_region(&path, &region)).await??;
        info!(
            "Saved region ({}, {}) r={} km to {}",
            region.latitude,
            region.longitude,
            region.radius_km,
            self.path.display()
        );
        Ok(())
    }

    /// Removes the stored region. Clearing an absent region is not an error.
    pub async fn clear(&self) -> Result<(), ConfigError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::Write(self.path.clone(), e)),
        }
    }
}

fn write_region(path: &Path, region: &WeatherRegion) -> Result<(), ConfigError> {
    let write_error = |e: std::io::Error| ConfigError::Write(path.to_path_buf(), e);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(write_error)?;

    let json = serde_json::to_vec_pretty(region).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(&json).map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
