//! JSON file persistence for galaxy boards.
//!
//! # Invariants
//! - A missing file loads as an empty board list.
//! - Saves write a sibling temp file, sync it, then rename over the target.

use super::{Galaxy, GalaxyError};
use crate::config::CoreConfig;
use crate::model::EntityId;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct GalaxyDocument {
    version: u32,
    #[serde(default)]
    galaxies: Vec<Galaxy>,
}

/// Loads and saves every galaxy board as one JSON document.
#[derive(Debug, Clone)]
pub struct GalaxyStore {
    path: PathBuf,
}

impl GalaxyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured `galaxy_path`.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.galaxy_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all boards. Dangling connections are pruned on the way in.
    pub fn load(&self) -> Result<Vec<Galaxy>, GalaxyError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let document: GalaxyDocument = serde_json::from_slice(&bytes)?;
        let mut galaxies = document.galaxies;
        let pruned: usize = galaxies.iter_mut().map(Galaxy::prune_dangling).sum();
        if pruned > 0 {
            warn!(
                "event=galaxy_load module=galaxy status=repaired dangling_connections={}",
                pruned
            );
        }
        Ok(galaxies)
    }

    pub fn save(&self, galaxies: &[Galaxy]) -> Result<(), GalaxyError> {
        let document = GalaxyDocument {
            version: DOCUMENT_VERSION,
            galaxies: galaxies.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        self.write_atomic(&bytes)?;
        info!(
            "event=galaxy_save module=galaxy status=ok galaxies={}",
            galaxies.len()
        );
        Ok(())
    }

    /// Inserts or replaces one board by id.
    pub fn upsert(&self, galaxy: &Galaxy) -> Result<(), GalaxyError> {
        let mut galaxies = self.load()?;
        match galaxies.iter_mut().find(|current| current.id == galaxy.id) {
            Some(current) => *current = galaxy.clone(),
            None => galaxies.push(galaxy.clone()),
        }
        self.save(&galaxies)
    }

    /// Removes one board; returns whether it existed.
    pub fn remove(&self, id: EntityId) -> Result<bool, GalaxyError> {
        let mut galaxies = self.load()?;
        let before = galaxies.len();
        galaxies.retain(|galaxy| galaxy.id != id);
        if galaxies.len() == before {
            return Ok(false);
        }
        self.save(&galaxies)?;
        Ok(true)
    }

    fn write_atomic(&self, data: &[u8]) -> Result<(), GalaxyError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("galaxies.json");
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        let temp_path = parent.join(format!(".{filename}.{nanos}.tmp"));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        let written = file.write_all(data).and_then(|()| file.sync_all());
        drop(file);
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }
}
