use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::config::{CONFIG_FILE, Config};
use crate::error::Result;
use crate::store::Store;

pub const DB_FILE: &str = "revu.db";

/// Default base directory for all revu storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".revu")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// The data directory: the review database plus its configuration.
pub struct ReviewStore {
    base_dir: PathBuf,
    config: Config,
    store: Store,
}

impl ReviewStore {
    /// Open (creating if needed) the data directory at `base_dir`, or the
    /// default location when `None`.
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let base_dir = base_dir.map(Path::to_path_buf).unwrap_or_else(default_base_dir);
        fs::create_dir_all(&base_dir)?;

        let config = Config::load(&base_dir.join(CONFIG_FILE))?;
        let store = Store::open(&base_dir.join(DB_FILE))?;
        tracing::info!("opened review store at {}", base_dir.display());

        Ok(Self {
            base_dir,
            config,
            store,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
