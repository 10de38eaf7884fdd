use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the platform data directory when set.
pub const DATA_DIR_ENV: &str = "PURSESH_DATA_DIR";

pub struct Config {
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub log_file: PathBuf,
    pub export_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("com", "pursesh", "pursesh")
                .context("unable to locate a config directory")?
                .data_dir()
                .to_path_buf(),
        };
        Ok(Self::with_data_dir(data_dir))
    }

    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            backup_dir: data_dir.join("backups"),
            log_file: data_dir.join("pursesh.log"),
            export_file: data_dir.join("expenses.csv"),
            data_dir,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("creating {:?}", self.data_dir))?;
        fs::create_dir_all(&self.backup_dir)
            .with_context(|| format!("creating {:?}", self.backup_dir))?;
        Ok(())
    }
}
