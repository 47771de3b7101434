use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 17020;
pub const DEFAULT_EXPORT_DIR: &str = "./stackforge-export";

pub const DB_PATH_ENV: &str = "STACKFORGE_DB_PATH";
pub const PORT_ENV: &str = "STACKFORGE_PORT";
pub const EXPORT_DIR_ENV: &str = "STACKFORGE_EXPORT_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` means the platform data directory.
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            port: DEFAULT_PORT,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(DB_PATH_ENV) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(port) = get(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, port))?;
        }
        if let Some(dir) = get(EXPORT_DIR_ENV) {
            config.export_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn open_database(&self) -> Result<crate::db::Database> {
        let db = match &self.db_path {
            Some(path) => crate::db::Database::open(path.clone())?,
            None => crate::db::Database::open_default()?,
        };
        db.migrate()?;
        Ok(db)
    }
}
