use std::env;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

const DEFAULT_FILE_PATH: &str = "file.json";
const DEFAULT_DB_HOST: &str = "localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    Db,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Opened as a path by the embedded engine; `:memory:` keeps it in RAM.
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: Backend,
    pub file_path: PathBuf,
    pub db: Option<DbConfig>,
    pub env: Option<String>,
}

impl StorageConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("HBNB_TYPE_STORAGE").as_deref() {
            Some("db") => Backend::Db,
            _ => Backend::File,
        };

        let file_path = lookup("HBNB_FILE_PATH")
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_PATH.to_string())
            .into();

        let db = match backend {
            Backend::File => None,
            Backend::Db => Some(DbConfig {
                host: lookup("HBNB_DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                user: lookup("HBNB_DB_USER"),
                password: lookup("HBNB_DB_PWD"),
                name: lookup("HBNB_DB_NAME")
                    .filter(|name| !name.is_empty())
                    .ok_or(AppError::MissingConfig("HBNB_DB_NAME"))?,
            }),
        };

        Ok(Self {
            backend,
            file_path,
            db,
            env: lookup("HBNB_ENV"),
        })
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File,
            file_path: path.into(),
            db: None,
            env: None,
        }
    }

    pub fn is_test_env(&self) -> bool {
        self.env.as_deref() == Some("test")
    }
}
