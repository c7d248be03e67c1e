use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::config::{Backend, StorageConfig};
use crate::db_storage::DbStorage;
use crate::error::{AppError, AppResult};
use crate::file_storage::FileStorage;
use crate::models::{Amenity, Kind, Model, Place};

/// Entities keyed by `"<Type>.<id>"`.
pub type Objects = BTreeMap<String, Model>;

/// Operations every storage backend offers.
///
/// The file backend accepts anything; the database backend enforces NOT NULL
/// and foreign keys at `persist` and then needs a `rollback` before reuse.
pub trait StorageEngine: Send + Sync {
    fn register(&self, model: Model) -> AppResult<()>;
    fn persist(&self) -> AppResult<()>;
    fn reload(&self) -> AppResult<()>;
    fn query(&self, kind: Option<Kind>) -> AppResult<Objects>;
    fn delete(&self, model: Option<&Model>) -> AppResult<()>;
    fn close(&self) -> AppResult<()>;
    fn rollback(&self) -> AppResult<()>;

    /// Entities of `kind` whose `foreign_key` equals `parent_id`.
    fn children(&self, kind: Kind, foreign_key: &str, parent_id: &str) -> AppResult<Vec<Model>>;

    fn amenities_of(&self, place: &Place) -> AppResult<Vec<Amenity>>;

    fn get(&self, kind: Kind, id: &str) -> AppResult<Option<Model>> {
        Ok(self.query(Some(kind))?.remove(&format!("{kind}.{id}")))
    }

    fn count(&self, kind: Option<Kind>) -> AppResult<usize> {
        Ok(self.query(kind)?.len())
    }
}

/// The backend chosen by configuration.
pub enum Storage {
    File(FileStorage),
    Db(DbStorage),
}

impl Storage {
    pub fn open(config: &StorageConfig) -> AppResult<Self> {
        match config.backend {
            Backend::File => Ok(Storage::File(FileStorage::new(&config.file_path))),
            Backend::Db => {
                let db = config
                    .db
                    .as_ref()
                    .ok_or(AppError::MissingConfig("HBNB_DB_NAME"))?;
                Ok(Storage::Db(DbStorage::open(db, config.is_test_env())?))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Storage::File(_) => Backend::File,
            Storage::Db(_) => Backend::Db,
        }
    }

    fn engine(&self) -> &dyn StorageEngine {
        match self {
            Storage::File(file) => file,
            Storage::Db(db) => db,
        }
    }
}

impl StorageEngine for Storage {
    fn register(&self, model: Model) -> AppResult<()> {
        self.engine().register(model)
    }

    fn persist(&self) -> AppResult<()> {
        self.engine().persist()
    }

    fn reload(&self) -> AppResult<()> {
        self.engine().reload()
    }

    fn query(&self, kind: Option<Kind>) -> AppResult<Objects> {
        self.engine().query(kind)
    }

    fn delete(&self, model: Option<&Model>) -> AppResult<()> {
        self.engine().delete(model)
    }

    fn close(&self) -> AppResult<()> {
        self.engine().close()
    }

    fn rollback(&self) -> AppResult<()> {
        self.engine().rollback()
    }

    fn children(&self, kind: Kind, foreign_key: &str, parent_id: &str) -> AppResult<Vec<Model>> {
        self.engine().children(kind, foreign_key, parent_id)
    }

    fn amenities_of(&self, place: &Place) -> AppResult<Vec<Amenity>> {
        self.engine().amenities_of(place)
    }
}

// Global storage instance
static STORAGE: OnceLock<Storage> = OnceLock::new();

/// Opens the configured backend, loads it and installs it for the process.
pub fn init_storage(config: &StorageConfig) -> AppResult<&'static Storage> {
    let storage = Storage::open(config)?;
    storage.reload()?;
    STORAGE
        .set(storage)
        .map_err(|_| AppError::Internal("Storage already initialized".into()))?;
    tracing::info!(backend = ?config.backend, "storage initialized");
    get_storage()
}

pub fn get_storage() -> AppResult<&'static Storage> {
    STORAGE
        .get()
        .ok_or_else(|| AppError::Internal("Storage not initialized".into()))
}
