use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::models::{Amenity, Entity, Kind, Model, Place};
use crate::storage::{Objects, StorageEngine};

pub type SharedObjects = Arc<Mutex<Objects>>;

static SHARED_OBJECTS: OnceLock<SharedObjects> = OnceLock::new();

/// The mapping every `FileStorage::new` instance works on.
pub fn shared_objects() -> SharedObjects {
    SHARED_OBJECTS
        .get_or_init(|| Arc::new(Mutex::new(Objects::new())))
        .clone()
}

/// Keeps entities in memory and mirrors them into a single JSON file.
pub struct FileStorage {
    path: PathBuf,
    objects: SharedObjects,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_objects(path, shared_objects())
    }

    /// A store with its own mapping, not visible to other instances.
    pub fn detached(path: impl AsRef<Path>) -> Self {
        Self::with_objects(path, Arc::new(Mutex::new(Objects::new())))
    }

    pub fn with_objects(path: impl AsRef<Path>, objects: SharedObjects) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            objects,
        }
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Objects>> {
        self.objects
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".into()))
    }
}

impl StorageEngine for FileStorage {
    fn register(&self, model: Model) -> AppResult<()> {
        let key = model.key();
        tracing::debug!(%key, "registering object");
        self.lock()?.insert(key, model);
        Ok(())
    }

    fn persist(&self) -> AppResult<()> {
        let document: Map<String, Value> = self
            .lock()?
            .iter()
            .map(|(key, model)| (key.clone(), Value::Object(model.to_map())))
            .collect();
        let content = serde_json::to_string(&document)?;
        std::fs::write(&self.path, content)?;
        tracing::info!("Persisted {} objects to {:?}", document.len(), self.path);
        Ok(())
    }

    fn reload(&self) -> AppResult<()> {
        if !self.path.exists() {
            tracing::debug!("No storage file at {:?}, nothing to reload", self.path);
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let document: Map<String, Value> = serde_json::from_str(&content)?;

        let mut loaded = Vec::with_capacity(document.len());
        for (_, value) in document {
            let map: Map<String, Value> = serde_json::from_value(value)?;
            loaded.push(Model::from_map(map)?);
        }

        let count = loaded.len();
        let mut objects = self.lock()?;
        for model in loaded {
            objects.insert(model.key(), model);
        }
        tracing::info!("Reloaded {} objects from {:?}", count, self.path);
        Ok(())
    }

    fn query(&self, kind: Option<Kind>) -> AppResult<Objects> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(_, model)| kind.map_or(true, |kind| model.kind() == kind))
            .map(|(key, model)| (key.clone(), model.clone()))
            .collect())
    }

    fn delete(&self, model: Option<&Model>) -> AppResult<()> {
        if let Some(model) = model {
            if self.lock()?.remove(&model.key()).is_some() {
                tracing::debug!(key = %model.key(), "deleted object");
            }
        }
        Ok(())
    }

    fn close(&self) -> AppResult<()> {
        self.reload()
    }

    fn rollback(&self) -> AppResult<()> {
        Ok(())
    }

    fn children(&self, kind: Kind, foreign_key: &str, parent_id: &str) -> AppResult<Vec<Model>> {
        Ok(self
            .query(Some(kind))?
            .into_values()
            .filter(|model| {
                model.attribute(foreign_key).as_ref().and_then(Value::as_str) == Some(parent_id)
            })
            .collect())
    }

    fn amenities_of(&self, place: &Place) -> AppResult<Vec<Amenity>> {
        Ok(self
            .query(Some(Kind::Amenity))?
            .into_values()
            .filter_map(Amenity::from_model)
            .filter(|amenity| place.amenity_ids.iter().any(|id| id == amenity.id()))
            .collect())
    }
}
