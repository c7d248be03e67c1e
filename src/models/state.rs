use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{children, BaseModel, City, Entity};
use crate::error::AppResult;
use crate::storage::StorageEngine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

entity!(State);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn cities<S>(&self, storage: &S) -> AppResult<Vec<City>>
    where
        S: StorageEngine + ?Sized,
    {
        children(storage, "state_id", self.id())
    }
}
