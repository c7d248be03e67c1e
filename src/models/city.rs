use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{children, BaseModel, Entity, Place};
use crate::error::AppResult;
use crate::storage::StorageEngine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

entity!(City);

impl City {
    pub fn new(name: impl Into<String>, state_id: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            state_id: Some(state_id.into()),
            ..Self::default()
        }
    }

    pub fn places<S>(&self, storage: &S) -> AppResult<Vec<Place>>
    where
        S: StorageEngine + ?Sized,
    {
        children(storage, "city_id", self.id())
    }
}
