use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{children, BaseModel, Entity, Place, Review};
use crate::error::AppResult;
use crate::storage::StorageEngine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

entity!(User);

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn places<S>(&self, storage: &S) -> AppResult<Vec<Place>>
    where
        S: StorageEngine + ?Sized,
    {
        children(storage, "user_id", self.id())
    }

    pub fn reviews<S>(&self, storage: &S) -> AppResult<Vec<Review>>
    where
        S: StorageEngine + ?Sized,
    {
        children(storage, "user_id", self.id())
    }
}
