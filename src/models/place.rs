use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{children, Amenity, BaseModel, Entity, Review};
use crate::error::AppResult;
use crate::storage::StorageEngine;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Linked amenities; the database keeps these in `place_amenity`.
    #[serde(default)]
    pub amenity_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

entity!(Place);

impl Place {
    pub fn new(
        city_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            city_id: Some(city_id.into()),
            user_id: Some(user_id.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn reviews<S>(&self, storage: &S) -> AppResult<Vec<Review>>
    where
        S: StorageEngine + ?Sized,
    {
        children(storage, "place_id", self.id())
    }

    pub fn amenities<S>(&self, storage: &S) -> AppResult<Vec<Amenity>>
    where
        S: StorageEngine + ?Sized,
    {
        storage.amenities_of(self)
    }

    pub fn add_amenity(&mut self, amenity: &Amenity) {
        let id = amenity.id();
        if !self.amenity_ids.iter().any(|linked| linked == id) {
            self.amenity_ids.push(id.to_string());
        }
    }
}
