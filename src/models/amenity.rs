use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::BaseModel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

entity!(Amenity);

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}
