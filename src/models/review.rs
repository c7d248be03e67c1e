use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::BaseModel;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

entity!(Review);

impl Review {
    pub fn new(
        text: impl Into<String>,
        place_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            text: Some(text.into()),
            place_id: Some(place_id.into()),
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }
}
