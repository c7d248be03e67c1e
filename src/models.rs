use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::storage::StorageEngine;

/// Key naming the concrete type inside a serialized mapping.
pub const CLASS_KEY: &str = "__class__";

macro_rules! entity {
    ($ty:ident) => {
        impl crate::models::Entity for $ty {
            const KIND: crate::models::Kind = crate::models::Kind::$ty;

            fn base(&self) -> &crate::models::BaseModel {
                &self.base
            }

            fn base_mut(&mut self) -> &mut crate::models::BaseModel {
                &mut self.base
            }

            fn from_model(model: crate::models::Model) -> Option<Self> {
                match model {
                    crate::models::Model::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for crate::models::Model {
            fn from(value: $ty) -> Self {
                crate::models::Model::$ty(value)
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.base == other.base
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.base, state);
            }
        }
    };
}

mod amenity;
mod base;
mod city;
mod place;
mod review;
mod state;
mod user;

pub use amenity::Amenity;
pub use base::{next_timestamp, timestamp, BaseModel};
pub use city::City;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    State,
    City,
    User,
    Place,
    Review,
    Amenity,
}

impl Kind {
    /// Parents come before the kinds that reference them.
    pub const ALL: [Kind; 6] = [
        Kind::State,
        Kind::City,
        Kind::User,
        Kind::Amenity,
        Kind::Place,
        Kind::Review,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kind::State => "State",
            Kind::City => "City",
            Kind::User => "User",
            Kind::Place => "Place",
            Kind::Review => "Review",
            Kind::Amenity => "Amenity",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Kind::State => "states",
            Kind::City => "cities",
            Kind::User => "users",
            Kind::Place => "places",
            Kind::Review => "reviews",
            Kind::Amenity => "amenities",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AppError::UnknownClass(s.to_string()))
    }
}

/// Behaviour shared by the concrete entity types.
pub trait Entity: Clone + Serialize + DeserializeOwned + Into<Model> {
    const KIND: Kind;

    fn base(&self) -> &BaseModel;
    fn base_mut(&mut self) -> &mut BaseModel;
    fn from_model(model: Model) -> Option<Self>;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn key(&self) -> String {
        format!("{}.{}", Self::KIND, self.id())
    }

    /// Rebuilds an entity, keeping `id` and timestamps when the mapping has them.
    fn from_map(mut map: Map<String, Value>) -> AppResult<Self> {
        map.remove(CLASS_KEY);
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    fn to_map(&self) -> Map<String, Value> {
        // Entities are structs with string keys, so they always serialize to an object.
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            other => {
                tracing::error!(
                    "{} {} did not serialize to an object: {:?}",
                    Self::KIND,
                    self.id(),
                    other
                );
                Map::new()
            }
        };
        map.insert(CLASS_KEY.to_string(), Value::String(Self::KIND.to_string()));
        map
    }

    /// Refreshes `updated_at`, registers with `storage` and persists it.
    fn save<S>(&mut self, storage: &S) -> AppResult<()>
    where
        S: StorageEngine + ?Sized,
    {
        self.base_mut().touch();
        storage.register(self.clone().into())?;
        storage.persist()
    }

    fn delete<S>(&self, storage: &S) -> AppResult<()>
    where
        S: StorageEngine + ?Sized,
    {
        storage.delete(Some(&self.clone().into()))
    }
}

/// An entity of any kind, as held by the stores.
#[derive(Debug, Clone)]
pub enum Model {
    State(State),
    City(City),
    User(User),
    Place(Place),
    Review(Review),
    Amenity(Amenity),
}

impl Model {
    /// Builds a fresh entity; identity and timestamps in `attributes` are ignored.
    pub fn new(kind: Kind, mut attributes: Map<String, Value>) -> AppResult<Self> {
        for reserved in ["id", "created_at", "updated_at"] {
            attributes.remove(reserved);
        }
        let mut model = Self::from_kind_map(kind, attributes)?;
        *model.base_mut() = BaseModel::new();
        Ok(model)
    }

    /// Rebuilds an entity from a serialized mapping, dispatching on `__class__`.
    pub fn from_map(mut map: Map<String, Value>) -> AppResult<Self> {
        let kind = match map.remove(CLASS_KEY) {
            Some(Value::String(class)) => class.parse::<Kind>()?,
            Some(other) => return Err(AppError::UnknownClass(other.to_string())),
            None => return Err(AppError::UnknownClass(format!("missing {CLASS_KEY}"))),
        };
        Self::from_kind_map(kind, map)
    }

    pub fn from_kind_map(kind: Kind, map: Map<String, Value>) -> AppResult<Self> {
        Ok(match kind {
            Kind::State => State::from_map(map)?.into(),
            Kind::City => City::from_map(map)?.into(),
            Kind::User => User::from_map(map)?.into(),
            Kind::Place => Place::from_map(map)?.into(),
            Kind::Review => Review::from_map(map)?.into(),
            Kind::Amenity => Amenity::from_map(map)?.into(),
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Model::State(_) => Kind::State,
            Model::City(_) => Kind::City,
            Model::User(_) => Kind::User,
            Model::Place(_) => Kind::Place,
            Model::Review(_) => Kind::Review,
            Model::Amenity(_) => Kind::Amenity,
        }
    }

    pub fn base(&self) -> &BaseModel {
        match self {
            Model::State(inner) => inner.base(),
            Model::City(inner) => inner.base(),
            Model::User(inner) => inner.base(),
            Model::Place(inner) => inner.base(),
            Model::Review(inner) => inner.base(),
            Model::Amenity(inner) => inner.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseModel {
        match self {
            Model::State(inner) => inner.base_mut(),
            Model::City(inner) => inner.base_mut(),
            Model::User(inner) => inner.base_mut(),
            Model::Place(inner) => inner.base_mut(),
            Model::Review(inner) => inner.base_mut(),
            Model::Amenity(inner) => inner.base_mut(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn key(&self) -> String {
        format!("{}.{}", self.kind(), self.id())
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match self {
            Model::State(inner) => inner.to_map(),
            Model::City(inner) => inner.to_map(),
            Model::User(inner) => inner.to_map(),
            Model::Place(inner) => inner.to_map(),
            Model::Review(inner) => inner.to_map(),
            Model::Amenity(inner) => inner.to_map(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.to_map().remove(name)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

impl Eq for Model {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = self.to_map();
        map.remove(CLASS_KEY);
        write!(f, "[{}] ({}) {}", self.kind(), self.id(), Value::Object(map))
    }
}

/// Children of `parent_id` through `foreign_key`, typed.
pub(crate) fn children<T, S>(storage: &S, foreign_key: &str, parent_id: &str) -> AppResult<Vec<T>>
where
    T: Entity,
    S: StorageEngine + ?Sized,
{
    Ok(storage
        .children(T::KIND, foreign_key, parent_id)?
        .into_iter()
        .filter_map(T::from_model)
        .collect())
}
