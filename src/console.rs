use clap::{Parser, Subcommand};
use serde_json::{Map, Number, Value};

use crate::error::{AppError, AppResult};
use crate::models::{Kind, Model, CLASS_KEY};
use crate::storage::StorageEngine;

const RESERVED: [&str; 4] = ["id", "created_at", "updated_at", CLASS_KEY];

/// HBnB console: manage objects in the configured storage
#[derive(Parser, Debug)]
#[command(name = "hbnb")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an object, e.g. `create Place name="My_house" number_rooms=4`
    Create { class: String, params: Vec<String> },
    /// Print one object
    Show { class: String, id: String },
    /// Print every object, or every object of one class
    All { class: Option<String> },
    /// Count the objects of one class
    Count { class: String },
    /// Set one attribute and save
    Update {
        class: String,
        id: String,
        attribute: String,
        value: String,
    },
    /// Delete an object
    Destroy { class: String, id: String },
}

pub fn execute<S>(command: &Command, storage: &S) -> AppResult<String>
where
    S: StorageEngine + ?Sized,
{
    match command {
        Command::Create { class, params } => {
            let kind = class.parse::<Kind>()?;
            let attributes: Map<String, Value> =
                params.iter().filter_map(|param| parse_param(param)).collect();
            let model = Model::new(kind, attributes)?;
            let id = model.id().to_string();
            storage.register(model)?;
            storage.persist()?;
            Ok(id)
        }
        Command::Show { class, id } => Ok(find(storage, class, id)?.to_string()),
        Command::All { class } => {
            let kind = class.as_deref().map(str::parse::<Kind>).transpose()?;
            Ok(storage
                .query(kind)?
                .values()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Count { class } => {
            let kind = class.parse::<Kind>()?;
            Ok(storage.count(Some(kind))?.to_string())
        }
        Command::Update {
            class,
            id,
            attribute,
            value,
        } => {
            if RESERVED.contains(&attribute.as_str()) {
                return Err(AppError::InvalidArgument(format!(
                    "{attribute} cannot be updated"
                )));
            }
            let model = find(storage, class, id)?;
            let mut map = model.to_map();
            let value = parse_value(value).unwrap_or_else(|| Value::String(value.clone()));
            map.insert(attribute.clone(), value);
            let mut updated = Model::from_map(map)?;
            updated.base_mut().touch();
            storage.register(updated)?;
            storage.persist()?;
            Ok(String::new())
        }
        Command::Destroy { class, id } => {
            let model = find(storage, class, id)?;
            storage.delete(Some(&model))?;
            storage.persist()?;
            Ok(String::new())
        }
    }
}

fn find<S>(storage: &S, class: &str, id: &str) -> AppResult<Model>
where
    S: StorageEngine + ?Sized,
{
    let kind = class.parse::<Kind>()?;
    storage
        .get(kind, id)?
        .ok_or_else(|| AppError::NotFound(format!("{kind}.{id}")))
}

/// Parses `key=value`; `None` when the pair is malformed.
pub fn parse_param(param: &str) -> Option<(String, Value)> {
    let (key, raw) = param.split_once('=')?;
    if key.is_empty() || RESERVED.contains(&key) {
        return None;
    }
    Some((key.to_string(), parse_value(raw)?))
}

/// `"quoted"` strings (underscores become spaces), floats, then integers.
pub fn parse_value(raw: &str) -> Option<Value> {
    if let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        let mut text = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('"') => text.push('"'),
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => text.push('\\'),
                },
                '"' => return None,
                '_' => text.push(' '),
                other => text.push(other),
            }
        }
        return Some(Value::String(text));
    }

    if raw.contains('.') {
        return raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number);
    }
    raw.parse::<i64>().ok().map(Value::from)
}
