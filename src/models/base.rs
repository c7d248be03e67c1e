use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and timestamps shared by every entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseModel {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default = "next_timestamp", with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default = "next_timestamp", with = "timestamp")]
    pub updated_at: NaiveDateTime,
}

impl BaseModel {
    pub fn new() -> Self {
        let now = next_timestamp();
        Self {
            id: new_id(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the record as modified.
    pub fn touch(&mut self) {
        self.updated_at = next_timestamp();
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for BaseModel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BaseModel {}

impl Hash for BaseModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

static LAST_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// UTC now at microsecond precision, strictly later than any value handed out before.
pub fn next_timestamp() -> NaiveDateTime {
    let now = Utc::now().timestamp_micros();
    let mut issued = now;
    // fetch_update only fails when the closure returns None, which it never does
    let _ = LAST_MICROS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        issued = if now > last { now } else { last.saturating_add(1) };
        Some(issued)
    });
    let nanos = (issued.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(issued.div_euclid(1_000_000), nanos)
        .unwrap_or_default()
        .naive_utc()
}

pub mod timestamp {
    use chrono::{NaiveDateTime, SubsecRound};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn render(value: &NaiveDateTime) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&render(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        // Held at the precision `FORMAT` writes back.
        raw.parse::<NaiveDateTime>()
            .map(|parsed| parsed.trunc_subsecs(6))
            .map_err(serde::de::Error::custom)
    }
}
