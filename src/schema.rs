use crate::models::Kind;

/// Join table linking places and amenities.
pub const PLACE_AMENITY: &str = "place_amenity";

/// Columns stored for each kind, `id` first.
pub fn columns(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::State => &["id", "created_at", "updated_at", "name"],
        Kind::City => &["id", "created_at", "updated_at", "name", "state_id"],
        Kind::User => &[
            "id",
            "created_at",
            "updated_at",
            "email",
            "password",
            "first_name",
            "last_name",
        ],
        Kind::Place => &[
            "id",
            "created_at",
            "updated_at",
            "city_id",
            "user_id",
            "name",
            "description",
            "number_rooms",
            "number_bathrooms",
            "max_guest",
            "price_by_night",
            "latitude",
            "longitude",
        ],
        Kind::Review => &["id", "created_at", "updated_at", "text", "place_id", "user_id"],
        Kind::Amenity => &["id", "created_at", "updated_at", "name"],
    }
}

pub fn create_table(kind: Kind) -> &'static str {
    match kind {
        Kind::State => {
            "CREATE TABLE IF NOT EXISTS states (
                id TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name TEXT NOT NULL
            )"
        }
        Kind::City => {
            "CREATE TABLE IF NOT EXISTS cities (
                id TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name TEXT NOT NULL,
                state_id TEXT NOT NULL
                    REFERENCES states(id) ON DELETE CASCADE
            )"
        }
        Kind::User => {
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                email TEXT NOT NULL,
                password TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT
            )"
        }
        Kind::Place => {
            "CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                city_id TEXT NOT NULL
                    REFERENCES cities(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL
                    REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                number_rooms INTEGER NOT NULL DEFAULT 0,
                number_bathrooms INTEGER NOT NULL DEFAULT 0,
                max_guest INTEGER NOT NULL DEFAULT 0,
                price_by_night INTEGER NOT NULL DEFAULT 0,
                latitude REAL,
                longitude REAL
            )"
        }
        Kind::Review => {
            "CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                text TEXT NOT NULL,
                place_id TEXT NOT NULL
                    REFERENCES places(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL
                    REFERENCES users(id) ON DELETE CASCADE
            )"
        }
        Kind::Amenity => {
            "CREATE TABLE IF NOT EXISTS amenities (
                id TEXT PRIMARY KEY NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name TEXT NOT NULL
            )"
        }
    }
}

const CREATE_PLACE_AMENITY: &str = "CREATE TABLE IF NOT EXISTS place_amenity (
    place_id TEXT NOT NULL
        REFERENCES places(id) ON DELETE CASCADE,
    amenity_id TEXT NOT NULL
        REFERENCES amenities(id) ON DELETE CASCADE,
    PRIMARY KEY (place_id, amenity_id)
)";

/// Statements creating every table, parents first.
pub fn create_all() -> Vec<&'static str> {
    let mut statements: Vec<&'static str> = Kind::ALL.into_iter().map(create_table).collect();
    statements.push(CREATE_PLACE_AMENITY);
    statements
}

/// Statements dropping every table, children first.
pub fn drop_all() -> Vec<String> {
    std::iter::once(PLACE_AMENITY)
        .chain(Kind::ALL.into_iter().rev().map(Kind::table))
        .map(|table| format!("DROP TABLE IF EXISTS {table}"))
        .collect()
}

pub fn is_column(kind: Kind, name: &str) -> bool {
    columns(kind).contains(&name)
}
