use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Params};
use serde_json::{Map, Number, Value};

use crate::config::DbConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Amenity, Entity, Kind, Model, Place};
use crate::schema::{self, PLACE_AMENITY};
use crate::storage::{Objects, StorageEngine};

enum PendingOp {
    Save(Model),
    Delete(Kind, String),
}

/// Unit of work against the connection: queued changes plus the failed-commit flag.
struct Session {
    conn: Connection,
    pending: Vec<PendingOp>,
    failed: bool,
}

impl Session {
    fn ensure_usable(&self) -> AppResult<()> {
        if self.failed {
            return Err(AppError::RollbackRequired);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.failed = false;
    }

    fn flush(&mut self) -> AppResult<()> {
        let tx = self.conn.transaction().map_err(AppError::from_sql)?;
        for op in &self.pending {
            apply(&tx, op).map_err(AppError::from_sql)?;
        }
        tx.commit().map_err(AppError::from_sql)?;
        self.pending.clear();
        Ok(())
    }
}

/// Stores entities in SQLite tables with NOT NULL and cascading foreign keys.
pub struct DbStorage {
    session: Mutex<Session>,
}

impl DbStorage {
    pub fn open(config: &DbConfig, drop_existing: bool) -> AppResult<Self> {
        tracing::info!(
            host = %config.host,
            user = config.user.as_deref().unwrap_or(""),
            "Opening database {:?}",
            config.name
        );
        let conn = if config.name == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.name)?
        };
        Self::from_connection(conn, drop_existing)
    }

    pub fn in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, false)
    }

    pub fn from_connection(conn: Connection, drop_existing: bool) -> AppResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        if drop_existing {
            tracing::info!("Dropping all tables");
            for statement in schema::drop_all() {
                conn.execute(&statement, [])?;
            }
        }
        create_schema(&conn)?;
        Ok(Self {
            session: Mutex::new(Session {
                conn,
                pending: Vec::new(),
                failed: false,
            }),
        })
    }

    /// Number of queued saves and deletes not yet committed.
    pub fn pending_count(&self) -> AppResult<usize> {
        Ok(self.lock()?.pending.len())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".into()))
    }
}

impl StorageEngine for DbStorage {
    fn register(&self, model: Model) -> AppResult<()> {
        let mut session = self.lock()?;
        session.ensure_usable()?;
        tracing::debug!(key = %model.key(), "queueing save");
        session.pending.push(PendingOp::Save(model));
        Ok(())
    }

    fn persist(&self) -> AppResult<()> {
        let mut session = self.lock()?;
        session.ensure_usable()?;
        if session.pending.is_empty() {
            return Ok(());
        }

        let count = session.pending.len();
        match session.flush() {
            Ok(()) => {
                tracing::info!("Committed {} pending operations", count);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "commit failed, session needs a rollback");
                session.failed = true;
                Err(err)
            }
        }
    }

    fn reload(&self) -> AppResult<()> {
        let mut session = self.lock()?;
        create_schema(&session.conn)?;
        session.reset();
        tracing::info!("Database session reloaded");
        Ok(())
    }

    fn query(&self, kind: Option<Kind>) -> AppResult<Objects> {
        let session = self.lock()?;
        session.ensure_usable()?;

        let kinds = match kind {
            Some(kind) => vec![kind],
            None => Kind::ALL.to_vec(),
        };

        let mut objects = Objects::new();
        for kind in kinds {
            let sql = format!(
                "SELECT {} FROM {} ORDER BY created_at",
                schema::columns(kind).join(", "),
                kind.table()
            );
            for model in load(&session.conn, kind, &sql, [])? {
                objects.insert(model.key(), model);
            }
        }
        tracing::debug!("Query returned {} objects", objects.len());
        Ok(objects)
    }

    fn delete(&self, model: Option<&Model>) -> AppResult<()> {
        let Some(model) = model else {
            return Ok(());
        };
        let mut session = self.lock()?;
        session.ensure_usable()?;
        tracing::debug!(key = %model.key(), "queueing delete");
        session
            .pending
            .push(PendingOp::Delete(model.kind(), model.id().to_string()));
        Ok(())
    }

    fn close(&self) -> AppResult<()> {
        self.lock()?.reset();
        Ok(())
    }

    fn rollback(&self) -> AppResult<()> {
        let mut session = self.lock()?;
        if session.failed || !session.pending.is_empty() {
            tracing::info!("Rolling back {} pending operations", session.pending.len());
        }
        session.reset();
        Ok(())
    }

    fn children(&self, kind: Kind, foreign_key: &str, parent_id: &str) -> AppResult<Vec<Model>> {
        if !schema::is_column(kind, foreign_key) {
            return Ok(Vec::new());
        }
        let session = self.lock()?;
        session.ensure_usable()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY created_at",
            schema::columns(kind).join(", "),
            kind.table(),
            foreign_key
        );
        load(&session.conn, kind, &sql, params![parent_id])
    }

    fn amenities_of(&self, place: &Place) -> AppResult<Vec<Amenity>> {
        let session = self.lock()?;
        session.ensure_usable()?;
        let columns = schema::columns(Kind::Amenity)
            .iter()
            .map(|column| format!("a.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {columns} FROM amenities a
             JOIN {PLACE_AMENITY} pa ON pa.amenity_id = a.id
             WHERE pa.place_id = ?1
             ORDER BY a.created_at"
        );
        Ok(load(&session.conn, Kind::Amenity, &sql, params![place.id()])?
            .into_iter()
            .filter_map(Amenity::from_model)
            .collect())
    }
}

fn create_schema(conn: &Connection) -> AppResult<()> {
    for statement in schema::create_all() {
        conn.execute(statement, [])?;
    }
    Ok(())
}

fn apply(conn: &Connection, op: &PendingOp) -> rusqlite::Result<()> {
    match op {
        PendingOp::Save(model) => {
            let kind = model.kind();
            let columns = schema::columns(kind);
            let map = model.to_map();

            let placeholders = (1..=columns.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            let updates = columns[1..]
                .iter()
                .map(|column| format!("{column} = excluded.{column}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
                kind.table(),
                columns.join(", "),
                placeholders,
                updates
            );
            let values = columns.iter().map(|column| to_sql(map.get(*column)));
            conn.execute(&sql, params_from_iter(values))?;

            if let Model::Place(place) = model {
                conn.execute(
                    "DELETE FROM place_amenity WHERE place_id = ?1",
                    params![place.id()],
                )?;
                for amenity_id in &place.amenity_ids {
                    conn.execute(
                        "INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)",
                        params![place.id(), amenity_id],
                    )?;
                }
            }
        }
        PendingOp::Delete(kind, id) => {
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
                params![id],
            )?;
        }
    }
    Ok(())
}

/// Runs `sql`, which must select `schema::columns(kind)` in order.
fn load<P: Params>(conn: &Connection, kind: Kind, sql: &str, params: P) -> AppResult<Vec<Model>> {
    let columns = schema::columns(kind);
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            let mut map = Map::new();
            for (index, column) in columns.iter().enumerate() {
                map.insert(column.to_string(), to_json(row.get::<_, SqlValue>(index)?));
            }
            Ok(map)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut models = Vec::with_capacity(rows.len());
    for mut map in rows {
        if kind == Kind::Place {
            let id = map
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            map.insert("amenity_ids".into(), Value::from(amenity_ids(conn, &id)?));
        }
        models.push(Model::from_kind_map(kind, map)?);
    }
    Ok(models)
}

fn amenity_ids(conn: &Connection, place_id: &str) -> AppResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY rowid")?;
    let ids = stmt
        .query_map(params![place_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn to_sql(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(flag)) => SqlValue::Integer(i64::from(*flag)),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Some(Value::String(text)) => SqlValue::Text(text.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

fn to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(integer) => Value::from(integer),
        SqlValue::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
        SqlValue::Text(text) => Value::String(text),
        SqlValue::Blob(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
