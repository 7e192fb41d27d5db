//! Row-level operations for users, batches and material lines.
//!
//! The gateway connects lazily: the first call opens the connection and
//! bootstraps the schema, later calls reuse it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use surrealdb::engine::any::Any;
use surrealdb::{RecordId, Surreal};
use tokio::sync::OnceCell;

use crate::db::migration::MigrationRunner;
use crate::db::schema::{BATCH, MATERIAL, SEQUENCE, USER};
use crate::db::{DatabaseConfig, DatabaseError, Result, client, is_unique_violation};
use crate::model::{
    Batch, ChatId, MaterialLine, NewMaterial, NewUser, Slot, SlotEntry, User,
};
use crate::station::Station;

/// Outcome of an insert against a uniquely keyed table
#[derive(Debug, Clone, PartialEq)]
pub enum Insert<T> {
    Created(T),
    /// The natural key is already taken; nothing was written.
    Duplicate,
}

impl<T> Insert<T> {
    pub fn created(self) -> Option<T> {
        match self {
            Insert::Created(value) => Some(value),
            Insert::Duplicate => None,
        }
    }
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub users: usize,
    pub batches: usize,
    pub materials: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct DbUser {
    id: RecordId,
    chat_id: i64,
    name: String,
    role: String,
    equipment: Option<String>,
    registered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DbBatch {
    id: RecordId,
    number: String,
    design: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DbSlot {
    #[serde(default)]
    worker: Option<String>,
    #[serde(default)]
    worker_id: Option<i64>,
    #[serde(default)]
    count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DbMaterial {
    id: RecordId,
    batch: RecordId,
    color: String,
    unit_count: i64,
    piece_count: i64,
    #[serde(default)]
    slots: BTreeMap<String, DbSlot>,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct Counter {
    value: i64,
}

#[derive(Deserialize)]
struct Total {
    total: usize,
}

fn record(table: &str, id: i64) -> RecordId {
    RecordId::from_table_key(table, id)
}

fn key_of(id: &RecordId) -> Result<i64> {
    let key = id.key().to_string();
    key.parse().map_err(|_| DatabaseError::InvalidRecordKey {
        table: id.table().to_string(),
        key,
    })
}

impl DbUser {
    fn into_user(self) -> Result<User> {
        Ok(User {
            id: key_of(&self.id)?,
            chat_id: ChatId(self.chat_id),
            name: self.name,
            role: self.role,
            equipment: self.equipment,
            registered_at: self.registered_at,
        })
    }
}

impl DbBatch {
    fn into_batch(self) -> Result<Batch> {
        Ok(Batch {
            id: key_of(&self.id)?,
            number: self.number,
            design: self.design,
            created_at: self.created_at,
        })
    }
}

impl DbMaterial {
    fn into_material(self) -> Result<MaterialLine> {
        let mut slots = BTreeMap::new();
        for (key, slot) in self.slots {
            match Station::from_key(&key) {
                Some(station) => {
                    slots.insert(
                        station,
                        Slot {
                            worker: slot.worker,
                            worker_id: slot.worker_id,
                            quantity: slot.count,
                        },
                    );
                }
                None => tracing::warn!("Ignoring unknown station slot '{}' on {}", key, self.id),
            }
        }
        Ok(MaterialLine {
            id: key_of(&self.id)?,
            batch_id: key_of(&self.batch)?,
            color: self.color,
            unit_count: self.unit_count,
            piece_count: self.piece_count,
            slots,
            created_at: self.created_at,
        })
    }
}

/// Persistence gateway
pub struct Gateway {
    config: DatabaseConfig,
    db: OnceCell<Surreal<Any>>,
}

impl Gateway {
    /// Gateway that connects on first use
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Gateway over an already established connection
    pub fn with_connection(db: Surreal<Any>) -> Self {
        Self {
            config: DatabaseConfig::Memory,
            db: OnceCell::from(db),
        }
    }

    async fn db(&self) -> Result<&Surreal<Any>> {
        self.db.get_or_try_init(|| client::connect(&self.config)).await
    }

    /// Force the connection and schema bootstrap.
    pub async fn connect(&self) -> Result<()> {
        self.db().await.map(|_| ())
    }

    pub async fn schema_version(&self) -> Result<u32> {
        MigrationRunner::get_schema_version(self.db().await?).await
    }

    /// Allocate the next row id for `table`.
    async fn next_id(&self, table: &'static str) -> Result<i64> {
        let counters: Vec<Counter> = self
            .db()
            .await?
            .query("UPSERT type::thing($sequence, $table) SET value += 1 RETURN AFTER")
            .bind(("sequence", SEQUENCE))
            .bind(("table", table))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(counters.first().map(|c| c.value).unwrap_or(1))
    }

    // Users

    pub async fn create_user(&self, new: NewUser) -> Result<Insert<User>> {
        let id = self.next_id(USER).await?;
        let row = DbUser {
            id: record(USER, id),
            chat_id: new.chat_id.0,
            name: new.name,
            role: new.role,
            equipment: new.equipment,
            registered_at: Utc::now(),
        };
        let created: std::result::Result<Option<DbUser>, surrealdb::Error> =
            self.db().await?.create(record(USER, id)).content(row).await;
        match created {
            Ok(Some(row)) => Ok(Insert::Created(row.into_user()?)),
            Ok(None) => Ok(Insert::Duplicate),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!("User with chat id {} already exists", new.chat_id);
                Ok(Insert::Duplicate)
            }
            Err(e) => Err(DatabaseError::QueryFailed(e)),
        }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row: Option<DbUser> = self
            .db()
            .await?
            .select(record(USER, id))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        row.map(DbUser::into_user).transpose()
    }

    pub async fn get_user_by_chat(&self, chat_id: ChatId) -> Result<Option<User>> {
        let rows: Vec<DbUser> = self
            .db()
            .await?
            .query("SELECT * FROM user WHERE chat_id = $chat_id LIMIT 1")
            .bind(("chat_id", chat_id.0))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        rows.into_iter().next().map(DbUser::into_user).transpose()
    }

    /// All users ordered by name
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<DbUser> = self
            .db()
            .await?
            .query("SELECT * FROM user ORDER BY name")
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        rows.into_iter().map(DbUser::into_user).collect()
    }

    pub async fn update_user_name(&self, id: i64, name: String) -> Result<bool> {
        self.update_user_field(id, "UPDATE $user SET name = $value RETURN AFTER", name)
            .await
    }

    pub async fn update_user_role(&self, id: i64, role: String) -> Result<bool> {
        self.update_user_field(id, "UPDATE $user SET role = $value RETURN AFTER", role)
            .await
    }

    pub async fn update_user_equipment(&self, id: i64, equipment: String) -> Result<bool> {
        self.update_user_field(
            id,
            "UPDATE $user SET equipment = $value RETURN AFTER",
            equipment,
        )
        .await
    }

    async fn update_user_field(&self, id: i64, sql: &str, value: String) -> Result<bool> {
        let rows: Vec<DbUser> = self
            .db()
            .await?
            .query(sql)
            .bind(("user", record(USER, id)))
            .bind(("value", value))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(!rows.is_empty())
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let deleted: Option<DbUser> = self
            .db()
            .await?
            .delete(record(USER, id))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        Ok(deleted.is_some())
    }

    // Batches

    pub async fn create_batch(&self, number: String, design: Option<String>) -> Result<Insert<Batch>> {
        let id = self.next_id(BATCH).await?;
        let row = DbBatch {
            id: record(BATCH, id),
            number,
            design,
            created_at: Utc::now(),
        };
        let number = row.number.clone();
        let created: std::result::Result<Option<DbBatch>, surrealdb::Error> =
            self.db().await?.create(record(BATCH, id)).content(row).await;
        match created {
            Ok(Some(row)) => Ok(Insert::Created(row.into_batch()?)),
            Ok(None) => Ok(Insert::Duplicate),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!("Batch {} already exists", number);
                Ok(Insert::Duplicate)
            }
            Err(e) => Err(DatabaseError::QueryFailed(e)),
        }
    }

    pub async fn get_batch(&self, number: &str) -> Result<Option<Batch>> {
        let rows: Vec<DbBatch> = self
            .db()
            .await?
            .query("SELECT * FROM batch WHERE number = $number LIMIT 1")
            .bind(("number", number.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        rows.into_iter().next().map(DbBatch::into_batch).transpose()
    }

    pub async fn get_batch_by_id(&self, id: i64) -> Result<Option<Batch>> {
        let row: Option<DbBatch> = self
            .db()
            .await?
            .select(record(BATCH, id))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        row.map(DbBatch::into_batch).transpose()
    }

    /// All batches ordered by number
    pub async fn list_batches(&self) -> Result<Vec<Batch>> {
        let rows: Vec<DbBatch> = self
            .db()
            .await?
            .query("SELECT * FROM batch ORDER BY number")
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        rows.into_iter().map(DbBatch::into_batch).collect()
    }

    pub async fn update_batch_design(&self, id: i64, design: String) -> Result<bool> {
        let rows: Vec<DbBatch> = self
            .db()
            .await?
            .query("UPDATE $batch SET design = $design RETURN AFTER")
            .bind(("batch", record(BATCH, id)))
            .bind(("design", design))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(!rows.is_empty())
    }

    /// Delete a batch and every material line that belongs to it.
    pub async fn delete_batch(&self, number: &str) -> Result<bool> {
        let Some(batch) = self.get_batch(number).await? else {
            return Ok(false);
        };
        self.db()
            .await?
            .query(
                "BEGIN TRANSACTION;
                 DELETE material WHERE batch = $batch;
                 DELETE $batch;
                 COMMIT TRANSACTION;",
            )
            .bind(("batch", record(BATCH, batch.id)))
            .await
            .map_err(DatabaseError::TransactionFailed)?
            .check()
            .map_err(DatabaseError::TransactionFailed)?;
        tracing::info!("Deleted batch {} with its material lines", number);
        Ok(true)
    }

    // Material lines

    pub async fn create_material(&self, new: NewMaterial) -> Result<MaterialLine> {
        let id = self.next_id(MATERIAL).await?;
        let row = DbMaterial {
            id: record(MATERIAL, id),
            batch: record(BATCH, new.batch_id),
            color: new.color,
            unit_count: new.unit_count,
            piece_count: new.piece_count,
            slots: BTreeMap::new(),
            created_at: Utc::now(),
        };
        let created: Option<DbMaterial> = self
            .db()
            .await?
            .create(record(MATERIAL, id))
            .content(row)
            .await
            .map_err(DatabaseError::QueryFailed)?;
        match created {
            Some(row) => row.into_material(),
            None => Err(DatabaseError::InvalidRecordKey {
                table: MATERIAL.to_string(),
                key: id.to_string(),
            }),
        }
    }

    pub async fn get_material(&self, id: i64) -> Result<Option<MaterialLine>> {
        let row: Option<DbMaterial> = self
            .db()
            .await?
            .select(record(MATERIAL, id))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        row.map(DbMaterial::into_material).transpose()
    }

    /// Material lines of one batch in insertion order
    pub async fn list_materials(&self, batch_id: i64) -> Result<Vec<MaterialLine>> {
        let rows: Vec<DbMaterial> = self
            .db()
            .await?
            .query("SELECT * FROM material WHERE batch = $batch ORDER BY id")
            .bind(("batch", record(BATCH, batch_id)))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        rows.into_iter().map(DbMaterial::into_material).collect()
    }

    pub async fn count_materials(&self, batch_id: i64) -> Result<usize> {
        let totals: Vec<Total> = self
            .db()
            .await?
            .query("SELECT count() AS total FROM material WHERE batch = $batch GROUP ALL")
            .bind(("batch", record(BATCH, batch_id)))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(totals.first().map(|t| t.total).unwrap_or(0))
    }

    /// Overwrite one station's slot. A missing line updates nothing and
    /// reports `false`.
    pub async fn update_station_slot(
        &self,
        material_id: i64,
        station: Station,
        entry: SlotEntry,
    ) -> Result<bool> {
        // The field path comes from the closed station table, never from input.
        let sql = format!(
            "UPDATE $material SET slots.{} = $slot RETURN AFTER",
            station.key()
        );
        let slot = DbSlot {
            worker: Some(entry.worker),
            worker_id: entry.worker_id,
            count: Some(entry.quantity),
        };
        let rows: Vec<DbMaterial> = self
            .db()
            .await?
            .query(sql)
            .bind(("material", record(MATERIAL, material_id)))
            .bind(("slot", slot))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        if rows.is_empty() {
            tracing::debug!("Slot update for missing material line {}", material_id);
        }
        Ok(!rows.is_empty())
    }

    pub async fn rename_material(&self, id: i64, color: String) -> Result<bool> {
        let rows: Vec<DbMaterial> = self
            .db()
            .await?
            .query("UPDATE $material SET color = $color RETURN AFTER")
            .bind(("material", record(MATERIAL, id)))
            .bind(("color", color))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;
        Ok(!rows.is_empty())
    }

    pub async fn delete_material(&self, id: i64) -> Result<bool> {
        let deleted: Option<DbMaterial> = self
            .db()
            .await?
            .delete(record(MATERIAL, id))
            .await
            .map_err(DatabaseError::QueryFailed)?;
        Ok(deleted.is_some())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let mut response = self
            .db()
            .await?
            .query("SELECT count() AS total FROM user GROUP ALL")
            .query("SELECT count() AS total FROM batch GROUP ALL")
            .query("SELECT count() AS total FROM material GROUP ALL")
            .await
            .map_err(DatabaseError::QueryFailed)?;
        let mut counts = [0usize; 3];
        for (index, count) in counts.iter_mut().enumerate() {
            let totals: Vec<Total> = response.take(index).map_err(DatabaseError::QueryFailed)?;
            *count = totals.first().map(|t| t.total).unwrap_or(0);
        }
        Ok(StoreStats {
            users: counts[0],
            batches: counts[1],
            materials: counts[2],
        })
    }
}
