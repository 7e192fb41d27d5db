//! Schema versioning

use super::{DatabaseError, Result};
use crate::db::schema::Schema;
use surrealdb::{Connection, Surreal};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Database migration runner
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run every migration newer than the stored schema version
    pub async fn run<C: Connection>(db: &Surreal<C>) -> Result<()> {
        let current_version = Self::get_schema_version(db).await?;

        if current_version < 1 {
            tracing::info!("Running migration v1: initial schema");
            Self::migrate_v1(db).await?;
            Self::update_schema_version(db, 1).await?;
        }

        Ok(())
    }

    /// Migration v1: users, batches, material lines
    async fn migrate_v1<C: Connection>(db: &Surreal<C>) -> Result<()> {
        for table in Schema::tables() {
            tracing::debug!("Defining table {}", table.name);
            db.query(&table.schema)
                .await
                .map_err(DatabaseError::QueryFailed)?
                .check()
                .map_err(DatabaseError::QueryFailed)?;

            for index in &table.indexes {
                db.query(index)
                    .await
                    .map_err(DatabaseError::QueryFailed)?
                    .check()
                    .map_err(DatabaseError::QueryFailed)?;
            }
        }
        Ok(())
    }

    pub async fn get_schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32> {
        let mut result = db
            .query("SELECT schema_version FROM system_metadata LIMIT 1")
            .await
            .map_err(DatabaseError::QueryFailed)?;

        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            schema_version: u32,
        }

        // The table does not exist on a blank database
        let versions: Vec<SchemaVersion> = result.take(0).unwrap_or_default();

        Ok(versions.first().map(|v| v.schema_version).unwrap_or(0))
    }

    async fn update_schema_version<C: Connection>(db: &Surreal<C>, version: u32) -> Result<()> {
        db.query("UPSERT system_metadata:schema SET schema_version = $version, updated_at = $now")
            .bind(("version", version))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .check()
            .map_err(DatabaseError::QueryFailed)?;
        Ok(())
    }
}
