//! Connecting to SurrealDB

use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;

use crate::db::migration::MigrationRunner;
use crate::db::{DatabaseConfig, DatabaseError, Result, default_namespace};

/// Connect according to `config`, select the namespace and run migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<Surreal<Any>> {
    let started = std::time::Instant::now();
    let db = match config {
        DatabaseConfig::Memory => {
            tracing::info!("Connecting to in-memory database");
            let db = any::connect("memory")
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            select_default_namespace(&db).await?;
            db
        }
        DatabaseConfig::Embedded { path } => {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|cause| DatabaseError::Directory {
                        path: parent.display().to_string(),
                        cause,
                    })?;
                }
            }
            tracing::info!("Connecting to embedded database at: {}", path);
            let db = any::connect(format!("surrealkv://{}", path))
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            select_default_namespace(&db).await?;
            db
        }
        DatabaseConfig::Remote {
            url,
            username,
            password,
            namespace,
            database,
        } => {
            tracing::info!("Connecting to remote database at: {}", url);
            let db = any::connect(url.as_str())
                .await
                .map_err(DatabaseError::ConnectionFailed)?;

            if let (Some(username), Some(password)) = (username, password) {
                db.signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            }

            db.use_ns(namespace.as_str())
                .use_db(database.as_str())
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            db
        }
    };
    tracing::info!("Database connection established in {:?}", started.elapsed());

    MigrationRunner::run(&db).await?;
    Ok(db)
}

async fn select_default_namespace(db: &Surreal<Any>) -> Result<()> {
    let name = default_namespace();
    db.use_ns(name.as_str())
        .use_db(name.as_str())
        .await
        .map_err(DatabaseError::ConnectionFailed)
}

/// Fresh in-memory database with the schema applied
pub async fn create_test_db() -> Result<Surreal<Any>> {
    connect(&DatabaseConfig::Memory).await
}
