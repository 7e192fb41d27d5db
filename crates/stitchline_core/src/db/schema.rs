//! Table definitions

pub const USER: &str = "user";
pub const BATCH: &str = "batch";
pub const MATERIAL: &str = "material";
pub const SEQUENCE: &str = "sequence";
pub const SYSTEM_METADATA: &str = "system_metadata";

/// SurrealQL schema definitions
pub struct Schema;

impl Schema {
    pub fn tables() -> Vec<TableDefinition> {
        vec![
            Self::system_metadata(),
            Self::sequences(),
            Self::users(),
            Self::batches(),
            Self::materials(),
        ]
    }

    pub fn system_metadata() -> TableDefinition {
        TableDefinition {
            name: SYSTEM_METADATA.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS system_metadata SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS schema_version ON system_metadata TYPE int;
                DEFINE FIELD IF NOT EXISTS updated_at ON system_metadata TYPE string;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Row id counters, one record per table
    pub fn sequences() -> TableDefinition {
        TableDefinition {
            name: SEQUENCE.to_string(),
            schema: "DEFINE TABLE IF NOT EXISTS sequence SCHEMALESS;".to_string(),
            indexes: vec![],
        }
    }

    pub fn users() -> TableDefinition {
        TableDefinition {
            name: USER.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS chat_id ON user TYPE int;
                DEFINE FIELD IF NOT EXISTS name ON user TYPE string;
                DEFINE FIELD IF NOT EXISTS role ON user TYPE string;
                DEFINE FIELD IF NOT EXISTS equipment ON user TYPE option<string>;
                DEFINE FIELD IF NOT EXISTS registered_at ON user TYPE string;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX IF NOT EXISTS user_chat_id ON user FIELDS chat_id UNIQUE".to_string(),
            ],
        }
    }

    pub fn batches() -> TableDefinition {
        TableDefinition {
            name: BATCH.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS batch SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS number ON batch TYPE string;
                DEFINE FIELD IF NOT EXISTS design ON batch TYPE option<string>;
                DEFINE FIELD IF NOT EXISTS created_at ON batch TYPE string;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX IF NOT EXISTS batch_number ON batch FIELDS number UNIQUE".to_string(),
            ],
        }
    }

    /// Material lines. The table is schemaless so the per-station `slots`
    /// object can hold any station key.
    pub fn materials() -> TableDefinition {
        TableDefinition {
            name: MATERIAL.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS material SCHEMALESS;
                DEFINE FIELD IF NOT EXISTS batch ON material TYPE record<batch>;
                DEFINE FIELD IF NOT EXISTS color ON material TYPE string;
                DEFINE FIELD IF NOT EXISTS unit_count ON material TYPE int;
                DEFINE FIELD IF NOT EXISTS piece_count ON material TYPE int;
                DEFINE FIELD IF NOT EXISTS slots ON material TYPE object DEFAULT {};
                DEFINE FIELD IF NOT EXISTS created_at ON material TYPE string;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX IF NOT EXISTS material_batch ON material FIELDS batch".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}
