// PostgreSQL document store: one JSONB table shared by all collections
use crate::document::DocumentStore;
use crate::error::{DatabaseError, DatabaseResult};
use crate::query::{path_segments, Condition, Filter, FindOptions, SortOrder};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{info, warn};

const UNIQUE_VIOLATION: &str = "23505";

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        seq BIGSERIAL,
        data JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (collection, id)
    )",
    "CREATE INDEX IF NOT EXISTS documents_data_gin ON documents USING GIN (data jsonb_path_ops)",
    "CREATE TABLE IF NOT EXISTS sequences (
        name TEXT PRIMARY KEY,
        value BIGINT NOT NULL
    )",
];

/// JSONB-backed store over a pooled PostgreSQL connection
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Connect and create the schema if it does not exist yet
    pub async fn connect(connection_string: &str, max_connections: u32) -> DatabaseResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(connection_string)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        info!("Database connection pool created successfully");

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> DatabaseResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for condition in filter.conditions() {
        let path = path_segments(condition.field());
        match condition {
            Condition::Eq { value, .. } => {
                builder.push(" AND data #> ");
                builder.push_bind(path);
                builder.push(" = ");
                builder.push_bind(value.clone());
            }
            Condition::In { values, .. } => {
                if values.is_empty() {
                    builder.push(" AND FALSE");
                    continue;
                }
                builder.push(" AND (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder.push("data #> ");
                    builder.push_bind(path.clone());
                    builder.push(" = ");
                    builder.push_bind(value.clone());
                }
                builder.push(")");
            }
            Condition::Contains { value, .. } => {
                builder.push(" AND data #> ");
                builder.push_bind(path);
                builder.push(" @> ");
                builder.push_bind(Value::Array(vec![value.clone()]));
            }
            Condition::Gte { value, .. } => push_range(builder, path, ">=", value),
            Condition::Lte { value, .. } => push_range(builder, path, "<=", value),
        }
    }
}

fn push_range(builder: &mut QueryBuilder<'_, Postgres>, path: Vec<String>, op: &str, value: &Value) {
    match value {
        Value::Number(n) => {
            builder.push(" AND (data #>> ");
            builder.push_bind(path);
            builder.push(format!(")::numeric {op} "));
            builder.push_bind(n.as_f64().unwrap_or_default());
        }
        Value::String(s) => {
            builder.push(" AND data #>> ");
            builder.push_bind(path);
            builder.push(format!(" {op} "));
            builder.push_bind(s.clone());
        }
        other => {
            builder.push(" AND data #>> ");
            builder.push_bind(path);
            builder.push(format!(" {op} "));
            builder.push_bind(other.to_string());
        }
    }
}

fn map_insert_error(error: sqlx::Error, collection: &str, id: &str) -> DatabaseError {
    match &error {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            DatabaseError::DuplicateKey {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        }
        _ => DatabaseError::SqlxError(error),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, id: &str, document: Value) -> DatabaseResult<()> {
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(document)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, collection, id))?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> DatabaseResult<Option<Value>> {
        let data = sqlx::query_scalar::<_, Value>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(data)
    }

    async fn replace(&self, collection: &str, id: &str, document: Value) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET data = $3, updated_at = NOW() WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(document)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> DatabaseResult<Vec<Value>> {
        let mut builder = QueryBuilder::new("SELECT data FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());
        push_conditions(&mut builder, filter);

        builder.push(" ORDER BY ");
        for (field, order) in &options.sort {
            builder.push("data #>> ");
            builder.push_bind(path_segments(field));
            builder.push(match order {
                SortOrder::Ascending => " ASC NULLS LAST, ",
                SortOrder::Descending => " DESC NULLS LAST, ",
            });
        }
        builder.push("seq ASC");

        if let Some(limit) = options.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(options.skip).unwrap_or(i64::MAX));

        let rows = builder
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(rows)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> DatabaseResult<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents WHERE collection = ");
        builder.push_bind(collection.to_string());
        push_conditions(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn next_sequence(&self, name: &str) -> DatabaseResult<u64> {
        let value = sqlx::query_scalar::<_, i64>(
            "INSERT INTO sequences (name, value) VALUES ($1, 1)
             ON CONFLICT (name) DO UPDATE SET value = sequences.value + 1
             RETURNING value",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        u64::try_from(value).map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    async fn is_healthy(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Database health check failed: {}", e);
                false
            }
        }
    }
}
