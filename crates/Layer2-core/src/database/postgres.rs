//! PostgreSQL 드라이버 (sqlx, 지연 연결 풀)

use super::driver::{group_columns, SqlDriver, TableColumns};
use super::query::Dialect;
use apilink_foundation::{DatabaseConfig, Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::debug;

const LIST_TABLES_SQL: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

const TEXT_COLUMNS_SQL: &str = "SELECT table_name::text, column_name::text \
     FROM information_schema.columns \
     WHERE table_schema = 'public' \
     AND data_type IN ('character varying', 'text', 'varchar') \
     ORDER BY table_name, ordinal_position";

/// PostgreSQL 데이터베이스 하나
pub struct PostgresDriver {
    name: String,
    pool: PgPool,
}

impl PostgresDriver {
    /// 풀 생성 (실제 연결은 첫 쿼리 시점)
    pub fn connect_lazy(name: impl Into<String>, config: &DatabaseConfig) -> Result<Self> {
        let name = name.into();
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
            .connect_lazy(&config.postgres_url(&name))
            .map_err(|e| Error::database(&name, format!("invalid connection options: {}", e)))?;

        debug!("Created PostgreSQL pool for {}", name);
        Ok(Self { name, pool })
    }

    fn err(&self, e: sqlx::Error) -> Error {
        Error::database(&self.name, e.to_string())
    }
}

#[async_trait]
impl SqlDriver for PostgresDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| self.err(e))
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.err(e))
    }

    async fn text_columns(&self) -> Result<Vec<TableColumns>> {
        let rows = sqlx::query_as::<_, (String, String)>(TEXT_COLUMNS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.err(e))?;
        Ok(group_columns(rows))
    }

    async fn fetch_rows(&self, sql: &str, pattern: &str, limit: i64) -> Result<Vec<Value>> {
        let wrapped = format!("SELECT row_to_json(t) FROM ({}) t", sql);
        sqlx::query_scalar::<_, Value>(&wrapped)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.err(e))
    }

    async fn fetch_count(&self, sql: &str, pattern: &str) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>(sql)
            .bind(pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.err(e))?;
        Ok(count.max(0) as u64)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
