//! SQLite 드라이버 (rusqlite)
//!
//! 임베디드 배포와 테스트용. 쿼리는 blocking 스레드에서 실행합니다.

use super::driver::{SqlDriver, TableColumns};
use super::query::Dialect;
use apilink_foundation::{Error, Result};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const TABLE_INFO_SQL: &str = "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid";

/// SQLite 데이터베이스 하나
pub struct SqliteDriver {
    name: String,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteDriver {
    /// 파일 열기 (없으면 생성)
    pub fn open(name: impl Into<String>, path: &Path) -> Result<Self> {
        let name = name.into();
        let conn = Connection::open(path).map_err(|e| {
            Error::database(&name, format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!("Opened SQLite database {} at {}", name, path.display());
        Ok(Self {
            name,
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// 인메모리 데이터베이스 (테스트용)
    pub fn in_memory(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(&name, format!("Failed to create in-memory database: {}", e)))?;
        Ok(Self {
            name,
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// 스키마/데이터 준비용 배치 실행
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| Error::database(&self.name, "connection closed"))?;
        conn.execute_batch(sql)
            .map_err(|e| Error::database(&self.name, e.to_string()))
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let name = self.name.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            let conn = guard
                .as_ref()
                .ok_or_else(|| Error::database(&name, "connection closed"))?;
            f(conn).map_err(|e| Error::database(&name, e.to_string()))
        })
        .await
        .map_err(|e| Error::Internal(format!("Blocking task failed: {}", e)))?
    }
}

fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// 선언 타입 기준 텍스트 친화 컬럼
fn is_text_type(declared: &str) -> bool {
    let upper = declared.to_uppercase();
    upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("CLOB")
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(b.iter().map(|x| format!("{:02x}", x)).collect()),
    }
}

#[async_trait]
impl SqlDriver for SqliteDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| conn.query_row("SELECT 1", [], |_| Ok(())))
            .await
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.with_conn(list_tables).await
    }

    async fn text_columns(&self) -> Result<Vec<TableColumns>> {
        self.with_conn(|conn| {
            let mut grouped = Vec::new();
            for table in list_tables(conn)? {
                let mut stmt = conn.prepare(TABLE_INFO_SQL)?;
                let columns = stmt
                    .query_map(params![table], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?
                    .into_iter()
                    .filter(|(_, declared)| is_text_type(declared))
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>();

                if !columns.is_empty() {
                    grouped.push(TableColumns { table, columns });
                }
            }
            Ok(grouped)
        })
        .await
    }

    async fn fetch_rows(&self, sql: &str, pattern: &str, limit: i64) -> Result<Vec<Value>> {
        let sql = sql.to_string();
        let pattern = pattern.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let rows = stmt.query_map(params![pattern, limit], |row| {
                let mut object = Map::new();
                for (idx, name) in names.iter().enumerate() {
                    object.insert(name.clone(), value_to_json(row.get_ref(idx)?));
                }
                Ok(Value::Object(object))
            })?;
            rows.collect()
        })
        .await
    }

    async fn fetch_count(&self, sql: &str, pattern: &str) -> Result<u64> {
        let sql = sql.to_string();
        let pattern = pattern.to_string();
        let count = self
            .with_conn(move |conn| conn.query_row(&sql, params![pattern], |row| row.get::<_, i64>(0)))
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn close(&self) {
        if self.conn.lock().take().is_some() {
            debug!("Closed SQLite database {}", self.name);
        }
    }
}
