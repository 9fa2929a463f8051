//! DatabaseManager - 여러 논리 데이터베이스에 대한 팬아웃 검색
//!
//! 테이블 하나, 데이터베이스 하나의 실패는 로그만 남기고 건너뜁니다.
//! 데이터베이스는 설정 순서대로 하나씩 처리합니다.

use super::driver::SqlDriver;
use super::postgres::PostgresDriver;
use super::query::{contains_pattern, SearchQuery};
use super::sqlite::SqliteDriver;
use apilink_foundation::{DatabaseConfig, DbDriverKind, Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 데이터베이스 정보
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseInfo {
    pub name: String,
    pub description: String,
    pub tables: Vec<String>,
}

/// 테이블 하나의 검색 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMatch {
    pub table: String,
    pub records: Vec<Value>,
    pub match_count: usize,
}

/// 데이터베이스 태그가 붙은 검색 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMatch {
    pub database: String,
    pub table: String,
    pub records: Vec<Value>,
    pub match_count: usize,
}

/// 전체 발생 횟수
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceCount {
    pub total: u64,
    pub by_database: BTreeMap<String, u64>,
}

/// 시작 시 연결 확인 결과
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 데이터베이스 연결 관리자
pub struct DatabaseManager {
    /// 설정 순서 유지
    drivers: Vec<Arc<dyn SqlDriver>>,
    closed: AtomicBool,
    connected: AtomicBool,
}

impl DatabaseManager {
    /// 설정에서 드라이버 생성
    ///
    /// PostgreSQL 풀은 지연 연결이므로 여기서 네트워크 오류가 나지 않습니다.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let mut drivers: Vec<Arc<dyn SqlDriver>> = Vec::with_capacity(config.names.len());
        for name in &config.names {
            let driver: Arc<dyn SqlDriver> = match config.driver {
                DbDriverKind::Postgres => Arc::new(PostgresDriver::connect_lazy(name, config)?),
                DbDriverKind::Sqlite => {
                    Arc::new(SqliteDriver::open(name, &config.sqlite_path(name))?)
                }
            };
            drivers.push(driver);
        }
        info!(
            "Database manager configured with {} databases ({:?})",
            drivers.len(),
            config.driver
        );
        Ok(Self::from_drivers(drivers))
    }

    /// 드라이버 직접 주입 (테스트, 임베디드)
    pub fn from_drivers(drivers: Vec<Arc<dyn SqlDriver>>) -> Self {
        Self {
            drivers,
            closed: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    /// 설정된 데이터베이스 이름
    pub fn list_databases(&self) -> Vec<String> {
        self.drivers.iter().map(|d| d.name().to_string()).collect()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::database("*", "database manager is closed"));
        }
        Ok(())
    }

    fn driver(&self, name: &str) -> Result<&Arc<dyn SqlDriver>> {
        self.ensure_open()?;
        self.drivers
            .iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| Error::NotFound(format!("database '{}' is not configured", name)))
    }

    /// 데이터베이스 정보 (기본 테이블만)
    pub async fn database_info(&self, name: &str) -> Result<DatabaseInfo> {
        let driver = self.driver(name)?;
        let tables = driver.list_tables().await?;
        Ok(DatabaseInfo {
            name: name.to_string(),
            description: format!("Base de datos {}", name),
            tables,
        })
    }

    /// 데이터베이스 하나에서 검색
    ///
    /// 테이블별 쿼리 실패는 로그 후 건너뜁니다.
    pub async fn search_in(&self, name: &str, term: &str, limit: i64) -> Result<Vec<TableMatch>> {
        let driver = self.driver(name)?;
        let pattern = contains_pattern(term);
        let mut matches = Vec::new();

        for table in driver.text_columns().await? {
            let query = SearchQuery::new(driver.dialect(), &table.table, &table.columns);
            match driver.fetch_rows(&query.select_sql(), &pattern, limit).await {
                Ok(records) if !records.is_empty() => {
                    debug!("{}.{}: {} matches", name, table.table, records.len());
                    matches.push(TableMatch {
                        table: table.table,
                        match_count: records.len(),
                        records,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!("Search failed in {}.{}: {}", name, table.table, e),
            }
        }
        Ok(matches)
    }

    /// 모든 데이터베이스에서 검색 (데이터베이스 단위 실패 격리)
    pub async fn search_across(&self, term: &str, limit: i64) -> Result<Vec<DatabaseMatch>> {
        self.ensure_open()?;
        let mut results = Vec::new();

        for driver in &self.drivers {
            match self.search_in(driver.name(), term, limit).await {
                Ok(matches) => results.extend(matches.into_iter().map(|m| DatabaseMatch {
                    database: driver.name().to_string(),
                    table: m.table,
                    records: m.records,
                    match_count: m.match_count,
                })),
                Err(e) => warn!("Skipping database {} during search: {}", driver.name(), e),
            }
        }
        Ok(results)
    }

    /// 데이터베이스 하나의 발생 횟수 (테이블 실패는 0으로 처리)
    pub async fn count_in(&self, name: &str, term: &str) -> Result<u64> {
        let driver = self.driver(name)?;
        let pattern = contains_pattern(term);
        let mut total = 0;

        for table in driver.text_columns().await? {
            let query = SearchQuery::new(driver.dialect(), &table.table, &table.columns);
            match driver.fetch_count(&query.count_sql(), &pattern).await {
                Ok(count) => total += count,
                Err(e) => warn!("Count failed in {}.{}: {}", name, table.table, e),
            }
        }
        Ok(total)
    }

    /// 모든 데이터베이스의 발생 횟수 (실패한 데이터베이스는 0)
    pub async fn count_occurrences(&self, term: &str) -> Result<OccurrenceCount> {
        self.ensure_open()?;
        let mut result = OccurrenceCount::default();

        for driver in &self.drivers {
            let count = match self.count_in(driver.name(), term).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Count skipped for database {}: {}", driver.name(), e);
                    0
                }
            };
            result.total += count;
            result.by_database.insert(driver.name().to_string(), count);
        }
        Ok(result)
    }

    /// 시작 시 연결 확인 (실패해도 프로세스는 계속)
    pub async fn probe_all(&self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(self.drivers.len());
        for driver in &self.drivers {
            let result = match driver.ping().await {
                Ok(()) => {
                    info!("Database {} connected", driver.name());
                    ProbeResult {
                        name: driver.name().to_string(),
                        connected: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Database {} unavailable: {}", driver.name(), e);
                    ProbeResult {
                        name: driver.name().to_string(),
                        connected: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }

        let any_connected = results.iter().any(|r| r.connected);
        self.connected.store(any_connected, Ordering::SeqCst);
        results
    }

    /// 마지막 probe에서 하나라도 연결되었는지
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.connected.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 모든 풀 종료 (여러 번 호출해도 안전)
    pub async fn close_all(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Database manager already closed");
            return;
        }
        for driver in &self.drivers {
            driver.close().await;
        }
        self.connected.store(false, Ordering::SeqCst);
        info!("Closed {} database pools", self.drivers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::driver::TableColumns;
    use crate::database::query::Dialect;
    use async_trait::async_trait;

    fn sqlite(name: &str, setup: &str) -> Arc<dyn SqlDriver> {
        let driver = SqliteDriver::in_memory(name).unwrap();
        driver.execute_batch(setup).unwrap();
        Arc::new(driver)
    }

    /// 모든 연산이 실패하는 드라이버
    struct FailingDriver;

    #[async_trait]
    impl SqlDriver for FailingDriver {
        fn name(&self) -> &str {
            "broken"
        }
        fn dialect(&self) -> Dialect {
            Dialect::Postgres
        }
        async fn ping(&self) -> Result<()> {
            Err(Error::database("broken", "connection refused"))
        }
        async fn list_tables(&self) -> Result<Vec<String>> {
            Err(Error::database("broken", "connection refused"))
        }
        async fn text_columns(&self) -> Result<Vec<TableColumns>> {
            Err(Error::database("broken", "connection refused"))
        }
        async fn fetch_rows(&self, _: &str, _: &str, _: i64) -> Result<Vec<Value>> {
            Err(Error::database("broken", "connection refused"))
        }
        async fn fetch_count(&self, _: &str, _: &str) -> Result<u64> {
            Err(Error::database("broken", "connection refused"))
        }
        async fn close(&self) {}
    }

    fn scenario() -> DatabaseManager {
        DatabaseManager::from_drivers(vec![
            sqlite(
                "formulario",
                "CREATE TABLE usuarios (id INTEGER, nombre TEXT);
                 INSERT INTO usuarios VALUES (1, 'Ever'), (2, 'Ana');",
            ),
            Arc::new(FailingDriver),
            sqlite(
                "geoportal_electoral",
                "CREATE TABLE votos (id INTEGER, candidato VARCHAR(40));
                 CREATE TABLE mesas (numero INTEGER);
                 INSERT INTO votos VALUES (1, 'EVERARDO'), (2, 'Luis'), (3, 'Everest');",
            ),
        ])
    }

    #[tokio::test]
    async fn test_search_across_scenario() {
        let manager = scenario();
        let results = manager.search_across("ever", 10).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].database, "formulario");
        assert_eq!(results[0].table, "usuarios");
        assert_eq!(results[0].match_count, 1);
        assert_eq!(results[1].database, "geoportal_electoral");
        assert_eq!(results[1].table, "votos");
        assert_eq!(results[1].match_count, 2);
    }

    #[tokio::test]
    async fn test_search_skips_tables_without_text_columns() {
        let manager = DatabaseManager::from_drivers(vec![sqlite(
            "geoportal_electoral",
            "CREATE TABLE usuarios (nombre TEXT, email TEXT);
             CREATE TABLE votos (id INT);
             INSERT INTO votos VALUES (1), (2);
             INSERT INTO usuarios VALUES
                ('Ever', 'ever@x.com'), ('Evelyn', 'evelyn@x.com'), ('Everardo', 'e1@x.com'),
                ('Ana', 'ana@forever.org'), ('Luis', 'luis@x.com'), ('EVEREST', 'e2@x.com'),
                ('Clever', 'c@x.com'), ('Severo', 'severo@x.com');",
        )]);

        let results = manager
            .search_in("geoportal_electoral", "ever", 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].table, "usuarios");
        assert!(results[0].match_count <= 5);
        assert_eq!(results[0].match_count, results[0].records.len());
        assert_eq!(results[0].match_count, 5);
    }

    #[tokio::test]
    async fn test_from_config_sqlite_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            driver: DbDriverKind::Sqlite,
            names: vec!["formulario".to_string(), "geoportal_electoral".to_string()],
            sqlite_dir: dir.path().to_path_buf(),
            ..DatabaseConfig::default()
        };

        let seed = SqliteDriver::open("formulario", &config.sqlite_path("formulario")).unwrap();
        seed.execute_batch(
            "CREATE TABLE usuarios (id INTEGER, nombre TEXT);
             INSERT INTO usuarios VALUES (1, 'Ever'), (2, 'Ana');",
        )
        .unwrap();
        seed.close().await;

        let manager = DatabaseManager::from_config(&config).unwrap();
        assert_eq!(
            manager.list_databases(),
            vec!["formulario", "geoportal_electoral"]
        );
        assert!(config.sqlite_path("geoportal_electoral").exists());

        let results = manager.search_across("ever", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].database, "formulario");
        assert_eq!(results[0].records[0]["nombre"], "Ever");

        manager.close_all().await;
    }

    #[tokio::test]
    async fn test_search_limit() {
        let manager = scenario();
        let results = manager.search_in("geoportal_electoral", "ever", 1).await.unwrap();
        assert_eq!(results[0].records.len(), 1);
    }

    #[tokio::test]
    async fn test_count_occurrences_isolation() {
        let manager = scenario();
        let counts = manager.count_occurrences("ever").await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.by_database["broken"], 0);
        assert_eq!(counts.by_database["formulario"], 1);
        assert_eq!(counts.by_database["geoportal_electoral"], 2);
    }

    #[tokio::test]
    async fn test_database_info() {
        let manager = scenario();
        let info = manager.database_info("geoportal_electoral").await.unwrap();
        assert_eq!(info.tables, vec!["mesas", "votos"]);
        assert_eq!(info.description, "Base de datos geoportal_electoral");

        let err = manager.database_info("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(
            manager.list_databases(),
            vec!["formulario", "broken", "geoportal_electoral"]
        );
    }

    #[tokio::test]
    async fn test_probe_and_close() {
        let manager = scenario();
        let probes = manager.probe_all().await;
        assert_eq!(probes.iter().filter(|p| p.connected).count(), 2);
        assert!(manager.is_connected());

        manager.close_all().await;
        manager.close_all().await;
        assert!(manager.is_closed());
        assert!(!manager.is_connected());
        assert!(manager.search_across("ever", 10).await.is_err());
    }
}
