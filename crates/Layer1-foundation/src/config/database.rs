//! Database Configuration - 데이터베이스 연결 설정

use super::{parse_var, string_var};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 기본 검색 대상 데이터베이스
const DEFAULT_DATABASES: &[&str] = &["geoportal_electoral", "formulario", "db_fijo_ac"];

/// 데이터베이스 드라이버 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbDriverKind {
    Postgres,
    Sqlite,
}

impl std::str::FromStr for DbDriverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DbDriverKind::Postgres),
            "sqlite" => Ok(DbDriverKind::Sqlite),
            other => Err(format!("unknown driver '{}'", other)),
        }
    }
}

/// 데이터베이스 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub driver: DbDriverKind,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// 논리 데이터베이스 이름 목록 (각각 별도 풀)
    pub names: Vec<String>,
    /// SQLite 파일 디렉토리 (`<name>.db`)
    pub sqlite_dir: PathBuf,
    /// 풀 최대 연결 수
    pub pool_max: u32,
    /// 유휴 연결 타임아웃 (초)
    pub idle_timeout_secs: u64,
    /// 연결 획득 타임아웃 (밀리초)
    pub connect_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DbDriverKind::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            names: DEFAULT_DATABASES.iter().map(|s| s.to_string()).collect(),
            sqlite_dir: PathBuf::from("."),
            pool_max: 20,
            idle_timeout_secs: 30,
            connect_timeout_ms: 2000,
        }
    }
}

impl DatabaseConfig {
    pub(crate) fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let names = match lookup("DB_NAMES") {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => defaults.names.clone(),
        };

        Ok(Self {
            driver: parse_var(lookup, "DB_DRIVER", defaults.driver)?,
            host: string_var(lookup, "DB_HOST", &defaults.host),
            port: parse_var(lookup, "DB_PORT", defaults.port)?,
            user: string_var(lookup, "DB_USER", &defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            names,
            sqlite_dir: lookup("DB_SQLITE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_dir),
            pool_max: parse_var(lookup, "DB_POOL_MAX", defaults.pool_max)?,
            idle_timeout_secs: defaults.idle_timeout_secs,
            connect_timeout_ms: parse_var(
                lookup,
                "DB_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout_ms,
            )?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_max == 0 {
            return Err(Error::Config("DB_POOL_MAX must be greater than 0".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for name in &self.names {
            if !seen.insert(name.as_str()) {
                return Err(Error::Config(format!("duplicate database name: {}", name)));
            }
        }
        Ok(())
    }

    /// PostgreSQL 연결 URL
    pub fn postgres_url(&self, database: &str) -> String {
        let auth = if self.password.is_empty() {
            urlencode(&self.user)
        } else {
            format!("{}:{}", urlencode(&self.user), urlencode(&self.password))
        };
        format!(
            "postgres://{}@{}:{}/{}",
            auth,
            self.host,
            self.port,
            urlencode(database)
        )
    }

    /// SQLite 파일 경로
    pub fn sqlite_path(&self, database: &str) -> PathBuf {
        self.sqlite_dir.join(format!("{}.db", database))
    }
}

fn urlencode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
