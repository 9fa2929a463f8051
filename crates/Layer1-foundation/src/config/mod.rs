//! Config - 환경 변수 기반 설정
//!
//! - `app.rs` - AppConfig 통합 설정 (서버, 클라이언트, API 호출)
//! - `database.rs` - 데이터베이스 연결 설정
//!
//! 설정은 프로세스 시작 시 한 번 읽으며 런타임 재로딩은 지원하지 않습니다.

mod app;
mod database;

pub use app::{
    ApiClientConfig, AppConfig, ClientConfig, Environment, ReconnectConfig, ServerConfig,
    DEFAULT_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
pub use database::{DatabaseConfig, DbDriverKind};

use crate::{Error, Result};
use std::str::FromStr;

/// 변수 조회 후 파싱, 없으면 기본값
pub(crate) fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Config(format!("{}='{}': {}", key, raw, e))),
        _ => Ok(default),
    }
}

/// 문자열 변수 조회, 없거나 비어 있으면 기본값
pub(crate) fn string_var<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
