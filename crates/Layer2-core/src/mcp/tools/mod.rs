//! Tool Providers - `tools/call`로 호출되는 도구
//!
//! ## 도구
//! - `api_query` - 등록된 API 엔드포인트 호출
//! - `api_discovery` - 레지스트리 검색
//! - `database_search` - 전체 데이터베이스 텍스트 검색
//!
//! 실행 실패는 `success: false` 페이로드로 보고합니다.

mod api_discovery;
mod api_query;
mod database_search;

pub use api_discovery::ApiDiscoveryTool;
pub use api_query::ApiQueryTool;
pub use database_search::DatabaseSearchTool;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// 메타데이터용 ISO-8601 타임스탬프
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn str_arg<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str)
}

/// 숫자 인자 (없거나 숫자가 아니면 기본값)
pub(crate) fn int_arg(arguments: &Value, key: &str, default: i64) -> i64 {
    arguments
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(default)
}
