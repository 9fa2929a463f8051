//! Resource Providers - URI 스킴별 읽기 전용 리소스
//!
//! ## 스킴
//! - `api://{apiId}/{endpoint}` - 등록된 REST API 조회
//! - `system://{info|memory|cpu|uptime|apis}` - 프로세스/호스트 정보
//! - `database://{name|all}/{info|search|count}?term=` - 데이터베이스 검색

mod api;
mod database;
mod system;

pub use api::ApiResource;
pub use database::DatabaseResource;
pub use system::SystemResource;

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// 지연 컴파일된 URI 패턴으로 매칭
pub(crate) fn match_uri<'a>(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
    uri: &'a str,
) -> Option<Captures<'a>> {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .and_then(|re| re.captures(uri))
}
