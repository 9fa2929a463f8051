//! Database - 여러 데이터베이스에 걸친 텍스트 검색
//!
//! ## 기능
//! - 스키마 조회로 텍스트 컬럼 탐색
//! - 테이블별 동적 검색 쿼리 (식별자 인용, 바인드 파라미터)
//! - 테이블/데이터베이스 단위 부분 실패 집계
//!
//! ## 드라이버
//! - PostgreSQL (sqlx)
//! - SQLite (rusqlite)

mod driver;
mod manager;
mod postgres;
mod query;
mod sqlite;

pub use driver::{SqlDriver, TableColumns};
pub use manager::{
    DatabaseInfo, DatabaseManager, DatabaseMatch, OccurrenceCount, ProbeResult, TableMatch,
};
pub use postgres::PostgresDriver;
pub use query::{contains_pattern, quote_ident, Dialect, SearchQuery};
pub use sqlite::SqliteDriver;
