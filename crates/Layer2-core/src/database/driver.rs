//! SqlDriver - 논리 데이터베이스 하나에 대한 연결 추상화

use super::query::Dialect;
use apilink_foundation::Result;
use async_trait::async_trait;
use serde_json::Value;

/// 테이블과 텍스트 컬럼 (ordinal 순서)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub table: String,
    pub columns: Vec<String>,
}

/// 데이터베이스 드라이버
///
/// 각 인스턴스는 설정된 데이터베이스 이름 하나와 그 연결 풀을 소유합니다.
#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// 논리 데이터베이스 이름
    fn name(&self) -> &str;

    fn dialect(&self) -> Dialect;

    /// 연결 확인
    async fn ping(&self) -> Result<()>;

    /// 기본 테이블 목록
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// 텍스트 컬럼을 테이블별로 묶어 반환 (텍스트 컬럼이 없는 테이블은 제외)
    async fn text_columns(&self) -> Result<Vec<TableColumns>>;

    /// 검색 쿼리 실행, 행을 JSON 객체로 반환
    async fn fetch_rows(&self, sql: &str, pattern: &str, limit: i64) -> Result<Vec<Value>>;

    /// COUNT 쿼리 실행
    async fn fetch_count(&self, sql: &str, pattern: &str) -> Result<u64>;

    /// 연결 풀 종료
    async fn close(&self);
}

/// `(table, column)` 행을 테이블별로 묶기 (입력 순서 유지)
pub(crate) fn group_columns(rows: Vec<(String, String)>) -> Vec<TableColumns> {
    let mut grouped: Vec<TableColumns> = Vec::new();
    for (table, column) in rows {
        match grouped.last_mut() {
            Some(last) if last.table == table => last.columns.push(column),
            _ => {
                if let Some(existing) = grouped.iter_mut().find(|t| t.table == table) {
                    existing.columns.push(column);
                } else {
                    grouped.push(TableColumns {
                        table,
                        columns: vec![column],
                    });
                }
            }
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_columns() {
        let grouped = group_columns(vec![
            ("a".into(), "x".into()),
            ("a".into(), "y".into()),
            ("b".into(), "z".into()),
            ("a".into(), "w".into()),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].columns, vec!["x", "y", "w"]);
        assert_eq!(grouped[1].table, "b");
    }
}
