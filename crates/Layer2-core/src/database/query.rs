//! 검색 쿼리 생성
//!
//! 식별자는 스키마 조회 결과만 사용하며 항상 큰따옴표로 감쌉니다.
//! 검색어와 LIMIT은 바인드 파라미터로만 전달합니다.

/// SQL 방언
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// 식별자 인용 (내부 큰따옴표는 두 번 반복)
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `%term%` 패턴
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", term)
}

/// 테이블 하나에 대한 텍스트 검색 쿼리
#[derive(Debug, Clone)]
pub struct SearchQuery<'a> {
    dialect: Dialect,
    table: &'a str,
    columns: &'a [String],
}

impl<'a> SearchQuery<'a> {
    pub fn new(dialect: Dialect, table: &'a str, columns: &'a [String]) -> Self {
        Self {
            dialect,
            table,
            columns,
        }
    }

    /// 어느 텍스트 컬럼이든 패턴을 포함하는 조건
    fn predicate(&self) -> String {
        self.columns
            .iter()
            .map(|col| match self.dialect {
                Dialect::Postgres => format!("{}::text ILIKE $1", quote_ident(col)),
                Dialect::Sqlite => format!("CAST({} AS TEXT) LIKE ?1", quote_ident(col)),
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    /// `SELECT * ... LIMIT` (바인드: 패턴, limit)
    pub fn select_sql(&self) -> String {
        let limit = match self.dialect {
            Dialect::Postgres => "$2",
            Dialect::Sqlite => "?2",
        };
        format!(
            "SELECT * FROM {} WHERE {} LIMIT {}",
            quote_ident(self.table),
            self.predicate(),
            limit
        )
    }

    /// `SELECT COUNT(*)` (바인드: 패턴)
    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            quote_ident(self.table),
            self.predicate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("usuarios"), "\"usuarios\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_ident("a; DROP TABLE x"), "\"a; DROP TABLE x\"");
    }

    #[test]
    fn test_postgres_sql() {
        let columns = vec!["nombre".to_string(), "email".to_string()];
        let query = SearchQuery::new(Dialect::Postgres, "usuarios", &columns);
        assert_eq!(
            query.select_sql(),
            "SELECT * FROM \"usuarios\" WHERE \"nombre\"::text ILIKE $1 OR \"email\"::text ILIKE $1 LIMIT $2"
        );
        assert_eq!(
            query.count_sql(),
            "SELECT COUNT(*) FROM \"usuarios\" WHERE \"nombre\"::text ILIKE $1 OR \"email\"::text ILIKE $1"
        );
    }

    #[test]
    fn test_sqlite_sql() {
        let columns = vec!["candidato".to_string()];
        let query = SearchQuery::new(Dialect::Sqlite, "votos", &columns);
        assert_eq!(
            query.select_sql(),
            "SELECT * FROM \"votos\" WHERE CAST(\"candidato\" AS TEXT) LIKE ?1 LIMIT ?2"
        );
        assert_eq!(contains_pattern("ever"), "%ever%");
    }
}
