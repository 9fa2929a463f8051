//! `database://` 리소스 - 정보/검색/카운트

use super::match_uri;
use crate::database::DatabaseManager;
use crate::mcp::types::json_content;
use apilink_foundation::{Error, ResourceDescriptor, ResourceProvider, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tracing::debug;

const DATABASE_URI_PATTERN: &str = r"^database://([^/]+)/([^?]+)(\?.*)?$";
static DATABASE_URI: OnceLock<Option<Regex>> = OnceLock::new();

/// 모든 데이터베이스를 뜻하는 이름
const ALL_DATABASES: &str = "all";

/// 리소스 검색 시 테이블당 최대 행
const RESOURCE_SEARCH_LIMIT: i64 = 50;

#[derive(Debug, PartialEq)]
struct DatabaseUri {
    database: String,
    resource: String,
    term: Option<String>,
}

impl DatabaseUri {
    fn parse(uri: &str) -> Result<Self> {
        let captures = match_uri(&DATABASE_URI, DATABASE_URI_PATTERN, uri)
            .ok_or_else(|| Error::InvalidUri(uri.to_string()))?;

        let term = captures.get(3).and_then(|query| {
            url::form_urlencoded::parse(query.as_str().trim_start_matches('?').as_bytes())
                .find(|(key, _)| key == "term")
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        });

        Ok(Self {
            database: captures[1].to_string(),
            resource: captures[2].to_string(),
            term,
        })
    }

    fn is_all(&self) -> bool {
        self.database == ALL_DATABASES
    }

    fn require_term(&self) -> Result<&str> {
        self.term
            .as_deref()
            .ok_or_else(|| Error::MissingParameter("term".to_string()))
    }
}

pub struct DatabaseResource {
    manager: Arc<DatabaseManager>,
}

impl DatabaseResource {
    pub fn new(manager: Arc<DatabaseManager>) -> Self {
        Self { manager }
    }

    async fn info(&self, uri: &DatabaseUri) -> Result<Value> {
        if uri.is_all() {
            let mut infos = Vec::new();
            for name in self.manager.list_databases() {
                infos.push(self.manager.database_info(&name).await?);
            }
            return Ok(serde_json::to_value(infos)?);
        }
        Ok(serde_json::to_value(
            self.manager.database_info(&uri.database).await?,
        )?)
    }

    async fn search(&self, uri: &DatabaseUri) -> Result<Value> {
        let term = uri.require_term()?;
        let results = if uri.is_all() {
            serde_json::to_value(
                self.manager
                    .search_across(term, RESOURCE_SEARCH_LIMIT)
                    .await?,
            )?
        } else {
            serde_json::to_value(
                self.manager
                    .search_in(&uri.database, term, RESOURCE_SEARCH_LIMIT)
                    .await?,
            )?
        };

        Ok(json!({
            "searchTerm": term,
            "results": results,
            "database": uri.database,
        }))
    }

    async fn count(&self, uri: &DatabaseUri) -> Result<Value> {
        let term = uri.require_term()?;
        let count = if uri.is_all() {
            serde_json::to_value(self.manager.count_occurrences(term).await?)?
        } else {
            json!(self.manager.count_in(&uri.database, term).await?)
        };

        Ok(json!({
            "term": term,
            "count": count,
        }))
    }
}

#[async_trait]
impl ResourceProvider for DatabaseResource {
    fn scheme(&self) -> &str {
        "database"
    }

    fn descriptors(&self) -> Vec<ResourceDescriptor> {
        vec![ResourceDescriptor::new("database://{databaseName}/{resourceType}")
            .name("Database Resource")
            .description("Información y búsqueda en bases de datos de la empresa")]
    }

    async fn read(&self, uri: &str) -> Result<Value> {
        let parsed = DatabaseUri::parse(uri)?;
        debug!(
            "Reading database resource {} ({} / {})",
            uri, parsed.database, parsed.resource
        );

        let data = match parsed.resource.as_str() {
            "info" => self.info(&parsed).await?,
            "search" => self.search(&parsed).await?,
            "count" => self.count(&parsed).await?,
            other => {
                return Err(Error::NotFound(format!(
                    "unsupported database resource type '{}'",
                    other
                )))
            }
        };

        Ok(json_content(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{SqlDriver, SqliteDriver};

    fn manager() -> Arc<DatabaseManager> {
        let formulario = SqliteDriver::in_memory("formulario").unwrap();
        formulario
            .execute_batch(
                "CREATE TABLE usuarios (id INTEGER, nombre TEXT);
                 INSERT INTO usuarios VALUES (1, 'Ever'), (2, 'Ana');",
            )
            .unwrap();
        let geoportal = SqliteDriver::in_memory("geoportal_electoral").unwrap();
        geoportal
            .execute_batch(
                "CREATE TABLE votos (id INTEGER, candidato TEXT);
                 INSERT INTO votos VALUES (1, 'EVERARDO'), (2, 'Everest');",
            )
            .unwrap();

        let drivers: Vec<Arc<dyn SqlDriver>> = vec![Arc::new(formulario), Arc::new(geoportal)];
        Arc::new(DatabaseManager::from_drivers(drivers))
    }

    fn content(value: &Value) -> Value {
        serde_json::from_str(value["content"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_uri() {
        let uri = DatabaseUri::parse("database://all/search?term=ever%20a").unwrap();
        assert_eq!(
            uri,
            DatabaseUri {
                database: "all".into(),
                resource: "search".into(),
                term: Some("ever a".into()),
            }
        );

        let uri = DatabaseUri::parse("database://formulario/info").unwrap();
        assert!(uri.term.is_none());
        assert!(!uri.is_all());

        assert!(matches!(
            DatabaseUri::parse("database://formulario"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[tokio::test]
    async fn test_info() {
        let resource = DatabaseResource::new(manager());

        let single = content(&resource.read("database://formulario/info").await.unwrap());
        assert_eq!(single["tables"], json!(["usuarios"]));

        let all = content(&resource.read("database://all/info").await.unwrap());
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_and_count() {
        let resource = DatabaseResource::new(manager());

        let search = content(&resource.read("database://all/search?term=ever").await.unwrap());
        assert_eq!(search["searchTerm"], "ever");
        assert_eq!(search["database"], "all");
        assert_eq!(search["results"].as_array().unwrap().len(), 2);
        assert_eq!(search["results"][0]["database"], "formulario");

        let single = content(
            &resource
                .read("database://geoportal_electoral/search?term=ever")
                .await
                .unwrap(),
        );
        assert_eq!(single["results"][0]["matchCount"], 2);

        let count = content(&resource.read("database://all/count?term=ever").await.unwrap());
        assert_eq!(count["count"]["total"], 3);
        assert_eq!(count["count"]["byDatabase"]["formulario"], 1);

        let count = content(&resource.read("database://formulario/count?term=a").await.unwrap());
        assert_eq!(count["count"], 1);
    }

    #[tokio::test]
    async fn test_errors() {
        let resource = DatabaseResource::new(manager());

        let err = resource.read("database://all/search").await.unwrap_err();
        assert!(matches!(err, Error::MissingParameter(_)));

        let err = resource.read("database://all/drop").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = resource.read("database://nope/info").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
