//! `database_search` - 전체 데이터베이스 텍스트 검색

use super::{int_arg, str_arg, timestamp};
use crate::database::{DatabaseManager, DatabaseMatch};
use apilink_foundation::{Error, Result, ToolDescriptor, ToolProvider};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_LIMIT: i64 = 20;
const MIN_TERM_LEN: usize = 2;
const SAMPLE_RECORDS: usize = 3;

pub const DATABASE_SEARCH_SUGGESTION: &str =
    "Verifique la conexión a la base de datos y los parámetros de búsqueda";

pub struct DatabaseSearchTool {
    manager: Arc<DatabaseManager>,
}

impl DatabaseSearchTool {
    pub fn new(manager: Arc<DatabaseManager>) -> Self {
        Self { manager }
    }

    async fn search(&self, term: &str, limit: i64, include_count: bool) -> Result<Value> {
        let matches = self.manager.search_across(term, limit).await?;

        let statistics = if include_count {
            let counts = self.manager.count_occurrences(term).await?;
            json!({
                "totalOccurrences": counts.total,
                "byDatabase": counts.by_database,
            })
        } else {
            Value::Null
        };

        Ok(json!({
            "success": true,
            "searchTerm": term,
            "results": format_results(&matches, term),
            "statistics": statistics,
            "metadata": {
                "timestamp": timestamp(),
                "searchLimit": limit,
            }
        }))
    }
}

/// 데이터베이스별 요약 + 테이블별 샘플 레코드
fn format_results(matches: &[DatabaseMatch], term: &str) -> Value {
    if matches.is_empty() {
        return json!({
            "message": format!("No se encontraron resultados para \"{}\"", term),
            "databasesSearched": 0,
            "totalRecords": 0,
        });
    }

    let mut by_database = Map::new();
    let mut total_records = 0;
    let mut detailed = Vec::with_capacity(matches.len());

    for m in matches {
        let entry = by_database
            .entry(m.database.clone())
            .or_insert_with(|| json!({ "tables": 0, "records": 0 }));
        entry["tables"] = json!(entry["tables"].as_u64().unwrap_or(0) + 1);
        entry["records"] =
            json!(entry["records"].as_u64().unwrap_or(0) + m.match_count as u64);
        total_records += m.match_count;

        detailed.push(json!({
            "database": m.database,
            "table": m.table,
            "recordCount": m.match_count,
            "sampleRecords": m.records.iter().take(SAMPLE_RECORDS).collect::<Vec<_>>(),
        }));
    }

    json!({
        "summary": {
            "totalDatabases": by_database.len(),
            "totalTables": matches.len(),
            "totalRecords": total_records,
            "byDatabase": by_database,
        },
        "detailedResults": detailed,
        "searchTerm": term,
    })
}

#[async_trait]
impl ToolProvider for DatabaseSearchTool {
    fn name(&self) -> &str {
        "database_search"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("database_search")
            .description("Buscar información en todas las bases de datos de la empresa")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "searchTerm": {
                        "type": "string",
                        "description": "Término a buscar (ej: \"ever\", \"usuario\", etc.)"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Límite de resultados por base de datos",
                        "default": DEFAULT_LIMIT
                    },
                    "includeCount": {
                        "type": "boolean",
                        "description": "Incluir conteo total de ocurrencias",
                        "default": true
                    }
                },
                "required": ["searchTerm"]
            }))
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let term = str_arg(&arguments, "searchTerm").unwrap_or_default();
        if term.trim().chars().count() < MIN_TERM_LEN {
            return Err(Error::InvalidParams(
                "El término de búsqueda debe tener al menos 2 caracteres".to_string(),
            ));
        }

        let limit = int_arg(&arguments, "limit", DEFAULT_LIMIT).max(1);
        let include_count = arguments
            .get("includeCount")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        info!("Searching \"{}\" across all databases", term);

        match self.search(term, limit, include_count).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("database_search failed: {}", e);
                Ok(json!({
                    "success": false,
                    "error": e.to_string(),
                    "suggestion": DATABASE_SEARCH_SUGGESTION,
                }))
            }
        }
    }
}
