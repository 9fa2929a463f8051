//! `api_discovery` - 레지스트리 검색

use super::{int_arg, str_arg, timestamp};
use apilink_foundation::{ApiDescriptor, ApiRegistry, Result, ToolDescriptor, ToolProvider};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

pub struct ApiDiscoveryTool {
    registry: Arc<ApiRegistry>,
}

impl ApiDiscoveryTool {
    pub fn new(registry: Arc<ApiRegistry>) -> Self {
        Self { registry }
    }
}

/// 이름/설명/키워드/엔드포인트 경로와 설명에서 부분 문자열 검색
fn matches_query(api: &ApiDescriptor, query: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(query);

    contains(&api.name)
        || contains(&api.description)
        || api.keywords.iter().any(|k| contains(k))
        || api
            .endpoints
            .iter()
            .any(|e| contains(&e.path) || contains(&e.description))
}

fn summarize(api: &ApiDescriptor) -> Value {
    json!({
        "id": api.id,
        "name": api.name,
        "description": api.description,
        "type": api.api_type,
        "baseUrl": api.base_url,
        "endpoints": api.endpoints.iter().map(|e| json!({
            "path": e.path,
            "description": e.description,
            "method": e.method,
        })).collect::<Vec<_>>(),
    })
}

#[async_trait]
impl ToolProvider for ApiDiscoveryTool {
    fn name(&self) -> &str {
        "api_discovery"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("api_discovery")
            .description("Descubrir APIs disponibles basado en consultas")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Consulta para buscar APIs (ej: \"usuarios\", \"activos\")"
                    },
                    "type": {
                        "type": "string",
                        "description": "Filtrar por tipo de API"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Límite de resultados",
                        "default": DEFAULT_LIMIT
                    }
                }
            }))
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let query = str_arg(&arguments, "query").filter(|q| !q.is_empty());
        let api_type = str_arg(&arguments, "type").filter(|t| !t.is_empty());
        let limit = int_arg(&arguments, "limit", DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;

        let all = self.registry.all();
        let total = all.len();

        let type_filter = api_type.map(str::to_lowercase);
        let query_filter = query.map(str::to_lowercase);

        let apis: Vec<Value> = all
            .iter()
            .filter(|api| {
                type_filter
                    .as_deref()
                    .map_or(true, |t| api.api_type.to_lowercase().contains(t))
            })
            .filter(|api| query_filter.as_deref().map_or(true, |q| matches_query(api, q)))
            .take(limit)
            .map(summarize)
            .collect();

        debug!(
            "api_discovery query={:?} type={:?}: {} of {}",
            query,
            api_type,
            apis.len(),
            total
        );

        Ok(json!({
            "success": true,
            "count": apis.len(),
            "total": total,
            "apis": apis,
            "metadata": {
                "query": query,
                "timestamp": timestamp(),
            }
        }))
    }
}
