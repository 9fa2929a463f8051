//! `api_query` - 등록된 API 엔드포인트 호출

use super::{str_arg, timestamp};
use crate::api::{ApiQueryClient, HttpMethod};
use apilink_foundation::{Error, Result, ToolDescriptor, ToolProvider};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const API_QUERY_SUGGESTION: &str =
    "Verifique que la API esté disponible y los parámetros sean correctos";

pub struct ApiQueryTool {
    client: Arc<ApiQueryClient>,
}

impl ApiQueryTool {
    pub fn new(client: Arc<ApiQueryClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolProvider for ApiQueryTool {
    fn name(&self) -> &str {
        "api_query"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("api_query")
            .description("Consultar endpoints de APIs dinámicas registradas")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "apiId": {
                        "type": "string",
                        "description": "ID de la API a consultar"
                    },
                    "endpoint": {
                        "type": "string",
                        "description": "Endpoint a consultar (ej: /usuarios)"
                    },
                    "params": {
                        "type": "object",
                        "description": "Parámetros de consulta",
                        "additionalProperties": true
                    },
                    "method": {
                        "type": "string",
                        "enum": ["GET", "POST", "PUT", "DELETE"],
                        "default": "GET"
                    }
                },
                "required": ["apiId", "endpoint"]
            }))
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        // 인자 오류도 호출 실패와 같은 페이로드로 보고
        let (api_id, endpoint, method) = match parse_arguments(&arguments) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("api_query rejected arguments: {}", e);
                return Ok(failure(&e));
            }
        };
        let params = arguments.get("params").cloned().unwrap_or_else(|| json!({}));

        info!("api_query {} {}{}", method.as_str(), api_id, endpoint);

        match self
            .client
            .query_with_method(api_id, endpoint, &params, method)
            .await
        {
            Ok(data) => Ok(json!({
                "success": true,
                "data": data,
                "metadata": {
                    "apiId": api_id,
                    "endpoint": endpoint,
                    "method": method.as_str(),
                    "timestamp": timestamp(),
                }
            })),
            Err(e) => {
                warn!("api_query {}{} failed: {}", api_id, endpoint, e);
                Ok(failure(&e))
            }
        }
    }
}

fn parse_arguments(arguments: &Value) -> Result<(&str, &str, HttpMethod)> {
    let api_id = str_arg(arguments, "apiId")
        .ok_or_else(|| Error::InvalidParams("apiId is required".into()))?;
    let endpoint = str_arg(arguments, "endpoint")
        .ok_or_else(|| Error::InvalidParams("endpoint is required".into()))?;
    let method: HttpMethod = str_arg(arguments, "method").unwrap_or("GET").parse()?;
    Ok((api_id, endpoint, method))
}

fn failure(error: &Error) -> Value {
    json!({
        "success": false,
        "error": error.to_string(),
        "suggestion": API_QUERY_SUGGESTION,
    })
}
