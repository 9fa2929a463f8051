//! McpServer - JSON-RPC 메서드 디스패처
//!
//! 전송 계층과 무관하게 메시지 하나를 받아 응답 하나(또는 없음)를 돌려줍니다.
//!
//! ## 기능
//! - `initialize` 버전 협상
//! - 리소스 스킴 / 도구 이름 기반 라우팅
//! - 표준 JSON-RPC 에러 매핑
//!
//! ```ignore
//! let server = McpServer::builder()
//!     .server_info("bispace", "1.0.0")
//!     .tool(Arc::new(ApiQueryTool::new(client)))
//!     .resource(Arc::new(SystemResource::new(registry)))
//!     .build()?;
//!
//! let reply = server.handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
//! ```

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::types::{Implementation, InitializeParams, InitializeResult, ToolCallResult};
use apilink_foundation::{
    Error, ResourceProvider, Result, ToolProvider, DEFAULT_PROTOCOL_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 프로토콜 디스패처
pub struct McpServer {
    info: Implementation,
    /// 등록 순서 유지 (`tools/list` 순서)
    tools: Vec<Arc<dyn ToolProvider>>,
    resources: Vec<Arc<dyn ResourceProvider>>,
    initialized: AtomicBool,
}

/// McpServer 빌더
pub struct McpServerBuilder {
    info: Implementation,
    tools: Vec<Arc<dyn ToolProvider>>,
    resources: Vec<Arc<dyn ResourceProvider>>,
}

impl Default for McpServerBuilder {
    fn default() -> Self {
        Self {
            info: Implementation::new("bispace", "1.0.0"),
            tools: Vec::new(),
            resources: Vec::new(),
        }
    }
}

impl McpServerBuilder {
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.info = Implementation::new(name, version);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn ToolProvider>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn resource(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.resources.push(provider);
        self
    }

    /// 중복된 도구 이름이나 스킴이 있으면 실패
    pub fn build(self) -> Result<McpServer> {
        let mut names = HashSet::new();
        for tool in &self.tools {
            if !names.insert(tool.name().to_string()) {
                return Err(Error::Config(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
        }

        let mut schemes = HashSet::new();
        for provider in &self.resources {
            if !schemes.insert(provider.scheme().to_string()) {
                return Err(Error::Config(format!(
                    "duplicate resource scheme '{}'",
                    provider.scheme()
                )));
            }
        }

        info!(
            "MCP server '{}' ready: {} tools, {} resource schemes",
            self.info.name,
            self.tools.len(),
            self.resources.len()
        );

        Ok(McpServer {
            info: self.info,
            tools: self.tools,
            resources: self.resources,
            initialized: AtomicBool::new(false),
        })
    }
}

impl McpServer {
    pub fn builder() -> McpServerBuilder {
        McpServerBuilder::default()
    }

    pub fn server_info(&self) -> &Implementation {
        &self.info
    }

    /// `initialize` 성공 여부 (다른 메서드 호출을 막지는 않음)
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    // ========================================================================
    // 진입점
    // ========================================================================

    /// 원본 텍스트 메시지 처리
    ///
    /// JSON 파싱 실패는 id 없는 `-32700` 응답을 돌려줍니다.
    pub async fn handle_message(&self, text: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                warn!("Invalid JSON message: {}", e);
                Some(JsonRpcResponse::failure(None, JsonRpcError::parse_error()))
            }
        }
    }

    /// 파싱된 메시지 처리 (검증 포함)
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.handle_request(request).await,
            Err(invalid) => {
                warn!("Invalid request: {}", invalid.error.message);
                invalid
                    .id
                    .map(|id| JsonRpcResponse::failure(Some(id), invalid.error))
            }
        }
    }

    /// 검증된 요청 처리 (알림이면 응답 없음)
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("-> {} (id: {:?})", request.method, request.id);
        let result = self.dispatch(&request.method, request.params).await;

        let Some(id) = request.id else {
            if let Err(e) = result {
                debug!("Notification {} failed: {}", request.method, e.message);
            }
            return None;
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        })
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(self.initialize(params)),
            "notifications/initialized" => Ok(Value::Null),
            "resources/list" => Ok(self.list_resources()),
            "resources/read" => self.read_resource(params).await,
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(params).await,
            "ping" => Ok(json!("pong")),
            "notifications/cancelled" => {
                debug!("Cancellation acknowledged: {:?}", params);
                Ok(json!({ "cancelled": true }))
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    // ========================================================================
    // 메서드 핸들러
    // ========================================================================

    fn initialize(&self, params: Option<Value>) -> Value {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        let protocol_version = params
            .protocol_version
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()))
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        if let Some(client) = &params.client_info {
            info!(
                "Client initialized: {} {} (protocol {})",
                client.name, client.version, protocol_version
            );
        }
        self.initialized.store(true, Ordering::SeqCst);

        let result = InitializeResult {
            protocol_version,
            capabilities: json!({
                "resources": {},
                "tools": {},
                "logging": {}
            }),
            server_info: self.info.clone(),
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    fn list_resources(&self) -> Value {
        let resources: Vec<_> = self
            .resources
            .iter()
            .flat_map(|p| p.descriptors())
            .collect();
        json!({ "resources": resources })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<_> = self.tools.iter().map(|t| t.descriptor()).collect();
        json!({ "tools": tools })
    }

    async fn read_resource(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing uri parameter"))?;

        let provider = self.provider_for(uri).map_err(|e| JsonRpcError::from(&e))?;

        provider.read(uri).await.map_err(|e| {
            warn!("Failed to read resource {}: {}", uri, e);
            JsonRpcError::internal_error(e.to_string())
        })
    }

    fn provider_for(&self, uri: &str) -> Result<&Arc<dyn ResourceProvider>> {
        let scheme = uri
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| Error::InvalidUri(uri.to_string()))?;

        self.resources
            .iter()
            .find(|p| p.scheme() == scheme)
            .ok_or_else(|| Error::UnsupportedScheme(scheme.to_string()))
    }

    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params = params.unwrap_or(Value::Null);
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;

        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| JsonRpcError::from(&Error::ToolNotFound(name.to_string())))?;

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let result = match tool.execute(arguments).await {
            Ok(payload) => ToolCallResult::from_payload(&payload),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolCallResult::failure(e.to_string())
            }
        };
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilink_foundation::{ResourceDescriptor, ToolDescriptor};
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl ToolProvider for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("echo").description("Echo arguments")
        }
        async fn execute(&self, arguments: Value) -> Result<Value> {
            if arguments.get("fail").is_some() {
                return Err(Error::InvalidParams("boom".into()));
            }
            Ok(json!({ "success": true, "echo": arguments }))
        }
    }

    struct MemoryResource;

    #[async_trait]
    impl ResourceProvider for MemoryResource {
        fn scheme(&self) -> &str {
            "mem"
        }
        fn descriptors(&self) -> Vec<ResourceDescriptor> {
            vec![ResourceDescriptor::new("mem://{key}").name("Memory")]
        }
        async fn read(&self, uri: &str) -> Result<Value> {
            match uri {
                "mem://a" => Ok(json!({ "value": 1 })),
                _ => Err(Error::NotFound(uri.to_string())),
            }
        }
    }

    fn server() -> McpServer {
        McpServer::builder()
            .tool(Arc::new(EchoTool))
            .resource(Arc::new(MemoryResource))
            .build()
            .unwrap()
    }

    async fn call(server: &McpServer, message: Value) -> JsonRpcResponse {
        server.handle_value(message).await.unwrap()
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let err = McpServer::builder()
            .tool(Arc::new(EchoTool))
            .tool(Arc::new(EchoTool))
            .build();
        assert!(err.is_err());

        let err = McpServer::builder()
            .resource(Arc::new(MemoryResource))
            .resource(Arc::new(MemoryResource))
            .build();
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server();
        assert!(!server.is_initialized());

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": { "protocolVersion": "2024-11-05", "clientInfo": { "name": "t", "version": "0" } }
            }),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "bispace");
        assert!(result["capabilities"].get("tools").is_some());
        assert!(server.is_initialized());

        let response = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 2, "method": "initialize", "params": { "protocolVersion": "1999-01-01" } }),
        )
        .await;
        assert_eq!(response.result.unwrap()["protocolVersion"], "2025-06-18");
    }

    #[tokio::test]
    async fn test_ping_without_initialize() {
        let server = server();
        let response = call(&server, json!({ "jsonrpc": "2.0", "id": 9, "method": "ping" })).await;
        assert_eq!(response.result, Some(json!("pong")));
        assert!(!server.is_initialized());
    }

    #[tokio::test]
    async fn test_unknown_method_and_notifications() {
        let server = server();
        let response = call(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "foo/bar" })).await;
        assert_eq!(response.error.unwrap().code, -32601);

        let none = server
            .handle_value(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
        assert!(none.is_none());

        let cancelled = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 3, "method": "notifications/cancelled", "params": { "requestId": 1 } }),
        )
        .await;
        assert_eq!(cancelled.result.unwrap()["cancelled"], true);
    }

    #[tokio::test]
    async fn test_invalid_messages() {
        let server = server();
        let parse = server.handle_message("not-json").await.unwrap();
        assert!(parse.id.is_none());
        assert_eq!(parse.error.unwrap().code, -32700);

        let invalid = server
            .handle_value(json!({ "jsonrpc": "1.0", "id": 4, "method": "ping" }))
            .await
            .unwrap();
        assert_eq!(invalid.error.unwrap().code, -32600);

        // id 없는 잘못된 요청은 응답하지 않음
        assert!(server.handle_value(json!({ "method": "ping" })).await.is_none());
    }

    #[tokio::test]
    async fn test_resources() {
        let server = server();
        let list = call(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "resources/list" })).await;
        assert_eq!(list.result.unwrap()["resources"][0]["uri"], "mem://{key}");

        let read = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 2, "method": "resources/read", "params": { "uri": "mem://a" } }),
        )
        .await;
        assert_eq!(read.result.unwrap()["value"], 1);

        let missing = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": {} }),
        )
        .await;
        let error = missing.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Missing uri parameter");

        let scheme = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 4, "method": "resources/read", "params": { "uri": "ftp://x" } }),
        )
        .await;
        assert_eq!(scheme.error.unwrap().code, -32602);

        let failed = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/read", "params": { "uri": "mem://zzz" } }),
        )
        .await;
        assert_eq!(failed.error.unwrap().code, -32603);
    }

    #[tokio::test]
    async fn test_tools() {
        let server = server();
        let list = call(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" })).await;
        assert_eq!(list.result.unwrap()["tools"][0]["name"], "echo");

        let ok = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": { "name": "echo", "arguments": { "x": 1 } } }),
        )
        .await;
        let result = ok.result.unwrap();
        assert!(result.get("isError").is_none());
        let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["echo"]["x"], 1);

        let unknown = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": { "name": "nope" } }),
        )
        .await;
        let error = unknown.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Tool not supported: nope");

        let thrown = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": { "name": "echo", "arguments": { "fail": true } } }),
        )
        .await;
        assert!(thrown.error.is_none());
        assert_eq!(thrown.result.unwrap()["isError"], true);

        let missing = call(
            &server,
            json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {} }),
        )
        .await;
        assert_eq!(missing.error.unwrap().code, -32602);
    }
}
