//! apilink-core: Core Runtime for apilink
//!
//! Layer2 - 외부 API / 데이터베이스 / 프로토콜 구현 레이어
//!
//! # 주요 모듈
//!
//! - `api`: 레지스트리 기반 REST 호출과 헬스 체크
//! - `database`: 여러 데이터베이스에 걸친 텍스트 검색
//! - `mcp`: JSON-RPC 디스패처, 리소스/도구, 전송, 클라이언트
//!
//! # 사용 예시
//!
//! ```ignore
//! use apilink_core::{ApiQueryClient, DatabaseManager, McpServer};
//!
//! let registry = Arc::new(ApiRegistry::with_builtins());
//! let client = Arc::new(ApiQueryClient::new(registry.clone(), &config.api, config.environment)?);
//! let databases = Arc::new(DatabaseManager::from_config(&config.database)?);
//!
//! let server = build_server(&config.server, registry, client, databases)?;
//! let reply = server.handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
//! ```

pub mod api;
pub mod database;
pub mod mcp;

use apilink_foundation::{ApiRegistry, ServerConfig};
use std::sync::Arc;

// Re-exports: API
pub use api::{ApiQueryClient, ApiStatus, HealthStatus, HttpMethod};

// Re-exports: Database
pub use database::{
    DatabaseInfo, DatabaseManager, DatabaseMatch, OccurrenceCount, PostgresDriver, ProbeResult,
    SqlDriver, SqliteDriver, TableMatch,
};

// Re-exports: MCP
pub use mcp::{
    ApiDiscoveryTool, ApiQueryTool, ApiResource, AppState, ConnectionState, DatabaseResource,
    DatabaseSearchTool, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpClient, McpServer,
    McpServerBuilder, RequestId, SystemResource, ToolCallResult,
};

// Layer1 re-exports
pub use apilink_foundation::{Error, Result};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 기본 리소스/도구를 모두 등록한 디스패처
pub fn build_server(
    config: &ServerConfig,
    registry: Arc<ApiRegistry>,
    client: Arc<ApiQueryClient>,
    databases: Arc<DatabaseManager>,
) -> Result<McpServer> {
    McpServer::builder()
        .server_info(&config.name, &config.version)
        .resource(Arc::new(ApiResource::new(Arc::clone(&client))))
        .resource(Arc::new(SystemResource::new(registry.clone())))
        .resource(Arc::new(DatabaseResource::new(Arc::clone(&databases))))
        .tool(Arc::new(ApiQueryTool::new(client)))
        .tool(Arc::new(ApiDiscoveryTool::new(registry)))
        .tool(Arc::new(DatabaseSearchTool::new(databases)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilink_foundation::{ApiClientConfig, Environment};

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_build_server() {
        let registry = Arc::new(ApiRegistry::with_builtins());
        let client = Arc::new(
            ApiQueryClient::new(registry.clone(), &ApiClientConfig::default(), Environment::Test)
                .unwrap(),
        );
        let databases = Arc::new(DatabaseManager::from_drivers(Vec::new()));

        let server = build_server(&ServerConfig::default(), registry, client, databases).unwrap();
        assert_eq!(
            server.tool_names(),
            vec!["api_query", "api_discovery", "database_search"]
        );
        assert_eq!(server.server_info().name, "bispace");
    }
}
