//! MCP - Model Context Protocol (JSON-RPC 2.0)
//!
//! ## 구성
//! - `protocol`: JSON-RPC 메시지 타입과 검증
//! - `server`: 메서드 디스패처 (`McpServer`)
//! - `resources`: `api://`, `system://`, `database://` 리소스
//! - `tools`: `api_query`, `api_discovery`, `database_search`
//! - `transport`: WebSocket / stdio
//! - `client`: WebSocket 클라이언트 (재연결 포함)
//!
//! ## 참고
//! - https://modelcontextprotocol.io/

pub mod client;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use client::{ConnectionState, McpClient};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, JSONRPC_VERSION};
pub use resources::{ApiResource, DatabaseResource, SystemResource};
pub use server::{McpServer, McpServerBuilder};
pub use tools::{ApiDiscoveryTool, ApiQueryTool, DatabaseSearchTool};
pub use transport::AppState;
pub use types::{Implementation, InitializeResult, McpContent, ToolCallResult};
