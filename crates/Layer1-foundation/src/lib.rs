//! # apilink-foundation
//!
//! Foundation layer for apilink:
//! - Error: 에러 타입과 JSON-RPC 코드 매핑
//! - Config: 환경 변수 기반 설정 (서버, 클라이언트, DB, API 호출)
//! - Registry: 외부 REST API 디스크립터 레지스트리
//! - Core: 리소스/도구/LLM 프로바이더 Trait
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Transports (WebSocket, stdio)                          │
//! │                     │                                   │
//! │                     ▼                                   │
//! │           Protocol Dispatcher                           │
//! │          ┌─────────┴─────────┐                          │
//! │          ▼                   ▼                          │
//! │   Resource Providers    Tool Providers                  │
//! │          │                   │                          │
//! │          └─────────┬─────────┘                          │
//! │                    ▼                                    │
//! │   ApiRegistry / Query Client / Database Manager         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod registry;

// ============================================================================
// Error
// ============================================================================
pub use error::{rpc_codes, Error, Result};

// ============================================================================
// Core (핵심 Trait 및 타입)
// ============================================================================
pub use core::{
    CompletionProvider, ModelKind, ResourceDescriptor, ResourceProvider, ToolDescriptor,
    ToolProvider,
};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ApiClientConfig, AppConfig, ClientConfig, DatabaseConfig, DbDriverKind, Environment,
    ReconnectConfig, ServerConfig, DEFAULT_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};

// ============================================================================
// Registry (레지스트리)
// ============================================================================
pub use registry::{
    builtin_apis, ApiAuth, ApiDescriptor, ApiPatch, ApiRegistry, EndpointDescriptor,
    ParamDescriptor, ParamLocation,
};
