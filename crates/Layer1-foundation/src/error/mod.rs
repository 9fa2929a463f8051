//! Error types for apilink
//!
//! 모든 에러를 중앙에서 관리하고 JSON-RPC 에러 코드로 매핑

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC 2.0 표준 에러 코드
pub mod rpc_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// apilink 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 조회 실패
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API not found: {0}")]
    ApiNotFound(String),

    #[error("Tool not supported: {0}")]
    ToolNotFound(String),

    #[error("Method not supported: {0}")]
    MethodNotFound(String),

    // ========================================================================
    // 입력 검증
    // ========================================================================
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Unsupported resource scheme: {0}")]
    UnsupportedScheme(String),

    // ========================================================================
    // 외부 API 관련
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream error: HTTP {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Response is not JSON (content-type: {content_type})")]
    NonJsonResponse { content_type: String },

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 프로토콜 관련
    // ========================================================================
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Remote error ({code}): {message}")]
    Remote { code: i32, message: String },

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // 데이터베이스 관련
    // ========================================================================
    #[error("Database error: {database} - {message}")]
    Database { database: String, message: String },

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// JSON-RPC 에러 코드로 변환
    pub fn rpc_code(&self) -> i32 {
        match self {
            Error::NotFound(_)
            | Error::ApiNotFound(_)
            | Error::InvalidParams(_)
            | Error::InvalidUri(_)
            | Error::MissingParameter(_)
            | Error::UnsupportedScheme(_) => rpc_codes::INVALID_PARAMS,
            Error::ToolNotFound(_) | Error::MethodNotFound(_) => rpc_codes::METHOD_NOT_FOUND,
            Error::Parse(_) => rpc_codes::PARSE_ERROR,
            Error::Remote { code, .. } => *code,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }

    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Connection(_) | Error::Http(_)
        )
    }

    /// 데이터베이스 에러 생성 헬퍼
    pub fn database(database: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Database {
            database: database.into(),
            message: message.into(),
        }
    }

    /// 업스트림 에러 생성 헬퍼
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
