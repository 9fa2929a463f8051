//! AppConfig - 통합 설정

use super::{parse_var, string_var, DatabaseConfig};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 지원하는 프로토콜 버전 (오래된 것부터)
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-06-18"];

/// 알 수 없는 버전 요청 시 응답할 버전
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

/// 실행 환경
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    /// production 모드에서만 TLS 인증서를 엄격하게 검증
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// 프로토콜 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// WebSocket 업그레이드 경로
    pub path: String,
    /// serverInfo.name
    pub name: String,
    /// serverInfo.version
    pub version: String,
    /// WebSocket ping 간격 (밀리초)
    pub heartbeat_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3003,
            path: "/mcp".to_string(),
            name: "bispace".to_string(),
            version: "1.0.0".to_string(),
            heartbeat_interval_ms: 30_000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 재연결 설정 (고정 딜레이, 횟수 제한)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// 자동 재연결 활성화
    pub auto_reconnect: bool,
    /// 최대 재연결 횟수
    pub max_attempts: u32,
    /// 재연결 딜레이 (밀리초)
    pub delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            max_attempts: 5,
            delay_ms: 2000,
        }
    }
}

/// 프로토콜 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3003/mcp".to_string(),
            connect_timeout_ms: 5000,
            request_timeout_ms: 30000,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// 외부 REST API 호출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClientConfig {
    /// 기본 요청 타임아웃 (밀리초)
    pub timeout_ms: u64,
    /// 헬스 체크 타임아웃 (밀리초)
    pub health_timeout_ms: u64,
    /// 추가 API 디스크립터 JSON 파일
    pub apis_file: Option<PathBuf>,
    /// 기본 API baseUrl 재정의 (`id=url`)
    pub base_url_overrides: Vec<(String, String)>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            health_timeout_ms: 10000,
            apis_file: None,
            base_url_overrides: Vec::new(),
        }
    }
}

/// 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    /// 기본 로그 필터 (RUST_LOG가 우선)
    pub log_level: String,
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub database: DatabaseConfig,
    pub api: ApiClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            client: ClientConfig::default(),
            database: DatabaseConfig::default(),
            api: ApiClientConfig::default(),
        }
    }
}

impl AppConfig {
    /// 프로세스 환경 변수에서 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수에서 로드 (테스트용)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_name = lookup("APILINK_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_default();

        let server_defaults = ServerConfig::default();
        let mut path = string_var(&lookup, "MCP_PATH", &server_defaults.path);
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        let server = ServerConfig {
            host: string_var(&lookup, "MCP_HOST", &server_defaults.host),
            port: parse_var(&lookup, "MCP_PORT", server_defaults.port)?,
            path,
            name: string_var(&lookup, "MCP_SERVER_NAME", &server_defaults.name),
            version: string_var(&lookup, "MCP_SERVER_VERSION", &server_defaults.version),
            heartbeat_interval_ms: parse_var(
                &lookup,
                "MCP_HEARTBEAT_INTERVAL",
                server_defaults.heartbeat_interval_ms,
            )?,
        };

        let client_defaults = ClientConfig::default();
        let client = ClientConfig {
            url: string_var(&lookup, "MCP_URL", &client_defaults.url),
            connect_timeout_ms: client_defaults.connect_timeout_ms,
            request_timeout_ms: parse_var(
                &lookup,
                "MCP_REQUEST_TIMEOUT",
                client_defaults.request_timeout_ms,
            )?,
            reconnect: ReconnectConfig {
                auto_reconnect: true,
                max_attempts: parse_var(
                    &lookup,
                    "MCP_MAX_RECONNECT_ATTEMPTS",
                    client_defaults.reconnect.max_attempts,
                )?,
                delay_ms: parse_var(
                    &lookup,
                    "MCP_RECONNECT_DELAY",
                    client_defaults.reconnect.delay_ms,
                )?,
            },
        };

        let api_defaults = ApiClientConfig::default();
        let api = ApiClientConfig {
            timeout_ms: parse_var(&lookup, "API_TIMEOUT_MS", api_defaults.timeout_ms)?,
            health_timeout_ms: api_defaults.health_timeout_ms,
            apis_file: lookup("APIS_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            base_url_overrides: parse_overrides(lookup("API_BASE_URLS").as_deref())?,
        };

        let config = Self {
            environment: Environment::parse(&env_name),
            log_level: string_var(&lookup, "MCP_LOG_LEVEL", "info"),
            server,
            client,
            database: DatabaseConfig::from_lookup(&lookup)?,
            api,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_ms == 0 {
            return Err(Error::Config("API_TIMEOUT_MS must be greater than 0".into()));
        }
        if self.client.request_timeout_ms == 0 {
            return Err(Error::Config(
                "MCP_REQUEST_TIMEOUT must be greater than 0".into(),
            ));
        }
        if self.server.heartbeat_interval_ms == 0 {
            return Err(Error::Config(
                "MCP_HEARTBEAT_INTERVAL must be greater than 0".into(),
            ));
        }
        self.database.validate()
    }
}

/// `sabi=http://a,trendvoto=http://b` 형식 파싱
fn parse_overrides(raw: Option<&str>) -> Result<Vec<(String, String)>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(id, url)| (id.trim().to_string(), url.trim().to_string()))
                .filter(|(id, url)| !id.is_empty() && !url.is_empty())
                .ok_or_else(|| Error::Config(format!("API_BASE_URLS entry '{}' must be id=url", pair)))
        })
        .collect()
}
