//! 단발성 명령 (서버 없이 실행)
//!
//! - `call`: 실행 중인 서버에 JSON-RPC 요청 하나를 보내고 결과 출력
//! - `health`: 등록 API 헬스 체크와 데이터베이스 연결 확인

use crate::bootstrap::Services;
use apilink_core::McpClient;
use apilink_foundation::{ClientConfig, Error, Result};
use serde_json::{json, Value};
use tracing::debug;

/// 명령줄 JSON 인자 파싱 (없으면 `None`)
pub fn parse_params(raw: Option<&str>) -> Result<Option<Value>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| Error::InvalidParams(format!("params must be JSON: {}", e))),
    }
}

/// 서버에 연결해 초기화 후 요청 하나 전송
pub async fn run_call(config: ClientConfig, method: &str, params: Option<Value>) -> Result<Value> {
    let client = McpClient::new(config);
    client.connect().await?;

    let result = async {
        let init = client.initialize().await?;
        debug!(
            "Connected to {} {} (protocol {})",
            init.server_info.name, init.server_info.version, init.protocol_version
        );
        client.send_request(method, params).await
    }
    .await;

    client.disconnect().await;
    result
}

/// API 헬스 + 데이터베이스 연결 보고서
pub async fn run_health(services: &Services) -> Value {
    let apis = services.client.check_all_health().await;
    let databases = services.databases.probe_all().await;
    let report = json!({
        "apis": apis,
        "databases": databases,
        "connected": services.databases.is_connected(),
    });
    services.databases.close_all().await;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert!(parse_params(None).unwrap().is_none());
        assert!(parse_params(Some("  ")).unwrap().is_none());
        assert_eq!(
            parse_params(Some(r#"{"uri":"system://info"}"#)).unwrap(),
            Some(json!({ "uri": "system://info" }))
        );
        assert!(matches!(
            parse_params(Some("{oops")),
            Err(Error::InvalidParams(_))
        ));
    }

    #[tokio::test]
    async fn test_call_without_server() {
        let mut config = ClientConfig::default();
        config.url = "ws://127.0.0.1:1/mcp".to_string();
        config.connect_timeout_ms = 500;
        config.reconnect.auto_reconnect = false;
        assert!(run_call(config, "ping", None).await.is_err());
    }
}
