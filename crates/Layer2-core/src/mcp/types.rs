//! MCP Types - 프로토콜 페이로드 타입

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// MCP 콘텐츠
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpContent {
    /// 텍스트 콘텐츠
    Text { text: String },

    /// 리소스 참조
    Resource {
        uri: String,
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

/// `tools/call` 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<McpContent>,

    /// 도구 수준 실패 여부
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// 도구 페이로드를 JSON 텍스트 콘텐츠로 감싸기
    ///
    /// 페이로드의 `success`가 `false`면 `isError`로 표시합니다.
    pub fn from_payload(payload: &Value) -> Self {
        let is_error = payload.get("success") == Some(&Value::Bool(false));
        Self {
            content: vec![McpContent::Text {
                text: pretty(payload),
            }],
            is_error,
        }
    }

    /// 실행 실패 결과
    pub fn failure(message: impl Into<String>) -> Self {
        let payload = json!({ "success": false, "error": message.into() });
        Self {
            content: vec![McpContent::Text {
                text: pretty(&payload),
            }],
            is_error: true,
        }
    }

    /// 첫 텍스트 콘텐츠
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            McpContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// 텍스트 콘텐츠를 JSON으로 파싱
    pub fn json(&self) -> Option<Value> {
        self.text().and_then(|t| serde_json::from_str(t).ok())
    }
}

/// 클라이언트/서버 식별 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// `initialize` 요청 파라미터
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<Implementation>,
}

/// `initialize` 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: Value,
    pub server_info: Implementation,
}

/// 리소스 읽기 결과 포맷 (`content` + `mimeType`)
pub fn json_content(data: &Value) -> Value {
    json!({
        "content": pretty(data),
        "mimeType": "application/json"
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
