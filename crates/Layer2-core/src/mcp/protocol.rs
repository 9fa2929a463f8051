//! JSON-RPC 2.0 메시지 타입
//!
//! 요청 검증, 응답 생성, 표준 에러 코드 생성자

use apilink_foundation::{rpc_codes, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// 요청 ID (숫자 또는 문자열)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        RequestId::Number(id as i64)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

/// JSON-RPC 2.0 요청 (id가 없으면 알림)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// 검증 실패한 메시지
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidMessage {
    /// 추출 가능했던 id (없으면 응답하지 않음)
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// 파싱된 JSON 값을 요청으로 검증
    ///
    /// `jsonrpc == "2.0"`, 문자열 `method`, 숫자/문자열 `id`를 요구합니다.
    pub fn from_value(value: Value) -> std::result::Result<Self, InvalidMessage> {
        let Value::Object(mut object) = value else {
            return Err(InvalidMessage {
                id: None,
                error: JsonRpcError::invalid_request("Invalid Request"),
            });
        };

        let id = match object.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(RequestId::String(s)),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(n) => Some(RequestId::Number(n)),
                None => {
                    return Err(InvalidMessage {
                        id: None,
                        error: JsonRpcError::invalid_request("Invalid Request: id must be an integer or string"),
                    })
                }
            },
            Some(_) => {
                return Err(InvalidMessage {
                    id: None,
                    error: JsonRpcError::invalid_request("Invalid Request: id must be an integer or string"),
                })
            }
        };

        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(InvalidMessage {
                id,
                error: JsonRpcError::invalid_request("Invalid Request"),
            });
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => {
                return Err(InvalidMessage {
                    id,
                    error: JsonRpcError::invalid_request("Invalid Request"),
                })
            }
        };

        let params = object.remove("params").filter(|p| !p.is_null());

        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params,
        })
    }
}

/// JSON-RPC 2.0 응답 (result 또는 error 중 하나)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// 클라이언트 측 결과 변환
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(Error::Remote {
                code: error.code,
                message: error.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// JSON-RPC 에러
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(rpc_codes::PARSE_ERROR, "Parse error: Invalid JSON format")
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(rpc_codes::INVALID_REQUEST, msg)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            rpc_codes::METHOD_NOT_FOUND,
            format!("Method not supported: {}", method),
        )
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(rpc_codes::INVALID_PARAMS, msg)
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(rpc_codes::INTERNAL_ERROR, msg)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<&Error> for JsonRpcError {
    fn from(e: &Error) -> Self {
        Self::new(e.rpc_code(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": 7, "method": "ping"
        }))
        .unwrap();
        assert_eq!(req.id, Some(RequestId::Number(7)));
        assert_eq!(req.method, "ping");
        assert!(req.params.is_none());

        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": "abc", "method": "tools/list", "params": {}
        }))
        .unwrap();
        assert_eq!(req.id, Some(RequestId::String("abc".into())));
        assert!(!req.is_notification());
    }

    #[test]
    fn test_notification() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_invalid_requests() {
        let err = JsonRpcRequest::from_value(json!({ "jsonrpc": "1.0", "id": 1, "method": "x" }))
            .unwrap_err();
        assert_eq!(err.id, Some(RequestId::Number(1)));
        assert_eq!(err.error.code, -32600);

        let err = JsonRpcRequest::from_value(json!({ "jsonrpc": "2.0", "id": 2, "method": 5 }))
            .unwrap_err();
        assert_eq!(err.error.code, -32600);

        let err = JsonRpcRequest::from_value(json!({ "jsonrpc": "2.0", "id": {}, "method": "x" }))
            .unwrap_err();
        assert!(err.id.is_none());

        let err = JsonRpcRequest::from_value(json!([1, 2])).unwrap_err();
        assert!(err.id.is_none());
    }

    #[test]
    fn test_response_serialization() {
        let parse = JsonRpcResponse::failure(None, JsonRpcError::parse_error());
        let value = serde_json::to_value(&parse).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "error": { "code": -32700, "message": "Parse error: Invalid JSON format" }
            })
        );

        let ok = JsonRpcResponse::success(Some(RequestId::Number(3)), json!("pong"));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": 3, "result": "pong" }));
    }

    #[test]
    fn test_into_result() {
        let err = JsonRpcResponse::failure(Some(RequestId::Number(1)), JsonRpcError::method_not_found("x"))
            .into_result()
            .unwrap_err();
        assert_eq!(err.rpc_code(), -32601);
    }
}
