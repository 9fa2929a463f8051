//! API Descriptor - 외부 REST API 메타데이터

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_active() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

/// 파라미터 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Path,
    Body,
}

impl Default for ParamLocation {
    fn default() -> Self {
        ParamLocation::Query
    }
}

/// 엔드포인트 파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: ParamLocation,
    #[serde(rename = "type", default)]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// 엔드포인트 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamDescriptor>,
    /// 채팅 컨텍스트 선택용 키워드
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl EndpointDescriptor {
    pub fn get(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: default_method(),
            description: description.into(),
            parameters: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.parameters.push(param);
        self
    }
}

/// API 인증 방식
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ApiAuth {
    None,
    Bearer { token: String },
    ApiKey { key: String, value: String },
}

impl ApiAuth {
    /// 요청 헤더로 변환
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            ApiAuth::None => None,
            ApiAuth::Bearer { token } => {
                Some(("Authorization".to_string(), format!("Bearer {}", token)))
            }
            ApiAuth::ApiKey { key, value } => Some((key.clone(), value.clone())),
        }
    }
}

/// 외부 API 디스크립터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    /// 고유 식별자
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub description: String,
    /// 분류 (inventory, electoral 등)
    #[serde(rename = "type", default)]
    pub api_type: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_endpoint: Option<String>,
    /// 요청 타임아웃 재정의 (밀리초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<ApiAuth>,
}

impl ApiDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            description: description.into(),
            api_type: "rest".to_string(),
            active: true,
            endpoints: Vec::new(),
            keywords: Vec::new(),
            synonyms: Vec::new(),
            headers: HashMap::new(),
            health_endpoint: None,
            timeout_ms: None,
            auth: None,
        }
    }

    pub fn api_type(mut self, api_type: impl Into<String>) -> Self {
        self.api_type = api_type.into();
        self
    }

    pub fn endpoint(mut self, endpoint: EndpointDescriptor) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn health_endpoint(mut self, path: impl Into<String>) -> Self {
        self.health_endpoint = Some(path.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// 헬스 체크 경로 (기본 `/health`)
    pub fn health_path(&self) -> &str {
        self.health_endpoint.as_deref().unwrap_or("/health")
    }

    /// 요청에 적용할 헤더 (사용자 정의 + 인증)
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(header) = self.auth.as_ref().and_then(ApiAuth::header) {
            headers.push(header);
        }
        headers
    }

    /// 경로로 엔드포인트 찾기
    pub fn find_endpoint(&self, path: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.path == path)
    }
}

/// 부분 업데이트 (관리자 호출용)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPatch {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub api_type: Option<String>,
    pub active: Option<bool>,
    pub endpoints: Option<Vec<EndpointDescriptor>>,
    pub keywords: Option<Vec<String>>,
    pub synonyms: Option<Vec<String>>,
    pub headers: Option<HashMap<String, String>>,
    pub health_endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl ApiPatch {
    pub(crate) fn apply(self, api: &mut ApiDescriptor) {
        if let Some(v) = self.name {
            api.name = v;
        }
        if let Some(v) = self.base_url {
            api.base_url = v;
        }
        if let Some(v) = self.description {
            api.description = v;
        }
        if let Some(v) = self.api_type {
            api.api_type = v;
        }
        if let Some(v) = self.active {
            api.active = v;
        }
        if let Some(v) = self.endpoints {
            api.endpoints = v;
        }
        if let Some(v) = self.keywords {
            api.keywords = v;
        }
        if let Some(v) = self.synonyms {
            api.synonyms = v;
        }
        if let Some(v) = self.headers {
            api.headers = v;
        }
        if self.health_endpoint.is_some() {
            api.health_endpoint = self.health_endpoint;
        }
        if self.timeout_ms.is_some() {
            api.timeout_ms = self.timeout_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_defaults() {
        let api: ApiDescriptor = serde_json::from_value(json!({
            "id": "demo",
            "name": "Demo",
            "baseUrl": "http://localhost:9000",
            "description": "demo api",
            "endpoints": [{ "path": "/items" }]
        }))
        .unwrap();
        assert!(api.active);
        assert_eq!(api.endpoints[0].method, "GET");
        assert_eq!(api.health_path(), "/health");
    }

    #[test]
    fn test_auth_headers() {
        let mut api = ApiDescriptor::new("a", "A", "http://x", "d").header("X-Tenant", "7");
        api.auth = Some(ApiAuth::Bearer {
            token: "abc".into(),
        });
        let headers = api.request_headers();
        assert!(headers.contains(&("X-Tenant".to_string(), "7".to_string())));
        assert!(headers.contains(&("Authorization".to_string(), "Bearer abc".to_string())));
    }
}
