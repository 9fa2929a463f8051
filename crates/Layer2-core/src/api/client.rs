//! API Query Client - 레지스트리 기반 REST 호출

use super::health::ApiStatus;
use apilink_foundation::{ApiClientConfig, ApiDescriptor, ApiRegistry, Environment, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// 비 JSON 응답 로그 시 최대 길이
const BODY_SNIPPET_LEN: usize = 200;

/// 지원 HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(Error::InvalidParams(format!(
                "unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

/// 외부 API 호출 클라이언트
pub struct ApiQueryClient {
    registry: Arc<ApiRegistry>,
    http: reqwest::Client,
    default_timeout: Duration,
    health_timeout: Duration,
}

impl ApiQueryClient {
    /// 클라이언트 생성
    ///
    /// production 이외 환경에서는 TLS 인증서 검증을 완화합니다.
    pub fn new(
        registry: Arc<ApiRegistry>,
        config: &ApiClientConfig,
        environment: Environment,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!environment.is_production())
            .user_agent(concat!("apilink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            registry,
            http,
            default_timeout: Duration::from_millis(config.timeout_ms),
            health_timeout: Duration::from_millis(config.health_timeout_ms),
        })
    }

    /// 기본 타임아웃 변경
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ApiRegistry> {
        &self.registry
    }

    /// GET 요청 (params는 쿼리스트링, null 값은 생략)
    pub async fn query(&self, api_id: &str, endpoint: &str, params: &Value) -> Result<Value> {
        self.query_with_method(api_id, endpoint, params, HttpMethod::Get)
            .await
    }

    /// 메서드 지정 요청 (GET 이외는 params를 JSON 본문으로 전송)
    pub async fn query_with_method(
        &self,
        api_id: &str,
        endpoint: &str,
        params: &Value,
        method: HttpMethod,
    ) -> Result<Value> {
        let api = self
            .registry
            .get(api_id)
            .ok_or_else(|| Error::ApiNotFound(api_id.to_string()))?;

        let mut url = build_url(&api.base_url, endpoint)?;
        let timeout = api
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);

        let builder = match method {
            HttpMethod::Get => {
                append_query(&mut url, params);
                self.http.get(url.clone())
            }
            other => {
                let builder = self.http.request(other.to_reqwest(), url.clone());
                if params.is_null() {
                    builder
                } else {
                    builder.json(params)
                }
            }
        };

        debug!("{} {}", method.as_str(), url);

        let response = builder
            .headers(request_headers(&api))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| send_error(e, &url, timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!("API {} responded {} for {}", api_id, status, url);
            return Err(Error::upstream(
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !is_json_content_type(&content_type) {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
            warn!(
                "API {} returned non-JSON response ({}): {}",
                api_id, content_type, snippet
            );
            return Err(Error::NonJsonResponse { content_type });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                timeout_error(&url, timeout)
            } else {
                Error::Parse(format!("Invalid JSON body from {}: {}", url, e))
            }
        })
    }

    /// 헬스 체크 (등록된 API에 대해서는 실패하지 않음)
    pub async fn check_health(&self, api_id: &str) -> Result<ApiStatus> {
        let api = self
            .registry
            .get(api_id)
            .ok_or_else(|| Error::ApiNotFound(api_id.to_string()))?;

        let url = match build_url(&api.base_url, api.health_path()) {
            Ok(url) => url,
            Err(e) => return Ok(ApiStatus::unhealthy(api_id, None, e.to_string())),
        };

        let started = Instant::now();
        let result = self
            .http
            .get(url)
            .headers(request_headers(&api))
            .timeout(self.health_timeout)
            .send()
            .await;
        let elapsed = started.elapsed().as_millis() as u64;

        let status = match result {
            Ok(response) if response.status().is_success() => ApiStatus::healthy(api_id, elapsed),
            Ok(response) => {
                ApiStatus::unhealthy(api_id, Some(elapsed), format!("HTTP {}", response.status()))
            }
            Err(e) => ApiStatus::unhealthy(api_id, None, e.to_string()),
        };

        info!(
            "Health check {}: {:?} ({}ms)",
            api_id, status.status, elapsed
        );
        Ok(status)
    }

    /// 모든 등록 API 헬스 체크
    pub async fn check_all_health(&self) -> Vec<ApiStatus> {
        let checks = self
            .registry
            .ids()
            .into_iter()
            .map(|id| async move { self.check_health(&id).await });

        futures::future::join_all(checks)
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn build_url(base_url: &str, endpoint: &str) -> Result<Url> {
    let base = base_url.trim_end_matches('/');
    let raw = if endpoint.starts_with('/') {
        format!("{}{}", base, endpoint)
    } else {
        format!("{}/{}", base, endpoint)
    };
    Url::parse(&raw).map_err(|e| Error::InvalidParams(format!("invalid URL '{}': {}", raw, e)))
}

fn append_query(url: &mut Url, params: &Value) {
    let Value::Object(map) = params else {
        return;
    };

    let pairs: Vec<(&String, String)> = map
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s.clone())),
            other => Some((key, other.to_string())),
        })
        .collect();

    if pairs.is_empty() {
        return;
    }

    let mut query = url.query_pairs_mut();
    for (key, value) in pairs {
        query.append_pair(key, &value);
    }
}

fn request_headers(api: &ApiDescriptor) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (key, value) in api.request_headers() {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("Skipping invalid header '{}' for API {}", key, api.id),
        }
    }
    headers
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn timeout_error(url: &Url, timeout: Duration) -> Error {
    Error::Timeout(format!(
        "{} did not respond within {}ms",
        url,
        timeout.as_millis()
    ))
}

fn send_error(e: reqwest::Error, url: &Url, timeout: Duration) -> Error {
    if e.is_timeout() {
        timeout_error(url, timeout)
    } else {
        Error::Http(format!("Request to {} failed: {}", url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::Html;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/items",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({ "items": [1, 2], "query": q }))
                }),
            )
            .route("/html", get(|| async { Html("<html>maintenance</html>") }))
            .route(
                "/fail",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Json(json!({}))
                }),
            )
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .route("/health", get(|| async { "ok" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str) -> ApiQueryClient {
        let registry = Arc::new(ApiRegistry::new());
        registry.register(ApiDescriptor::new("demo", "Demo", base_url, "demo api"));
        let mut slow = ApiDescriptor::new("slow", "Slow", base_url, "slow api");
        slow.timeout_ms = Some(200);
        registry.register(slow);
        registry.register(ApiDescriptor::new(
            "offline",
            "Offline",
            "http://127.0.0.1:1",
            "unreachable",
        ));
        ApiQueryClient::new(registry, &ApiClientConfig::default(), Environment::Test).unwrap()
    }

    #[test]
    fn test_build_url_and_query() {
        let mut url = build_url("http://host/api/", "items").unwrap();
        append_query(&mut url, &json!({ "a": "x y", "b": 3, "c": null }));
        assert_eq!(url.as_str(), "http://host/api/items?a=x+y&b=3");

        let mut plain = build_url("http://host", "/items").unwrap();
        append_query(&mut plain, &json!({ "c": null }));
        assert_eq!(plain.as_str(), "http://host/items");
    }

    #[test]
    fn test_json_content_type() {
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[tokio::test]
    async fn test_query_json() {
        let base = spawn_upstream().await;
        let client = client_for(&base);

        let body = client
            .query("demo", "/items", &json!({ "page": 2, "skip": null }))
            .await
            .unwrap();
        assert_eq!(body["items"], json!([1, 2]));
        assert_eq!(body["query"]["page"], "2");
        assert!(body["query"].get("skip").is_none());
    }

    #[tokio::test]
    async fn test_query_post_body() {
        let base = spawn_upstream().await;
        let client = client_for(&base);

        let body = client
            .query_with_method("demo", "/echo", &json!({ "name": "x" }), HttpMethod::Post)
            .await
            .unwrap();
        assert_eq!(body, json!({ "name": "x" }));
    }

    #[tokio::test]
    async fn test_query_errors() {
        let base = spawn_upstream().await;
        let client = client_for(&base);

        let err = client.query("nope", "/items", &Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::ApiNotFound(_)));

        let err = client.query("demo", "/html", &Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::NonJsonResponse { .. }));

        let err = client.query("demo", "/fail", &Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 503, .. }));

        let err = client.query("slow", "/slow", &Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_upstream().await;
        let client = client_for(&base);

        assert!(client.check_health("demo").await.unwrap().is_healthy());
        assert!(!client.check_health("offline").await.unwrap().is_healthy());
        assert!(client.check_health("unknown").await.is_err());
        assert_eq!(client.check_all_health().await.len(), 3);
    }
}
