//! 실시간 API 컨텍스트 수집
//!
//! 관련 API마다 질문 토큰과 맞는 엔드포인트를 최대 3개 골라 GET으로 조회하고,
//! 잘라낸 JSON 샘플을 `=== DATOS DE <NAME> ===` 구역으로 묶습니다.
//! 조회 실패는 컨텍스트에 한 줄로 남기고 건너뜁니다.

use apilink_core::ApiQueryClient;
use apilink_foundation::{ApiDescriptor, EndpointDescriptor};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// API당 조회할 최대 엔드포인트 수
pub const MAX_ENDPOINTS_PER_API: usize = 3;

/// 샘플에 포함할 최대 항목 수
pub const MAX_SAMPLE_ITEMS: usize = 20;

/// 토큰 최소 길이 (이보다 긴 토큰만 사용)
const MIN_TOKEN_LEN: usize = 3;

/// 수집 결과
#[derive(Debug, Clone, Default)]
pub struct LiveContext {
    /// 프롬프트에 들어갈 본문
    pub text: String,
    /// 실제 데이터를 가져온 API id
    pub used_apis: Vec<String>,
}

impl LiveContext {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// 응답에 노출할 요약
    pub fn label(&self) -> String {
        if self.used_apis.is_empty() {
            "Modo informativo".to_string()
        } else {
            format!("Con datos de: {}", self.used_apis.join(", "))
        }
    }
}

/// 질문 토큰 (소문자, 길이 3 초과)
pub fn question_tokens(question: &str) -> Vec<String> {
    let mut tokens: Vec<String> = question
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect();
    tokens.dedup();
    tokens
}

fn endpoint_matches(endpoint: &EndpointDescriptor, tokens: &[String]) -> bool {
    let path = endpoint.path.to_lowercase();
    let description = endpoint.description.to_lowercase();
    tokens.iter().any(|token| {
        path.contains(token.as_str())
            || description.contains(token.as_str())
            || endpoint.keywords.iter().any(|k| {
                let k = k.to_lowercase();
                !k.is_empty() && (k == *token || token.contains(k.as_str()))
            })
    })
}

/// 질문과 맞는 GET 엔드포인트 (선언 순서, 최대 3개)
pub fn select_endpoints<'a>(api: &'a ApiDescriptor, question: &str) -> Vec<&'a EndpointDescriptor> {
    let tokens = question_tokens(question);
    if tokens.is_empty() {
        return Vec::new();
    }
    api.endpoints
        .iter()
        .filter(|e| e.method.eq_ignore_ascii_case("GET"))
        .filter(|e| endpoint_matches(e, &tokens))
        .take(MAX_ENDPOINTS_PER_API)
        .collect()
}

/// 응답 JSON을 최대 20개 항목으로 잘라 문자열로 렌더링
///
/// 최상위 배열 또는 `data` 배열만 자릅니다.
pub fn render_sample(data: &Value) -> String {
    let truncate = |items: &Vec<Value>| -> (Value, Option<usize>) {
        if items.len() > MAX_SAMPLE_ITEMS {
            (
                Value::Array(items[..MAX_SAMPLE_ITEMS].to_vec()),
                Some(items.len()),
            )
        } else {
            (Value::Array(items.clone()), None)
        }
    };

    let (sample, total) = match data {
        Value::Array(items) => truncate(items),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => {
                let (cut, total) = truncate(items);
                let mut map = map.clone();
                map.insert("data".to_string(), cut);
                (Value::Object(map), total)
            }
            _ => (data.clone(), None),
        },
        other => (other.clone(), None),
    };

    let mut text = serde_json::to_string_pretty(&sample).unwrap_or_else(|_| sample.to_string());
    if let Some(total) = total {
        text.push_str(&format!(
            "\n(mostrando {} de {} elementos)",
            MAX_SAMPLE_ITEMS, total
        ));
    }
    text
}

/// 엔드포인트를 찾지 못했을 때의 API 개요
fn overview(api: &ApiDescriptor) -> String {
    let mut text = format!(
        "**{}**\n- URL: {}\n- Descripción: {}\n",
        api.name, api.base_url, api.description
    );
    if !api.endpoints.is_empty() {
        let paths: Vec<&str> = api
            .endpoints
            .iter()
            .take(MAX_ENDPOINTS_PER_API)
            .map(|e| e.path.as_str())
            .collect();
        text.push_str(&format!("- Endpoints disponibles: {}", paths.join(", ")));
        if api.endpoints.len() > MAX_ENDPOINTS_PER_API {
            text.push_str(&format!(
                ", ... (+{} más)",
                api.endpoints.len() - MAX_ENDPOINTS_PER_API
            ));
        }
        text.push('\n');
    }
    text
}

/// 관련 API 목록에 대한 실시간 컨텍스트 수집
pub async fn collect(client: &ApiQueryClient, apis: &[ApiDescriptor], question: &str) -> LiveContext {
    let mut context = LiveContext::default();

    for api in apis {
        let endpoints = select_endpoints(api, question);
        debug!(
            "API {}: {} matching endpoints",
            api.id,
            endpoints.len()
        );

        let mut section = String::new();
        let mut fetched = false;

        for endpoint in endpoints {
            match client.query(&api.id, &endpoint.path, &json!({})).await {
                Ok(data) => {
                    section.push_str(&format!(
                        "--- {} ({}) ---\n{}\n",
                        endpoint.path,
                        endpoint.description,
                        render_sample(&data)
                    ));
                    fetched = true;
                }
                Err(e) => {
                    warn!("Context fetch failed for {}{}: {}", api.id, endpoint.path, e);
                    section.push_str(&format!("No se pudo obtener {}: {}\n", endpoint.path, e));
                }
            }
        }

        if !fetched {
            section.push_str(&overview(api));
        } else {
            context.used_apis.push(api.id.clone());
        }

        context.text.push_str(&format!(
            "=== DATOS DE {} ===\n{}\n",
            api.name.to_uppercase(),
            section
        ));
    }

    context
}
