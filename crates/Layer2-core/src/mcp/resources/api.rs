//! `api://` 리소스 - 등록된 API 엔드포인트 GET

use super::match_uri;
use crate::api::ApiQueryClient;
use crate::mcp::types::json_content;
use apilink_foundation::{Error, ResourceDescriptor, ResourceProvider, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

const API_URI_PATTERN: &str = r"^api://([^/]+)/(.+)$";
static API_URI: OnceLock<Option<Regex>> = OnceLock::new();

pub struct ApiResource {
    client: Arc<ApiQueryClient>,
}

impl ApiResource {
    pub fn new(client: Arc<ApiQueryClient>) -> Self {
        Self { client }
    }

    /// `api://sabi/usuarios` -> (`sabi`, `/usuarios`)
    fn parse(uri: &str) -> Result<(String, String)> {
        let captures =
            match_uri(&API_URI, API_URI_PATTERN, uri).ok_or_else(|| Error::InvalidUri(uri.to_string()))?;
        Ok((captures[1].to_string(), format!("/{}", &captures[2])))
    }
}

#[async_trait]
impl ResourceProvider for ApiResource {
    fn scheme(&self) -> &str {
        "api"
    }

    fn descriptors(&self) -> Vec<ResourceDescriptor> {
        let mut descriptors = vec![ResourceDescriptor::new("api://{apiId}/{endpoint}")
            .name("API Resource")
            .description("Acceso a endpoints de APIs dinámicas registradas")];

        // 활성 API의 구체 엔드포인트
        for api in self.client.registry().active() {
            for endpoint in &api.endpoints {
                descriptors.push(
                    ResourceDescriptor::new(format!("api://{}{}", api.id, endpoint.path))
                        .name(format!("{} {}", api.name, endpoint.path))
                        .description(endpoint.description.clone()),
                );
            }
        }
        descriptors
    }

    async fn read(&self, uri: &str) -> Result<Value> {
        let (api_id, endpoint) = Self::parse(uri)?;

        if let Some(api) = self.client.registry().get(&api_id) {
            if !api.active {
                return Err(Error::NotFound(format!("API '{}' is inactive", api_id)));
            }
        }

        debug!("Reading API resource {} -> {}{}", uri, api_id, endpoint);
        let data = self
            .client
            .query(&api_id, &endpoint, &json!({}))
            .await
            .map_err(|e| {
                warn!("Failed to read API resource {}: {}", uri, e);
                e
            })?;

        Ok(json_content(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilink_foundation::{
        ApiClientConfig, ApiDescriptor, ApiRegistry, EndpointDescriptor, Environment,
    };
    use axum::routing::get;
    use axum::{Json, Router};

    async fn spawn_upstream() -> String {
        let app = Router::new().route(
            "/usuarios/activos",
            get(|| async { Json(json!([{ "nombre": "Ever" }])) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn resource(base_url: &str) -> ApiResource {
        let registry = Arc::new(ApiRegistry::new());
        registry.register(
            ApiDescriptor::new("sabi", "SABI", base_url, "activos")
                .endpoint(EndpointDescriptor::get("/usuarios/activos", "Usuarios activos")),
        );
        registry.register(ApiDescriptor::new("old", "Old", base_url, "legacy").inactive());
        let client =
            ApiQueryClient::new(registry, &ApiClientConfig::default(), Environment::Test).unwrap();
        ApiResource::new(Arc::new(client))
    }

    #[test]
    fn test_parse_uri() {
        let (id, endpoint) = ApiResource::parse("api://sabi/usuarios/activos").unwrap();
        assert_eq!(id, "sabi");
        assert_eq!(endpoint, "/usuarios/activos");

        assert!(matches!(
            ApiResource::parse("api://sabi"),
            Err(Error::InvalidUri(_))
        ));
        assert!(ApiResource::parse("api:///x").is_err());
    }

    #[tokio::test]
    async fn test_read() {
        let base = spawn_upstream().await;
        let resource = resource(&base);

        let value = resource.read("api://sabi/usuarios/activos").await.unwrap();
        assert_eq!(value["mimeType"], "application/json");
        let content: Value = serde_json::from_str(value["content"].as_str().unwrap()).unwrap();
        assert_eq!(content[0]["nombre"], "Ever");

        let err = resource.read("api://old/x").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = resource.read("api://missing/x").await.unwrap_err();
        assert!(matches!(err, Error::ApiNotFound(_)));
    }

    #[tokio::test]
    async fn test_descriptors() {
        let resource = resource("http://localhost:1");
        let descriptors = resource.descriptors();
        assert_eq!(descriptors[0].uri, "api://{apiId}/{endpoint}");
        assert_eq!(descriptors[0].name, "API Resource");
        assert!(descriptors
            .iter()
            .any(|d| d.uri == "api://sabi/usuarios/activos"));
        assert!(!descriptors.iter().any(|d| d.uri.starts_with("api://old")));
    }
}
