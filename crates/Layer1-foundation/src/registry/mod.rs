//! Registry - 외부 API 등록/관리
//!
//! - `descriptor.rs` - API/엔드포인트/파라미터 디스크립터
//! - `builtin.rs` - 기본 등록 API
//!
//! 하나의 `ApiRegistry` 인스턴스를 `Arc`로 공유하며 내부는 `RwLock`으로 보호합니다.
//! 등록 순서가 목록 순서가 됩니다.

mod builtin;
mod descriptor;

pub use builtin::builtin_apis;
pub use descriptor::{
    ApiAuth, ApiDescriptor, ApiPatch, EndpointDescriptor, ParamDescriptor, ParamLocation,
};

use crate::{Error, Result};
use parking_lot::RwLock;
use std::path::Path;
use tracing::{debug, info, warn};

/// API 레지스트리
#[derive(Debug, Default)]
pub struct ApiRegistry {
    apis: RwLock<Vec<ApiDescriptor>>,
}

impl ApiRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 API가 등록된 레지스트리 생성
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for api in builtin_apis() {
            registry.register(api);
        }
        registry
    }

    /// API 등록
    ///
    /// 같은 id가 이미 있으면 경고 후 `false`를 반환하며 기존 항목을 덮어쓰지 않습니다.
    pub fn register(&self, api: ApiDescriptor) -> bool {
        let mut apis = self.apis.write();
        if apis.iter().any(|a| a.id == api.id) {
            warn!("API with id '{}' is already registered", api.id);
            return false;
        }
        debug!("Registered API: {} - {}", api.id, api.name);
        apis.push(api);
        true
    }

    /// 필수 필드 검증 후 등록 (런타임 등록 경로)
    pub fn register_validated(&self, api: ApiDescriptor) -> Result<bool> {
        Self::validate(&api)?;
        Ok(self.register(api))
    }

    /// 필수 필드 검증: id, name, baseUrl, description
    pub fn validate(api: &ApiDescriptor) -> Result<()> {
        let missing: Vec<&str> = [
            ("id", api.id.as_str()),
            ("name", api.name.as_str()),
            ("baseUrl", api.base_url.as_str()),
            ("description", api.description.as_str()),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

        if !missing.is_empty() {
            return Err(Error::InvalidParams(format!(
                "required fields missing: {}",
                missing.join(", ")
            )));
        }

        let parsed = url::Url::parse(&api.base_url)
            .map_err(|e| Error::InvalidParams(format!("invalid baseUrl '{}': {}", api.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidParams(format!(
                "baseUrl must use http or https: {}",
                api.base_url
            )));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<ApiDescriptor> {
        self.apis.read().iter().find(|a| a.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.apis.read().iter().any(|a| a.id == id)
    }

    pub fn all(&self) -> Vec<ApiDescriptor> {
        self.apis.read().clone()
    }

    pub fn active(&self) -> Vec<ApiDescriptor> {
        self.apis.read().iter().filter(|a| a.active).cloned().collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.apis.read().iter().map(|a| a.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.apis.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apis.read().is_empty()
    }

    /// 부분 업데이트
    pub fn update(&self, id: &str, patch: ApiPatch) -> bool {
        let mut apis = self.apis.write();
        match apis.iter_mut().find(|a| a.id == id) {
            Some(api) => {
                patch.apply(api);
                info!("API updated: {}", id);
                true
            }
            None => false,
        }
    }

    /// 관리자 삭제
    pub fn remove(&self, id: &str) -> bool {
        let mut apis = self.apis.write();
        let before = apis.len();
        apis.retain(|a| a.id != id);
        let removed = apis.len() != before;
        if removed {
            info!("API removed: {}", id);
        }
        removed
    }

    /// JSON 배열 문자열에서 디스크립터 로드, 등록된 개수 반환
    pub fn load_from_json(&self, json: &str) -> Result<usize> {
        let apis: Vec<ApiDescriptor> = serde_json::from_str(json)?;
        let mut count = 0;
        for api in apis {
            if self.register_validated(api)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// JSON 파일에서 디스크립터 로드
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read API file {}: {}", path.display(), e))
        })?;
        let count = self.load_from_json(&content)?;
        info!("Loaded {} API descriptors from {}", count, path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo(id: &str) -> ApiDescriptor {
        ApiDescriptor::new(id, "Demo", "http://localhost:9000", "demo api")
    }

    #[test]
    fn test_register_duplicate() {
        let registry = ApiRegistry::new();
        assert!(registry.register(demo("x").api_type("a")));
        assert!(!registry.register(demo("x").api_type("b")));

        let stored = registry.get("x").unwrap();
        assert_eq!(stored.api_type, "a");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_id() {
        let registry = ApiRegistry::with_builtins();
        assert!(registry.get("missing").is_none());
        assert!(registry.contains("sabi"));
        assert_eq!(registry.ids(), vec!["sabi", "trendvoto"]);
    }

    #[test]
    fn test_active_filter_and_update() {
        let registry = ApiRegistry::new();
        registry.register(demo("a"));
        registry.register(demo("b").inactive());
        assert_eq!(registry.active().len(), 1);

        assert!(registry.update(
            "b",
            ApiPatch {
                active: Some(true),
                ..Default::default()
            }
        ));
        assert_eq!(registry.active().len(), 2);
        assert!(!registry.update("zzz", ApiPatch::default()));
    }

    #[test]
    fn test_remove() {
        let registry = ApiRegistry::new();
        registry.register(demo("a"));
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_validate_required_fields() {
        let mut api = demo("a");
        api.name.clear();
        api.description = "  ".into();
        let err = ApiRegistry::validate(&api).unwrap_err();
        assert!(err.to_string().contains("name, description"));

        let bad_url = ApiDescriptor::new("a", "A", "ftp://host", "d");
        assert!(ApiRegistry::validate(&bad_url).is_err());
        assert!(ApiRegistry::new().register_validated(bad_url).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apis.json");
        std::fs::write(
            &path,
            r#"[{"id":"extra","name":"Extra","baseUrl":"https://extra.local","description":"x"}]"#,
        )
        .unwrap();

        let registry = ApiRegistry::with_builtins();
        assert_eq!(registry.load_from_file(&path).unwrap(), 1);
        assert!(registry.get("extra").unwrap().active);
        assert!(registry.load_from_file(dir.path().join("missing.json")).is_err());
    }
}
