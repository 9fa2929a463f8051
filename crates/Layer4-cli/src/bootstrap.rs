//! 서비스 구성
//!
//! 레지스트리, API 클라이언트, 데이터베이스 관리자를 한 번만 만들고
//! 이후 모든 컴포넌트에 `Arc`로 넘깁니다.

use apilink_core::{ApiQueryClient, DatabaseManager};
use apilink_foundation::{ApiPatch, ApiRegistry, AppConfig, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// 프로세스 전체에서 공유하는 서비스
pub struct Services {
    pub registry: Arc<ApiRegistry>,
    pub client: Arc<ApiQueryClient>,
    pub databases: Arc<DatabaseManager>,
}

/// 기본 API + 파일 + baseUrl 재정의 적용
pub fn build_registry(config: &AppConfig) -> Result<ApiRegistry> {
    let registry = ApiRegistry::with_builtins();

    if let Some(path) = &config.api.apis_file {
        registry.load_from_file(path)?;
    }

    for (id, url) in &config.api.base_url_overrides {
        let patch = ApiPatch {
            base_url: Some(url.clone()),
            ..Default::default()
        };
        if registry.update(id, patch) {
            info!("API {} base URL set to {}", id, url);
        } else {
            warn!("Ignoring base URL override for unknown API '{}'", id);
        }
    }

    Ok(registry)
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = Arc::new(build_registry(config)?);
        let client = Arc::new(ApiQueryClient::new(
            registry.clone(),
            &config.api,
            config.environment,
        )?);
        let databases = Arc::new(DatabaseManager::from_config(&config.database)?);

        Ok(Self {
            registry,
            client,
            databases,
        })
    }
}
