//! API 헬스 상태

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 헬스 체크 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// API 상태 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    pub id: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl ApiStatus {
    pub fn healthy(id: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            id: id.into(),
            status: HealthStatus::Healthy,
            response_time_ms: Some(response_time_ms),
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(id: impl Into<String>, response_time_ms: Option<u64>, error: String) -> Self {
        Self {
            id: id.into(),
            status: HealthStatus::Unhealthy,
            response_time_ms,
            error: Some(error),
            checked_at: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
