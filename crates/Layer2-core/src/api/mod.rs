//! API Query - 외부 REST API 호출
//!
//! ## 기능
//! - 레지스트리 조회 후 `baseUrl + endpoint` 요청
//! - 파라미터를 쿼리스트링(GET) 또는 JSON 본문(POST/PUT/DELETE)으로 전달
//! - 타임아웃, 업스트림 에러, 비 JSON 응답 구분
//! - 헬스 체크

mod client;
mod health;

pub use client::{ApiQueryClient, HttpMethod};
pub use health::{ApiStatus, HealthStatus};
