//! Core Traits - 프로바이더 인터페이스
//!
//! Layer2에서 구현하고 프로토콜 디스패처가 이름/스킴으로 조회합니다.

use super::types::{ModelKind, ResourceDescriptor, ToolDescriptor};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

// ============================================================================
// Resource Provider
// ============================================================================

/// URI 스킴 하나를 담당하는 리소스 프로바이더
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// 담당 스킴 (`api`, `system`, `database`)
    fn scheme(&self) -> &str;

    /// `resources/list`에 노출할 디스크립터
    fn descriptors(&self) -> Vec<ResourceDescriptor>;

    /// 리소스 읽기
    async fn read(&self, uri: &str) -> Result<Value>;
}

// ============================================================================
// Tool Provider
// ============================================================================

/// 이름으로 호출되는 도구
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// 도구 이름 (고유 식별자)
    fn name(&self) -> &str;

    /// 스키마 포함 디스크립터
    fn descriptor(&self) -> ToolDescriptor;

    /// 도구 실행
    ///
    /// 도구 수준 실패는 `Ok` 안의 실패 페이로드로 보고하고,
    /// `Err`는 인자 검증 실패 등 호출 자체가 성립하지 않을 때만 반환합니다.
    async fn execute(&self, arguments: Value) -> Result<Value>;
}

// ============================================================================
// Completion Provider
// ============================================================================

/// 외부 LLM 완료 기능 (프롬프트 입력, 텍스트 출력)
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn model(&self) -> ModelKind;

    async fn complete(&self, prompt: &str) -> Result<String>;
}
