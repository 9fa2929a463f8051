//! Chat Orchestrator
//!
//! 질문 하나를 처리하는 흐름:
//! 1. 관련 API 선택 (`relevance`)
//! 2. 관련 API에서 실시간 데이터 수집 (`context`)
//! 3. 프롬프트 조립 후 선택한 모델에 전달 (`prompt`)
//! 4. 답변 후처리

use crate::{context, prompt, relevance};
use apilink_core::ApiQueryClient;
use apilink_foundation::{ApiRegistry, CompletionProvider, Error, ModelKind, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Results
// ============================================================================

/// 질문 응답 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub answer: String,
    pub relevant_apis: Vec<String>,
    pub used_apis: Vec<String>,
    /// `Con datos de: ...` 또는 `Modo informativo`
    pub context: String,
    pub model: ModelKind,
    pub timestamp: String,
}

/// 시스템 요약 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemsSummary {
    pub summary: String,
    pub total_systems: usize,
    pub systems: Vec<String>,
}

// ============================================================================
// ChatOrchestrator
// ============================================================================

/// 질문 → 관련 API → 실시간 컨텍스트 → 모델 답변
pub struct ChatOrchestrator {
    registry: Arc<ApiRegistry>,
    client: Arc<ApiQueryClient>,
    providers: HashMap<ModelKind, Arc<dyn CompletionProvider>>,
}

impl ChatOrchestrator {
    pub fn new(registry: Arc<ApiRegistry>, client: Arc<ApiQueryClient>) -> Self {
        Self {
            registry,
            client,
            providers: HashMap::new(),
        }
    }

    /// 모델 등록 (같은 모델은 교체)
    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.providers.insert(provider.model(), provider);
        self
    }

    /// 등록된 모델 목록
    pub fn models(&self) -> Vec<ModelKind> {
        let mut models: Vec<ModelKind> = self.providers.keys().copied().collect();
        models.sort_by_key(|m| m.to_string());
        models
    }

    fn provider(&self, model: ModelKind) -> Result<&Arc<dyn CompletionProvider>> {
        self.providers
            .get(&model)
            .ok_or_else(|| Error::InvalidParams(format!("model '{}' is not configured", model)))
    }

    /// 질문에 답변
    pub async fn answer(
        &self,
        question: &str,
        model: ModelKind,
        target_api: Option<&str>,
    ) -> Result<ChatAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidParams(
                "Parámetro \"question\" requerido".to_string(),
            ));
        }
        let provider = self.provider(model)?;

        info!(
            "Processing question with {} (target: {})",
            model,
            target_api.unwrap_or("auto")
        );

        let relevant = relevance::select_relevant(&self.registry, question, target_api);
        let relevant_ids: Vec<String> = relevant.iter().map(|api| api.id.clone()).collect();
        info!("Relevant APIs: {}", relevant_ids.join(", "));

        let live = context::collect(&self.client, &relevant, question).await;
        let prompt = prompt::build_prompt(question, &live.text, &self.registry.active(), &relevant);

        let raw = provider.complete(&prompt).await?;

        Ok(ChatAnswer {
            answer: prompt::shape_answer(&raw, question),
            relevant_apis: relevant_ids,
            context: live.label(),
            used_apis: live.used_apis,
            model,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// 등록된 모든 시스템의 요약
    pub async fn systems_summary(&self, model: ModelKind) -> Result<SystemsSummary> {
        let provider = self.provider(model)?;
        let apis = self.registry.all();
        let summary = provider.complete(&prompt::build_summary_prompt(&apis)).await?;

        Ok(SystemsSummary {
            summary,
            total_systems: apis.len(),
            systems: apis.into_iter().map(|api| api.id).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilink_foundation::{ApiClientConfig, Environment};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// 받은 프롬프트를 기록하고 고정 답변을 돌려주는 모델
    struct RecordingProvider {
        model: ModelKind,
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn new(model: ModelKind, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                model,
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for RecordingProvider {
        fn model(&self) -> ModelKind {
            self.model
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn orchestrator(provider: Arc<RecordingProvider>) -> ChatOrchestrator {
        let registry = Arc::new(ApiRegistry::with_builtins());
        let client = Arc::new(
            ApiQueryClient::new(registry.clone(), &ApiClientConfig::default(), Environment::Test)
                .unwrap(),
        );
        ChatOrchestrator::new(registry, client).with_provider(provider)
    }

    #[tokio::test]
    async fn test_empty_question() {
        let chat = orchestrator(RecordingProvider::new(ModelKind::Claude, "ok"));
        let err = chat.answer("   ", ModelKind::Claude, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_model() {
        let chat = orchestrator(RecordingProvider::new(ModelKind::Claude, "ok"));
        let err = chat.answer("hola", ModelKind::Gemini, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
        assert_eq!(chat.models(), vec![ModelKind::Claude]);
    }

    #[tokio::test]
    async fn test_answer_informative_mode() {
        let provider = RecordingProvider::new(ModelKind::Gemini, "Hay dos sistemas.");
        let chat = orchestrator(provider.clone());

        // 엔드포인트가 맞지 않으므로 네트워크 호출 없이 개요만 사용
        let result = chat.answer("hola", ModelKind::Gemini, None).await.unwrap();
        assert_eq!(result.answer, "Hay dos sistemas.");
        assert_eq!(result.relevant_apis, vec!["sabi", "trendvoto"]);
        assert!(result.used_apis.is_empty());
        assert_eq!(result.context, "Modo informativo");

        let prompts = provider.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("=== DATOS DE SABI ==="));
        assert!(prompts[0].contains("=== DATOS DE TRENDVOTO ==="));
        assert!(prompts[0].contains("PREGUNTA DEL USUARIO: hola"));
    }

    #[tokio::test]
    async fn test_systems_summary() {
        let provider = RecordingProvider::new(ModelKind::Claude, "Resumen");
        let chat = orchestrator(provider.clone());

        let summary = chat.systems_summary(ModelKind::Claude).await.unwrap();
        assert_eq!(summary.summary, "Resumen");
        assert_eq!(summary.total_systems, 2);
        assert!(provider.prompts.lock()[0].starts_with("Eres un arquitecto"));
    }
}
