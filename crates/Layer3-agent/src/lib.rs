//! # apilink-agent
//!
//! 등록된 API 위에서 자연어 질문에 답하는 채팅 오케스트레이션 레이어입니다.
//!
//! ## 핵심 컴포넌트
//!
//! - **relevance**: 질문과 관련된 API 선택 (키워드/동의어/이름 점수)
//! - **context**: 관련 API의 실시간 데이터 샘플 수집
//! - **prompt**: 프롬프트 조립과 답변 후처리
//! - **ChatOrchestrator**: 위 단계를 묶고 `CompletionProvider`로 답변 생성
//!
//! 모델 구현(`CompletionProvider`)은 외부에서 주입합니다.
//!
//! ## 사용 예
//!
//! ```ignore
//! use apilink_agent::ChatOrchestrator;
//!
//! let chat = ChatOrchestrator::new(registry, client).with_provider(claude);
//! let reply = chat.answer("¿Cuántos recintos hay?", ModelKind::Claude, None).await?;
//! println!("{} ({})", reply.answer, reply.context);
//! ```

pub mod context;
pub mod orchestrator;
pub mod prompt;
pub mod relevance;

pub use context::LiveContext;
pub use orchestrator::{ChatAnswer, ChatOrchestrator, SystemsSummary};
pub use prompt::QuestionStyle;
pub use relevance::{rank_apis, select_relevant, ScoredApi};
