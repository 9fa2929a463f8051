//! Core Module - 핵심 인터페이스 및 타입
//!
//! - `types.rs`: 디스크립터 (ResourceDescriptor, ToolDescriptor, ModelKind)
//! - `traits.rs`: 인터페이스 (ResourceProvider, ToolProvider, CompletionProvider)
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │            Protocol Dispatcher            │
//! │   scheme ─► ResourceProvider              │
//! │   name   ─► ToolProvider                  │
//! └─────────────────────┬─────────────────────┘
//!                       ▼
//!        API Query Client / Database Manager
//! ```

mod traits;
mod types;

pub use traits::{CompletionProvider, ResourceProvider, ToolProvider};
pub use types::{ModelKind, ResourceDescriptor, ToolDescriptor};
