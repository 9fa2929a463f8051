//! Transports - 디스패처를 외부 채널에 연결
//!
//! ## 지원 전송
//! - WebSocket (axum, 헬스 엔드포인트 포함)
//! - stdio (줄 단위 JSON-RPC)

mod stdio;
mod websocket;

pub use stdio::{run_stdio, serve_lines};
pub use websocket::{router, serve, AppState, HEARTBEAT_INTERVAL};
