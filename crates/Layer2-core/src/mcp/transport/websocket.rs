//! WebSocket 전송 (axum)
//!
//! ## 라우트
//! - `GET {path}` - JSON-RPC WebSocket 업그레이드 (기본 `/mcp`)
//! - `GET /health` - 서비스 상태
//! - `GET /databases` - 설정된 데이터베이스 목록
//!
//! 연결마다 수신 루프 하나와 쓰기 태스크 하나를 두고,
//! 메시지마다 별도 태스크에서 처리합니다. 응답 순서는 보장하지 않습니다.

use crate::database::DatabaseManager;
use crate::mcp::server::McpServer;
use apilink_foundation::{ApiRegistry, Error, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 기본 ping 간격 (이전 ping의 pong이 없으면 연결 종료)
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// 연결당 쓰기 큐 크기
const OUTBOUND_CAPACITY: usize = 64;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Shared state
// ============================================================================

/// 모든 연결이 공유하는 상태
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
    pub registry: Arc<ApiRegistry>,
    pub databases: Arc<DatabaseManager>,
    /// 종료 시 열린 세션도 닫음
    pub shutdown: CancellationToken,
    /// 연결별 ping 간격. 두 간격 동안 수신이 없으면 세션 종료
    pub heartbeat_interval: Duration,
}

// ============================================================================
// Server
// ============================================================================

/// WebSocket + 헬스 엔드포인트 라우터
pub fn router(state: AppState, ws_path: &str) -> Router {
    Router::new()
        .route(ws_path, get(ws_upgrade_handler))
        .route("/health", get(health_handler))
        .route("/databases", get(databases_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// 리스너에서 서비스 시작, `shutdown` 취소 시 정상 종료
pub async fn serve(listener: TcpListener, state: AppState, ws_path: &str) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = router(state, ws_path);

    if let Ok(addr) = listener.local_addr() {
        info!("MCP WebSocket server listening on ws://{}{}", addr, ws_path);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(Error::Io)?;

    info!("MCP WebSocket server stopped");
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn ws_upgrade_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let database = if state.databases.is_connected() {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "ok",
        "service": state.server.server_info().name,
        "timestamp": Utc::now().to_rfc3339(),
        "database": database,
        "apis": state.registry.ids(),
    }))
}

async fn databases_handler(State(state): State<AppState>) -> impl IntoResponse {
    let databases = state.databases.list_databases();
    Json(json!({
        "count": databases.len(),
        "databases": databases,
        "connected": state.databases.is_connected(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// ============================================================================
// Session
// ============================================================================

async fn run_session(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!("{}: client connected", conn_id);

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);

    // 쓰기 태스크 (mpsc -> WebSocket)
    let mut writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut alive = true;
    let period = state.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = tx.send(Message::Close(None)).await;
                break;
            }
            _ = heartbeat.tick() => {
                if !std::mem::replace(&mut alive, false) {
                    warn!("{}: heartbeat timeout, terminating", conn_id);
                    break;
                }
                if tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        debug!("{}: receive error: {}", conn_id, e);
                        break;
                    }
                    None => break,
                };
                alive = true;

                match message {
                    Message::Text(text) => spawn_handler(&state, &tx, text),
                    Message::Binary(bytes) => {
                        spawn_handler(&state, &tx, String::from_utf8_lossy(&bytes).into_owned())
                    }
                    Message::Close(_) => break,
                    // ping 응답은 axum이 처리
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
        }
    }

    // 남은 응답 전송 후 쓰기 태스크 종료
    drop(tx);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
    info!("{}: client disconnected", conn_id);
}

/// 메시지 하나를 별도 태스크에서 처리하고 응답을 쓰기 큐로 전달
fn spawn_handler(state: &AppState, tx: &mpsc::Sender<Message>, text: String) {
    let server = Arc::clone(&state.server);
    let tx = tx.clone();
    tokio::spawn(async move {
        let Some(response) = server.handle_message(&text).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(body) => {
                let _ = tx.send(Message::Text(body)).await;
            }
            Err(e) => warn!("Failed to serialize response: {}", e),
        }
    });
}
