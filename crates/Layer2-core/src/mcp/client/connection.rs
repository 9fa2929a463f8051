//! McpClient - WebSocket JSON-RPC 클라이언트 (tokio-tungstenite)
//!
//! ## 기능
//! - 연결 타임아웃, 요청 타임아웃
//! - id 기반 응답 매칭 (모르는 id는 버림)
//! - 고정 딜레이 자동 재연결 (횟수 소진 시 `Failed`)
//! - 연결 종료 시 대기 요청 거절
//! - 세대(generation) 번호로 늦게 끝난 핸드셰이크 폐기

use super::pending::PendingRequests;
use super::state::ConnectionState;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::mcp::types::{Implementation, InitializeParams, InitializeResult, ToolCallResult};
use apilink_foundation::{
    ClientConfig, Error, ResourceDescriptor, Result, ToolDescriptor, DEFAULT_PROTOCOL_VERSION,
};
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLIENT_NAME: &str = "mcp-client";
const CLIENT_VERSION: &str = "1.0.0";

/// JSON-RPC 클라이언트
///
/// ## 사용법
/// ```ignore
/// let client = McpClient::new(ClientConfig::default());
/// client.connect().await?;
/// client.initialize().await?;
/// let tools = client.list_tools().await?;
/// client.disconnect().await;
/// ```
#[derive(Clone)]
pub struct McpClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    state: watch::Sender<ConnectionState>,
    pending: PendingRequests,
    writer: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    /// 사용자 요청 종료 (재연결 안 함)
    closing: AtomicBool,
    /// connect/disconnect 마다 증가. 이전 세대의 재연결 루프는 스스로 종료
    generation: AtomicU64,
}

impl McpClient {
    pub fn new(config: ClientConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                state,
                pending: PendingRequests::new(),
                writer: Mutex::new(None),
                closing: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// 상태 변화 구독
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    // ========================================================================
    // 연결 관리
    // ========================================================================

    /// 서버 연결 (연결 타임아웃 적용)
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.closing.store(false, Ordering::SeqCst);
        self.inner.set_state(ConnectionState::Connecting);

        match self.inner.open().await {
            Ok(stream) => {
                if !Inner::attach(&self.inner, stream, generation) {
                    return Err(Error::Connection(
                        "connection superseded before handshake completed".to_string(),
                    ));
                }
                info!("Connected to {}", self.inner.config.url);
                Ok(())
            }
            Err(e) => {
                if self.inner.is_current(generation) {
                    self.inner.set_state(ConnectionState::Disconnected);
                }
                Err(e)
            }
        }
    }

    /// 연결 종료 (대기 요청은 거절)
    pub async fn disconnect(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(writer) = self.inner.writer.lock().take() {
            let _ = writer.send(Message::Close(None));
        }
        self.inner.pending.reject_all("client disconnected");
        self.inner.set_state(ConnectionState::Disconnected);
        info!("Disconnected from {}", self.inner.config.url);
    }

    // ========================================================================
    // 요청
    // ========================================================================

    /// 요청 전송 후 응답 대기 (요청 타임아웃 적용)
    pub async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let writer = self
            .inner
            .writer
            .lock()
            .clone()
            .filter(|_| self.is_connected())
            .ok_or_else(|| Error::Connection("not connected".to_string()))?;

        let (id, rx) = self.inner.pending.register();
        let request = JsonRpcRequest::new(id, method, params);
        let body = serde_json::to_string(&request)?;

        debug!("-> {} (id: {})", method, id);
        if writer.send(Message::Text(body)).is_err() {
            self.inner.pending.remove(id);
            return Err(Error::Connection("connection closed".to_string()));
        }

        let timeout = Duration::from_millis(self.inner.config.request_timeout_ms);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(response))) => response.into_result(),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(_)) => Err(Error::Connection("connection closed".to_string())),
            Err(_) => {
                self.inner.pending.remove(id);
                Err(Error::Timeout(format!(
                    "{} did not respond within {}ms",
                    method,
                    timeout.as_millis()
                )))
            }
        }
    }

    /// 알림 전송 (응답 없음)
    pub fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let writer = self
            .inner
            .writer
            .lock()
            .clone()
            .ok_or_else(|| Error::Connection("not connected".to_string()))?;
        let body = serde_json::to_string(&JsonRpcRequest::notification(method, params))?;
        writer
            .send(Message::Text(body))
            .map_err(|_| Error::Connection("connection closed".to_string()))
    }

    // ========================================================================
    // 편의 메서드
    // ========================================================================

    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: Some(DEFAULT_PROTOCOL_VERSION.to_string()),
            capabilities: Some(json!({})),
            client_info: Some(Implementation::new(CLIENT_NAME, CLIENT_VERSION)),
        };
        let result = self
            .send_request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(result)?;
        self.notify("notifications/initialized", None)?;
        Ok(result)
    }

    pub async fn ping(&self) -> Result<Value> {
        self.send_request("ping", None).await
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result = self.send_request("tools/list", None).await?;
        Ok(serde_json::from_value(
            result.get("tools").cloned().unwrap_or_else(|| json!([])),
        )?)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let result = self
            .send_request(
                "tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        let result = self.send_request("resources/list", None).await?;
        Ok(serde_json::from_value(
            result.get("resources").cloned().unwrap_or_else(|| json!([])),
        )?)
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        self.send_request("resources/read", Some(json!({ "uri": uri })))
            .await
    }

    /// `api_query` 도구 호출
    pub async fn query_api(
        &self,
        api_id: &str,
        endpoint: &str,
        params: Value,
    ) -> Result<ToolCallResult> {
        self.call_tool(
            "api_query",
            json!({ "apiId": api_id, "endpoint": endpoint, "params": params }),
        )
        .await
    }

    /// `api_discovery` 도구 호출
    pub async fn discover_apis(
        &self,
        query: Option<&str>,
        limit: Option<u32>,
    ) -> Result<ToolCallResult> {
        let mut arguments = json!({});
        if let Some(query) = query {
            arguments["query"] = json!(query);
        }
        if let Some(limit) = limit {
            arguments["limit"] = json!(limit);
        }
        self.call_tool("api_discovery", arguments).await
    }

    /// `database_search` 도구 호출
    pub async fn search_databases(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<ToolCallResult> {
        let mut arguments = json!({ "searchTerm": term });
        if let Some(limit) = limit {
            arguments["limit"] = json!(limit);
        }
        self.call_tool("database_search", arguments).await
    }
}

// ============================================================================
// Connection internals
// ============================================================================

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Client state: {} -> {}", previous, state);
        }
    }

    fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// 해당 세대가 아직 유효한지 (종료 요청/새 connect 없음)
    fn is_current(&self, generation: u64) -> bool {
        !self.closing.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn open(&self) -> Result<WsStream> {
        let timeout = Duration::from_millis(self.config.connect_timeout_ms);
        match tokio::time::timeout(timeout, connect_async(self.config.url.as_str())).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(e)) => Err(Error::Connection(format!(
                "failed to connect to {}: {}",
                self.config.url, e
            ))),
            Err(_) => Err(Error::Timeout(format!(
                "connection to {} not established within {}ms",
                self.config.url,
                timeout.as_millis()
            ))),
        }
    }

    /// 스트림에 쓰기/읽기 태스크 연결
    ///
    /// 세대가 바뀌었으면 스트림을 버리고 `false` 반환
    fn attach(inner: &Arc<Inner>, stream: WsStream, generation: u64) -> bool {
        let mut writer = inner.writer.lock();
        if !inner.is_current(generation) {
            debug!("Dropping stale connection to {}", inner.config.url);
            return false;
        }

        let (mut sink, source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if sink.send(message).await.is_err() || closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        *writer = Some(tx.clone());
        inner.set_state(ConnectionState::Connected);
        drop(writer);

        tokio::spawn(Inner::read_loop(Arc::clone(inner), source, tx));
        true
    }

    async fn read_loop(
        inner: Arc<Inner>,
        mut source: SplitStream<WsStream>,
        writer: mpsc::UnboundedSender<Message>,
    ) {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => inner.dispatch(&text),
                Ok(Message::Binary(bytes)) => inner.dispatch(&String::from_utf8_lossy(&bytes)),
                Ok(Message::Ping(data)) => {
                    let _ = writer.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Client receive error: {}", e);
                    break;
                }
            }
        }

        inner.on_closed(&writer);
    }

    fn dispatch(&self, text: &str) {
        match serde_json::from_str::<JsonRpcResponse>(text) {
            Ok(response) => {
                self.pending.resolve(response);
            }
            Err(e) => warn!("Ignoring malformed message from server: {}", e),
        }
    }

    fn on_closed(self: &Arc<Self>, writer: &mpsc::UnboundedSender<Message>) {
        {
            // 이미 새 연결로 교체됐거나 disconnect가 가져간 경우 무시
            let mut current = self.writer.lock();
            if !current.as_ref().is_some_and(|w| w.same_channel(writer)) {
                return;
            }
            *current = None;
        }
        self.pending.reject_all("connection closed");

        if self.closing.load(Ordering::SeqCst) {
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        let next = self
            .current_state()
            .after_connection_lost(&self.config.reconnect);
        warn!("Connection to {} lost ({})", self.config.url, next);
        self.set_state(next);

        if matches!(next, ConnectionState::Reconnecting { .. }) {
            let generation = self.generation.load(Ordering::SeqCst);
            tokio::spawn(Inner::reconnect(Arc::clone(self), generation));
        }
    }

    /// 고정 딜레이 재연결 (횟수 소진 시 Failed)
    ///
    /// disconnect/connect가 세대를 바꾸면 진행 중인 시도도 결과를 버리고 종료
    async fn reconnect(inner: Arc<Inner>, generation: u64) {
        let delay = Duration::from_millis(inner.config.reconnect.delay_ms);

        loop {
            let ConnectionState::Reconnecting { attempt } = inner.current_state() else {
                return;
            };

            tokio::time::sleep(delay).await;
            if !inner.is_current(generation) {
                debug!("Reconnect loop for {} superseded", inner.config.url);
                return;
            }

            info!(
                "Reconnecting to {} (attempt {}/{})",
                inner.config.url, attempt, inner.config.reconnect.max_attempts
            );

            match inner.open().await {
                Ok(stream) => {
                    if Inner::attach(&inner, stream, generation) {
                        info!("Reconnected to {}", inner.config.url);
                    }
                    return;
                }
                Err(e) => {
                    if !inner.is_current(generation) {
                        return;
                    }
                    warn!("Reconnect attempt {} failed: {}", attempt, e);
                    let next = inner
                        .current_state()
                        .after_failed_attempt(&inner.config.reconnect);
                    inner.set_state(next);
                    if next == ConnectionState::Failed {
                        warn!(
                            "Giving up on {} after {} attempts",
                            inner.config.url, inner.config.reconnect.max_attempts
                        );
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.url = url.to_string();
        config.connect_timeout_ms = 300;
        config.reconnect.auto_reconnect = false;
        config
    }

    #[tokio::test]
    async fn test_request_requires_connection() {
        let client = McpClient::new(config("ws://127.0.0.1:1/mcp"));
        let err = client.ping().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let client = McpClient::new(config("ws://127.0.0.1:1/mcp"));
        assert!(client.connect().await.is_err());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }
}
