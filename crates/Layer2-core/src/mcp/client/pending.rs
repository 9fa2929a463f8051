//! 응답 대기 중인 요청 테이블

use crate::mcp::protocol::{JsonRpcResponse, RequestId};
use apilink_foundation::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tracing::debug;

type Waiter = oneshot::Sender<Result<JsonRpcResponse>>;

/// id -> 응답 대기자
pub struct PendingRequests {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, Waiter>>,
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// 새 id 발급 및 대기 등록
    pub fn register(&self) -> (u64, oneshot::Receiver<Result<JsonRpcResponse>>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);
        (id, rx)
    }

    /// 응답 전달 (대기자가 없으면 버림)
    pub fn resolve(&self, response: JsonRpcResponse) -> bool {
        let id = match &response.id {
            Some(RequestId::Number(n)) if *n >= 0 => *n as u64,
            other => {
                debug!("Dropping response with unmatched id {:?}", other);
                return false;
            }
        };

        match self.waiters.lock().remove(&id) {
            Some(waiter) => waiter.send(Ok(response)).is_ok(),
            None => {
                debug!("Dropping response for unknown request {}", id);
                false
            }
        }
    }

    /// 타임아웃/전송 실패 시 정리
    pub fn remove(&self, id: u64) {
        self.waiters.lock().remove(&id);
    }

    /// 모든 대기 요청 거절 (연결 종료 시)
    pub fn reject_all(&self, reason: &str) -> usize {
        let waiters: Vec<_> = self.waiters.lock().drain().collect();
        let count = waiters.len();
        for (_, waiter) in waiters {
            let _ = waiter.send(Err(Error::Connection(reason.to_string())));
        }
        if count > 0 {
            debug!("Rejected {} pending requests: {}", count, reason);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
