//! 클라이언트 연결 상태 머신
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//! Connected --(연결 끊김)--> Reconnecting(1) -> ... -> Reconnecting(max) -> Failed
//! Reconnecting(n) --(성공)--> Connected
//! ```

use apilink_foundation::ReconnectConfig;
use serde::Serialize;

/// 연결 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    /// 재연결 횟수 소진 (종료 상태, 명시적 `connect`로만 복구)
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// 예기치 않은 연결 종료 후 다음 상태
    pub fn after_connection_lost(&self, policy: &ReconnectConfig) -> Self {
        if policy.auto_reconnect && policy.max_attempts > 0 {
            ConnectionState::Reconnecting { attempt: 1 }
        } else {
            ConnectionState::Disconnected
        }
    }

    /// 재연결 시도 실패 후 다음 상태
    pub fn after_failed_attempt(&self, policy: &ReconnectConfig) -> Self {
        match self {
            ConnectionState::Reconnecting { attempt } if *attempt < policy.max_attempts => {
                ConnectionState::Reconnecting {
                    attempt: attempt + 1,
                }
            }
            ConnectionState::Reconnecting { .. } => ConnectionState::Failed,
            other => *other,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting { attempt } => write!(f, "reconnecting ({})", attempt),
            ConnectionState::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> ReconnectConfig {
        ReconnectConfig {
            auto_reconnect: true,
            max_attempts,
            delay_ms: 10,
        }
    }

    #[test]
    fn test_reconnect_sequence() {
        let policy = policy(2);
        let state = ConnectionState::Connected.after_connection_lost(&policy);
        assert_eq!(state, ConnectionState::Reconnecting { attempt: 1 });

        let state = state.after_failed_attempt(&policy);
        assert_eq!(state, ConnectionState::Reconnecting { attempt: 2 });

        let state = state.after_failed_attempt(&policy);
        assert_eq!(state, ConnectionState::Failed);
        assert_eq!(state.after_failed_attempt(&policy), ConnectionState::Failed);
    }

    #[test]
    fn test_reconnect_disabled() {
        let mut policy = policy(5);
        policy.auto_reconnect = false;
        assert_eq!(
            ConnectionState::Connected.after_connection_lost(&policy),
            ConnectionState::Disconnected
        );
        assert_eq!(
            ConnectionState::Connected.after_connection_lost(&self::policy(0)),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Reconnecting { attempt: 3 }.to_string(), "reconnecting (3)");
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Failed.is_connected());
    }
}
