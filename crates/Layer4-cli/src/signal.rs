//! 종료 시그널 처리
//!
//! SIGINT/SIGTERM/SIGQUIT 중 첫 번째 시그널에서만 토큰을 취소합니다.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 시그널을 기다렸다가 `shutdown` 취소 (이미 취소되었으면 무시)
pub async fn wait_for_shutdown(shutdown: CancellationToken) {
    let name = tokio::select! {
        name = terminate_signal() => name,
        _ = shutdown.cancelled() => return,
    };

    if shutdown.is_cancelled() {
        return;
    }
    info!("Received {}, shutting down", name);
    shutdown.cancel();
}

#[cfg(unix)]
async fn terminate_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut term, mut quit) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    ) {
        (Ok(term), Ok(quit)) => (term, quit),
        _ => {
            warn!("Failed to install unix signal handlers, falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    }
}

#[cfg(not(unix))]
async fn terminate_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        wait_for_shutdown(token.clone()).await;
        assert!(token.is_cancelled());
    }
}
