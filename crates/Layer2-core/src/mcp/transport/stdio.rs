//! stdio 전송 - 줄 단위 JSON-RPC
//!
//! stdout에는 프로토콜 응답만 씁니다. 로그는 stderr로 보내야 합니다.

use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};
use crate::mcp::server::McpServer;
use apilink_foundation::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 프로세스 stdin/stdout으로 세션 실행
pub async fn run_stdio(server: &McpServer, shutdown: CancellationToken) -> Result<()> {
    info!("MCP stdio transport started");
    serve_lines(server, tokio::io::stdin(), tokio::io::stdout(), shutdown).await
}

/// 임의의 reader/writer 쌍으로 세션 실행 (EOF 또는 취소 시 종료)
///
/// 빈 줄은 무시하고, 요청은 도착 순서대로 하나씩 처리합니다.
pub async fn serve_lines<R, W>(
    server: &McpServer,
    reader: R,
    mut writer: W,
    shutdown: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("stdio session cancelled");
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => read?,
        };

        if read == 0 {
            info!("stdin closed, ending stdio session");
            break;
        }

        // UTF-8이 아닌 줄은 파싱 실패로 응답하고 세션 유지
        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                server.handle_message(trimmed).await
            }
            Err(e) => {
                warn!("Discarding non UTF-8 line: {}", e);
                Some(JsonRpcResponse::failure(None, JsonRpcError::parse_error()))
            }
        };

        let Some(response) = response else {
            continue;
        };

        match serde_json::to_string(&response) {
            Ok(mut body) => {
                body.push('\n');
                writer.write_all(body.as_bytes()).await?;
                writer.flush().await?;
            }
            Err(e) => warn!("Failed to serialize response: {}", e),
        }
    }

    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_line_session() {
        let server = McpServer::builder().build().unwrap();
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "not-json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":\"b\",\"method\":\"tools/list\"}\n",
        );

        let mut output = Vec::new();
        serve_lines(&server, input.as_bytes(), &mut output, CancellationToken::new())
            .await
            .unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["result"], "pong");
        assert_eq!(replies[1]["error"]["code"], -32700);
        assert!(replies[1].get("id").is_none());
        assert_eq!(replies[2]["id"], "b");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_session() {
        let server = McpServer::builder().build().unwrap();
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n");

        let mut output = Vec::new();
        serve_lines(&server, input.as_slice(), &mut output, CancellationToken::new())
            .await
            .unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert!(replies[0].get("id").is_none());
        assert_eq!(replies[1]["id"], 7);
        assert_eq!(replies[1]["result"], "pong");
    }

    #[tokio::test]
    async fn test_cancelled_session() {
        let server = McpServer::builder().build().unwrap();
        let (_client, server_side) = tokio::io::duplex(64);
        let (reader, writer) = tokio::io::split(server_side);

        let token = CancellationToken::new();
        token.cancel();
        serve_lines(&server, reader, writer, token).await.unwrap();
    }
}
