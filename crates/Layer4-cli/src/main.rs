//! apilink CLI - Main entry point
//!
//! ## 명령
//! - `serve`: WebSocket 서버 (`/mcp`, `/health`, `/databases`)
//! - `stdio`: 줄 단위 JSON-RPC (stdin/stdout)
//! - `call`: 실행 중인 서버에 요청 하나 전송
//! - `health`: API/데이터베이스 상태 확인

mod bootstrap;
mod cli;
mod signal;

use apilink_core::mcp::transport::{self, AppState};
use apilink_foundation::AppConfig;
use bootstrap::Services;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 종료 시 데이터베이스 풀 정리 제한 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// apilink - API query and cross-database search over JSON-RPC
#[derive(Parser, Debug)]
#[command(name = "apilink")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the WebSocket server (default)
    Serve {
        /// Override MCP_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Serve JSON-RPC over stdin/stdout
    Stdio,
    /// Send a single request to a running server
    Call {
        /// JSON-RPC method (e.g. tools/list)
        method: String,
        /// Params as JSON
        params: Option<String>,
        /// Server URL (overrides MCP_URL)
        #[arg(long)]
        url: Option<String>,
    },
    /// Check registered APIs and databases
    Health,
}

fn init_logging(config: &AppConfig, debug: bool) {
    let level = if debug { "debug" } else { config.log_level.as_str() };
    let filter = if debug {
        tracing_subscriber::EnvFilter::new(level)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };

    // stdout은 stdio 전송이 사용하므로 로그는 항상 stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::from_env()?;
    init_logging(&config, args.debug);

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Command::Stdio => run_stdio(config).await,
        Command::Call { method, params, url } => {
            let mut client_config = config.client.clone();
            if let Some(url) = url {
                client_config.url = url;
            }
            let params = cli::parse_params(params.as_deref())?;
            let result = cli::run_call(client_config, &method, params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Health => {
            let services = Services::from_config(&config)?;
            let report = cli::run_health(&services).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn start(config: &AppConfig) -> anyhow::Result<(Services, apilink_core::McpServer)> {
    let services = Services::from_config(config)?;

    for probe in services.databases.probe_all().await {
        if !probe.connected {
            warn!(
                "Database {} unavailable at startup: {}",
                probe.name,
                probe.error.unwrap_or_default()
            );
        }
    }

    let server = apilink_core::build_server(
        &config.server,
        services.registry.clone(),
        services.client.clone(),
        services.databases.clone(),
    )?;
    info!(
        "{} {} ready with tools: {}",
        config.server.name,
        config.server.version,
        server.tool_names().join(", ")
    );
    Ok((services, server))
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let (services, server) = start(&config).await?;
    let shutdown = CancellationToken::new();
    tokio::spawn(signal::wait_for_shutdown(shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    let state = AppState {
        server: Arc::new(server),
        registry: services.registry.clone(),
        databases: services.databases.clone(),
        shutdown: shutdown.clone(),
        heartbeat_interval: Duration::from_millis(config.server.heartbeat_interval_ms),
    };

    let result = transport::serve(listener, state, &config.server.path).await;
    shutdown.cancel();
    close_databases(&services).await;
    result.map_err(Into::into)
}

async fn run_stdio(config: AppConfig) -> anyhow::Result<()> {
    let (services, server) = start(&config).await?;
    let shutdown = CancellationToken::new();
    tokio::spawn(signal::wait_for_shutdown(shutdown.clone()));

    let result = transport::run_stdio(&server, shutdown.clone()).await;
    shutdown.cancel();
    close_databases(&services).await;
    result.map_err(Into::into)
}

async fn close_databases(services: &Services) {
    if tokio::time::timeout(SHUTDOWN_GRACE, services.databases.close_all())
        .await
        .is_err()
    {
        error!(
            "Database pools did not close within {}s",
            SHUTDOWN_GRACE.as_secs()
        );
    }
}
