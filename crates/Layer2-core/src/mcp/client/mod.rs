//! MCP Client - 원격 apilink 서버 연결

mod connection;
mod pending;
mod state;

pub use connection::McpClient;
pub use pending::PendingRequests;
pub use state::ConnectionState;
