pub mod client;
pub mod jsonrpc;

pub use client::{default_socket_path, ClientError, SocketClient, BASE_DIR, SOCKET_FILE};
pub use jsonrpc::{codes, parse_request, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
