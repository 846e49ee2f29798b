use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::{JsonRpcRequest, JsonRpcResponse};

/// Per-user state directory, relative to the home directory
pub const BASE_DIR: &str = ".briefing";
pub const SOCKET_FILE: &str = "briefing.sock";

/// Default location of the `briefingd` socket (`~/.briefing/briefing.sock`)
pub fn default_socket_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(BASE_DIR).join(SOCKET_FILE))
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("home directory unavailable")]
    NoHome,

    #[error("could not connect to {path} (is briefingd running?): {source}")]
    Connect {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("socket IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON on socket: {0}")]
    Json(#[from] serde_json::Error),

    #[error("socket closed while waiting for response")]
    Closed,
}

pub struct SocketClient {
    reader: BufReader<tokio::io::ReadHalf<UnixStream>>,
    writer: tokio::io::WriteHalf<UnixStream>,
}

impl SocketClient {
    pub async fn connect() -> Result<Self, ClientError> {
        let path = default_socket_path().ok_or(ClientError::NoHome)?;
        Self::connect_to(path).await
    }

    pub async fn connect_to(path: PathBuf) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|source| ClientError::Connect {
                path: path.display().to_string(),
                source,
            })?;
        let (r, w) = tokio::io::split(stream);
        Ok(Self {
            reader: BufReader::new(r),
            writer: w,
        })
    }

    pub async fn call(&mut self, request: JsonRpcRequest) -> Result<JsonRpcResponse, ClientError> {
        let payload = serde_json::to_string(&request)?;

        self.writer.write_all(payload.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line).await?;
        if bytes == 0 {
            return Err(ClientError::Closed);
        }

        Ok(serde_json::from_str(line.trim())?)
    }
}
