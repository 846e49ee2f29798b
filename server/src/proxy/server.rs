//! Unix Socket Server
//!
//! Listens for incoming connections on the configured socket and dispatches
//! newline-delimited JSON-RPC 2.0 requests to the handler registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use briefing_protocol::{parse_request, JsonRpcResponse};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::handlers::HandlerRegistry;
use super::ProxyState;

/// Proxy server that listens on a Unix socket
pub struct ProxyServer {
    socket_path: PathBuf,
    handlers: Arc<HandlerRegistry>,
    state: Arc<ProxyState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ProxyServer {
    pub fn new(socket_path: PathBuf, handlers: Arc<HandlerRegistry>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            socket_path,
            handlers,
            state: ProxyState::new(),
            shutdown_tx,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn state(&self) -> &ProxyState {
        &self.state
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Bind the socket and serve until [`shutdown`](Self::shutdown) is called
    pub async fn start(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // stale socket from a previous run
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!("Proxy server listening on {:?}", self.socket_path);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let handlers = Arc::clone(&self.handlers);
                            let state = Arc::clone(&self.state);
                            state.connection_opened();

                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, handlers).await {
                                    error!("Connection error: {}", e);
                                }
                                state.connection_closed();
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    info!(
                        "Proxy server shutting down after {} connections",
                        self.state.connection_count()
                    );
                    break;
                }
            }
        }

        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }

        Ok(())
    }
}

/// Handle a single connection
async fn handle_connection(
    stream: UnixStream,
    handlers: Arc<HandlerRegistry>,
) -> Result<(), std::io::Error> {
    let Ok(cred) = stream.peer_cred() else {
        warn!("Could not retrieve peer credentials, rejecting connection");
        return Ok(());
    };

    debug!("Connection from PID: {:?}, UID: {:?}", cred.pid(), cred.uid());

    // owner-only socket: the peer must run as our user
    let my_uid = unsafe { libc::getuid() };
    if cred.uid() != my_uid {
        warn!("Rejecting connection from UID {} (expected {})", cred.uid(), my_uid);
        return Ok(());
    }
    let peer_pid = cred.pid();

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();

        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Client disconnected");
                break;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }

                let response = process_request(&line, &handlers, peer_pid).await;

                // notifications get no reply
                if response.is_null() {
                    continue;
                }

                let response_json = match serde_json::to_string(&response) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize response: {}", e);
                        continue;
                    }
                };

                if let Err(e) = writer.write_all(response_json.as_bytes()).await {
                    warn!("Failed to write response: {}", e);
                    break;
                }
                if let Err(e) = writer.write_all(b"\n").await {
                    warn!("Failed to write newline: {}", e);
                    break;
                }
                if let Err(e) = writer.flush().await {
                    warn!("Failed to flush: {}", e);
                    break;
                }
            }
            Err(e) => {
                error!("Read error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Process a single request line. Returns `Value::Null` when nothing should
/// be written back.
async fn process_request(line: &str, handlers: &HandlerRegistry, peer_pid: Option<i32>) -> Value {
    let requests = match parse_request(line) {
        Ok(reqs) => reqs,
        Err(error_response) => {
            return serde_json::to_value(error_response).unwrap_or_default();
        }
    };

    let is_batch = line.trim_start().starts_with('[');
    let mut responses: Vec<JsonRpcResponse> = Vec::with_capacity(requests.len());

    for request in &requests {
        if let Err(e) = request.validate() {
            let id = request.id.clone().unwrap_or(Value::Null);
            responses.push(JsonRpcResponse::invalid_request(id, e));
            continue;
        }

        let response = handlers.handle(request, peer_pid).await;

        if !request.is_notification() {
            responses.push(response);
        }
    }

    if is_batch {
        if responses.is_empty() {
            Value::Null
        } else {
            serde_json::to_value(responses).unwrap_or_default()
        }
    } else {
        responses
            .pop()
            .map(|r| serde_json::to_value(r).unwrap_or_default())
            .unwrap_or(Value::Null)
    }
}
