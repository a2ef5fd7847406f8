//! STDIO transport implementation for MCP.
//!
//! [`StdioClientTransport`] spawns a server process and speaks newline-
//! delimited JSON-RPC over its stdin/stdout, for embedding this crate's
//! types as an MCP client.
//!
//! [`StdioTransport`] is the server side (C9): newline-delimited JSON-RPC
//! over the current process's own stdin/stdout, one logical session, one
//! reader, fully sequential. `stdout` carries protocol bytes only; every
//! diagnostic goes through `tracing`, which the host wires to `stderr`,
//! never to stdout.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use crate::core::error::{McpError, McpResult};
use crate::protocol::types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::server::protocol::{parse_error_response, MessageSink, Protocol};
use crate::transport::traits::{ConnectionState, Transport, TransportConfig};

/// STDIO transport for MCP clients
///
/// This transport communicates with an MCP server via STDIO (standard input/output).
/// It's typically used when the server is a separate process.
#[derive(Debug)]
pub struct StdioClientTransport {
    child: Option<Child>,
    stdin_writer: Option<BufWriter<tokio::process::ChildStdin>>,
    #[allow(dead_code)]
    stdout_reader: Option<BufReader<tokio::process::ChildStdout>>,
    notification_receiver: Option<mpsc::UnboundedReceiver<JsonRpcNotification>>,
    pending_requests: Arc<Mutex<HashMap<Value, tokio::sync::oneshot::Sender<JsonRpcResponse>>>>,
    config: TransportConfig,
    state: ConnectionState,
}

impl StdioClientTransport {
    /// Create a new STDIO client transport
    pub async fn new<S: AsRef<str>>(command: S, args: Vec<S>) -> McpResult<Self> {
        Self::with_config(command, args, TransportConfig::default()).await
    }

    /// Create a new STDIO client transport with custom configuration
    pub async fn with_config<S: AsRef<str>>(
        command: S,
        args: Vec<S>,
        config: TransportConfig,
    ) -> McpResult<Self> {
        let command_str = command.as_ref();
        let args_str: Vec<&str> = args.iter().map(|s| s.as_ref()).collect();

        debug!("Starting MCP server: {} {:?}", command_str, args_str);

        let mut child = Command::new(command_str)
            .args(&args_str)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| McpError::transport(format!("Failed to start server process: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::transport("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::transport("Failed to get stdout handle"))?;

        let stdin_writer = BufWriter::new(stdin);
        let stdout_reader = BufReader::new(stdout);

        let (notification_sender, notification_receiver) = mpsc::unbounded_channel();
        let pending_requests = Arc::new(Mutex::new(HashMap::new()));

        let reader_pending_requests = pending_requests.clone();
        let reader = stdout_reader;
        tokio::spawn(async move {
            Self::message_processor(reader, notification_sender, reader_pending_requests).await;
        });

        Ok(Self {
            child: Some(child),
            stdin_writer: Some(stdin_writer),
            stdout_reader: None,
            notification_receiver: Some(notification_receiver),
            pending_requests,
            config,
            state: ConnectionState::Connected,
        })
    }

    async fn message_processor(
        mut reader: BufReader<tokio::process::ChildStdout>,
        notification_sender: mpsc::UnboundedSender<JsonRpcNotification>,
        pending_requests: Arc<Mutex<HashMap<Value, tokio::sync::oneshot::Sender<JsonRpcResponse>>>>,
    ) {
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("STDIO reader reached EOF");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(line) {
                        let mut pending = pending_requests.lock().await;
                        match pending.remove(&response.id) {
                            Some(sender) => {
                                let _ = sender.send(response);
                            }
                            _ => {
                                warn!("Received response for unknown request ID: {:?}", response.id);
                            }
                        }
                    } else if let Ok(notification) =
                        serde_json::from_str::<JsonRpcNotification>(line)
                    {
                        if notification_sender.send(notification).is_err() {
                            debug!("Notification receiver dropped");
                            break;
                        }
                    } else {
                        warn!("Failed to parse message: {}", line);
                    }
                }
                Err(e) => {
                    error!("Error reading from stdout: {}", e);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for StdioClientTransport {
    async fn send_request(&mut self, request: JsonRpcRequest) -> McpResult<JsonRpcResponse> {
        let writer = self
            .stdin_writer
            .as_mut()
            .ok_or_else(|| McpError::transport("Transport not connected"))?;

        let (sender, receiver) = tokio::sync::oneshot::channel();

        {
            let mut pending = self.pending_requests.lock().await;
            pending.insert(request.id.clone(), sender);
        }

        let request_line = serde_json::to_string(&request).map_err(McpError::serialization)?;

        writer
            .write_all(request_line.as_bytes())
            .await
            .map_err(|e| McpError::transport(format!("Failed to write request: {e}")))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| McpError::transport(format!("Failed to write newline: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| McpError::transport(format!("Failed to flush: {e}")))?;

        let timeout_duration = Duration::from_millis(self.config.read_timeout_ms.unwrap_or(60_000));

        let response = timeout(timeout_duration, receiver)
            .await
            .map_err(|_| McpError::timeout("Request timeout"))?
            .map_err(|_| McpError::transport("Response channel closed"))?;

        Ok(response)
    }

    async fn send_notification(&mut self, notification: JsonRpcNotification) -> McpResult<()> {
        let writer = self
            .stdin_writer
            .as_mut()
            .ok_or_else(|| McpError::transport("Transport not connected"))?;

        let notification_line =
            serde_json::to_string(&notification).map_err(McpError::serialization)?;

        writer
            .write_all(notification_line.as_bytes())
            .await
            .map_err(|e| McpError::transport(format!("Failed to write notification: {e}")))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| McpError::transport(format!("Failed to write newline: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| McpError::transport(format!("Failed to flush: {e}")))?;

        Ok(())
    }

    async fn receive_notification(&mut self) -> McpResult<Option<JsonRpcNotification>> {
        if let Some(ref mut receiver) = self.notification_receiver {
            match receiver.try_recv() {
                Ok(notification) => Ok(Some(notification)),
                Err(mpsc::error::TryRecvError::Empty) => Ok(None),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    Err(McpError::transport("Notification channel disconnected"))
                }
            }
        } else {
            Ok(None)
        }
    }

    async fn close(&mut self) -> McpResult<()> {
        debug!("Closing STDIO transport");

        self.state = ConnectionState::Closing;

        if let Some(mut writer) = self.stdin_writer.take() {
            let _ = writer.shutdown().await;
        }

        if let Some(mut child) = self.child.take() {
            match timeout(Duration::from_secs(5), child.wait()).await {
                Ok(Ok(status)) => {
                    debug!("Server process exited with status: {}", status);
                }
                Ok(Err(e)) => {
                    warn!("Error waiting for server process: {}", e);
                }
                Err(_) => {
                    warn!("Timeout waiting for server process, killing it");
                    let _ = child.kill().await;
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected)
    }

    fn connection_info(&self) -> String {
        let state = &self.state;
        format!("STDIO transport (state: {state:?})")
    }
}

impl Drop for StdioClientTransport {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}

/// Fixed session id for the one logical connection a stdio server has.
pub const STDIO_SESSION_ID: &str = "stdio";

/// Drives [`Protocol`] off of this process's stdin/stdout. There is exactly
/// one session, so outbound frames from [`MessageSink::send`] are written
/// straight to stdout regardless of the `session_id` argument.
pub struct StdioTransport {
    protocol: Arc<Protocol>,
}

struct StdoutSink {
    writer: Mutex<BufWriter<tokio::io::Stdout>>,
}

impl StdoutSink {
    fn new() -> Self {
        Self { writer: Mutex::new(BufWriter::new(tokio::io::stdout())) }
    }

    async fn flush(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.flush().await {
            error!(error = %e, "failed to flush stdout on shutdown");
        }
    }
}

#[async_trait]
impl MessageSink for StdoutSink {
    async fn send(&self, _session_id: &str, message: Value) {
        let mut line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to serialize outbound message");
                return;
            }
        };
        line.push('\n');

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            error!(error = %e, "failed to write to stdout");
            return;
        }
        if let Err(e) = writer.flush().await {
            error!(error = %e, "failed to flush stdout");
        }
    }
}

impl StdioTransport {
    pub fn new(protocol: Arc<Protocol>) -> Self {
        Self { protocol }
    }

    /// Run the read loop until stdin closes or a termination signal arrives.
    /// Cooperative: each line is parsed and fully dispatched before the next
    /// read begins, matching the single-reader scheduling model.
    pub async fn run(&self) -> McpResult<()> {
        let sink = StdoutSink::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| McpError::transport(format!("failed to install SIGINT handler: {e}")))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| McpError::transport(format!("failed to install SIGTERM handler: {e}")))?;

        info!(event = "client_connected", session = STDIO_SESSION_ID);

        loop {
            tokio::select! {
                biased;

                _ = sigint.recv() => {
                    info!("received SIGINT, shutting down");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(line, &sink).await,
                        Ok(None) => {
                            debug!("stdin closed, stopping");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "error reading from stdin");
                            break;
                        }
                    }
                }
            }
        }

        sink.flush().await;
        info!(event = "client_disconnected", session = STDIO_SESSION_ID);
        Ok(())
    }

    async fn handle_line(&self, line: String, sink: &StdoutSink) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                self.protocol.handle_message(value, STDIO_SESSION_ID, sink).await;
            }
            Err(e) => {
                warn!(error = %e, "failed to parse line as JSON");
                if let Ok(frame) = serde_json::to_value(parse_error_response()) {
                    sink.send(STDIO_SESSION_ID, frame).await;
                }
            }
        }
    }
}
