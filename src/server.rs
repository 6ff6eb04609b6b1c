use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::handlers::Handler;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RpcError};

/// Maximum bytes per JSON-RPC message (8 MiB), excluding the newline.
pub const MAX_MESSAGE_BYTES: usize = 8 * 1024 * 1024;

/// Stream-level failures. Any of these ends the session.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("stream i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("message exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },
    #[error("response serialization: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cancelled")]
    Cancelled,
}

/// Method name -> handler. Built once at startup; read-only while serving.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `method` to `handler`, replacing any earlier binding.
    pub fn register<H: Handler + 'static>(&mut self, method: impl Into<String>, handler: H) {
        self.handlers.insert(method.into(), Box::new(handler));
    }

    pub fn get(&self, method: &str) -> Option<&dyn Handler> {
        self.handlers.get(method).map(|h| h.as_ref())
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Newline-delimited JSON-RPC 2.0 engine over an arbitrary byte stream.
///
/// One line is read, dispatched, and answered before the next is read, so
/// responses leave in request order.
pub struct Server {
    registry: Registry,
    max_message_bytes: usize,
}

impl Server {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            max_message_bytes: MAX_MESSAGE_BYTES,
        }
    }

    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.max_message_bytes = limit;
        self
    }

    /// Serve process stdin/stdout until EOF, a stream failure, or cancellation.
    pub async fn serve_stdio(&self, cancel: &CancellationToken) -> Result<(), ServeError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout, cancel).await
    }

    /// Serve one stream to completion.
    ///
    /// Returns `Ok(())` on clean end-of-input. Cancellation is observed while
    /// waiting for input and before each dispatch; a running handler is left
    /// to finish.
    pub async fn serve<R, W>(
        &self,
        mut reader: R,
        mut writer: W,
        cancel: &CancellationToken,
    ) -> Result<(), ServeError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // One extra byte so a line of exactly `max` bytes still fits its newline.
        let limit = self.max_message_bytes as u64 + 1;
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let mut framed = (&mut reader).take(limit);

            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ServeError::Cancelled),
                read = framed.read_until(b'\n', &mut raw) => read?,
            };

            if n == 0 {
                debug!("end of input");
                return Ok(());
            }

            if raw.last() != Some(&b'\n') && n as u64 >= limit {
                warn!(limit = self.max_message_bytes, "oversized message, closing session");
                return Err(ServeError::FrameTooLarge {
                    limit: self.max_message_bytes,
                });
            }

            let response = match std::str::from_utf8(&raw) {
                Ok(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if cancel.is_cancelled() {
                        return Err(ServeError::Cancelled);
                    }
                    self.handle_line(trimmed, cancel).await
                }
                Err(_) => {
                    warn!("message is not valid UTF-8");
                    Some(JsonRpcResponse::error(None, RpcError::parse_error()))
                }
            };

            if let Some(resp) = response {
                write_response(&mut writer, &resp).await?;
            }
        }
    }

    /// Decode and dispatch a single message. `None` means nothing is written.
    ///
    /// Only a JSON object is an envelope; arrays and scalars are parse errors
    /// rather than positional requests.
    pub async fn handle_line(
        &self,
        line: &str,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let req = match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) if value.is_object() => serde_json::from_value::<JsonRpcRequest>(value),
            Ok(_) => {
                warn!("parse error: message is not a JSON object");
                return Some(JsonRpcResponse::error(None, RpcError::parse_error()));
            }
            Err(e) => Err(e),
        };
        match req {
            Ok(req) => self.dispatch(req, cancel).await,
            Err(e) => {
                warn!("parse error: {e}");
                Some(JsonRpcResponse::error(None, RpcError::parse_error()))
            }
        }
    }

    /// Dispatch a decoded request to its handler.
    pub async fn dispatch(
        &self,
        req: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        if req.jsonrpc != "2.0" || req.method.is_empty() {
            warn!(method = %req.method, "invalid request envelope");
            return Some(JsonRpcResponse::error(req.id, RpcError::invalid_request()));
        }

        let Some(handler) = self.registry.get(&req.method) else {
            if req.is_notification() {
                debug!(method = %req.method, "dropping notification for unknown method");
                return None;
            }
            return Some(JsonRpcResponse::error(req.id, RpcError::method_not_found()));
        };

        debug!(method = %req.method, notification = req.is_notification(), "dispatch");
        let outcome = handler.handle(req.params, cancel).await;

        // Notifications run for their side effect only.
        let id = req.id?;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(err) => {
                debug!(method = %req.method, code = err.code, "request failed: {}", err.message);
                JsonRpcResponse::error(Some(id), err)
            }
        })
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    resp: &JsonRpcResponse,
) -> Result<(), ServeError> {
    let out = serde_json::to_string(resp)?;
    writer.write_all(out.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
