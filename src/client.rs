//! Async client for a `vcontext` server reachable over any byte stream,
//! typically the stdin/stdout pipes of a child process.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::handlers::{GET_CONTEXT, SAVE_CONTEXT, SEARCH_CONTEXT};
use crate::protocol::{
    GetContextParams, JsonRpcRequest, JsonRpcResponse, RpcError, RpcId, SaveContextParams,
    SaveContextResult, SearchContextParams, SearchContextResult,
};
use crate::store::ContextItem;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("stream i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Rpc(#[from] RpcError),
    #[error("connection closed")]
    ConnectionClosed,
}

struct Channel<R, W> {
    reader: R,
    writer: W,
    next_id: u64,
}

/// Request/response client. Calls are serialized; each waits for the
/// response carrying its own id and skips anything else on the stream.
pub struct Client<R, W> {
    channel: Mutex<Channel<R, W>>,
}

impl<R, W> Client<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            channel: Mutex::new(Channel {
                reader,
                writer,
                next_id: 0,
            }),
        }
    }

    pub async fn save_context(
        &self,
        params: SaveContextParams,
    ) -> Result<SaveContextResult, ClientError> {
        self.call(SAVE_CONTEXT, params).await
    }

    pub async fn search_context(
        &self,
        params: SearchContextParams,
    ) -> Result<SearchContextResult, ClientError> {
        self.call(SEARCH_CONTEXT, params).await
    }

    pub async fn get_context(&self, id: impl Into<String>) -> Result<ContextItem, ClientError> {
        self.call(GET_CONTEXT, GetContextParams { id: id.into() }).await
    }

    /// Send `method` with `params` and decode the correlated result.
    pub async fn call<P, T>(&self, method: &str, params: P) -> Result<T, ClientError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let mut channel = self.channel.lock().await;
        channel.next_id += 1;
        let id = RpcId::from(channel.next_id);

        let req = JsonRpcRequest::new(
            Some(id.clone()),
            method,
            Some(serde_json::to_value(params)?),
        );
        let mut payload = serde_json::to_vec(&req)?;
        payload.push(b'\n');
        channel.writer.write_all(&payload).await?;
        channel.writer.flush().await?;

        let mut line = String::new();
        loop {
            line.clear();
            if channel.reader.read_line(&mut line).await? == 0 {
                return Err(ClientError::ConnectionClosed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let resp: JsonRpcResponse = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    debug!("skipping unparseable line: {e}");
                    continue;
                }
            };

            if resp.id.as_ref() != Some(&id) {
                continue;
            }

            if let Some(err) = resp.error {
                return Err(ClientError::Rpc(err));
            }
            let result = resp.result.unwrap_or(serde_json::Value::Null);
            return Ok(serde_json::from_value(result)?);
        }
    }
}
