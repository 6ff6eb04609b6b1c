pub mod discovery;
pub mod get_context;
pub mod save_context;
pub mod search_context;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::protocol::RpcError;
use crate::server::Registry;
use crate::store::{ContextStore, StoreError};

pub const SAVE_CONTEXT: &str = "tools/save_context/invoke";
pub const SEARCH_CONTEXT: &str = "tools/search_context/invoke";
pub const GET_CONTEXT: &str = "tools/get_context/invoke";

/// A typed RPC method: decoded params in, serializable result out.
#[async_trait]
pub trait Method: Send + Sync {
    type Params: DeserializeOwned + Send;
    type Output: Serialize;

    /// Whether a missing or `null` params payload is acceptable.
    const PARAMS_OPTIONAL: bool = false;

    async fn call(
        &self,
        params: Self::Params,
        cancel: &CancellationToken,
    ) -> Result<Self::Output, RpcError>;
}

/// Type-erased handler stored in the [`Registry`].
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        params: Option<serde_json::Value>,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, RpcError>;
}

#[async_trait]
impl<M> Handler for M
where
    M: Method,
    M::Params: Default,
{
    async fn handle(
        &self,
        params: Option<serde_json::Value>,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, RpcError> {
        let params = if M::PARAMS_OPTIONAL && is_blank(params.as_ref()) {
            M::Params::default()
        } else {
            decode_params(params)?
        };
        let output = self.call(params, cancel).await?;
        serde_json::to_value(output).map_err(|e| {
            error!("result serialization failed: {e}");
            RpcError::internal_error(e.to_string())
        })
    }
}

/// Decode a params payload, rejecting absent/`null` payloads up front.
///
/// Params must be a JSON object; arrays would otherwise fill struct fields
/// by position.
pub fn decode_params<T: DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<T, RpcError> {
    match params {
        Some(v) if v.is_object() => {
            serde_json::from_value(v).map_err(|_| RpcError::invalid_params("invalid params"))
        }
        Some(v) if !v.is_null() => Err(RpcError::invalid_params("invalid params")),
        _ => Err(RpcError::invalid_params("params are required")),
    }
}

fn is_blank(params: Option<&serde_json::Value>) -> bool {
    params.map_or(true, serde_json::Value::is_null)
}

/// Run a blocking store call off the async reader and map its errors.
///
/// The caller awaits the result, so dispatch stays sequential.
pub(crate) async fn run_store<T, F>(store: &Arc<ContextStore>, f: F) -> Result<T, RpcError>
where
    T: Send + 'static,
    F: FnOnce(&ContextStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || f(store.as_ref())).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(StoreError::NotFound)) => Err(RpcError::not_found()),
        Ok(Err(e)) => {
            error!("store operation failed: {e}");
            Err(RpcError::internal_error(e.to_string()))
        }
        Err(join_err) => {
            error!("store task join error: {join_err}");
            Err(RpcError::internal_error("store task failed"))
        }
    }
}

/// Trimmed value of a required string field, or invalid-params naming it.
pub(crate) fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, RpcError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RpcError::invalid_params(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Build the method table served by the binary.
pub fn registry(store: Arc<ContextStore>) -> Registry {
    let mut registry = Registry::new();
    registry.register(
        SAVE_CONTEXT,
        save_context::SaveContext::new(Arc::clone(&store)),
    );
    registry.register(
        SEARCH_CONTEXT,
        search_context::SearchContext::new(Arc::clone(&store)),
    );
    registry.register(GET_CONTEXT, get_context::GetContext::new(store));
    registry.register("initialize", discovery::Initialize);
    registry.register("ping", discovery::Ping);
    registry.register("tools/list", discovery::ToolsList);
    registry
}
