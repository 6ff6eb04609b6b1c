use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{required, run_store, Method};
use crate::protocol::{GetContextParams, RpcError};
use crate::store::{ContextItem, ContextStore};

/// `tools/get_context/invoke`: fetch a full record by id.
///
/// A miss is reported as `-32004`, never as an internal error.
pub struct GetContext {
    store: Arc<ContextStore>,
}

impl GetContext {
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Method for GetContext {
    type Params = GetContextParams;
    type Output = ContextItem;

    async fn call(
        &self,
        params: GetContextParams,
        _cancel: &CancellationToken,
    ) -> Result<ContextItem, RpcError> {
        let id = required(&params.id, "id")?.to_string();
        run_store(&self.store, move |store| store.get(&id)).await
    }
}
