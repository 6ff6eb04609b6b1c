use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{required, run_store, Method};
use crate::protocol::{RpcError, SaveContextParams, SaveContextResult};
use crate::store::{ContextItem, ContextStore, DEFAULT_IMPORTANCE};

/// `tools/save_context/invoke`: persist one new context item.
pub struct SaveContext {
    store: Arc<ContextStore>,
}

impl SaveContext {
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Method for SaveContext {
    type Params = SaveContextParams;
    type Output = SaveContextResult;

    async fn call(
        &self,
        params: SaveContextParams,
        _cancel: &CancellationToken,
    ) -> Result<SaveContextResult, RpcError> {
        required(&params.content, "content")?;

        // Content is stored as sent; only the blank check trims.
        let item = ContextItem {
            id: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().timestamp(),
            source: params.source,
            thread_id: params.thread_id,
            role: params.role,
            title: params.title,
            content: params.content,
            tags: params.tags,
            importance: params.importance.unwrap_or(DEFAULT_IMPORTANCE),
        };

        let result = SaveContextResult {
            id: item.id.clone(),
            created_at: item.created_at,
        };
        run_store(&self.store, move |store| store.insert(&item)).await?;
        Ok(result)
    }
}
