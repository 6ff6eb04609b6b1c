use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{required, run_store, Method};
use crate::protocol::{RpcError, SearchContextParams, SearchContextResult};
use crate::store::{ContextStore, SearchQuery};

const DEFAULT_TOP_K: i64 = 5;
const MAX_TOP_K: i64 = 50;
const DEFAULT_MIN_IMPORTANCE: i64 = 1;

/// `tools/search_context/invoke`: ranked full-text search.
pub struct SearchContext {
    store: Arc<ContextStore>,
}

impl SearchContext {
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Method for SearchContext {
    type Params = SearchContextParams;
    type Output = SearchContextResult;

    async fn call(
        &self,
        params: SearchContextParams,
        _cancel: &CancellationToken,
    ) -> Result<SearchContextResult, RpcError> {
        let query = required(&params.query, "query")?.to_string();

        let mut search = SearchQuery::new(query)
            .top_k(effective_top_k(params.top_k))
            .min_importance(effective_min_importance(params.min_importance));
        search.thread_id = params.thread_id;

        let items = run_store(&self.store, move |store| store.search(&search)).await?;
        Ok(SearchContextResult { items })
    }
}

/// Default 5, then clamp into `[1, 50]`.
fn effective_top_k(requested: Option<i64>) -> usize {
    requested.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K) as usize
}

/// Default 1; anything below 1 is raised to 1. No upper bound.
fn effective_min_importance(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_MIN_IMPORTANCE)
        .max(DEFAULT_MIN_IMPORTANCE)
}
