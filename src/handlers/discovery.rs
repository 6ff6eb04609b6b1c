use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::{Method, GET_CONTEXT, SAVE_CONTEXT, SEARCH_CONTEXT};
use crate::protocol::RpcError;

/// `initialize`: capability handshake. Tool methods do not require it.
pub struct Initialize;

#[async_trait]
impl Method for Initialize {
    type Params = Value;
    type Output = Value;
    const PARAMS_OPTIONAL: bool = true;

    async fn call(&self, _params: Value, _cancel: &CancellationToken) -> Result<Value, RpcError> {
        Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "vcontext",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }
}

/// `ping`: liveness.
pub struct Ping;

#[async_trait]
impl Method for Ping {
    type Params = Value;
    type Output = Value;
    const PARAMS_OPTIONAL: bool = true;

    async fn call(&self, _params: Value, _cancel: &CancellationToken) -> Result<Value, RpcError> {
        Ok(json!({}))
    }
}

/// `tools/list`: advertise the three context tools and their input shapes.
pub struct ToolsList;

#[async_trait]
impl Method for ToolsList {
    type Params = Value;
    type Output = Value;
    const PARAMS_OPTIONAL: bool = true;

    async fn call(&self, _params: Value, _cancel: &CancellationToken) -> Result<Value, RpcError> {
        Ok(json!({ "tools": tool_descriptors() }))
    }
}

fn tool_descriptors() -> Value {
    json!([
        {
            "name": SAVE_CONTEXT,
            "description": "Save a context item for later retrieval",
            "inputSchema": {
                "type": "object",
                "required": ["content"],
                "properties": {
                    "source": { "type": "string" },
                    "thread_id": { "type": "string" },
                    "role": { "type": "string" },
                    "title": { "type": "string" },
                    "content": {
                        "type": "string",
                        "description": "Text body; must not be blank",
                        "minLength": 1
                    },
                    "tags": { "type": "array", "items": { "type": "string" } },
                    "importance": {
                        "type": "integer",
                        "description": "Priority, defaults to 3"
                    }
                }
            }
        },
        {
            "name": SEARCH_CONTEXT,
            "description": "Full-text search over saved context, best match first",
            "inputSchema": {
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "FTS5 match expression",
                        "minLength": 1
                    },
                    "top_k": {
                        "type": "integer",
                        "description": "Maximum results, clamped to 1..=50, defaults to 5"
                    },
                    "thread_id": { "type": "string" },
                    "min_importance": {
                        "type": "integer",
                        "description": "Minimum importance, at least 1"
                    }
                }
            }
        },
        {
            "name": GET_CONTEXT,
            "description": "Fetch a saved context item by id",
            "inputSchema": {
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "string", "minLength": 1 }
                }
            }
        }
    ])
}
