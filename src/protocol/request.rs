use serde::{Deserialize, Deserializer, Serialize};

/// JSON-RPC 2.0 ID, echoed back verbatim.
///
/// Any JSON value is accepted, including an explicit `null`. A request whose
/// `id` member is omitted entirely is a notification and carries `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcId(pub serde_json::Value);

impl RpcId {
    pub fn null() -> Self {
        Self(serde_json::Value::Null)
    }
}

impl From<i64> for RpcId {
    fn from(n: i64) -> Self {
        Self(n.into())
    }
}

impl From<u64> for RpcId {
    fn from(n: u64) -> Self {
        Self(n.into())
    }
}

impl From<&str> for RpcId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

/// JSON-RPC 2.0 request envelope.
///
/// `jsonrpc` and `method` default to empty so that a well-formed object with
/// those members missing is reported as an invalid request, not a parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RpcId>,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: Option<RpcId>, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Maps a present member (even `null`) to `Some`; absence is handled by `default`.
fn present<'de, D>(deserializer: D) -> Result<Option<RpcId>, D::Error>
where
    D: Deserializer<'de>,
{
    RpcId::deserialize(deserializer).map(Some)
}

/// Parameters for `tools/save_context/invoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveContextParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<i64>,
}

/// Parameters for `tools/search_context/invoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchContextParams {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_importance: Option<i64>,
}

/// Parameters for `tools/get_context/invoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetContextParams {
    #[serde(default)]
    pub id: String,
}
