pub mod request;
pub mod response;

pub use request::{
    GetContextParams, JsonRpcRequest, RpcId, SaveContextParams, SearchContextParams,
};
pub use response::{
    JsonRpcResponse, RpcError, SaveContextResult, SearchContextResult, CONTEXT_NOT_FOUND,
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
