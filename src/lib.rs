//! Persistent, full-text-searchable context store for tool-calling agents.
//!
//! Exposes `tools/save_context/invoke`, `tools/search_context/invoke`, and
//! `tools/get_context/invoke` over newline-delimited JSON-RPC 2.0 on any byte
//! stream (stdio in the binary), backed by SQLite with an FTS5 index.

pub mod client;
pub mod config;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod store;
