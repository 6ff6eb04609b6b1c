//! End-to-end: a `Client` driving a `Server` over an in-memory duplex pipe.

use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio_util::sync::CancellationToken;

use vcontext::client::{Client, ClientError};
use vcontext::handlers;
use vcontext::protocol::{SaveContextParams, SearchContextParams, CONTEXT_NOT_FOUND};
use vcontext::server::Server;
use vcontext::store::ContextStore;

type TestClient = Client<BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>>;

fn start() -> (TestClient, CancellationToken) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let store = Arc::new(ContextStore::open_in_memory().unwrap());
    let server = Server::new(handlers::registry(store));
    let cancel = CancellationToken::new();

    let serve_cancel = cancel.clone();
    tokio::spawn(async move {
        let (read_half, write_half) = tokio::io::split(server_io);
        let _ = server
            .serve(BufReader::new(read_half), write_half, &serve_cancel)
            .await;
    });

    let (read_half, write_half) = tokio::io::split(client_io);
    (Client::new(BufReader::new(read_half), write_half), cancel)
}

#[tokio::test]
async fn save_search_get_round_trip() {
    let (client, cancel) = start();

    let saved = client
        .save_context(SaveContextParams {
            content: "deploy service X to cluster".into(),
            tags: Some(vec!["a".into(), "b".into()]),
            importance: Some(5),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!saved.id.is_empty());

    let found = client
        .search_context(SearchContextParams {
            query: "deploy cluster".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].id, saved.id);
    assert!(!found.items[0].snippet.is_empty());

    let item = client.get_context(&saved.id).await.unwrap();
    assert_eq!(item.content, "deploy service X to cluster");
    assert_eq!(item.tags, Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(item.importance, 5);
    assert_eq!(item.created_at, saved.created_at);

    cancel.cancel();
}

#[tokio::test]
async fn server_errors_surface_as_rpc_errors() {
    let (client, cancel) = start();
    let err = client.get_context("never-saved").await.unwrap_err();
    match err {
        ClientError::Rpc(rpc) => assert_eq!(rpc.code, CONTEXT_NOT_FOUND),
        other => panic!("expected rpc error, got {other:?}"),
    }
    cancel.cancel();
}

#[tokio::test]
async fn stream_end_is_connection_closed() {
    let (client_io, server_io) = tokio::io::duplex(1024);
    drop(server_io);
    let (read_half, write_half) = tokio::io::split(client_io);
    let client = Client::new(BufReader::new(read_half), write_half);

    let err = client.get_context("anything").await.unwrap_err();
    assert!(
        matches!(err, ClientError::ConnectionClosed | ClientError::Io(_)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn uncorrelated_lines_are_skipped() {
    let (client_io, mut server_io) = tokio::io::duplex(4 * 1024);

    // Pre-load noise ahead of the real answer for request id 1.
    server_io
        .write_all(
            b"\nnot json\n{\"jsonrpc\":\"2.0\",\"id\":99,\"result\":{}}\n\
              {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"id\":\"abc\",\"created_at\":7}}\n",
        )
        .await
        .unwrap();

    let (read_half, write_half) = tokio::io::split(client_io);
    let client = Client::new(BufReader::new(read_half), write_half);

    let saved = client
        .save_context(SaveContextParams {
            content: "ignored by fake server".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(saved.id, "abc");
    assert_eq!(saved.created_at, 7);
}
