#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Client against a real gateway server bound on an ephemeral port

use std::net::SocketAddr;
use std::sync::Arc;

use add::{AddHttpClient, GatewayConfig, GatewayState, Service, router};
use add_sdk::{AddError, AddService, RequestCtx};
use tokio::net::TcpListener;

async fn spawn_server(config: GatewayConfig) -> SocketAddr {
    let state = GatewayState::build(
        Arc::new(Service::new(config.max_concat_len)),
        &config,
    )
    .unwrap();
    let app = router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn sum_round_trip() {
    let addr = spawn_server(GatewayConfig::default()).await;
    let client = AddHttpClient::new(&addr.to_string()).unwrap();

    let res = client.sum(&RequestCtx::new(), 40, 2).await.unwrap();
    assert_eq!(res, 42);
}

#[tokio::test]
async fn concat_round_trip() {
    let addr = spawn_server(GatewayConfig::default()).await;
    let client = AddHttpClient::new(&format!("http://{addr}")).unwrap();

    let res = client.concat(&RequestCtx::new(), "foo", "bar").await.unwrap();
    assert_eq!(res, "foobar");
}

#[tokio::test]
async fn domain_error_comes_back_as_domain_error() {
    let addr = spawn_server(GatewayConfig {
        max_concat_len: 4,
        ..GatewayConfig::default()
    })
    .await;
    let client = AddHttpClient::new(&addr.to_string()).unwrap();

    let err = client
        .concat(&RequestCtx::new(), "foo", "bar")
        .await
        .unwrap_err();
    match err {
        AddError::Domain(e) => {
            assert_eq!(e.message(), "result exceeds maximum size");
            assert_eq!(e.errors().len(), 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn token_is_forwarded() {
    let addr = spawn_server(GatewayConfig {
        require_token: true,
        ..GatewayConfig::default()
    })
    .await;
    let client = AddHttpClient::new(&addr.to_string()).unwrap();

    let err = client.sum(&RequestCtx::new(), 1, 2).await.unwrap_err();
    assert!(
        matches!(err, AddError::Domain(ref e) if e.message() == "token up for parsing was not passed through the context")
    );

    let ctx = RequestCtx::new().with_bearer_token("abc");
    assert_eq!(client.sum(&ctx, 1, 2).await.unwrap(), 3);
}

#[tokio::test]
async fn unreachable_instance_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = AddHttpClient::new(&addr.to_string()).unwrap();

    let err = client.sum(&RequestCtx::new(), 1, 2).await.unwrap_err();
    assert!(matches!(err, AddError::Transport(_)));
}
