use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::routing::post;
use axum::{Json, Router};
use futures::future::BoxFuture;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use wallet_check::address::Address;
use wallet_check::chain::{
    ActivitySnapshot, ActivitySource, ChainFetcher, Endpoint, RpcClient, Stablecoin,
};
use wallet_check::error::{EndpointError, FetchError};
use wallet_check::output::Labels;
use wallet_check::scoring::ScoringConfig;
use wallet_check::server::{router, AppState};

const OWNER: &str = "0x1db87acbd835b4c905652d100c2dc65bde18fc36";

/// Hands out the same canned snapshot (or failure) for every address.
struct Canned {
    snapshot: Result<ActivitySnapshot, FetchError>,
    calls: AtomicUsize,
}

impl Canned {
    fn ok(snapshot: ActivitySnapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Ok(snapshot),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            snapshot: Err(FetchError::Exhausted {
                operation: "eth_getTransactionCount".to_string(),
                attempts: 3,
                last: EndpointError::Status(503),
            }),
            calls: AtomicUsize::new(0),
        })
    }
}

impl ActivitySource for Canned {
    fn snapshot<'a>(
        &'a self,
        _address: &'a Address,
    ) -> BoxFuture<'a, Result<ActivitySnapshot, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.snapshot.clone();
        Box::pin(async move { result })
    }
}

fn app(source: Arc<dyn ActivitySource>) -> Router {
    router(AppState::new(source, ScoringConfig::default(), Labels::default()))
}

fn with_tx_count(tx_count: u64) -> ActivitySnapshot {
    ActivitySnapshot {
        tx_count,
        ..Default::default()
    }
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, http::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, Method::GET, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn assert_cors(headers: &http::HeaderMap) {
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
}

#[tokio::test]
async fn missing_address_is_rejected() {
    let source = Canned::ok(with_tx_count(100));
    let (status, body) = get_json(app(source.clone()), "/check-wallet").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Address required" }));

    let (status, body) = get_json(app(source.clone()), "/check-wallet?address=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Address required");

    // Rejected before any upstream work
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_address_is_rejected() {
    let source = Canned::ok(with_tx_count(100));
    for bad in ["0x1234", "0xzzzz87acbd835b4c905652d100c2dc65bde18fc36", "hello"] {
        let uri = format!("/check-wallet?address={}", bad);
        let (status, body) = get_json(app(source.clone()), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
        assert_eq!(body, json!({ "error": "Invalid address format" }));
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_activity_wallet() {
    let uri = "/check-wallet?address=0x0000000000000000000000000000000000000000";
    let (status, body) = get_json(app(Canned::ok(ActivitySnapshot::default())), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "0x0000000000000000000000000000000000000000");
    assert_eq!(body["stats"]["totalTransactions"], 0);
    assert_eq!(body["stats"]["daysActive"], 0);
    assert_eq!(body["stats"]["ethVolume"], "0.0000");
    assert_eq!(body["allocation"]["tokens"], "0");
    assert_eq!(body["allocation"]["points"], "0.00");
}

#[tokio::test]
async fn hundred_transactions_scored() {
    let uri = format!("/check-wallet?address={}", OWNER);
    let (status, body) = get_json(app(Canned::ok(with_tx_count(100))), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "address": OWNER,
            "stats": {
                "totalTransactions": 100,
                "ethTransactions": 100,
                "usdcTransactions": 30,
                "ethVolume": "1.5000",
                "usdcVolume": "0.00",
                "contractsDeployed": 0,
                "daysActive": 67,
                "currentBalance": "0.0000",
            },
            "allocation": {
                "tokens": "6,912,500",
                "points": "276.50",
            },
            "summary": "100 transactions • 1.50 ETH • 0.00 USDC • 0 contracts • 67 days active",
        })
    );
}

#[tokio::test]
async fn address_without_prefix_is_normalized() {
    let uri = "/check-wallet?address=1db87acbd835b4c905652d100c2dc65bde18fc36";
    let (status, body) = get_json(app(Canned::ok(with_tx_count(1))), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], OWNER);
}

#[tokio::test]
async fn upstream_failure_is_500() {
    let uri = format!("/check-wallet?address={}", OWNER);
    let (status, headers, body) = send(app(Canned::failing()), Method::GET, &uri).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Unable to fetch blockchain data");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("eth_getTransactionCount"));
    assert!(body.get("allocation").is_none());
}

#[tokio::test]
async fn preflight_returns_cors_headers() {
    let uris = vec![
        "/check-wallet".to_string(),
        format!("/check-wallet?address={}", OWNER),
    ];
    for uri in &uris {
        let source = Canned::ok(with_tx_count(100));
        let (status, headers, body) = send(app(source.clone()), Method::OPTIONS, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_cors(&headers);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn every_response_carries_cors_headers() {
    let source = Canned::ok(with_tx_count(5));
    let (_, headers, _) = send(app(source.clone()), Method::GET, "/check-wallet?address=bad").await;
    assert_cors(&headers);

    let uri = format!("/check-wallet?address={}", OWNER);
    let (_, headers, _) = send(app(source), Method::GET, &uri).await;
    assert_cors(&headers);
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let source = Canned::ok(with_tx_count(42));
    let uri = format!("/check-wallet?address={}", OWNER);
    let (_, _, first) = send(app(source.clone()), Method::GET, &uri).await;
    let (_, _, second) = send(app(source), Method::GET, &uri).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn health_check() {
    let (status, body) = get_json(app(Canned::ok(ActivitySnapshot::default())), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

#[tokio::test]
async fn fails_over_to_healthy_node() {
    let down = spawn_stub(Router::new().route(
        "/",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    ))
    .await;
    let healthy = spawn_stub(Router::new().route(
        "/",
        post(|Json(req): Json<Value>| async move {
            let result = match req["method"].as_str().unwrap_or_default() {
                "eth_getTransactionCount" => "0x64",
                "eth_getBalance" => "0xde0b6b3a7640000", // 1 ETH
                "eth_getCode" => "0x",
                _ => "0x0",
            };
            Json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
        }),
    ))
    .await;

    let rpc = RpcClient::new(
        vec![Endpoint::parse(&down).unwrap(), Endpoint::parse(&healthy).unwrap()],
        Duration::from_secs(5),
    )
    .unwrap();
    let stablecoin = Stablecoin {
        contract: Address::parse("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap(),
        decimals: 6,
    };
    let fetcher = ChainFetcher::new(rpc, None, Some(stablecoin));

    let uri = format!("/check-wallet?address={}", OWNER);
    let (status, body) = get_json(app(Arc::new(fetcher)), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["totalTransactions"], 100);
    assert_eq!(body["stats"]["currentBalance"], "1.0000");
    assert_eq!(body["allocation"]["tokens"], "6,912,500");
}

#[tokio::test]
async fn every_node_failing_is_500() {
    let down = spawn_stub(Router::new().route(
        "/",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    ))
    .await;
    let broken = spawn_stub(Router::new().route(
        "/",
        post(|| async {
            Json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32005, "message": "limit exceeded" }
            }))
        }),
    ))
    .await;

    let rpc = RpcClient::new(
        vec![Endpoint::parse(&down).unwrap(), Endpoint::parse(&broken).unwrap()],
        Duration::from_secs(5),
    )
    .unwrap();
    let fetcher = ChainFetcher::new(rpc, None, None);

    let uri = format!("/check-wallet?address={}", OWNER);
    let (status, headers, body) = send(app(Arc::new(fetcher)), Method::GET, &uri).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Unable to fetch blockchain data");
    let details = body["details"].as_str().unwrap();
    // Names the failed operation and the last endpoint's error, never the URLs
    assert!(details.contains("failed on all 2 endpoints"));
    assert!(details.contains("limit exceeded"));
    assert!(!details.contains("127.0.0.1"));
    assert!(body.get("stats").is_none());
}
