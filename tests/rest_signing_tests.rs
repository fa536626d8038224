use binance_usdm::core::kernel::{
    hmac_sha256_hex, HmacSigner, Host, ParamOrder, Params, ReqwestRest, RestClient,
    RestClientBuilder, RestClientConfig, API_KEY_HEADER,
};
use binance_usdm::core::types::OrderSide;
use binance_usdm::exchanges::binance_perp::{
    build_rest_client, ApiVersion, BinancePerpRestClient, ListenKeySource, NewOrderRequest,
};
use binance_usdm::{ExchangeConfig, ExchangeError};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const API_KEY: &str = "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A";
const SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

fn signed_client(server: &MockServer) -> BinancePerpRestClient<ReqwestRest> {
    let config =
        ExchangeConfig::new(API_KEY.to_string(), SECRET.to_string()).base_url(server.uri());
    build_rest_client(&config).unwrap()
}

fn public_client(server: &MockServer) -> BinancePerpRestClient<ReqwestRest> {
    build_rest_client(&ExchangeConfig::read_only().base_url(server.uri())).unwrap()
}

fn assert_signed(request: &Request) -> String {
    assert_eq!(
        request.headers.get(API_KEY_HEADER).unwrap().to_str().unwrap(),
        API_KEY
    );
    let query = request.url.query().unwrap();
    let (payload, signature) = query.split_once("&signature=").unwrap();
    assert!(payload.contains("recvWindow=5000&timestamp="), "unsigned query: {}", query);
    assert_eq!(
        signature,
        hmac_sha256_hex(SECRET.as_bytes(), payload).unwrap()
    );
    payload.to_string()
}

async fn only_request(server: &MockServer) -> Request {
    let mut requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

fn order_response() -> serde_json::Value {
    json!({
        "clientOrderId": "testOrder", "cumQty": "0", "cumQuote": "0", "executedQty": "0",
        "orderId": 22_542_179, "avgPrice": "0.00000", "origQty": "0.002", "price": "43000",
        "reduceOnly": false, "side": "BUY", "status": "NEW", "stopPrice": "0",
        "closePosition": false, "symbol": "BTCUSDT", "timeInForce": "GTC", "type": "LIMIT",
        "origType": "LIMIT", "updateTime": 1_566_818_724_722_i64, "priceProtect": false
    })
}

#[tokio::test]
async fn test_signature_covers_exact_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v3/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let balances = client.account_balance(ApiVersion::V3).await.unwrap();
    assert!(balances.is_empty());

    let request = only_request(&server).await;
    assert_eq!(
        request.headers.get(API_KEY_HEADER).unwrap().to_str().unwrap(),
        API_KEY
    );

    let query = request.url.query().unwrap();
    let (payload, signature) = query.split_once("&signature=").unwrap();
    assert!(payload.starts_with("recvWindow=5000&timestamp="));
    assert_eq!(
        signature,
        hmac_sha256_hex(SECRET.as_bytes(), payload).unwrap()
    );
}

#[tokio::test]
async fn test_new_order_keeps_parameter_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_response()))
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let order = NewOrderRequest::limit("BTCUSDT", OrderSide::Buy, "0.002", "43000");
    let response = client.new_order(&order).await.unwrap();
    assert_eq!(response.order_id, 22_542_179);
    assert_eq!(response.client_order_id, "testOrder");

    let request = only_request(&server).await;
    let query = request.url.query().unwrap();
    assert!(
        query.starts_with(
            "symbol=BTCUSDT&side=BUY&type=LIMIT&timeInForce=GTC&quantity=0.002&price=43000\
             &recvWindow=5000&timestamp="
        ),
        "unexpected query: {}",
        query
    );
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_timestamp_rejection_resyncs_clock_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": -1021,
            "msg": "Timestamp for this request is outside of the recvWindow."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ahead_ms = 3_600_000;
    let server_time = chrono::Utc::now().timestamp_millis() + ahead_ms;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serverTime": server_time})))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_client(&server);
    assert_eq!(client.inner().clock().offset_ms(), 0);

    let order = NewOrderRequest::market("BTCUSDT", OrderSide::Sell, "0.002");
    let err = client.new_order(&order).await.unwrap_err();
    assert!(err.is_timestamp_skew());

    let offset = client.inner().clock().offset_ms();
    assert!(
        (ahead_ms - 60_000..=ahead_ms + 60_000).contains(&offset),
        "offset {} not near {}",
        offset,
        ahead_ms
    );
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v2/ticker/price"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -1121, "msg": "Invalid symbol."})),
        )
        .mount(&server)
        .await;

    let client = public_client(&server);
    match client.ticker_price("NOPE").await {
        Err(ExchangeError::ApiError { code, message }) => {
            assert_eq!(code, -1121);
            assert_eq!(message, "Invalid symbol.");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_failure_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/ping"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = public_client(&server).ping().await.unwrap_err();
    assert_eq!(err.api_code(), Some(502));
}

#[tokio::test]
async fn test_signed_call_without_credentials_is_refused() {
    let server = MockServer::start().await;

    let err = public_client(&server)
        .account_balance(ApiVersion::V2)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::AuthenticationRequired));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_public_call_is_not_signed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/depth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lastUpdateId": 1_027_024, "E": 1_589_436_922_972_i64, "T": 1_589_436_922_959_i64,
            "bids": [["4.00000000", "431.00000000"]],
            "asks": [["4.00000200", "12.00000000"]]
        })))
        .mount(&server)
        .await;

    let book = signed_client(&server).order_book("BTCUSDT", 0).await.unwrap();
    assert_eq!(book.last_update_id, 1_027_024);
    assert_eq!(book.bids[0][0], "4.00000000");

    let request = only_request(&server).await;
    assert_eq!(request.url.query(), Some("symbol=BTCUSDT"));
}

#[tokio::test]
async fn test_listen_key_calls_are_signed() {
    let server = MockServer::start().await;
    let key = "pqia91ma19a5s61cv6a81va65sdf19v8a65a1a5s61cv6a81va65sdf19v8a65a1";
    for verb in ["POST", "PUT"] {
        Mock::given(method(verb))
            .and(path("/fapi/v1/listenKey"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"listenKey": key})))
            .mount(&server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path("/fapi/v1/listenKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = signed_client(&server);
    assert_eq!(client.create_listen_key().await.unwrap(), key);
    assert_eq!(client.keepalive_listen_key().await.unwrap(), key);
    client.close_listen_key().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let verbs: Vec<String> = requests.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(verbs, ["POST", "PUT", "DELETE"]);
    for request in &requests {
        let payload = assert_signed(request);
        assert!(payload.starts_with("recvWindow=5000&timestamp="));
    }
}

#[tokio::test]
async fn test_listen_key_requires_credentials() {
    let server = MockServer::start().await;
    let client = public_client(&server);

    let err = client.create_listen_key().await.unwrap_err();
    assert!(matches!(err, ExchangeError::AuthenticationRequired));
    let err = client.keepalive_listen_key().await.unwrap_err();
    assert!(matches!(err, ExchangeError::AuthenticationRequired));
    let err = client.close_listen_key().await.unwrap_err();
    assert!(matches!(err, ExchangeError::AuthenticationRequired));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signature_covers_escaped_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let signer = Arc::new(HmacSigner::new(
        API_KEY.to_string(),
        SECRET.to_string(),
        ParamOrder::AsSupplied,
    ));
    let rest = RestClientBuilder::new(RestClientConfig::new(
        server.uri(),
        "binance_perp".to_string(),
    ))
    .with_signer(signer)
    .build()
    .unwrap();

    let cases = [
        Params::new(),
        Params::new().with("symbol", "BTCUSDT"),
        Params::new()
            .with("a&b", "x=y z")
            .with("u", "héllo€中")
            .with("plain", 1),
    ];
    for params in cases {
        rest.request(
            reqwest::Method::GET,
            Host::Futures,
            "/fapi/v1/echo",
            params,
            true,
        )
        .await
        .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let payloads: Vec<String> = requests.iter().map(assert_signed).collect();

    assert!(payloads[0].starts_with("recvWindow=5000&timestamp="));
    assert!(payloads[1].starts_with("symbol=BTCUSDT&recvWindow=5000&timestamp="));
    assert!(
        payloads[2].starts_with(
            "a%26b=x%3Dy%20z&u=h%C3%A9llo%E2%82%AC%E4%B8%AD&plain=1&recvWindow=5000&timestamp="
        ),
        "unexpected payload: {}",
        payloads[2]
    );
}

#[tokio::test]
async fn test_oversized_batch_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = signed_client(&server);

    let orders: Vec<NewOrderRequest> = (0..6)
        .map(|_| NewOrderRequest::market("BTCUSDT", OrderSide::Buy, "0.001"))
        .collect();
    let err = client.place_batch_orders(&orders).await.unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidParameters(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
