mod common;

use binance_usdm::core::kernel::{ConnectionState, StreamConfig, StreamConnection, StreamExit};
use binance_usdm::exchanges::binance_perp::streams::{market_stream_url, names};
use binance_usdm::exchanges::binance_perp::{build_connector, BinancePerpCodec, StreamEvent};
use binance_usdm::{ExchangeConfig, ExchangeError};
use common::{drain, send_then_drain, text, MockWsServer, STEP};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

fn agg_trade(symbol: &str, id: i64) -> Value {
    json!({
        "e": "aggTrade", "E": 1_700_000_000_000_i64, "s": symbol, "a": id,
        "p": "43250.10", "q": "0.002", "f": 100, "l": 101, "T": 1_700_000_000_000_i64, "m": false
    })
}

fn recording_config() -> (StreamConfig, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let config = StreamConfig::default().with_error_hook(move |err: &ExchangeError| {
        sink.lock().unwrap().push(err.to_string());
    });
    (config, seen)
}

async fn open(
    url: &str,
    config: StreamConfig,
    token: &CancellationToken,
) -> (StreamConnection<BinancePerpCodec>, mpsc::Receiver<StreamEvent>) {
    timeout(STEP, StreamConnection::open(url, Arc::new(BinancePerpCodec), config, token))
        .await
        .expect("dial timed out")
        .expect("dial failed")
}

#[tokio::test]
async fn test_scripted_frames_until_error_envelope() {
    let (inbound_tx, mut inbound) = mpsc::unbounded_channel();
    let frames = vec![
        Message::Ping(vec![1, 2, 3]),
        Message::Text("{not json".to_string()),
        text(json!({"e": "mysteryEvent", "E": 1})),
        text(json!({"result": null, "id": 1})),
        text(agg_trade("BTCUSDT", 7)),
        text(json!({"code": -1121, "msg": "Invalid symbol."})),
    ];
    let mut server = MockWsServer::start(move |_, socket| {
        send_then_drain(socket, frames.clone(), inbound_tx.clone())
    })
    .await;

    let (config, seen) = recording_config();
    let token = CancellationToken::new();
    let url = market_stream_url(&server.url, &["btcusdt@aggTrade"]);
    let (connection, mut events) = open(&url, config, &token).await;
    assert_eq!(server.next_path().await, "/ws/btcusdt@aggTrade");

    let first = timeout(STEP, events.recv()).await.unwrap();
    match first {
        Some(StreamEvent::AggTrade(trade)) => {
            assert_eq!(trade.symbol, "BTCUSDT");
            assert_eq!(trade.agg_trade_id, 7);
        }
        other => panic!("expected aggTrade, got {:?}", other),
    }
    assert!(timeout(STEP, events.recv()).await.unwrap().is_none());

    assert_eq!(timeout(STEP, connection.closed()).await.unwrap(), ConnectionState::Failed);
    match timeout(STEP, connection.join()).await.unwrap() {
        StreamExit::Failed(err) => assert_eq!(err.api_code(), Some(-1121)),
        other => panic!("expected failure, got {:?}", other),
    }

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3, "hook calls: {:?}", seen);
    assert!(seen[0].starts_with("Deserialization error"));
    assert!(seen[1].contains("mysteryEvent"));
    assert!(seen[2].contains("-1121"));

    let pong = timeout(STEP, inbound.recv()).await.unwrap();
    assert_eq!(pong, Some(Message::Pong(vec![1, 2, 3])));
}

#[tokio::test]
async fn test_subscribe_sends_control_frame() {
    let (inbound_tx, mut inbound) = mpsc::unbounded_channel();
    let mut server = MockWsServer::start(move |_, socket| drain(socket, inbound_tx.clone())).await;

    let token = CancellationToken::new();
    let empty: [&str; 0] = [];
    let url = market_stream_url(&server.url, &empty);
    let (connection, _events) = open(&url, StreamConfig::default(), &token).await;
    assert_eq!(server.next_path().await, "/ws");

    let first = connection.subscribe(&["btcusdt@aggTrade", "ethusdt@markPrice"]).unwrap();
    let second = connection.unsubscribe(&["ethusdt@markPrice"]).unwrap();
    assert_eq!(second, first + 1);

    let Some(Message::Text(frame)) = timeout(STEP, inbound.recv()).await.unwrap() else {
        panic!("expected a text frame");
    };
    let frame: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(
        frame,
        json!({"method": "SUBSCRIBE", "params": ["btcusdt@aggTrade", "ethusdt@markPrice"], "id": first})
    );

    let Some(Message::Text(frame)) = timeout(STEP, inbound.recv()).await.unwrap() else {
        panic!("expected a text frame");
    };
    let frame: Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(frame["method"], "UNSUBSCRIBE");
    assert_eq!(frame["id"], second);
}

#[tokio::test]
async fn test_cancellation_closes_stream() {
    let (inbound_tx, mut inbound) = mpsc::unbounded_channel();
    let server = MockWsServer::start(move |_, socket| drain(socket, inbound_tx.clone())).await;

    let token = CancellationToken::new();
    let url = market_stream_url(&server.url, &["btcusdt@bookTicker"]);
    let (connection, mut events) = open(&url, StreamConfig::default(), &token).await;
    assert_eq!(connection.state(), ConnectionState::Open);

    token.cancel();
    assert!(timeout(STEP, events.recv()).await.unwrap().is_none());
    assert_eq!(timeout(STEP, connection.closed()).await.unwrap(), ConnectionState::Closed);
    assert!(matches!(
        timeout(STEP, connection.join()).await.unwrap(),
        StreamExit::Cancelled
    ));

    let close = timeout(STEP, inbound.recv()).await.unwrap();
    assert!(matches!(close, Some(Message::Close(_))));
}

#[tokio::test]
async fn test_full_channel_still_cancels_promptly() {
    let (inbound_tx, _inbound) = mpsc::unbounded_channel();
    let frames: Vec<Message> = (1..=50).map(|id| text(agg_trade("BTCUSDT", id))).collect();
    let server = MockWsServer::start(move |_, socket| {
        send_then_drain(socket, frames.clone(), inbound_tx.clone())
    })
    .await;

    let token = CancellationToken::new();
    let url = market_stream_url(&server.url, &["btcusdt@aggTrade"]);
    let config = StreamConfig::default().with_channel_capacity(1);
    let (connection, mut events) = open(&url, config, &token).await;

    match timeout(STEP, events.recv()).await.unwrap() {
        Some(StreamEvent::AggTrade(trade)) => assert_eq!(trade.agg_trade_id, 1),
        other => panic!("expected aggTrade, got {:?}", other),
    }

    // Reader is now parked on a full channel.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    token.cancel();
    assert!(matches!(
        timeout(STEP, connection.join()).await.unwrap(),
        StreamExit::Cancelled
    ));

    let mut last = 1;
    let mut received = 1;
    while let Some(event) = timeout(STEP, events.recv()).await.unwrap() {
        match event {
            StreamEvent::AggTrade(trade) => {
                assert!(trade.agg_trade_id > last);
                last = trade.agg_trade_id;
            }
            other => panic!("unexpected event {}", other.event_type()),
        }
        received += 1;
    }
    assert!(received < 50, "reader kept going after cancel: {}", received);
}

#[tokio::test]
async fn test_cancelled_token_fails_fast() {
    let token = CancellationToken::new();
    token.cancel();
    let result = StreamConnection::open(
        "ws://127.0.0.1:1/ws",
        Arc::new(BinancePerpCodec),
        StreamConfig::default(),
        &token,
    )
    .await;
    assert!(matches!(result, Err(ExchangeError::Cancelled)));
}

#[tokio::test]
async fn test_dial_failure_is_reported() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let token = CancellationToken::new();
    let result = StreamConnection::open(
        &format!("ws://{}/ws", addr),
        Arc::new(BinancePerpCodec),
        StreamConfig::default(),
        &token,
    )
    .await;
    assert!(matches!(result, Err(ExchangeError::WebSocketError(_))));
}

#[tokio::test]
async fn test_remote_close_ends_stream() {
    let (inbound_tx, _inbound) = mpsc::unbounded_channel();
    let server = MockWsServer::start(move |_, socket| {
        send_then_drain(socket, vec![Message::Close(None)], inbound_tx.clone())
    })
    .await;

    let token = CancellationToken::new();
    let url = market_stream_url(&server.url, &["btcusdt@aggTrade"]);
    let (connection, mut events) = open(&url, StreamConfig::default(), &token).await;

    assert!(timeout(STEP, events.recv()).await.unwrap().is_none());
    assert!(matches!(
        timeout(STEP, connection.join()).await.unwrap(),
        StreamExit::RemoteClosed
    ));
}

#[tokio::test]
async fn test_dropped_consumer_stops_reader() {
    // Only push an event once the client has spoken, so the receiver is gone by then.
    let server = MockWsServer::start(|_, mut socket| async move {
        use futures_util::{SinkExt, StreamExt};
        if let Some(Ok(Message::Text(_))) = socket.next().await {
            let _ = socket.send(text(agg_trade("BTCUSDT", 1))).await;
        }
        while let Some(Ok(_)) = socket.next().await {}
    })
    .await;

    let token = CancellationToken::new();
    let url = market_stream_url(&server.url, &["btcusdt@aggTrade"]);
    let (connection, events) = open(&url, StreamConfig::default(), &token).await;
    drop(events);
    connection.subscribe(&["ethusdt@aggTrade"]).unwrap();

    assert!(matches!(
        timeout(STEP, connection.join()).await.unwrap(),
        StreamExit::ConsumerDropped
    ));
}

#[tokio::test]
async fn test_connector_multiplexes_market_streams() {
    let (inbound_tx, _inbound) = mpsc::unbounded_channel();
    let frames = vec![
        text(json!({"stream": "btcusdt@aggTrade", "data": agg_trade("BTCUSDT", 1)})),
        text(json!({
            "stream": "btcusdt@markPrice",
            "data": {
                "e": "markPriceUpdate", "E": 1_562_305_380_000_i64, "s": "BTCUSDT",
                "p": "11794.15000000", "i": "11784.62659091", "P": "11784.25641265",
                "r": "0.00038167", "T": 1_562_306_400_000_i64
            }
        })),
    ];
    let mut server = MockWsServer::start(move |_, socket| {
        send_then_drain(socket, frames.clone(), inbound_tx.clone())
    })
    .await;

    let connector = build_connector(ExchangeConfig::read_only().ws_url(server.url.clone())).unwrap();
    let token = CancellationToken::new();
    let streams = vec![names::agg_trade("BTCUSDT"), names::mark_price("BTCUSDT", false)];
    let (connection, mut events) =
        timeout(STEP, connector.subscribe_market(&streams, &token)).await.unwrap().unwrap();

    assert_eq!(
        server.next_path().await,
        "/stream?streams=btcusdt@aggTrade/btcusdt@markPrice"
    );

    let first = timeout(STEP, events.recv()).await.unwrap().unwrap();
    assert_eq!(first.event_type(), "aggTrade");
    match timeout(STEP, events.recv()).await.unwrap().unwrap() {
        StreamEvent::MarkPriceUpdate(mark) => {
            assert_eq!(mark.symbol, "BTCUSDT");
            assert_eq!(mark.mark_price, "11794.15000000");
        }
        other => panic!("expected mark price, got {:?}", other),
    }

    connection.cancel();
    assert!(matches!(
        timeout(STEP, connection.join()).await.unwrap(),
        StreamExit::Cancelled
    ));
}
