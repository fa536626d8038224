use crate::core::errors::ExchangeError;
use crate::core::kernel::WsCodec;
use crate::exchanges::binance_perp::events::{
    AccountConfigUpdateEvent, AccountUpdateEvent, AggTradeEvent, AssetIndexEvent,
    BookTickerEvent, CompositeIndexEvent, ConditionalOrderRejectEvent, ContractInfoEvent,
    DepthUpdateEvent, ForceOrderEvent, GridUpdateEvent, KlineEvent, ListenKeyExpiredEvent,
    MarginCallEvent, MarkPriceEvent, MiniTickerEvent, OrderTradeUpdateEvent,
    StrategyUpdateEvent, TickerEvent, TradeLiteEvent,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

/// Every event the futures streams can deliver, keyed by the `"e"` field.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    AggTrade(AggTradeEvent),
    MarkPriceUpdate(MarkPriceEvent),
    /// Both `kline` and `continuous_kline`.
    Kline(KlineEvent),
    MiniTicker(MiniTickerEvent),
    Ticker(TickerEvent),
    BookTicker(BookTickerEvent),
    ForceOrder(ForceOrderEvent),
    DepthUpdate(DepthUpdateEvent),
    CompositeIndex(CompositeIndexEvent),
    ContractInfo(ContractInfoEvent),
    AssetIndexUpdate(AssetIndexEvent),
    AccountUpdate(AccountUpdateEvent),
    MarginCall(MarginCallEvent),
    OrderTradeUpdate(OrderTradeUpdateEvent),
    TradeLite(TradeLiteEvent),
    AccountConfigUpdate(AccountConfigUpdateEvent),
    StrategyUpdate(StrategyUpdateEvent),
    GridUpdate(GridUpdateEvent),
    ConditionalOrderTriggerReject(ConditionalOrderRejectEvent),
    ListenKeyExpired(ListenKeyExpiredEvent),
}

impl StreamEvent {
    /// Wire discriminator of the event.
    pub fn event_type(&self) -> &str {
        match self {
            Self::AggTrade(e) => &e.event_type,
            Self::MarkPriceUpdate(e) => &e.event_type,
            Self::Kline(e) => &e.event_type,
            Self::MiniTicker(e) => &e.event_type,
            Self::Ticker(e) => &e.event_type,
            Self::BookTicker(e) => &e.event_type,
            Self::ForceOrder(e) => &e.event_type,
            Self::DepthUpdate(e) => &e.event_type,
            Self::CompositeIndex(e) => &e.event_type,
            Self::ContractInfo(e) => &e.event_type,
            Self::AssetIndexUpdate(e) => &e.event_type,
            Self::AccountUpdate(e) => &e.event_type,
            Self::MarginCall(e) => &e.event_type,
            Self::OrderTradeUpdate(e) => &e.event_type,
            Self::TradeLite(e) => &e.event_type,
            Self::AccountConfigUpdate(e) => &e.event_type,
            Self::StrategyUpdate(e) => &e.event_type,
            Self::GridUpdate(e) => &e.event_type,
            Self::ConditionalOrderTriggerReject(e) => &e.event_type,
            Self::ListenKeyExpired(e) => &e.event_type,
        }
    }
}

/// Stream dialect of the futures WebSocket API.
///
/// Accepts raw single-stream payloads and the `{"stream": .., "data": ..}` envelope used
/// by combined streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinancePerpCodec;

impl BinancePerpCodec {
    fn control_frame(
        method: &str,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Message {
        let params: Vec<&str> = streams.iter().map(|s| s.as_ref()).collect();
        let frame = json!({
            "method": method,
            "params": params,
            "id": id,
        });
        Message::Text(frame.to_string())
    }

    /// Classify an event object by its `"e"` field.
    pub fn classify(payload: Value) -> Result<StreamEvent, ExchangeError> {
        let event_type = payload
            .get("e")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExchangeError::MalformedFrame(format!("event without type field: {}", payload))
            })?
            .to_string();

        let event = match event_type.as_str() {
            "aggTrade" => StreamEvent::AggTrade(decode(&event_type, payload)?),
            "markPriceUpdate" => StreamEvent::MarkPriceUpdate(decode(&event_type, payload)?),
            "kline" | "continuous_kline" => StreamEvent::Kline(decode(&event_type, payload)?),
            "24hrMiniTicker" => StreamEvent::MiniTicker(decode(&event_type, payload)?),
            "24hrTicker" => StreamEvent::Ticker(decode(&event_type, payload)?),
            "bookTicker" => StreamEvent::BookTicker(decode(&event_type, payload)?),
            "forceOrder" => StreamEvent::ForceOrder(decode(&event_type, payload)?),
            "depthUpdate" => StreamEvent::DepthUpdate(decode(&event_type, payload)?),
            "compositeIndex" => StreamEvent::CompositeIndex(decode(&event_type, payload)?),
            "contractInfo" => StreamEvent::ContractInfo(decode(&event_type, payload)?),
            "assetIndexUpdate" => StreamEvent::AssetIndexUpdate(decode(&event_type, payload)?),
            "ACCOUNT_UPDATE" => StreamEvent::AccountUpdate(decode(&event_type, payload)?),
            "MARGIN_CALL" => StreamEvent::MarginCall(decode(&event_type, payload)?),
            "ORDER_TRADE_UPDATE" => StreamEvent::OrderTradeUpdate(decode(&event_type, payload)?),
            "TRADE_LITE" => StreamEvent::TradeLite(decode(&event_type, payload)?),
            "ACCOUNT_CONFIG_UPDATE" => {
                StreamEvent::AccountConfigUpdate(decode(&event_type, payload)?)
            }
            "STRATEGY_UPDATE" => StreamEvent::StrategyUpdate(decode(&event_type, payload)?),
            "GRID_UPDATE" => StreamEvent::GridUpdate(decode(&event_type, payload)?),
            "CONDITIONAL_ORDER_TRIGGER_REJECT" => {
                StreamEvent::ConditionalOrderTriggerReject(decode(&event_type, payload)?)
            }
            "listenKeyExpired" => StreamEvent::ListenKeyExpired(decode(&event_type, payload)?),
            _ => {
                return Err(ExchangeError::UnrecognizedEvent {
                    event_type,
                    payload,
                })
            }
        };

        Ok(event)
    }
}

fn decode<T: DeserializeOwned>(event_type: &str, payload: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(payload).map_err(|e| {
        ExchangeError::DeserializationError(format!("Failed to parse {}: {}", event_type, e))
    })
}

fn is_control_reply(frame: &serde_json::Map<String, Value>) -> bool {
    frame.contains_key("id") && (frame.contains_key("result") || frame.contains_key("error"))
}

impl WsCodec for BinancePerpCodec {
    type Message = StreamEvent;

    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError> {
        Ok(Self::control_frame("SUBSCRIBE", streams, id))
    }

    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError> {
        Ok(Self::control_frame("UNSUBSCRIBE", streams, id))
    }

    fn decode_message(&self, frame: Value) -> Result<Option<Self::Message>, ExchangeError> {
        let mut object = match frame {
            Value::Object(object) => object,
            other => {
                return Err(ExchangeError::MalformedFrame(format!(
                    "expected a JSON object, got {}",
                    other
                )));
            }
        };

        if object.contains_key("stream") {
            return match object.remove("data") {
                Some(data @ Value::Object(_)) => Self::classify(data).map(Some),
                Some(other) => Err(ExchangeError::MalformedFrame(format!(
                    "combined stream data is not an object: {}",
                    other
                ))),
                None => Err(ExchangeError::MalformedFrame(
                    "combined stream frame without data".to_string(),
                )),
            };
        }

        if object.get("e").is_some_and(Value::is_string) {
            return Self::classify(Value::Object(object)).map(Some);
        }

        if is_control_reply(&object) {
            return Ok(None);
        }

        Err(ExchangeError::MalformedFrame(format!(
            "unrecognised frame shape: {}",
            Value::Object(object)
        )))
    }
}
