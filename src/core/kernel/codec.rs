use crate::core::errors::ExchangeError;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

/// Exchange-specific stream dialect.
///
/// The connection manager owns the socket and handles transport concerns (ping/pong,
/// close, error envelopes); the codec only builds control frames and turns parsed frames
/// into typed events.
pub trait WsCodec: Send + Sync + 'static {
    /// Typed event delivered to consumers.
    type Message: Send + 'static;

    /// Encode a subscription request for the given streams.
    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError>;

    /// Encode an unsubscription request for the given streams.
    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
        id: u64,
    ) -> Result<Message, ExchangeError>;

    /// Classify one parsed frame.
    ///
    /// `Ok(None)` marks frames that are valid but carry no event (subscription acks).
    fn decode_message(&self, frame: Value) -> Result<Option<Self::Message>, ExchangeError>;
}
