//! Exchange-agnostic transport layer.
//!
//! - [`Params`]: ordered parameter set and its canonical query-string encoding
//! - [`Signer`] / [`HmacSigner`]: request authentication
//! - [`RequestAuthenticator`]: recvWindow + timestamp injection and signing
//! - [`ClockSkew`]: shared offset between local and exchange clocks
//! - [`RestClient`] / [`ReqwestRest`]: HTTP transport with error-envelope decoding
//! - [`WsCodec`]: exchange stream dialect
//! - [`StreamConnection`]: single-owner WebSocket reader with cooperative cancellation
//!
//! Nothing in here knows about individual endpoints or event payloads.
//!
//! ```rust,no_run
//! use binance_usdm::core::kernel::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), binance_usdm::ExchangeError> {
//! let signer = Arc::new(HmacSigner::new(
//!     "api_key".to_string(),
//!     "secret_key".to_string(),
//!     ParamOrder::AsSupplied,
//! ));
//! let config = RestClientConfig::new("https://fapi.binance.com".to_string(), "binance_perp".to_string())
//!     .with_server_time_endpoint("/fapi/v1/time".to_string());
//! let rest = RestClientBuilder::new(config).with_signer(signer).build()?;
//!
//! let balances: serde_json::Value = rest
//!     .get_json("/fapi/v3/balance", Params::new(), true)
//!     .await?;
//! # let _ = balances;
//! # Ok(())
//! # }
//! ```
pub mod clock;
pub mod codec;
pub mod params;
pub mod rest;
pub mod signer;
pub mod ws;

pub use clock::ClockSkew;
pub use codec::WsCodec;
pub use params::{ParamOrder, Params};
pub use rest::{decode_json, Host, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{
    hmac_sha256_hex, HmacSigner, RequestAuthenticator, SignatureResult, SignedQuery, Signer,
    API_KEY_HEADER,
};
pub use ws::{
    ConnectionState, ErrorHook, StreamConfig, StreamConnection, StreamExit,
    DEFAULT_CHANNEL_CAPACITY,
};
