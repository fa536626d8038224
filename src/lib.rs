//! Binance USDⓈ-M futures client: signed REST endpoints and WebSocket streams.

pub mod core;
pub mod exchanges;

pub use core::{config::ExchangeConfig, errors::ExchangeError, types::*};
pub use exchanges::binance_perp::{
    build_connector, BinancePerpConnector, BinancePerpRestClient, StreamEvent,
};
