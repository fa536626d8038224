//! Stream names and connection URLs.

use crate::core::types::{ContractType, KlineInterval};

/// Production WebSocket host.
pub const WS_BASE_URL: &str = "wss://fstream.binance.com";
/// Testnet WebSocket host.
pub const TESTNET_WS_BASE_URL: &str = "wss://stream.binancefuture.com";

/// URL for a market-data connection.
///
/// One stream connects to the raw endpoint (`/ws/{stream}`), several to the combined
/// endpoint (`/stream?streams=a/b`), and none to a bare `/ws` socket that is fed through
/// `SUBSCRIBE` later.
pub fn market_stream_url(base_url: &str, streams: &[impl AsRef<str>]) -> String {
    let base_url = base_url.trim_end_matches('/');
    match streams {
        [] => format!("{}/ws", base_url),
        [single] => format!("{}/ws/{}", base_url, single.as_ref()),
        many => {
            let joined = many.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/");
            format!("{}/stream?streams={}", base_url, joined)
        }
    }
}

/// URL for the user-data connection bound to `listen_key`.
pub fn user_stream_url(base_url: &str, listen_key: &str) -> String {
    format!("{}/ws/{}", base_url.trim_end_matches('/'), listen_key)
}

/// Update speed of the depth streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthSpeed {
    Ms100,
    #[default]
    Ms250,
    Ms500,
}

impl DepthSpeed {
    fn suffix(self) -> &'static str {
        match self {
            Self::Ms100 => "@100ms",
            Self::Ms250 => "",
            Self::Ms500 => "@500ms",
        }
    }
}

/// Stream name builders. Symbols are lower-cased as the exchange requires.
pub mod names {
    use super::*;

    fn lower(symbol: &str) -> String {
        symbol.to_ascii_lowercase()
    }

    pub fn agg_trade(symbol: &str) -> String {
        format!("{}@aggTrade", lower(symbol))
    }

    /// Mark price and funding; `every_second` switches from the 3 s to the 1 s feed.
    pub fn mark_price(symbol: &str, every_second: bool) -> String {
        let speed = if every_second { "@1s" } else { "" };
        format!("{}@markPrice{}", lower(symbol), speed)
    }

    pub fn all_mark_prices(every_second: bool) -> String {
        let speed = if every_second { "@1s" } else { "" };
        format!("!markPrice@arr{}", speed)
    }

    pub fn kline(symbol: &str, interval: KlineInterval) -> String {
        format!("{}@kline_{}", lower(symbol), interval)
    }

    pub fn continuous_kline(pair: &str, contract_type: ContractType, interval: KlineInterval) -> String {
        format!(
            "{}_{}@continuousKline_{}",
            lower(pair),
            contract_type.as_str().to_ascii_lowercase(),
            interval
        )
    }

    pub fn mini_ticker(symbol: &str) -> String {
        format!("{}@miniTicker", lower(symbol))
    }

    pub fn all_mini_tickers() -> String {
        "!miniTicker@arr".to_string()
    }

    pub fn ticker(symbol: &str) -> String {
        format!("{}@ticker", lower(symbol))
    }

    pub fn all_tickers() -> String {
        "!ticker@arr".to_string()
    }

    pub fn book_ticker(symbol: &str) -> String {
        format!("{}@bookTicker", lower(symbol))
    }

    pub fn all_book_tickers() -> String {
        "!bookTicker".to_string()
    }

    pub fn force_order(symbol: &str) -> String {
        format!("{}@forceOrder", lower(symbol))
    }

    pub fn all_force_orders() -> String {
        "!forceOrder@arr".to_string()
    }

    /// Top `levels` (5, 10 or 20) of the book.
    pub fn partial_depth(symbol: &str, levels: u8, speed: DepthSpeed) -> String {
        format!("{}@depth{}{}", lower(symbol), levels, speed.suffix())
    }

    pub fn diff_depth(symbol: &str, speed: DepthSpeed) -> String {
        format!("{}@depth{}", lower(symbol), speed.suffix())
    }

    pub fn composite_index(symbol: &str) -> String {
        format!("{}@compositeIndex", lower(symbol))
    }

    pub fn contract_info() -> String {
        "!contractInfo".to_string()
    }

    pub fn asset_index(symbol: &str) -> String {
        format!("{}@assetIndex", lower(symbol))
    }

    pub fn all_asset_index() -> String {
        "!assetIndex@arr".to_string()
    }
}
