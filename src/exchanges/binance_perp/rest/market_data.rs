use super::{BinancePerpRestClient, TimeRange};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::core::types::{ContractType, KlineInterval, StatsPeriod};
use crate::exchanges::binance_perp::types::{
    AggTrade, AssetIndex, BookTicker, CompositeIndexInfo, DeliveryPrice, ExchangeInfo,
    FundingInfo, FundingRate, IndexConstituents, Kline, LongShortRatio, MarkPrice, MarketTrade,
    OpenInterest, OpenInterestHist, OrderBook, ServerTime, TakerLongShortRatio, Ticker24hr,
    TickerPrice,
};
use serde::de::DeserializeOwned;
use tracing::instrument;

/// Filters for the `/futures/data` statistics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsQuery {
    pub period: StatsPeriod,
    pub range: TimeRange,
}

impl StatsQuery {
    pub fn new(period: StatsPeriod) -> Self {
        Self {
            period,
            range: TimeRange::default(),
        }
    }

    #[must_use]
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }
}

fn symbol_params(symbol: Option<&str>) -> Params {
    let mut params = Params::new();
    params.push_opt("symbol", symbol);
    params
}

impl<R: RestClient> BinancePerpRestClient<R> {
    /// Test connectivity.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn ping(&self) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self.rest.get_json("/fapi/v1/ping", Params::new(), false).await?;
        Ok(())
    }

    /// Exchange server time in milliseconds.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn server_time(&self) -> Result<i64, ExchangeError> {
        let time: ServerTime = self.rest.get_json("/fapi/v1/time", Params::new(), false).await?;
        Ok(time.server_time)
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/exchangeInfo", Params::new(), false)
            .await
    }

    /// Order book; `limit` of 0 leaves the depth to the server default.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn order_book(&self, symbol: &str, limit: i64) -> Result<OrderBook, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_positive("limit", limit);
        self.rest.get_json("/fapi/v1/depth", params, false).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn recent_trades(
        &self,
        symbol: &str,
        limit: i64,
    ) -> Result<Vec<MarketTrade>, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_positive("limit", limit);
        self.rest.get_json("/fapi/v1/trades", params, false).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn historical_trades(
        &self,
        symbol: &str,
        from_id: i64,
        limit: i64,
    ) -> Result<Vec<MarketTrade>, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_positive("fromId", from_id);
        params.push_positive("limit", limit);
        self.rest
            .get_json("/fapi/v1/historicalTrades", params, false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn aggregate_trades(
        &self,
        symbol: &str,
        from_id: i64,
        range: TimeRange,
    ) -> Result<Vec<AggTrade>, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_positive("fromId", from_id);
        range.apply(&mut params);
        self.rest.get_json("/fapi/v1/aggTrades", params, false).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol, interval = %interval))]
    pub async fn klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        self.symbol_klines("/fapi/v1/klines", symbol, interval, range)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", pair = %pair, interval = %interval))]
    pub async fn continuous_klines(
        &self,
        pair: &str,
        contract_type: ContractType,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        self.pair_klines("/fapi/v1/continuousKlines", pair, Some(contract_type), interval, range)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", pair = %pair, interval = %interval))]
    pub async fn index_price_klines(
        &self,
        pair: &str,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        self.pair_klines("/fapi/v1/indexPriceKlines", pair, None, interval, range)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol, interval = %interval))]
    pub async fn mark_price_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        self.symbol_klines("/fapi/v1/markPriceKlines", symbol, interval, range)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol, interval = %interval))]
    pub async fn premium_index_klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        self.symbol_klines("/fapi/v1/premiumIndexKlines", symbol, interval, range)
            .await
    }

    async fn symbol_klines(
        &self,
        endpoint: &str,
        symbol: &str,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let mut params = Params::new()
            .with("symbol", symbol)
            .with("interval", interval);
        range.apply(&mut params);
        self.rest.get_json(endpoint, params, false).await
    }

    async fn pair_klines(
        &self,
        endpoint: &str,
        pair: &str,
        contract_type: Option<ContractType>,
        interval: KlineInterval,
        range: TimeRange,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let mut params = Params::new().with("pair", pair);
        params.push_opt("contractType", contract_type);
        params.insert("interval", interval);
        range.apply(&mut params);
        self.rest.get_json(endpoint, params, false).await
    }

    /// Mark price and funding state for one symbol.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn mark_price(&self, symbol: &str) -> Result<MarkPrice, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/premiumIndex", symbol_params(Some(symbol)), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn mark_prices(&self) -> Result<Vec<MarkPrice>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/premiumIndex", Params::new(), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn funding_rate_history(
        &self,
        symbol: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        let mut params = symbol_params(symbol);
        range.apply(&mut params);
        self.rest.get_json("/fapi/v1/fundingRate", params, false).await
    }

    /// Symbols with adjusted funding caps, floors or intervals.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn funding_info(&self) -> Result<Vec<FundingInfo>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/fundingInfo", Params::new(), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn ticker_24hr(&self, symbol: &str) -> Result<Ticker24hr, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/ticker/24hr", symbol_params(Some(symbol)), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn tickers_24hr(&self) -> Result<Vec<Ticker24hr>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/ticker/24hr", Params::new(), false)
            .await
    }

    /// Latest price for one symbol (`/fapi/v2/ticker/price`).
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn ticker_price(&self, symbol: &str) -> Result<TickerPrice, ExchangeError> {
        self.rest
            .get_json("/fapi/v2/ticker/price", symbol_params(Some(symbol)), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn ticker_prices(&self) -> Result<Vec<TickerPrice>, ExchangeError> {
        self.rest
            .get_json("/fapi/v2/ticker/price", Params::new(), false)
            .await
    }

    /// Latest price through the older `/fapi/v1/ticker/price` route.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn ticker_price_v1(&self, symbol: &str) -> Result<TickerPrice, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/ticker/price", symbol_params(Some(symbol)), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn book_ticker(&self, symbol: &str) -> Result<BookTicker, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/ticker/bookTicker", symbol_params(Some(symbol)), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn book_tickers(&self) -> Result<Vec<BookTicker>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/ticker/bookTicker", Params::new(), false)
            .await
    }

    /// Quarterly contract delivery prices for a pair.
    #[instrument(skip(self), fields(exchange = "binance_perp", pair = %pair))]
    pub async fn delivery_price(&self, pair: &str) -> Result<Vec<DeliveryPrice>, ExchangeError> {
        let params = Params::new().with("pair", pair);
        self.rest
            .get_json("/futures/data/delivery-price", params, false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn open_interest(&self, symbol: &str) -> Result<OpenInterest, ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        self.rest.get_json("/fapi/v1/openInterest", params, false).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn open_interest_hist(
        &self,
        symbol: &str,
        query: StatsQuery,
    ) -> Result<Vec<OpenInterestHist>, ExchangeError> {
        self.stats("/futures/data/openInterestHist", symbol, query)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn top_long_short_position_ratio(
        &self,
        symbol: &str,
        query: StatsQuery,
    ) -> Result<Vec<LongShortRatio>, ExchangeError> {
        self.stats("/futures/data/topLongShortPositionRatio", symbol, query)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn top_long_short_account_ratio(
        &self,
        symbol: &str,
        query: StatsQuery,
    ) -> Result<Vec<LongShortRatio>, ExchangeError> {
        self.stats("/futures/data/topLongShortAccountRatio", symbol, query)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn global_long_short_account_ratio(
        &self,
        symbol: &str,
        query: StatsQuery,
    ) -> Result<Vec<LongShortRatio>, ExchangeError> {
        self.stats("/futures/data/globalLongShortAccountRatio", symbol, query)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn taker_long_short_ratio(
        &self,
        symbol: &str,
        query: StatsQuery,
    ) -> Result<Vec<TakerLongShortRatio>, ExchangeError> {
        self.stats("/futures/data/takerlongshortRatio", symbol, query)
            .await
    }

    async fn stats<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        symbol: &str,
        query: StatsQuery,
    ) -> Result<T, ExchangeError> {
        let mut params = Params::new()
            .with("symbol", symbol)
            .with("period", query.period);
        query.range.apply(&mut params);
        self.rest.get_json(endpoint, params, false).await
    }

    /// Composite index constituents; `None` returns every composite index.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn composite_index_info(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<CompositeIndexInfo>, ExchangeError> {
        let value = self
            .rest
            .get_json::<serde_json::Value>("/fapi/v1/indexInfo", symbol_params(symbol), false)
            .await?;
        one_or_many(value)
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn asset_index(&self, symbol: &str) -> Result<AssetIndex, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/assetIndex", symbol_params(Some(symbol)), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn asset_indexes(&self) -> Result<Vec<AssetIndex>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/assetIndex", Params::new(), false)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn index_constituents(&self, symbol: &str) -> Result<IndexConstituents, ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        self.rest.get_json("/fapi/v1/constituents", params, false).await
    }
}

/// Some endpoints answer with a bare object when filtered by symbol and a list otherwise.
pub(super) fn one_or_many<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<Vec<T>, ExchangeError> {
    use crate::core::kernel::decode_json;
    match value {
        serde_json::Value::Array(_) => decode_json(value),
        other => Ok(vec![decode_json(other)?]),
    }
}
