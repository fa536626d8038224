use super::market_data::one_or_many;
use super::{ApiVersion, BinancePerpRestClient, TimeRange};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{ClockSkew, Params, RestClient};
use crate::core::types::{DownloadKind, IncomeType};
use crate::exchanges::binance_perp::types::{
    AccountBalance, AccountConfiguration, AccountInfo, Acknowledgement, CommissionRate,
    DownloadId, DownloadLink, Income, LeverageBracket, RateLimit, SymbolConfiguration,
    TradingStatus, TransferHistory,
};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Default look-back of the transfer history query: six 30-day months.
const TRANSFER_HISTORY_LOOKBACK_MS: i64 = 6 * 720 * 3_600_000;
const TRANSFER_HISTORY_PAGE_SIZE: i64 = 100;

/// Filters for `GET /fapi/v1/income`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomeQuery {
    pub symbol: Option<String>,
    pub income_type: Option<IncomeType>,
    pub range: TimeRange,
    pub page: i64,
}

impl IncomeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn income_type(mut self, income_type: IncomeType) -> Self {
        self.income_type = Some(income_type);
        self
    }

    #[must_use]
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.push_opt("symbol", self.symbol.as_deref());
        params.push_opt("incomeType", self.income_type);
        params.push_positive("startTime", self.range.start_time);
        params.push_positive("endTime", self.range.end_time);
        params.push_positive("page", self.page);
        params.push_positive("limit", self.range.limit);
        params
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultiAssetsMode {
    multi_assets_margin: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionMode {
    dual_side_position: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeBurnStatus {
    fee_burn: bool,
}

impl<R: RestClient> BinancePerpRestClient<R> {
    /// Futures wallet balances.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn account_balance(
        &self,
        version: ApiVersion,
    ) -> Result<Vec<AccountBalance>, ExchangeError> {
        self.rest
            .get_json(&version.path("balance"), Params::new(), true)
            .await
    }

    /// Account totals, per-asset margins and open positions.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn account_info(&self, version: ApiVersion) -> Result<AccountInfo, ExchangeError> {
        self.rest
            .get_json(&version.path("account"), Params::new(), true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn commission_rate(&self, symbol: &str) -> Result<CommissionRate, ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        self.rest
            .get_json("/fapi/v1/commissionRate", params, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn account_configuration(&self) -> Result<AccountConfiguration, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/accountConfig", Params::new(), true)
            .await
    }

    /// Per-symbol margin type and leverage; `None` covers every symbol.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn symbol_configuration(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<SymbolConfiguration>, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", symbol);
        self.rest.get_json("/fapi/v1/symbolConfig", params, true).await
    }

    /// Order-count rate limits applied to this account.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn order_rate_limit(&self) -> Result<Vec<RateLimit>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/rateLimit/order", Params::new(), true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn leverage_brackets(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<LeverageBracket>, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", symbol);
        let value = self
            .rest
            .get_json::<serde_json::Value>("/fapi/v1/leverageBracket", params, true)
            .await?;
        one_or_many(value)
    }

    /// Whether Multi-Assets mode is on.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn multi_assets_margin(&self) -> Result<bool, ExchangeError> {
        let mode: MultiAssetsMode = self
            .rest
            .get_json("/fapi/v1/multiAssetsMargin", Params::new(), true)
            .await?;
        Ok(mode.multi_assets_margin)
    }

    /// Whether hedge mode (dual side position) is on.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn dual_side_position(&self) -> Result<bool, ExchangeError> {
        let mode: PositionMode = self
            .rest
            .get_json("/fapi/v1/positionSide/dual", Params::new(), true)
            .await?;
        Ok(mode.dual_side_position)
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn income_history(&self, query: &IncomeQuery) -> Result<Vec<Income>, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/income", query.to_params(), true)
            .await
    }

    /// Quantitative trading-rule indicators.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn trading_status(&self, symbol: Option<&str>) -> Result<TradingStatus, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", symbol);
        self.rest
            .get_json("/fapi/v1/apiTradingStatus", params, true)
            .await
    }

    /// Start an asynchronous history export.
    #[instrument(skip(self), fields(exchange = "binance_perp", kind = %kind))]
    pub async fn download_id(
        &self,
        kind: DownloadKind,
        start_time: i64,
        end_time: i64,
    ) -> Result<DownloadId, ExchangeError> {
        let params = Params::new()
            .with("startTime", start_time)
            .with("endTime", end_time);
        self.rest
            .get_json(&format!("/fapi/v1/{}/asyn", kind), params, true)
            .await
    }

    /// Poll an export started with [`download_id`](Self::download_id).
    #[instrument(skip(self), fields(exchange = "binance_perp", kind = %kind))]
    pub async fn download_link(
        &self,
        kind: DownloadKind,
        download_id: &str,
    ) -> Result<DownloadLink, ExchangeError> {
        let params = Params::new().with("downloadId", download_id);
        self.rest
            .get_json(&format!("/fapi/v1/{}/asyn/id", kind), params, true)
            .await
    }

    /// Pay trading fees with BNB.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn toggle_bnb_fee_burn(&self, fee_burn: bool) -> Result<(), ExchangeError> {
        let params = Params::new().with("feeBurn", fee_burn);
        let ack: Acknowledgement = self.rest.post_json("/fapi/v1/feeBurn", params, true).await?;
        debug!(code = ack.code, msg = %ack.msg, "fee burn updated");
        Ok(())
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn bnb_fee_burn_status(&self) -> Result<bool, ExchangeError> {
        let status: FeeBurnStatus = self
            .rest
            .get_json("/fapi/v1/feeBurn", Params::new(), true)
            .await?;
        Ok(status.fee_burn)
    }

    /// Spot ↔ futures wallet transfers, served by the spot host.
    ///
    /// A non-positive `start_time` looks back six months.
    #[instrument(skip(self), fields(exchange = "binance_perp", asset = %asset))]
    pub async fn futures_transfer_history(
        &self,
        asset: &str,
        start_time: i64,
    ) -> Result<TransferHistory, ExchangeError> {
        let start_time = if start_time > 0 {
            start_time
        } else {
            ClockSkew::local_now_ms() - TRANSFER_HISTORY_LOOKBACK_MS
        };
        let params = Params::new()
            .with("asset", asset)
            .with("startTime", start_time)
            .with("size", TRANSFER_HISTORY_PAGE_SIZE);
        self.rest
            .spot_get_json("/sapi/v1/futures/transfer", params)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::ParamOrder;

    #[test]
    fn income_query_omits_unset_filters() {
        assert_eq!(IncomeQuery::new().to_params().encode(ParamOrder::AsSupplied), "");

        let query = IncomeQuery::new()
            .symbol("BTCUSDT")
            .income_type(IncomeType::FundingFee)
            .range(TimeRange::new().start(1_700_000_000_000).limit(100))
            .page(2);
        assert_eq!(
            query.to_params().encode(ParamOrder::AsSupplied),
            "symbol=BTCUSDT&incomeType=FUNDING_FEE&startTime=1700000000000&page=2&limit=100"
        );
    }

    #[test]
    fn versioned_paths() {
        assert_eq!(ApiVersion::V2.path("balance"), "/fapi/v2/balance");
        assert_eq!(ApiVersion::V3.path("account"), "/fapi/v3/account");
    }
}
