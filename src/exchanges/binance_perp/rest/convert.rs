use super::BinancePerpRestClient;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::exchanges::binance_perp::types::{
    ConvertAccepted, ConvertOrderStatus, ConvertPair, ConvertQuote,
};
use tracing::instrument;

/// Amount side of a convert quote request. The exchange takes exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertAmount {
    From(String),
    To(String),
}

impl<R: RestClient> BinancePerpRestClient<R> {
    /// Convertible pairs and their limits. At least one asset must be given.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn convert_pairs(
        &self,
        from_asset: Option<&str>,
        to_asset: Option<&str>,
    ) -> Result<Vec<ConvertPair>, ExchangeError> {
        if from_asset.is_none() && to_asset.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "from_asset or to_asset is required".to_string(),
            ));
        }
        let mut params = Params::new();
        params.push_opt("fromAsset", from_asset);
        params.push_opt("toAsset", to_asset);
        self.rest
            .get_json("/fapi/v1/convert/exchangeInfo", params, false)
            .await
    }

    /// Request a quote; `valid_time` is one of `10s`, `30s`, `1m`, `2m` (server default `10s`).
    #[instrument(skip(self), fields(exchange = "binance_perp", from = %from_asset, to = %to_asset))]
    pub async fn convert_quote(
        &self,
        from_asset: &str,
        to_asset: &str,
        amount: ConvertAmount,
        valid_time: Option<&str>,
    ) -> Result<ConvertQuote, ExchangeError> {
        let mut params = Params::new()
            .with("fromAsset", from_asset)
            .with("toAsset", to_asset);
        match amount {
            ConvertAmount::From(value) => params.insert("fromAmount", value),
            ConvertAmount::To(value) => params.insert("toAmount", value),
        }
        params.push_opt("validTime", valid_time);
        self.rest
            .post_json("/fapi/v1/convert/getQuote", params, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", quote_id = %quote_id))]
    pub async fn accept_quote(&self, quote_id: &str) -> Result<ConvertAccepted, ExchangeError> {
        let params = Params::new().with("quoteId", quote_id);
        self.rest
            .post_json("/fapi/v1/convert/acceptQuote", params, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", order_id = %order_id))]
    pub async fn convert_order_status(
        &self,
        order_id: &str,
    ) -> Result<ConvertOrderStatus, ExchangeError> {
        let params = Params::new().with("orderId", order_id);
        self.rest
            .get_json("/fapi/v1/convert/orderStatus", params, true)
            .await
    }
}
