use super::{ApiVersion, BinancePerpRestClient, TimeRange};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::core::types::{AutoCloseType, MarginAdjustment, MarginType, PositionSide};
use crate::exchanges::binance_perp::requests::{
    batch_params, ModifyOrderRequest, NewOrderRequest, OrderRef,
};
use crate::exchanges::binance_perp::types::{
    Acknowledgement, AdlQuantile, BatchOutcome, CountdownCancelAll, LeverageChange, OrderResponse,
    PositionMarginChange, PositionMarginHistory, PositionRisk, UserTrade,
};
use tracing::{debug, instrument};

/// Exchange allows at most this many orders per batch call.
pub const MAX_BATCH_ORDERS: usize = 5;

/// Filters for `allOrders` / `userTrades`. Non-positive ids are left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeQuery {
    pub order_id: i64,
    pub from_id: i64,
    pub range: TimeRange,
}

impl TradeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn order_id(mut self, order_id: i64) -> Self {
        self.order_id = order_id;
        self
    }

    #[must_use]
    pub fn from_id(mut self, from_id: i64) -> Self {
        self.from_id = from_id;
        self
    }

    #[must_use]
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }
}

/// Filters for `forceOrders`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub auto_close_type: Option<AutoCloseType>,
    pub range: TimeRange,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn auto_close_type(mut self, auto_close_type: AutoCloseType) -> Self {
        self.auto_close_type = Some(auto_close_type);
        self
    }

    #[must_use]
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }
}

fn check_batch_size(len: usize) -> Result<(), ExchangeError> {
    if len > MAX_BATCH_ORDERS {
        return Err(ExchangeError::InvalidParameters(format!(
            "batch holds {} orders, at most {} allowed",
            len, MAX_BATCH_ORDERS
        )));
    }
    Ok(())
}

fn json_list<T: serde::Serialize>(items: &[T]) -> Result<String, ExchangeError> {
    serde_json::to_string(items).map_err(|e| ExchangeError::SerializationError(e.to_string()))
}

fn order_params(symbol: &str, order: &OrderRef) -> Params {
    let mut params = Params::new().with("symbol", symbol);
    order.apply(&mut params);
    params
}

impl<R: RestClient> BinancePerpRestClient<R> {
    #[instrument(skip(self, request), fields(exchange = "binance_perp", symbol = %request.symbol, side = %request.side))]
    pub async fn new_order(&self, request: &NewOrderRequest) -> Result<OrderResponse, ExchangeError> {
        self.rest
            .post_json("/fapi/v1/order", request.to_params(), true)
            .await
    }

    /// Validate an order without sending it to the matching engine.
    #[instrument(skip(self, request), fields(exchange = "binance_perp", symbol = %request.symbol))]
    pub async fn test_order(&self, request: &NewOrderRequest) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .rest
            .post_json("/fapi/v1/order/test", request.to_params(), true)
            .await?;
        Ok(())
    }

    /// Place up to five orders. Each element of the result succeeds or fails on its own.
    #[instrument(skip(self, orders), fields(exchange = "binance_perp", count = orders.len()))]
    pub async fn place_batch_orders(
        &self,
        orders: &[NewOrderRequest],
    ) -> Result<Vec<BatchOutcome>, ExchangeError> {
        check_batch_size(orders.len())?;
        self.rest
            .post_json("/fapi/v1/batchOrders", batch_params(orders)?, true)
            .await
    }

    #[instrument(skip(self, request), fields(exchange = "binance_perp", symbol = %request.symbol))]
    pub async fn modify_order(
        &self,
        request: &ModifyOrderRequest,
    ) -> Result<OrderResponse, ExchangeError> {
        self.rest
            .put_json("/fapi/v1/order", request.to_params(), true)
            .await
    }

    #[instrument(skip(self, orders), fields(exchange = "binance_perp", count = orders.len()))]
    pub async fn modify_batch_orders(
        &self,
        orders: &[ModifyOrderRequest],
    ) -> Result<Vec<BatchOutcome>, ExchangeError> {
        check_batch_size(orders.len())?;
        self.rest
            .put_json("/fapi/v1/batchOrders", batch_params(orders)?, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn cancel_order(
        &self,
        symbol: &str,
        order: OrderRef,
    ) -> Result<OrderResponse, ExchangeError> {
        self.rest
            .delete_json("/fapi/v1/order", order_params(symbol, &order), true)
            .await
    }

    /// Cancel up to ten orders, by exchange ids or by client ids.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn cancel_batch_orders(
        &self,
        symbol: &str,
        order_ids: &[i64],
        client_order_ids: &[String],
    ) -> Result<Vec<BatchOutcome>, ExchangeError> {
        if order_ids.is_empty() && client_order_ids.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "either order ids or client order ids are required".to_string(),
            ));
        }
        let mut params = Params::new().with("symbol", symbol);
        if !order_ids.is_empty() {
            params.insert("orderIdList", json_list(order_ids)?);
        }
        if !client_order_ids.is_empty() {
            params.insert("origClientOrderIdList", json_list(client_order_ids)?);
        }
        self.rest
            .delete_json("/fapi/v1/batchOrders", params, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn cancel_all_open_orders(&self, symbol: &str) -> Result<(), ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        let ack: Acknowledgement = self
            .rest
            .delete_json("/fapi/v1/allOpenOrders", params, true)
            .await?;
        debug!(msg = %ack.msg, "open orders cancelled");
        Ok(())
    }

    /// Dead-man switch: cancel every open order of `symbol` unless refreshed within
    /// `countdown_ms`. Zero disarms it.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn countdown_cancel_all(
        &self,
        symbol: &str,
        countdown_ms: u64,
    ) -> Result<CountdownCancelAll, ExchangeError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("countdownTime", countdown_ms);
        self.rest
            .post_json("/fapi/v1/countdownCancelAll", params, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn query_order(
        &self,
        symbol: &str,
        order: OrderRef,
    ) -> Result<OrderResponse, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/order", order_params(symbol, &order), true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn all_orders(
        &self,
        symbol: &str,
        query: TradeQuery,
    ) -> Result<Vec<OrderResponse>, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_positive("orderId", query.order_id);
        query.range.apply(&mut params);
        self.rest.get_json("/fapi/v1/allOrders", params, true).await
    }

    /// Open orders of one symbol, or of every symbol when `None`.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderResponse>, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", symbol);
        self.rest.get_json("/fapi/v1/openOrders", params, true).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn open_order(
        &self,
        symbol: &str,
        order: OrderRef,
    ) -> Result<OrderResponse, ExchangeError> {
        self.rest
            .get_json("/fapi/v1/openOrder", order_params(symbol, &order), true)
            .await
    }

    /// Liquidation and ADL orders of this account.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn force_orders(&self, query: &HistoryQuery) -> Result<Vec<OrderResponse>, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", query.symbol.as_deref());
        params.push_opt("autoCloseType", query.auto_close_type);
        query.range.apply(&mut params);
        self.rest.get_json("/fapi/v1/forceOrders", params, true).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn user_trades(
        &self,
        symbol: &str,
        query: TradeQuery,
    ) -> Result<Vec<UserTrade>, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_positive("orderId", query.order_id);
        params.push_positive("startTime", query.range.start_time);
        params.push_positive("endTime", query.range.end_time);
        params.push_positive("fromId", query.from_id);
        params.push_positive("limit", query.range.limit);
        self.rest.get_json("/fapi/v1/userTrades", params, true).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol, margin_type = %margin_type))]
    pub async fn change_margin_type(
        &self,
        symbol: &str,
        margin_type: MarginType,
    ) -> Result<(), ExchangeError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("marginType", margin_type);
        let _: Acknowledgement = self.rest.post_json("/fapi/v1/marginType", params, true).await?;
        Ok(())
    }

    /// Switch between hedge mode (`true`) and one-way mode.
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn change_position_mode(&self, dual_side_position: bool) -> Result<(), ExchangeError> {
        let params = Params::new().with("dualSidePosition", dual_side_position);
        let _: Acknowledgement = self
            .rest
            .post_json("/fapi/v1/positionSide/dual", params, true)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn change_leverage(
        &self,
        symbol: &str,
        leverage: u32,
    ) -> Result<LeverageChange, ExchangeError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("leverage", leverage);
        self.rest.post_json("/fapi/v1/leverage", params, true).await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    pub async fn change_multi_assets_mode(&self, multi_assets_margin: bool) -> Result<(), ExchangeError> {
        let params = Params::new().with("multiAssetsMargin", multi_assets_margin);
        let _: Acknowledgement = self
            .rest
            .post_json("/fapi/v1/multiAssetsMargin", params, true)
            .await?;
        Ok(())
    }

    /// Add or remove isolated margin.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn modify_position_margin(
        &self,
        symbol: &str,
        position_side: Option<PositionSide>,
        amount: &str,
        adjustment: MarginAdjustment,
    ) -> Result<PositionMarginChange, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_opt("positionSide", position_side);
        params.insert("amount", amount);
        params.insert("type", adjustment);
        self.rest
            .post_json("/fapi/v1/positionMargin", params, true)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn position_risk(
        &self,
        version: ApiVersion,
        symbol: Option<&str>,
    ) -> Result<Vec<PositionRisk>, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", symbol);
        self.rest
            .get_json(&version.path("positionRisk"), params, true)
            .await
    }

    /// Auto-deleverage queue estimate per position.
    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = ?symbol))]
    pub async fn adl_quantile(&self, symbol: Option<&str>) -> Result<Vec<AdlQuantile>, ExchangeError> {
        let mut params = Params::new();
        params.push_opt("symbol", symbol);
        let value = self
            .rest
            .get_json::<serde_json::Value>("/fapi/v1/adlQuantile", params, true)
            .await?;
        super::market_data::one_or_many(value)
    }

    #[instrument(skip(self), fields(exchange = "binance_perp", symbol = %symbol))]
    pub async fn position_margin_history(
        &self,
        symbol: &str,
        adjustment: Option<MarginAdjustment>,
        range: TimeRange,
    ) -> Result<Vec<PositionMarginHistory>, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.push_opt("type", adjustment);
        range.apply(&mut params);
        self.rest
            .get_json("/fapi/v1/positionMargin/history", params, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::ParamOrder;

    #[test]
    fn oversized_batch_is_rejected_before_sending() {
        assert!(check_batch_size(MAX_BATCH_ORDERS).is_ok());
        assert!(matches!(
            check_batch_size(MAX_BATCH_ORDERS + 1),
            Err(ExchangeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn order_ref_picks_the_matching_key() {
        let by_id = order_params("BTCUSDT", &OrderRef::from(42_i64));
        assert_eq!(by_id.encode(ParamOrder::AsSupplied), "symbol=BTCUSDT&orderId=42");

        let by_client = order_params("BTCUSDT", &OrderRef::from("abc"));
        assert_eq!(
            by_client.encode(ParamOrder::AsSupplied),
            "symbol=BTCUSDT&origClientOrderId=abc"
        );
    }

    #[test]
    fn id_lists_are_json_arrays() {
        assert_eq!(json_list(&[1_i64, 2, 3]).unwrap(), "[1,2,3]");
        assert_eq!(
            json_list(&["a".to_string(), "b".to_string()]).unwrap(),
            r#"["a","b"]"#
        );
    }
}
