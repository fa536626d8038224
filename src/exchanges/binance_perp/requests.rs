//! Order request builders.
//!
//! Each builder spells out its optional fields and the rule that drops them from the query
//! string. The same structs serialize to the JSON objects expected inside `batchOrders`.

use crate::core::errors::ExchangeError;
use crate::core::kernel::Params;
use crate::core::types::{
    OrderSide, OrderType, PositionSide, PriceMatch, ResponseType, StpMode, TimeInForce,
    WorkingType,
};
use serde::Serialize;

/// `POST /fapi/v1/order` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_client_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    /// Close-all; only with `STOP_MARKET` / `TAKE_PROFIT_MARKET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_position: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_type: Option<WorkingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_protect: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_order_resp_type: Option<ResponseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_match: Option<PriceMatch>,
    #[serde(
        rename = "selfTradePreventionMode",
        skip_serializing_if = "Option::is_none"
    )]
    pub stp_mode: Option<StpMode>,
    /// Only with `timeInForce=GTD`; milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_till_date: Option<i64>,
}

impl NewOrderRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            position_side: None,
            time_in_force: None,
            quantity: None,
            price: None,
            reduce_only: None,
            new_client_order_id: None,
            stop_price: None,
            close_position: None,
            activation_price: None,
            callback_rate: None,
            working_type: None,
            price_protect: None,
            new_order_resp_type: None,
            price_match: None,
            stp_mode: None,
            good_till_date: None,
        }
    }

    /// Limit order with GTC time in force.
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self::new(symbol, side, OrderType::Limit)
            .time_in_force(TimeInForce::Gtc)
            .quantity(quantity)
            .price(price)
    }

    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: impl Into<String>) -> Self {
        Self::new(symbol, side, OrderType::Market).quantity(quantity)
    }

    #[must_use]
    pub fn position_side(mut self, position_side: PositionSide) -> Self {
        self.position_side = Some(position_side);
        self
    }

    #[must_use]
    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    #[must_use]
    pub fn quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    #[must_use]
    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    #[must_use]
    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
        self
    }

    #[must_use]
    pub fn client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn stop_price(mut self, stop_price: impl Into<String>) -> Self {
        self.stop_price = Some(stop_price.into());
        self
    }

    #[must_use]
    pub fn close_position(mut self, close_position: bool) -> Self {
        self.close_position = Some(close_position);
        self
    }

    /// Trailing stop parameters.
    #[must_use]
    pub fn trailing(mut self, activation_price: impl Into<String>, callback_rate: impl Into<String>) -> Self {
        self.activation_price = Some(activation_price.into());
        self.callback_rate = Some(callback_rate.into());
        self
    }

    #[must_use]
    pub fn working_type(mut self, working_type: WorkingType) -> Self {
        self.working_type = Some(working_type);
        self
    }

    #[must_use]
    pub fn price_protect(mut self, price_protect: bool) -> Self {
        self.price_protect = Some(price_protect);
        self
    }

    #[must_use]
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.new_order_resp_type = Some(response_type);
        self
    }

    #[must_use]
    pub fn price_match(mut self, price_match: PriceMatch) -> Self {
        self.price_match = Some(price_match);
        self
    }

    #[must_use]
    pub fn stp_mode(mut self, stp_mode: StpMode) -> Self {
        self.stp_mode = Some(stp_mode);
        self
    }

    #[must_use]
    pub fn good_till_date(mut self, good_till_date_ms: i64) -> Self {
        self.good_till_date = Some(good_till_date_ms);
        self
    }

    /// Query parameters in wire order. `None` fields and a non-positive `goodTillDate` are
    /// omitted; booleans are sent as `true`/`false` when set.
    pub fn to_params(&self) -> Params {
        let mut params = Params::new()
            .with("symbol", &self.symbol)
            .with("side", self.side)
            .with("type", self.order_type);
        params.push_opt("positionSide", self.position_side);
        params.push_opt("timeInForce", self.time_in_force);
        params.push_opt("quantity", self.quantity.as_deref());
        params.push_opt("price", self.price.as_deref());
        params.push_opt("reduceOnly", self.reduce_only);
        params.push_opt("newClientOrderId", self.new_client_order_id.as_deref());
        params.push_opt("stopPrice", self.stop_price.as_deref());
        params.push_opt("closePosition", self.close_position);
        params.push_opt("activationPrice", self.activation_price.as_deref());
        params.push_opt("callbackRate", self.callback_rate.as_deref());
        params.push_opt("workingType", self.working_type);
        params.push_opt("priceProtect", self.price_protect.map(|p| if p { "TRUE" } else { "FALSE" }));
        params.push_opt("newOrderRespType", self.new_order_resp_type);
        params.push_opt("priceMatch", self.price_match);
        params.push_opt("selfTradePreventionMode", self.stp_mode);
        params.push_positive("goodTillDate", self.good_till_date.unwrap_or_default());
        params
    }
}

/// `PUT /fapi/v1/order` parameters. Exactly one of `order_id` / `orig_client_order_id`
/// identifies the order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: String,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_client_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_match: Option<PriceMatch>,
}

impl ModifyOrderRequest {
    pub fn by_order_id(
        symbol: impl Into<String>,
        order_id: i64,
        side: OrderSide,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity: quantity.into(),
            price: price.into(),
            order_id: Some(order_id),
            orig_client_order_id: None,
            price_match: None,
        }
    }

    pub fn by_client_order_id(
        symbol: impl Into<String>,
        client_order_id: impl Into<String>,
        side: OrderSide,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity: quantity.into(),
            price: price.into(),
            order_id: None,
            orig_client_order_id: Some(client_order_id.into()),
            price_match: None,
        }
    }

    #[must_use]
    pub fn price_match(mut self, price_match: PriceMatch) -> Self {
        self.price_match = Some(price_match);
        self
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new().with("symbol", &self.symbol);
        params.push_opt("orderId", self.order_id);
        params.push_opt("origClientOrderId", self.orig_client_order_id.as_deref());
        params.insert("side", self.side);
        params.insert("quantity", &self.quantity);
        params.insert("price", &self.price);
        params.push_opt("priceMatch", self.price_match);
        params
    }
}

/// Encode a list of requests as the `batchOrders` JSON parameter.
pub fn batch_params<T: Serialize>(orders: &[T]) -> Result<Params, ExchangeError> {
    if orders.is_empty() {
        return Err(ExchangeError::InvalidParameters(
            "batch must contain at least one order".to_string(),
        ));
    }
    let encoded = serde_json::to_string(orders)
        .map_err(|e| ExchangeError::SerializationError(format!("batchOrders: {}", e)))?;
    Ok(Params::new().with("batchOrders", encoded))
}

/// Identify an order by exchange id or by client id, as accepted by query/cancel endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRef {
    Id(i64),
    ClientId(String),
}

impl OrderRef {
    pub(crate) fn apply(&self, params: &mut Params) {
        match self {
            Self::Id(id) => params.insert("orderId", id),
            Self::ClientId(id) => params.insert("origClientOrderId", id),
        }
    }
}

impl From<i64> for OrderRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for OrderRef {
    fn from(id: &str) -> Self {
        Self::ClientId(id.to_string())
    }
}

impl From<String> for OrderRef {
    fn from(id: String) -> Self {
        Self::ClientId(id)
    }
}
