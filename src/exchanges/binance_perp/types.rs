//! REST response shapes.
//!
//! Numeric amounts stay as the decimal strings the exchange sends; callers pick their own
//! numeric type. Structs are lenient (`#[serde(default)]`) so that fields added by the
//! exchange, or omitted for a given account mode, do not break decoding.

use crate::core::types::{
    ContractStatus, ContractType, OrderSide, OrderStatus, OrderType, PositionSide, PriceMatch,
    StpMode, TimeInForce, WorkingType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimit {
    pub rate_limit_type: String,
    pub interval: String,
    pub interval_num: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarginAsset {
    pub asset: String,
    pub margin_available: bool,
    pub auto_asset_exchange: Option<String>,
}

/// One entry of a symbol's `filters` list. Only the fields relevant to `filter_type` are set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolFilter {
    pub filter_type: String,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub tick_size: Option<String>,
    pub min_qty: Option<String>,
    pub max_qty: Option<String>,
    pub step_size: Option<String>,
    pub limit: Option<u32>,
    pub notional: Option<String>,
    pub multiplier_up: Option<String>,
    pub multiplier_down: Option<String>,
    pub multiplier_decimal: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub pair: String,
    pub contract_type: Option<ContractType>,
    #[serde(default)]
    pub delivery_date: i64,
    #[serde(default)]
    pub onboard_date: i64,
    pub status: ContractStatus,
    #[serde(default)]
    pub maint_margin_percent: String,
    #[serde(default)]
    pub required_margin_percent: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub margin_asset: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    #[serde(default)]
    pub base_asset_precision: u32,
    #[serde(default)]
    pub quote_precision: u32,
    #[serde(default)]
    pub underlying_type: String,
    #[serde(default)]
    pub underlying_sub_type: Vec<String>,
    #[serde(default)]
    pub trigger_protect: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
    #[serde(default, rename = "orderTypes", alias = "OrderType")]
    pub order_types: Vec<OrderType>,
    #[serde(default)]
    pub time_in_force: Vec<TimeInForce>,
    #[serde(default)]
    pub liquidation_fee: String,
    #[serde(default)]
    pub market_take_bound: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    #[serde(default)]
    pub timezone: String,
    pub server_time: i64,
    #[serde(default)]
    pub rate_limits: Vec<RateLimit>,
    #[serde(default)]
    pub assets: Vec<MarginAsset>,
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderBook {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: i64,
    /// Message output time.
    #[serde(rename = "E", default)]
    pub event_time: i64,
    /// Transaction time.
    #[serde(rename = "T", default)]
    pub transaction_time: i64,
    /// `[price, quantity]` levels, best first.
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrade {
    pub id: i64,
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub quote_qty: String,
    pub time: i64,
    pub is_buyer_maker: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggTrade {
    #[serde(rename = "a")]
    pub agg_trade_id: i64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "f")]
    pub first_trade_id: i64,
    #[serde(rename = "l")]
    pub last_trade_id: i64,
    #[serde(rename = "T")]
    pub timestamp: i64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Candlestick row.
///
/// Klines arrive as 12-element JSON arrays; the derived `Deserialize` reads them
/// positionally in field order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Kline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
    pub quote_asset_volume: String,
    pub number_of_trades: i64,
    pub taker_buy_base_asset_volume: String,
    pub taker_buy_quote_asset_volume: String,
    pub ignore: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPrice {
    pub symbol: String,
    pub mark_price: String,
    pub index_price: String,
    #[serde(default)]
    pub estimated_settle_price: String,
    pub last_funding_rate: String,
    pub next_funding_time: i64,
    #[serde(default)]
    pub interest_rate: String,
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub symbol: String,
    pub funding_rate: String,
    pub funding_time: i64,
    #[serde(default)]
    pub mark_price: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingInfo {
    pub symbol: String,
    pub adjusted_funding_rate_cap: String,
    pub adjusted_funding_rate_floor: String,
    pub funding_interval_hours: u32,
    #[serde(default)]
    pub disclaimer: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hr {
    pub symbol: String,
    pub price_change: String,
    pub price_change_percent: String,
    pub weighted_avg_price: String,
    pub last_price: String,
    pub last_qty: String,
    pub open_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
    pub quote_volume: String,
    pub open_time: i64,
    pub close_time: i64,
    pub first_id: i64,
    pub last_id: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTicker {
    pub symbol: String,
    pub bid_price: String,
    pub bid_qty: String,
    pub ask_price: String,
    pub ask_qty: String,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPrice {
    pub delivery_time: i64,
    pub delivery_price: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterest {
    pub symbol: String,
    pub open_interest: String,
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestHist {
    pub symbol: String,
    pub sum_open_interest: String,
    pub sum_open_interest_value: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongShortRatio {
    pub symbol: String,
    pub long_short_ratio: String,
    pub long_account: String,
    pub short_account: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakerLongShortRatio {
    pub buy_sell_ratio: String,
    pub buy_vol: String,
    pub sell_vol: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMember {
    pub base_asset: String,
    pub quote_asset: String,
    pub weight_in_quantity: String,
    pub weight_in_percentage: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeIndexInfo {
    pub symbol: String,
    pub time: i64,
    pub component: String,
    pub base_asset_list: Vec<IndexMember>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetIndex {
    pub symbol: String,
    pub time: i64,
    pub index: String,
    pub bid_buffer: String,
    pub ask_buffer: String,
    pub bid_rate: String,
    pub ask_rate: String,
    pub auto_exchange_bid_buffer: String,
    pub auto_exchange_ask_buffer: String,
    pub auto_exchange_bid_rate: String,
    pub auto_exchange_ask_rate: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Constituent {
    pub symbol: String,
    pub exchange: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConstituents {
    pub symbol: String,
    pub time: i64,
    pub constituents: Vec<Constituent>,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountBalance {
    pub account_alias: String,
    pub asset: String,
    pub balance: String,
    pub cross_wallet_balance: String,
    pub cross_un_pnl: String,
    pub available_balance: String,
    pub max_withdraw_amount: String,
    pub margin_available: bool,
    pub update_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountAsset {
    pub asset: String,
    pub wallet_balance: String,
    pub unrealized_profit: String,
    pub margin_balance: String,
    pub maint_margin: String,
    pub initial_margin: String,
    pub position_initial_margin: String,
    pub open_order_initial_margin: String,
    pub cross_wallet_balance: String,
    pub cross_un_pnl: String,
    pub available_balance: String,
    pub max_withdraw_amount: String,
    pub update_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountPosition {
    pub symbol: String,
    pub position_side: Option<PositionSide>,
    pub position_amt: String,
    pub unrealized_profit: String,
    pub isolated_margin: String,
    pub notional: String,
    pub isolated_wallet: String,
    pub initial_margin: String,
    pub maint_margin: String,
    pub entry_price: Option<String>,
    pub leverage: Option<String>,
    pub update_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountInfo {
    pub total_initial_margin: String,
    pub total_maint_margin: String,
    pub total_wallet_balance: String,
    pub total_unrealized_profit: String,
    pub total_margin_balance: String,
    pub total_position_initial_margin: String,
    pub total_open_order_initial_margin: String,
    pub total_cross_wallet_balance: String,
    pub total_cross_un_pnl: String,
    pub available_balance: String,
    pub max_withdraw_amount: String,
    pub assets: Vec<AccountAsset>,
    pub positions: Vec<AccountPosition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRate {
    pub symbol: String,
    pub maker_commission_rate: String,
    pub taker_commission_rate: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountConfiguration {
    pub fee_tier: u32,
    pub can_trade: bool,
    pub can_deposit: bool,
    pub can_withdraw: bool,
    pub dual_side_position: bool,
    pub update_time: i64,
    pub multi_assets_margin: bool,
    pub trade_group_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymbolConfiguration {
    pub symbol: String,
    pub margin_type: String,
    pub is_auto_add_margin: serde_json::Value,
    pub leverage: u32,
    pub max_notional_value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub bracket: u32,
    pub initial_leverage: u32,
    pub notional_cap: f64,
    pub notional_floor: f64,
    pub maint_margin_ratio: f64,
    pub cum: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageBracket {
    pub symbol: String,
    /// Present only when the account's bracket has been adjusted.
    #[serde(default)]
    pub notional_coef: Option<f64>,
    pub brackets: Vec<Bracket>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    #[serde(default)]
    pub symbol: String,
    pub income_type: String,
    pub income: String,
    pub asset: String,
    #[serde(default)]
    pub info: String,
    pub time: i64,
    pub tran_id: serde_json::Value,
    #[serde(default)]
    pub trade_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingIndicator {
    pub is_locked: bool,
    pub planned_recover_time: i64,
    pub indicator: String,
    pub value: f64,
    pub trigger_value: f64,
}

/// Quantitative trading-rule indicators, keyed by symbol (or `ACCOUNT`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingStatus {
    pub indicators: HashMap<String, Vec<TradingIndicator>>,
    pub update_time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadId {
    pub avg_cost_timestamp_of_last30d: i64,
    pub download_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadLink {
    pub download_id: String,
    /// `completed` or `processing`.
    pub status: String,
    pub url: String,
    pub notified: bool,
    pub expiration_timestamp: i64,
    pub is_expired: Option<bool>,
}

impl DownloadLink {
    pub fn is_ready(&self) -> bool {
        self.status == "completed" && !self.url.is_empty()
    }
}

/// Direction of a spot ↔ futures wallet transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    SpotToUsdm,
    UsdmToSpot,
    SpotToCoinm,
    CoinmToSpot,
    Other(i32),
}

impl From<i32> for TransferDirection {
    fn from(code: i32) -> Self {
        match code {
            1 => Self::SpotToUsdm,
            2 => Self::UsdmToSpot,
            3 => Self::SpotToCoinm,
            4 => Self::CoinmToSpot,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferRecord {
    pub asset: String,
    pub tran_id: i64,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub timestamp: i64,
    /// `PENDING`, `CONFIRMED` or `FAILED`.
    pub status: String,
}

impl TransferRecord {
    pub fn direction(&self) -> TransferDirection {
        TransferDirection::from(self.kind)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferHistory {
    pub rows: Vec<TransferRecord>,
    pub total: u64,
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub symbol: String,
    pub status: OrderStatus,
    pub client_order_id: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub orig_qty: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub cum_qty: Option<String>,
    #[serde(default)]
    pub cum_quote: String,
    pub time_in_force: TimeInForce,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub orig_type: Option<OrderType>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub close_position: bool,
    pub side: OrderSide,
    #[serde(default)]
    pub position_side: Option<PositionSide>,
    #[serde(default)]
    pub stop_price: String,
    #[serde(default)]
    pub working_type: Option<WorkingType>,
    #[serde(default)]
    pub price_protect: bool,
    #[serde(default)]
    pub activate_price: Option<String>,
    #[serde(default)]
    pub price_rate: Option<String>,
    #[serde(default)]
    pub update_time: i64,
    #[serde(default)]
    pub price_match: Option<PriceMatch>,
    #[serde(default, rename = "selfTradePreventionMode")]
    pub stp_mode: Option<StpMode>,
    #[serde(default)]
    pub good_till_date: i64,
}

/// One element of a batch place/modify response: batches are not atomic, so every order
/// either succeeds or carries its own error envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Accepted(Box<OrderResponse>),
    Rejected { code: i64, msg: String },
}

impl BatchOutcome {
    pub fn order(&self) -> Option<&OrderResponse> {
        match self {
            Self::Accepted(order) => Some(order),
            Self::Rejected { .. } => None,
        }
    }
}

/// Message-only acknowledgement (`{"code": 200, "msg": "success"}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Acknowledgement {
    pub code: i64,
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownCancelAll {
    pub symbol: String,
    pub countdown_time: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTrade {
    pub buyer: bool,
    pub commission: String,
    pub commission_asset: String,
    pub id: i64,
    pub maker: bool,
    pub order_id: i64,
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    pub realized_pnl: String,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub symbol: String,
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageChange {
    pub symbol: String,
    pub leverage: u32,
    pub max_notional_value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PositionMarginChange {
    pub code: i64,
    pub msg: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionRisk {
    pub symbol: String,
    pub position_side: Option<PositionSide>,
    pub position_amt: String,
    pub entry_price: String,
    pub break_even_price: String,
    pub mark_price: String,
    #[serde(alias = "unrealizedProfit")]
    pub un_realized_profit: String,
    pub liquidation_price: String,
    pub isolated_margin: String,
    pub notional: String,
    pub margin_asset: Option<String>,
    pub isolated_wallet: String,
    pub initial_margin: Option<String>,
    pub maint_margin: Option<String>,
    pub position_initial_margin: Option<String>,
    pub open_order_initial_margin: Option<String>,
    pub adl: Option<u32>,
    pub bid_notional: Option<String>,
    pub ask_notional: Option<String>,
    pub leverage: Option<String>,
    pub max_notional_value: Option<String>,
    pub margin_type: Option<String>,
    pub is_auto_add_margin: Option<String>,
    pub update_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdlLevels {
    #[serde(rename = "LONG")]
    pub long: Option<u8>,
    #[serde(rename = "SHORT")]
    pub short: Option<u8>,
    /// One-way mode.
    #[serde(rename = "BOTH")]
    pub both: Option<u8>,
    /// Hedge-mode placeholder reported for isolated positions.
    #[serde(rename = "HEDGE")]
    pub hedge: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdlQuantile {
    pub symbol: String,
    pub adl_quantile: AdlLevels,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMarginHistory {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub delta_type: String,
    pub amount: String,
    pub asset: String,
    pub time: i64,
    pub position_side: PositionSide,
}

// ---------------------------------------------------------------------------
// Convert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPair {
    pub from_asset: String,
    pub to_asset: String,
    pub from_asset_min_amount: String,
    pub from_asset_max_amount: String,
    pub to_asset_min_amount: String,
    pub to_asset_max_amount: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertQuote {
    pub quote_id: String,
    pub ratio: String,
    pub inverse_ratio: String,
    pub valid_timestamp: i64,
    pub to_amount: String,
    pub from_amount: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertAccepted {
    pub order_id: String,
    pub create_time: i64,
    pub order_status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOrderStatus {
    pub order_id: String,
    pub order_status: String,
    pub from_asset: String,
    pub from_amount: String,
    pub to_asset: String,
    pub to_amount: String,
    pub ratio: String,
    pub inverse_ratio: String,
    pub create_time: i64,
}

// ---------------------------------------------------------------------------
// Portfolio margin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PmAccountInfo {
    pub max_withdraw_amount_usd: String,
    pub asset: String,
    pub max_withdraw_amount: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::decode_json;
    use serde_json::json;

    #[test]
    fn kline_decodes_from_positional_array() {
        let row = json!([
            1499040000000_i64,
            "0.01634790",
            "0.80000000",
            "0.01575800",
            "0.01577100",
            "148976.11427815",
            1499644799999_i64,
            "2434.19055334",
            308,
            "1756.87402397",
            "28.46694368",
            "17928899.62484339"
        ]);
        let kline: Kline = decode_json(row).unwrap();
        assert_eq!(kline.open_time, 1499040000000);
        assert_eq!(kline.close, "0.01577100");
        assert_eq!(kline.number_of_trades, 308);
        assert_eq!(kline.ignore, "17928899.62484339");
    }

    #[test]
    fn order_response_decodes_documented_shape() {
        let body = json!({
            "clientOrderId": "testOrder",
            "cumQty": "0",
            "cumQuote": "0",
            "executedQty": "0",
            "orderId": 22542179,
            "avgPrice": "0.00000",
            "origQty": "10",
            "price": "0",
            "reduceOnly": false,
            "side": "BUY",
            "positionSide": "SHORT",
            "status": "NEW",
            "stopPrice": "9300",
            "closePosition": false,
            "symbol": "BTCUSDT",
            "timeInForce": "GTD",
            "type": "TRAILING_STOP_MARKET",
            "origType": "TRAILING_STOP_MARKET",
            "activatePrice": "9020",
            "priceRate": "0.3",
            "updateTime": 1566818724722_i64,
            "workingType": "CONTRACT_PRICE",
            "priceProtect": false,
            "priceMatch": "NONE",
            "selfTradePreventionMode": "NONE",
            "goodTillDate": 1693207680000_i64
        });
        let order: OrderResponse = decode_json(body).unwrap();
        assert_eq!(order.order_id, 22542179);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.order_type, OrderType::TrailingStopMarket);
        assert_eq!(order.time_in_force, TimeInForce::Gtd);
        assert_eq!(order.position_side, Some(PositionSide::Short));
        assert_eq!(order.stp_mode, Some(StpMode::None));
    }

    #[test]
    fn batch_outcome_separates_rejections() {
        let outcomes: Vec<BatchOutcome> = decode_json(json!([
            {"code": -2022, "msg": "ReduceOnly Order is rejected."},
            {
                "orderId": 1, "symbol": "BTCUSDT", "status": "NEW", "clientOrderId": "x",
                "timeInForce": "GTC", "type": "LIMIT", "side": "SELL"
            }
        ]))
        .unwrap();
        assert!(matches!(outcomes[0], BatchOutcome::Rejected { code: -2022, .. }));
        assert_eq!(outcomes[1].order().map(|o| o.order_id), Some(1));
    }

    #[test]
    fn transfer_direction_maps_type_codes() {
        assert_eq!(TransferDirection::from(1), TransferDirection::SpotToUsdm);
        assert_eq!(TransferDirection::from(2), TransferDirection::UsdmToSpot);
        assert_eq!(TransferDirection::from(9), TransferDirection::Other(9));
    }

    #[test]
    fn download_link_readiness() {
        let processing: DownloadLink = decode_json(json!({
            "downloadId": "545923594199212032",
            "status": "processing",
            "url": "",
            "notified": false,
            "expirationTimestamp": -1,
            "isExpired": null
        }))
        .unwrap();
        assert!(!processing.is_ready());
    }
}
