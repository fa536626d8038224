//! Typed wrappers over [`RestClient`], one file per endpoint group.
//!
//! Every wrapper builds its [`Params`](crate::core::kernel::Params) explicitly, in the order
//! the exchange documents, and lets the transport sign and send it.

mod account;
mod convert;
mod listen_key;
mod market_data;
mod portfolio_margin;
mod trade;

pub use account::IncomeQuery;
pub use convert::ConvertAmount;
pub use listen_key::ListenKeySource;
pub use market_data::StatsQuery;
pub use trade::{HistoryQuery, TradeQuery, MAX_BATCH_ORDERS};

use crate::core::kernel::RestClient;

/// REST API operations for Binance USDⓈ-M futures.
pub struct BinancePerpRestClient<R: RestClient> {
    rest: R,
}

impl<R: RestClient> BinancePerpRestClient<R> {
    /// Create a new REST client wrapper
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    /// Underlying transport.
    pub fn inner(&self) -> &R {
        &self.rest
    }
}

/// Revision of endpoints that exist under several `/fapi/vN` prefixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiVersion {
    V2,
    #[default]
    V3,
}

impl ApiVersion {
    pub(crate) fn path(self, resource: &str) -> String {
        match self {
            Self::V2 => format!("/fapi/v2/{}", resource),
            Self::V3 => format!("/fapi/v3/{}", resource),
        }
    }
}

/// Time-window and page-size filters shared by the history endpoints.
///
/// Non-positive values are left out of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start_time: i64,
    pub end_time: i64,
    pub limit: i64,
}

impl TimeRange {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start(mut self, start_time: i64) -> Self {
        self.start_time = start_time;
        self
    }

    #[must_use]
    pub fn end(mut self, end_time: i64) -> Self {
        self.end_time = end_time;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn apply(&self, params: &mut crate::core::kernel::Params) {
        params.push_positive("startTime", self.start_time);
        params.push_positive("endTime", self.end_time);
        params.push_positive("limit", self.limit);
    }
}
