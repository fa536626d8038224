// Core modules - one responsibility per file
pub mod codec; // impl WsCodec (event classifier)
pub mod events; // serde structs ← stream payloads
pub mod requests; // order request builders
pub mod rest; // typed wrappers around RestClient
pub mod streams; // stream names and URLs
pub mod types; // serde structs ← REST responses
pub mod user_stream; // listen-key lifecycle

pub mod builder;
pub mod connector;

// Re-export main types for easier importing
pub use builder::{build_connector, build_connector_with_stream_config, build_rest_client};
pub use codec::{BinancePerpCodec, StreamEvent};
pub use connector::BinancePerpConnector;
pub use requests::{ModifyOrderRequest, NewOrderRequest, OrderRef};
pub use rest::{
    ApiVersion, BinancePerpRestClient, ConvertAmount, HistoryQuery, IncomeQuery,
    ListenKeySource, StatsQuery, TimeRange, TradeQuery,
};
pub use user_stream::{UserDataStream, UserStreamConfig};
