use crate::core::errors::ExchangeError;
use crate::core::kernel::{ReqwestRest, StreamConfig, StreamConnection};
use crate::exchanges::binance_perp::codec::{BinancePerpCodec, StreamEvent};
use crate::exchanges::binance_perp::rest::BinancePerpRestClient;
use crate::exchanges::binance_perp::streams::market_stream_url;
use crate::exchanges::binance_perp::user_stream::{
    UserDataStream, UserStreamConfig, DEFAULT_KEEPALIVE_INTERVAL,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Entry point bundling the REST wrapper with stream factories.
pub struct BinancePerpConnector {
    rest: Arc<BinancePerpRestClient<ReqwestRest>>,
    ws_base_url: String,
    codec: Arc<BinancePerpCodec>,
    stream_config: StreamConfig,
}

impl BinancePerpConnector {
    pub fn new(
        rest: BinancePerpRestClient<ReqwestRest>,
        ws_base_url: String,
        stream_config: StreamConfig,
    ) -> Self {
        Self {
            rest: Arc::new(rest),
            ws_base_url,
            codec: Arc::new(BinancePerpCodec),
            stream_config,
        }
    }

    /// REST endpoints.
    pub fn rest(&self) -> &BinancePerpRestClient<ReqwestRest> {
        &self.rest
    }

    pub fn ws_base_url(&self) -> &str {
        &self.ws_base_url
    }

    /// Open a market-data connection for `streams` (see
    /// [`names`](crate::exchanges::binance_perp::streams::names)).
    ///
    /// An empty list opens a bare socket; add streams with
    /// [`StreamConnection::subscribe`].
    #[instrument(skip(self, token), fields(exchange = "binance_perp", count = streams.len()))]
    pub async fn subscribe_market(
        &self,
        streams: &[String],
        token: &CancellationToken,
    ) -> Result<(StreamConnection<BinancePerpCodec>, mpsc::Receiver<StreamEvent>), ExchangeError>
    {
        let url = market_stream_url(&self.ws_base_url, streams);
        StreamConnection::open(&url, self.codec.clone(), self.stream_config.clone(), token).await
    }

    /// Start the user-data stream with the default keep-alive interval.
    pub async fn subscribe_user_data(
        &self,
        token: &CancellationToken,
    ) -> Result<(UserDataStream, mpsc::Receiver<StreamEvent>), ExchangeError> {
        self.subscribe_user_data_with(DEFAULT_KEEPALIVE_INTERVAL, token)
            .await
    }

    #[instrument(skip(self, token), fields(exchange = "binance_perp"))]
    pub async fn subscribe_user_data_with(
        &self,
        keepalive_interval: Duration,
        token: &CancellationToken,
    ) -> Result<(UserDataStream, mpsc::Receiver<StreamEvent>), ExchangeError> {
        let config = UserStreamConfig::default()
            .with_keepalive_interval(keepalive_interval)
            .with_stream_config(self.stream_config.clone());
        UserDataStream::start(
            self.rest.clone(),
            &self.ws_base_url,
            self.codec.clone(),
            config,
            token,
        )
        .await
    }
}
