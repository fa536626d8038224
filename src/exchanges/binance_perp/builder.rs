use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    HmacSigner, ParamOrder, ReqwestRest, RestClientBuilder, RestClientConfig, StreamConfig,
};
use crate::exchanges::binance_perp::connector::BinancePerpConnector;
use crate::exchanges::binance_perp::rest::BinancePerpRestClient;
use crate::exchanges::binance_perp::streams::{TESTNET_WS_BASE_URL, WS_BASE_URL};
use std::sync::Arc;
use tracing::debug;

/// Production futures REST host.
pub const REST_BASE_URL: &str = "https://fapi.binance.com";
/// Testnet futures REST host.
pub const TESTNET_REST_BASE_URL: &str = "https://testnet.binancefuture.com";
/// Spot REST host; serves the futures transfer history.
pub const SPOT_BASE_URL: &str = "https://api.binance.com";
/// Unsigned endpoint used to recalibrate the clock offset.
pub const SERVER_TIME_ENDPOINT: &str = "/fapi/v1/time";

/// REST base URL: an explicit override wins, then the testnet flag, then production.
fn rest_base_url(config: &ExchangeConfig) -> String {
    match (&config.base_url, config.testnet) {
        (Some(url), _) => url.clone(),
        (None, true) => TESTNET_REST_BASE_URL.to_string(),
        (None, false) => REST_BASE_URL.to_string(),
    }
}

fn ws_base_url(config: &ExchangeConfig) -> String {
    match (&config.ws_url, config.testnet) {
        (Some(url), _) => url.clone(),
        (None, true) => TESTNET_WS_BASE_URL.to_string(),
        (None, false) => WS_BASE_URL.to_string(),
    }
}

/// Build the REST wrapper alone.
pub fn build_rest_client(
    config: &ExchangeConfig,
) -> Result<BinancePerpRestClient<ReqwestRest>, ExchangeError> {
    let rest_config = RestClientConfig::new(rest_base_url(config), "binance_perp".to_string())
        .with_timeout(30)
        .with_spot_base_url(SPOT_BASE_URL.to_string())
        .with_server_time_endpoint(SERVER_TIME_ENDPOINT.to_string())
        .with_recv_window(config.recv_window);

    let mut rest_builder = RestClientBuilder::new(rest_config);

    // Add authentication if credentials are provided
    if config.has_credentials() {
        let signer = Arc::new(HmacSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
            ParamOrder::AsSupplied,
        ));
        rest_builder = rest_builder.with_signer(signer);
    } else {
        debug!("no credentials configured, signed endpoints will be rejected");
    }

    Ok(BinancePerpRestClient::new(rest_builder.build()?))
}

/// Create a connector with REST and streaming support
pub fn build_connector(config: ExchangeConfig) -> Result<BinancePerpConnector, ExchangeError> {
    build_connector_with_stream_config(config, StreamConfig::default())
}

/// Same as [`build_connector`], with explicit stream settings (channel capacity, timeouts,
/// error hook).
pub fn build_connector_with_stream_config(
    config: ExchangeConfig,
    stream_config: StreamConfig,
) -> Result<BinancePerpConnector, ExchangeError> {
    let rest = build_rest_client(&config)?;
    Ok(BinancePerpConnector::new(
        rest,
        ws_base_url(&config),
        stream_config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_selection() {
        let production = ExchangeConfig::read_only();
        assert_eq!(rest_base_url(&production), REST_BASE_URL);
        assert_eq!(ws_base_url(&production), WS_BASE_URL);

        let testnet = ExchangeConfig::read_only().testnet(true);
        assert_eq!(rest_base_url(&testnet), TESTNET_REST_BASE_URL);
        assert_eq!(ws_base_url(&testnet), TESTNET_WS_BASE_URL);

        let custom = ExchangeConfig::read_only()
            .testnet(true)
            .base_url("http://127.0.0.1:9000".to_string())
            .ws_url("ws://127.0.0.1:9001".to_string());
        assert_eq!(rest_base_url(&custom), "http://127.0.0.1:9000");
        assert_eq!(ws_base_url(&custom), "ws://127.0.0.1:9001");
    }

    #[test]
    fn test_read_only_client_has_no_signer() {
        let client = build_rest_client(&ExchangeConfig::read_only()).unwrap();
        assert!(!client.inner().has_signer());
        assert_eq!(
            client.inner().config().spot_base_url.as_deref(),
            Some(SPOT_BASE_URL)
        );
    }

    #[test]
    fn test_credentials_enable_signing() {
        let config = ExchangeConfig::new("key".to_string(), "secret".to_string()).recv_window(10_000);
        let client = build_rest_client(&config).unwrap();
        assert!(client.inner().has_signer());
        assert_eq!(client.inner().config().recv_window, 10_000);
    }
}
