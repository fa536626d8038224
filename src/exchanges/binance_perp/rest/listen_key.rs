use super::BinancePerpRestClient;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Issues, extends and revokes user-data listen keys.
///
/// Implemented by [`BinancePerpRestClient`] with signed calls, so a client without
/// credentials fails with [`ExchangeError::AuthenticationRequired`] before anything is sent.
/// The user-data stream only depends on this trait so tests can script key rotation
/// without a server.
#[async_trait]
pub trait ListenKeySource: Send + Sync + 'static {
    /// Obtain a listen key. While a key is alive the exchange hands back the same one.
    async fn create_listen_key(&self) -> Result<String, ExchangeError>;

    /// Extend the validity of the current key by 60 minutes.
    async fn keepalive_listen_key(&self) -> Result<String, ExchangeError>;

    /// Revoke the current key.
    async fn close_listen_key(&self) -> Result<(), ExchangeError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListenKeyResponse {
    listen_key: String,
}

#[async_trait]
impl<R: RestClient + 'static> ListenKeySource for BinancePerpRestClient<R> {
    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    async fn create_listen_key(&self) -> Result<String, ExchangeError> {
        let response: ListenKeyResponse = self
            .rest
            .post_json("/fapi/v1/listenKey", Params::new(), true)
            .await?;
        debug!("listen key issued");
        Ok(response.listen_key)
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    async fn keepalive_listen_key(&self) -> Result<String, ExchangeError> {
        let response: ListenKeyResponse = self
            .rest
            .put_json("/fapi/v1/listenKey", Params::new(), true)
            .await?;
        Ok(response.listen_key)
    }

    #[instrument(skip(self), fields(exchange = "binance_perp"))]
    async fn close_listen_key(&self) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .rest
            .delete_json("/fapi/v1/listenKey", Params::new(), true)
            .await?;
        Ok(())
    }
}
