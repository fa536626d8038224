use super::BinancePerpRestClient;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Params, RestClient};
use crate::exchanges::binance_perp::types::PmAccountInfo;
use tracing::instrument;

impl<R: RestClient> BinancePerpRestClient<R> {
    /// Classic portfolio-margin account summary for one asset.
    #[instrument(skip(self), fields(exchange = "binance_perp", asset = %asset))]
    pub async fn pm_account_info(&self, asset: &str) -> Result<PmAccountInfo, ExchangeError> {
        let params = Params::new().with("asset", asset);
        self.rest
            .get_json("/fapi/v1/pmAccountInfo", params, true)
            .await
    }
}
