use crate::core::errors::{ErrorEnvelope, ExchangeError};
use crate::core::kernel::clock::ClockSkew;
use crate::core::kernel::params::{ParamOrder, Params};
use crate::core::kernel::signer::{RequestAuthenticator, Signer};
use crate::core::config::DEFAULT_RECV_WINDOW_MS;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Which API host a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// Derivatives REST host.
    Futures,
    /// Spot REST host (a handful of account endpoints live there).
    Spot,
}

/// Decode a JSON document into a typed response.
pub fn decode_json<T: DeserializeOwned>(value: Value) -> Result<T, ExchangeError> {
    serde_json::from_value(value).map_err(|e| {
        ExchangeError::DeserializationError(format!("Failed to deserialize JSON: {}", e))
    })
}

/// HTTP transport used by the typed endpoint wrappers.
///
/// Every parameter travels in the query string, for reads and writes alike. Authenticated
/// calls are signed over the exact query that is sent.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Issue a request and return the decoded JSON body.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `host` - Target API host
    /// * `endpoint` - Path, starting with `/`
    /// * `params` - Request parameters
    /// * `authenticated` - Whether to sign the request
    async fn request(
        &self,
        method: Method,
        host: Host,
        endpoint: &str,
        params: Params,
        authenticated: bool,
    ) -> Result<Value, ExchangeError>;

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        let value = self
            .request(Method::GET, Host::Futures, endpoint, params, authenticated)
            .await?;
        decode_json(value)
    }

    async fn post_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        let value = self
            .request(Method::POST, Host::Futures, endpoint, params, authenticated)
            .await?;
        decode_json(value)
    }

    async fn put_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        let value = self
            .request(Method::PUT, Host::Futures, endpoint, params, authenticated)
            .await?;
        decode_json(value)
    }

    async fn delete_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: Params,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        let value = self
            .request(Method::DELETE, Host::Futures, endpoint, params, authenticated)
            .await?;
        decode_json(value)
    }

    /// Signed GET against the spot host.
    async fn spot_get_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        params: Params,
    ) -> Result<T, ExchangeError> {
        let value = self
            .request(Method::GET, Host::Spot, endpoint, params, true)
            .await?;
        decode_json(value)
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL of the derivatives API
    pub base_url: String,
    /// Base URL of the spot API, if spot endpoints are used
    pub spot_base_url: Option<String>,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Unsigned endpoint answering `{"serverTime": ms}`, used to recalibrate the clock
    pub server_time_endpoint: Option<String>,
    /// Default `recvWindow` for signed requests, in milliseconds
    pub recv_window: u64,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            spot_base_url: None,
            exchange_name,
            timeout_seconds: 30,
            user_agent: "binance-usdm/0.1".to_string(),
            server_time_endpoint: None,
            recv_window: DEFAULT_RECV_WINDOW_MS,
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_spot_base_url(mut self, spot_base_url: String) -> Self {
        self.spot_base_url = Some(spot_base_url);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_server_time_endpoint(mut self, endpoint: String) -> Self {
        self.server_time_endpoint = Some(endpoint);
        self
    }

    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Option<Arc<ClockSkew>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Share a clock offset with other clients of the same account
    pub fn with_clock(mut self, clock: Arc<ClockSkew>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        let clock = self.clock.unwrap_or_default();
        let auth = self.signer.map(|signer| {
            RequestAuthenticator::new(signer, clock.clone())
                .with_recv_window(self.config.recv_window)
        });

        Ok(ReqwestRest {
            client,
            config: self.config,
            auth,
            clock,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    auth: Option<RequestAuthenticator>,
    clock: Arc<ClockSkew>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<ClockSkew> {
        &self.clock
    }

    pub fn has_signer(&self) -> bool {
        self.auth.is_some()
    }

    fn base_url(&self, host: Host) -> Result<&str, ExchangeError> {
        match host {
            Host::Futures => Ok(&self.config.base_url),
            Host::Spot => self.config.spot_base_url.as_deref().ok_or_else(|| {
                ExchangeError::ConfigurationError("spot base URL is not configured".to_string())
            }),
        }
    }

    fn param_order(&self) -> ParamOrder {
        self.auth
            .as_ref()
            .map_or(ParamOrder::AsSupplied, |auth| auth.signer().param_order())
    }

    /// Fetch the server clock and store the new offset.
    ///
    /// Called automatically after a timestamp-skew rejection; the rejected request is not
    /// retried.
    #[instrument(skip(self), fields(exchange = %self.config.exchange_name))]
    pub async fn resync_clock(&self) -> Result<i64, ExchangeError> {
        let endpoint = self.config.server_time_endpoint.as_deref().ok_or_else(|| {
            ExchangeError::ConfigurationError("server time endpoint is not configured".to_string())
        })?;

        let sent_at = ClockSkew::local_now_ms();
        let value = self
            .send(Method::GET, Host::Futures, endpoint, String::new())
            .await?;
        let received_at = ClockSkew::local_now_ms();

        let server_time = value
            .get("serverTime")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ExchangeError::DeserializationError(format!(
                    "server time response without serverTime: {}",
                    value
                ))
            })?;

        let offset = self.clock.calibrate(server_time, sent_at, received_at);
        debug!(offset_ms = offset, "clock offset recalibrated");
        Ok(offset)
    }

    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", body);

        let parsed = serde_json::from_str::<Value>(&body);
        match parsed {
            Ok(value) => {
                if let Some(envelope) = ErrorEnvelope::from_value(&value) {
                    if envelope.is_error() {
                        return Err(envelope.into());
                    }
                }
                if status.is_success() {
                    Ok(value)
                } else {
                    Err(ExchangeError::ApiError {
                        code: i32::from(status.as_u16()),
                        message: body,
                    })
                }
            }
            Err(e) if status.is_success() => Err(ExchangeError::DeserializationError(format!(
                "Failed to parse JSON response: {}",
                e
            ))),
            Err(_) => Err(ExchangeError::ApiError {
                code: i32::from(status.as_u16()),
                message: body,
            }),
        }
    }

    /// Send a request whose query string is already final.
    async fn send(
        &self,
        method: Method,
        host: Host,
        endpoint: &str,
        query: String,
    ) -> Result<Value, ExchangeError> {
        let base = self.base_url(host)?;
        let url = if query.is_empty() {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}{}?{}", base, endpoint, query)
        };

        let mut request = self.client.request(method, &url);
        if let Some(auth) = &self.auth {
            for (key, value) in auth.signer().auth_headers() {
                request = request.header(key, value);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint, param_count = params.len()))]
    async fn request(
        &self,
        method: Method,
        host: Host,
        endpoint: &str,
        params: Params,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        if !authenticated {
            let query = params.encode(self.param_order());
            return self.send(method, host, endpoint, query).await;
        }

        let auth = self
            .auth
            .as_ref()
            .ok_or(ExchangeError::AuthenticationRequired)?;
        let query = auth.sign(params)?.to_query_string();

        let result = self.send(method, host, endpoint, query).await;
        if let Err(err) = &result {
            if err.is_timestamp_skew() {
                warn!(error = %err, "request timestamp rejected, resynchronising clock");
                if let Err(sync_err) = self.resync_clock().await {
                    warn!(error = %sync_err, "clock resync failed");
                }
            }
        }
        result
    }
}
