use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Default tolerance, in milliseconds, the server allows between our timestamp and its clock.
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;

/// Credentials and endpoint overrides for one account.
///
/// The key pair is held in [`Secret`] so it never shows up in `Debug` output, logs or
/// serialized configuration.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub testnet: bool,
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub recv_window: u64,
}

impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("testnet", &self.testnet)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("ws_url", &self.ws_url)?;
        state.serialize_field("recv_window", &self.recv_window)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawConfig {
            api_key: String,
            secret_key: String,
            #[serde(default)]
            testnet: bool,
            #[serde(default)]
            base_url: Option<String>,
            #[serde(default)]
            ws_url: Option<String>,
            #[serde(default = "default_recv_window")]
            recv_window: u64,
        }

        let raw = RawConfig::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(raw.api_key),
            secret_key: Secret::new(raw.secret_key),
            testnet: raw.testnet,
            base_url: raw.base_url,
            ws_url: raw.ws_url,
            recv_window: raw.recv_window,
        })
    }
}

const fn default_recv_window() -> u64 {
    DEFAULT_RECV_WINDOW_MS
}

impl ExchangeConfig {
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet: false,
            base_url: None,
            ws_url: None,
            recv_window: DEFAULT_RECV_WINDOW_MS,
        }
    }

    /// Read configuration from the process environment.
    ///
    /// - `{PREFIX}_API_KEY`, `{PREFIX}_SECRET_KEY` (required)
    /// - `{PREFIX}_TESTNET` (optional, `true`/`false`)
    /// - `{PREFIX}_BASE_URL`, `{PREFIX}_WS_URL` (optional overrides)
    /// - `{PREFIX}_RECV_WINDOW` (optional, milliseconds)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let var = |name: &str| format!("{}_{}", prefix, name);

        let api_key_var = var("API_KEY");
        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;

        let secret_key_var = var("SECRET_KEY");
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let testnet = env::var(var("TESTNET"))
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let recv_window = match env::var(var("RECV_WINDOW")) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!("{}: {}", var("RECV_WINDOW"), e))
            })?,
            Err(_) => DEFAULT_RECV_WINDOW_MS,
        };

        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            testnet,
            base_url: env::var(var("BASE_URL")).ok(),
            ws_url: env::var(var("WS_URL")).ok(),
            recv_window,
        })
    }

    /// Load `.env` (if present) and then read the environment.
    ///
    /// **Security Warning**: keep `.env` out of version control.
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load env file '{}': {}",
                    path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Configuration for public market data only.
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.expose_secret().is_empty() && !self.secret_key.expose_secret().is_empty()
    }

    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn ws_url(mut self, ws_url: String) -> Self {
        self.ws_url = Some(ws_url);
        self
    }

    #[must_use]
    pub const fn recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    /// Exposes the API key; use only to build a signer.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Exposes the secret key; use only to build a signer.
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_redacts_credentials() {
        let config = ExchangeConfig::new("my-key".to_string(), "my-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("my-key"));
        assert!(!json.contains("my-secret"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = ExchangeConfig::new("my-key".to_string(), "my-secret".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("my-secret"));
    }

    #[test]
    fn read_only_has_no_credentials() {
        let config = ExchangeConfig::read_only();
        assert!(!config.has_credentials());
        assert_eq!(config.recv_window, DEFAULT_RECV_WINDOW_MS);
    }

    #[test]
    fn deserialize_fills_defaults() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"api_key":"k","secret_key":"s"}"#).unwrap();
        assert!(config.has_credentials());
        assert!(!config.testnet);
        assert_eq!(config.recv_window, 5_000);
    }

    #[test]
    fn from_env_reads_prefixed_variables() {
        env::set_var("USDMCFGTEST_API_KEY", "env-key");
        env::set_var("USDMCFGTEST_SECRET_KEY", "env-secret");
        env::set_var("USDMCFGTEST_TESTNET", "true");
        env::set_var("USDMCFGTEST_RECV_WINDOW", "10000");

        let config = ExchangeConfig::from_env("usdmcfgtest").unwrap();
        assert_eq!(config.api_key(), "env-key");
        assert!(config.testnet);
        assert_eq!(config.recv_window, 10_000);
    }

    #[test]
    fn from_env_reports_missing_key() {
        let err = ExchangeConfig::from_env("usdmcfgmissing").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvironmentVariable(v) if v == "USDMCFGMISSING_API_KEY"));
    }
}
