use crate::core::config::DEFAULT_RECV_WINDOW_MS;
use crate::core::errors::ExchangeError;
use crate::core::kernel::clock::ClockSkew;
use crate::core::kernel::params::{ParamOrder, Params};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Result type for signing operations.
pub type SignatureResult = Result<SignedQuery, ExchangeError>;

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn hmac_sha256_hex(secret: &[u8], payload: &str) -> Result<String, ExchangeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Request authentication for one account.
///
/// Implementations hold no mutable state; one instance is shared across every request
/// of a client and may sign concurrently.
pub trait Signer: Send + Sync {
    /// API key sent in [`API_KEY_HEADER`].
    fn api_key(&self) -> &str;

    /// Layout of the canonical string this exchange signs.
    fn param_order(&self) -> ParamOrder {
        ParamOrder::AsSupplied
    }

    /// Signature over an already canonical payload.
    fn sign(&self, payload: &str) -> Result<String, ExchangeError>;

    /// Headers attached to signed and public requests alike.
    fn auth_headers(&self) -> HashMap<String, String> {
        HashMap::from([(API_KEY_HEADER.to_string(), self.api_key().to_string())])
    }
}

/// HMAC-SHA256 signer producing lowercase hex signatures.
#[derive(Debug)]
pub struct HmacSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
    order: ParamOrder,
}

impl HmacSigner {
    pub fn new(api_key: String, secret_key: String, order: ParamOrder) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
            order,
        }
    }
}

impl Signer for HmacSigner {
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    fn param_order(&self) -> ParamOrder {
        self.order
    }

    fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        hmac_sha256_hex(self.secret_key.expose_secret().as_bytes(), payload)
    }
}

/// A signed, ready-to-send query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    /// Exactly the bytes the signature was computed over.
    pub canonical: String,
    pub signature: String,
}

impl SignedQuery {
    /// `canonical&signature=<hex>`; the canonical part is never re-encoded.
    pub fn to_query_string(&self) -> String {
        format!(
            "{}&signature={}",
            self.canonical,
            urlencoding::encode(&self.signature)
        )
    }
}

/// Turns a parameter set into a signed query: injects `recvWindow` and a skew-corrected
/// `timestamp`, renders the canonical string and signs it.
#[derive(Clone)]
pub struct RequestAuthenticator {
    signer: Arc<dyn Signer>,
    clock: Arc<ClockSkew>,
    recv_window: u64,
}

impl std::fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("recv_window", &self.recv_window)
            .field("clock_offset_ms", &self.clock.offset_ms())
            .finish_non_exhaustive()
    }
}

impl RequestAuthenticator {
    pub fn new(signer: Arc<dyn Signer>, clock: Arc<ClockSkew>) -> Self {
        Self {
            signer,
            clock,
            recv_window: DEFAULT_RECV_WINDOW_MS,
        }
    }

    pub fn with_recv_window(mut self, recv_window: u64) -> Self {
        self.recv_window = recv_window;
        self
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn clock(&self) -> &Arc<ClockSkew> {
        &self.clock
    }

    /// Sign with a fresh timestamp from the shared clock.
    pub fn sign(&self, params: Params) -> SignatureResult {
        self.sign_at(params, self.clock.now_ms())
    }

    /// Sign with an explicit timestamp.
    pub fn sign_at(&self, mut params: Params, timestamp_ms: i64) -> SignatureResult {
        params.insert_if_absent("recvWindow", self.recv_window);
        params.insert("timestamp", timestamp_ms);

        let canonical = params.encode(self.signer.param_order());
        let signature = self.signer.sign(&canonical)?;
        Ok(SignedQuery {
            canonical,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example published in the exchange's API documentation.
    const DOC_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
    const DOC_PAYLOAD: &str = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
    const DOC_SIGNATURE: &str = "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71";

    #[test]
    fn rfc4231_case_2() {
        let sig = hmac_sha256_hex(b"Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn documented_request_signature() {
        let signer = HmacSigner::new("key".into(), DOC_SECRET.into(), ParamOrder::AsSupplied);
        assert_eq!(signer.sign(DOC_PAYLOAD).unwrap(), DOC_SIGNATURE);
    }

    #[test]
    fn signature_is_lowercase_hex() {
        let sig = hmac_sha256_hex(b"secret", "").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn authenticator_reproduces_documented_request() {
        let signer = Arc::new(HmacSigner::new(
            "key".into(),
            DOC_SECRET.into(),
            ParamOrder::AsSupplied,
        ));
        let auth = RequestAuthenticator::new(signer, Arc::new(ClockSkew::new()));
        let params = Params::new()
            .with("symbol", "LTCBTC")
            .with("side", "BUY")
            .with("type", "LIMIT")
            .with("timeInForce", "GTC")
            .with("quantity", 1)
            .with("price", "0.1");

        let signed = auth.sign_at(params, 1_499_827_319_559).unwrap();
        assert_eq!(signed.canonical, DOC_PAYLOAD);
        assert_eq!(signed.signature, DOC_SIGNATURE);
        assert_eq!(
            signed.to_query_string(),
            format!("{}&signature={}", DOC_PAYLOAD, DOC_SIGNATURE)
        );
    }

    #[test]
    fn caller_recv_window_wins() {
        let signer = Arc::new(HmacSigner::new("k".into(), "s".into(), ParamOrder::AsSupplied));
        let auth = RequestAuthenticator::new(signer, Arc::new(ClockSkew::new()));
        let signed = auth
            .sign_at(Params::new().with("recvWindow", 2_000), 42)
            .unwrap();
        assert_eq!(signed.canonical, "recvWindow=2000&timestamp=42");
    }

    #[test]
    fn timestamp_includes_clock_offset() {
        let signer = Arc::new(HmacSigner::new("k".into(), "s".into(), ParamOrder::AsSupplied));
        let auth = RequestAuthenticator::new(signer, Arc::new(ClockSkew::with_offset(3_600_000)));
        let before = ClockSkew::local_now_ms();
        let signed = auth.sign(Params::new()).unwrap();
        let ts: i64 = signed
            .canonical
            .rsplit("timestamp=")
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(ts >= before + 3_600_000);
    }

    #[test]
    fn sorted_signer_sorts_canonical_string() {
        let signer = Arc::new(HmacSigner::new("k".into(), "s".into(), ParamOrder::Sorted));
        let auth = RequestAuthenticator::new(signer, Arc::new(ClockSkew::new()));
        let signed = auth
            .sign_at(Params::new().with("symbol", "X").with("limit", 5), 7)
            .unwrap();
        assert_eq!(
            signed.canonical,
            "limit=5&recvWindow=5000&symbol=X&timestamp=7"
        );
    }

    #[test]
    fn auth_header_carries_api_key() {
        let signer = HmacSigner::new("my-api-key".into(), "s".into(), ParamOrder::AsSupplied);
        let headers = signer.auth_headers();
        assert_eq!(headers.get(API_KEY_HEADER).map(String::as_str), Some("my-api-key"));
    }
}
