//! User-data stream: listen-key lifecycle around a [`StreamConnection`].

use crate::core::errors::ExchangeError;
use crate::core::kernel::{StreamConfig, StreamConnection};
use crate::exchanges::binance_perp::codec::{BinancePerpCodec, StreamEvent};
use crate::exchanges::binance_perp::rest::ListenKeySource;
use crate::exchanges::binance_perp::streams::user_stream_url;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Keys expire 60 minutes after the last keep-alive.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(58 * 60);

/// Upper bound on revoking the listen key at shutdown.
const CLOSE_KEY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct UserStreamConfig {
    pub keepalive_interval: Duration,
    pub stream: StreamConfig,
}

impl Default for UserStreamConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            stream: StreamConfig::default(),
        }
    }
}

impl UserStreamConfig {
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }
}

/// A running user-data subscription.
///
/// Two tasks back it: a supervisor that forwards account events and rotates the listen
/// key when the exchange reports it expired, and a keep-alive that extends the key on a
/// fixed interval. Both stop with the stream's cancellation token; the supervisor then
/// revokes the key. Dropping the handle cancels it.
pub struct UserDataStream {
    token: CancellationToken,
    listen_key: watch::Receiver<String>,
    supervisor: Option<JoinHandle<()>>,
    keepalive: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for UserDataStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDataStream")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl UserDataStream {
    /// Obtain a listen key, connect to `{ws_base_url}/ws/{listenKey}` and start the
    /// supervisor and keep-alive tasks.
    ///
    /// Key creation and the first dial happen before this returns, so their errors surface
    /// here.
    #[instrument(skip_all, fields(exchange = "binance_perp"))]
    pub async fn start<S: ListenKeySource>(
        source: Arc<S>,
        ws_base_url: &str,
        codec: Arc<BinancePerpCodec>,
        config: UserStreamConfig,
        parent: &CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<StreamEvent>), ExchangeError> {
        if parent.is_cancelled() {
            return Err(ExchangeError::Cancelled);
        }
        let token = parent.child_token();

        let listen_key = until_cancelled(&token, source.create_listen_key()).await?;
        let (connection, events) = StreamConnection::open(
            &user_stream_url(ws_base_url, &listen_key),
            codec.clone(),
            config.stream.clone(),
            &token,
        )
        .await?;
        info!("user data stream connected");

        let (key_tx, key_rx) = watch::channel(listen_key);
        let (out_tx, out_rx) = mpsc::channel(config.stream.channel_capacity.max(1));

        let supervisor = Supervisor {
            source: source.clone(),
            ws_base_url: ws_base_url.to_string(),
            codec,
            stream_config: config.stream.clone(),
            token: token.clone(),
            listen_key: key_tx,
            out: out_tx,
        };
        let supervisor = tokio::spawn(supervisor.run(connection, events));
        let keepalive = tokio::spawn(keepalive_loop(
            source,
            config.keepalive_interval,
            config.stream,
            token.clone(),
        ));

        Ok((
            Self {
                token,
                listen_key: key_rx,
                supervisor: Some(supervisor),
                keepalive: Some(keepalive),
            },
            out_rx,
        ))
    }

    /// Listen key currently in use.
    pub fn listen_key(&self) -> String {
        self.listen_key.borrow().clone()
    }

    /// Observe key rotations.
    pub fn listen_key_watch(&self) -> watch::Receiver<String> {
        self.listen_key.clone()
    }

    /// Stop the stream. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until both background tasks have finished.
    pub async fn join(mut self) {
        if let Some(task) = self.supervisor.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "user stream supervisor aborted");
            }
        }
        if let Some(task) = self.keepalive.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "listen key keep-alive aborted");
            }
        }
    }
}

impl Drop for UserDataStream {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn until_cancelled<T>(
    token: &CancellationToken,
    fut: impl Future<Output = Result<T, ExchangeError>>,
) -> Result<T, ExchangeError> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(ExchangeError::Cancelled),
        result = fut => result,
    }
}

struct Supervisor<S: ListenKeySource> {
    source: Arc<S>,
    ws_base_url: String,
    codec: Arc<BinancePerpCodec>,
    stream_config: StreamConfig,
    token: CancellationToken,
    listen_key: watch::Sender<String>,
    out: mpsc::Sender<StreamEvent>,
}

impl<S: ListenKeySource> Supervisor<S> {
    async fn run(
        self,
        mut connection: StreamConnection<BinancePerpCodec>,
        mut events: mpsc::Receiver<StreamEvent>,
    ) {
        loop {
            let next = tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                next = events.recv() => next,
            };

            let Some(event) = next else {
                info!(state = ?connection.state(), "user data connection ended");
                break;
            };

            let expired = matches!(event, StreamEvent::ListenKeyExpired(_));
            if !self.forward(event).await {
                break;
            }

            if expired {
                warn!("listen key expired, rotating");
                connection.cancel();
                match self.reconnect().await {
                    Ok((next_connection, next_events)) => {
                        connection = next_connection;
                        events = next_events;
                    }
                    Err(ExchangeError::Cancelled) => break,
                    Err(e) => {
                        self.stream_config.report(&e);
                        break;
                    }
                }
            }
        }

        connection.cancel();
        drop(connection);
        self.token.cancel();

        let Self { source, out, .. } = self;
        drop(out);
        close_listen_key(source.as_ref()).await;
    }

    /// Hand one event to the consumer. `false` once the consumer is gone or the stream was
    /// cancelled mid-send.
    async fn forward(&self, event: StreamEvent) -> bool {
        tokio::select! {
            biased;
            () = self.token.cancelled() => false,
            sent = self.out.send(event) => {
                if sent.is_err() {
                    debug!("user stream consumer dropped");
                }
                sent.is_ok()
            }
        }
    }

    async fn reconnect(
        &self,
    ) -> Result<(StreamConnection<BinancePerpCodec>, mpsc::Receiver<StreamEvent>), ExchangeError> {
        let key = until_cancelled(&self.token, self.source.create_listen_key()).await?;
        let opened = StreamConnection::open(
            &user_stream_url(&self.ws_base_url, &key),
            self.codec.clone(),
            self.stream_config.clone(),
            &self.token,
        )
        .await?;
        self.listen_key.send_replace(key);
        info!("user data stream reconnected with a new listen key");
        Ok(opened)
    }
}

/// Best effort; the key expires on its own if this fails.
async fn close_listen_key<S: ListenKeySource>(source: &S) {
    match tokio::time::timeout(CLOSE_KEY_TIMEOUT, source.close_listen_key()).await {
        Ok(Ok(())) => debug!("listen key closed"),
        Ok(Err(e)) => debug!(error = %e, "failed to close listen key"),
        Err(_) => debug!("closing listen key timed out"),
    }
}

/// The timer is not reset when the supervisor rotates the key: the keep-alive call extends
/// whichever key is current for the account.
async fn keepalive_loop<S: ListenKeySource>(
    source: Arc<S>,
    interval: Duration,
    stream_config: StreamConfig,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => return,
            () = tokio::time::sleep(interval) => {}
        }

        match until_cancelled(&token, source.keepalive_listen_key()).await {
            Ok(_) => debug!("listen key extended"),
            Err(ExchangeError::Cancelled) => return,
            Err(e) => {
                stream_config.report(&e);
                return;
            }
        }
    }
}
