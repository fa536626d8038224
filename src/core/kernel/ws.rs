use crate::core::errors::{ErrorEnvelope, ExchangeError};
use crate::core::kernel::codec::WsCodec;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Default capacity of the per-connection event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Callback for anomalies that do not end the stream (bad frames, unknown events).
pub type ErrorHook = Arc<dyn Fn(&ExchangeError) + Send + Sync>;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;
type SocketSource = SplitStream<Socket>;

/// Stream connection settings
#[derive(Clone)]
pub struct StreamConfig {
    /// Capacity of the bounded event channel; a full channel back-pressures the reader
    pub channel_capacity: usize,
    /// Upper bound on the dial
    pub connect_timeout: Duration,
    /// Upper bound on sending the close frame at teardown
    pub close_timeout: Duration,
    /// Optional sink for non-fatal errors, in addition to the log
    pub error_hook: Option<ErrorHook>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(1),
            error_hook: None,
        }
    }
}

impl std::fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfig")
            .field("channel_capacity", &self.channel_capacity)
            .field("connect_timeout", &self.connect_timeout)
            .field("close_timeout", &self.close_timeout)
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

impl StreamConfig {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExchangeError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    /// Log a non-fatal error and hand it to the hook.
    pub fn report(&self, err: &ExchangeError) {
        warn!(error = %err, "stream anomaly");
        if let Some(hook) = &self.error_hook {
            hook(err);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
    /// Terminal; the server sent an error envelope or the transport broke.
    Failed,
}

impl ConnectionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Why a reader task stopped.
#[derive(Debug)]
pub enum StreamExit {
    Cancelled,
    RemoteClosed,
    ConsumerDropped,
    Failed(ExchangeError),
}

/// One live WebSocket subscription.
///
/// A single background task owns the socket: it reads frames, answers pings, writes
/// control messages and forwards classified events into a bounded channel. The channel
/// closes exactly once, when that task ends. Dropping the connection cancels it.
pub struct StreamConnection<C: WsCodec> {
    url: String,
    codec: Arc<C>,
    token: CancellationToken,
    control: mpsc::UnboundedSender<Message>,
    next_id: AtomicU64,
    state: watch::Receiver<ConnectionState>,
    task: Option<JoinHandle<StreamExit>>,
}

impl<C: WsCodec> std::fmt::Debug for StreamConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("url", &self.url)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<C: WsCodec> StreamConnection<C> {
    /// Dial `url` and start the reader task.
    ///
    /// The connection lives under a child of `parent`; cancelling either ends it. Fails
    /// fast when `parent` is already cancelled, and nothing is spawned if the dial fails.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn open(
        url: &str,
        codec: Arc<C>,
        config: StreamConfig,
        parent: &CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<C::Message>), ExchangeError> {
        if parent.is_cancelled() {
            return Err(ExchangeError::Cancelled);
        }

        let token = parent.child_token();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let socket = tokio::select! {
            biased;
            () = token.cancelled() => return Err(ExchangeError::Cancelled),
            dialed = tokio::time::timeout(config.connect_timeout, connect_async(url)) => {
                match dialed {
                    Err(_) => {
                        return Err(ExchangeError::ConnectionTimeout(format!(
                            "dialing {} took longer than {:?}",
                            url, config.connect_timeout
                        )));
                    }
                    Ok(Err(e)) => {
                        return Err(ExchangeError::WebSocketError(format!(
                            "failed to connect to {}: {}",
                            url, e
                        )));
                    }
                    Ok(Ok((socket, _response))) => socket,
                }
            }
        };

        state_tx.send_replace(ConnectionState::Open);
        info!("stream connected");

        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let reader = Reader {
            codec: codec.clone(),
            config,
            token: token.clone(),
            events: event_tx,
            control: control_rx,
            state: state_tx,
        };
        let task = tokio::spawn(reader.run(socket));

        Ok((
            Self {
                url: url.to_string(),
                codec,
                token,
                control: control_tx,
                next_id: AtomicU64::new(1),
                state: state_rx,
                task: Some(task),
            },
            event_rx,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask the server to add streams to this connection. Returns the request id.
    pub fn subscribe(&self, streams: &[impl AsRef<str> + Send + Sync]) -> Result<u64, ExchangeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = self.codec.encode_subscription(streams, id)?;
        self.send_control(message)?;
        Ok(id)
    }

    /// Ask the server to drop streams from this connection. Returns the request id.
    pub fn unsubscribe(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<u64, ExchangeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = self.codec.encode_unsubscription(streams, id)?;
        self.send_control(message)?;
        Ok(id)
    }

    fn send_control(&self, message: Message) -> Result<(), ExchangeError> {
        self.control
            .send(message)
            .map_err(|_| ExchangeError::WebSocketError(format!("stream {} is closed", self.url)))
    }

    /// Stop the connection. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait until the connection reaches `Closed` or `Failed`.
    pub async fn closed(&self) -> ConnectionState {
        let mut state = self.state.clone();
        let result = state.wait_for(|s| s.is_terminal()).await.map(|s| *s);
        result.unwrap_or(ConnectionState::Closed)
    }

    /// Wait for the reader task and return why it stopped.
    pub async fn join(mut self) -> StreamExit {
        match self.task.take() {
            Some(task) => task.await.unwrap_or_else(|e| {
                StreamExit::Failed(ExchangeError::Other(format!("stream task aborted: {}", e)))
            }),
            None => StreamExit::Cancelled,
        }
    }
}

impl<C: WsCodec> Drop for StreamConnection<C> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct Reader<C: WsCodec> {
    codec: Arc<C>,
    config: StreamConfig,
    token: CancellationToken,
    events: mpsc::Sender<C::Message>,
    control: mpsc::UnboundedReceiver<Message>,
    state: watch::Sender<ConnectionState>,
}

impl<C: WsCodec> Reader<C> {
    async fn run(mut self, socket: Socket) -> StreamExit {
        let (mut write, mut read): (SocketSink, SocketSource) = socket.split();

        let exit = loop {
            let step = tokio::select! {
                biased;
                () = self.token.cancelled() => ControlFlow::Break(StreamExit::Cancelled),
                Some(message) = self.control.recv() => self.write(&mut write, message).await,
                frame = read.next() => self.handle_frame(&mut write, frame).await,
            };
            if let ControlFlow::Break(exit) = step {
                break exit;
            }
        };

        self.shutdown(write, exit).await
    }

    async fn write(&self, sink: &mut SocketSink, message: Message) -> ControlFlow<StreamExit> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => ControlFlow::Break(StreamExit::Cancelled),
            sent = sink.send(message) => match sent {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => ControlFlow::Break(StreamExit::Failed(ExchangeError::WebSocketError(
                    format!("write failed: {}", e),
                ))),
            },
        }
    }

    async fn handle_frame(
        &self,
        sink: &mut SocketSink,
        frame: Option<Result<Message, tungstenite::Error>>,
    ) -> ControlFlow<StreamExit> {
        match frame {
            None => {
                debug!("stream ended by peer");
                ControlFlow::Break(StreamExit::RemoteClosed)
            }
            Some(Err(e)) => {
                let err = ExchangeError::WebSocketError(format!("read failed: {}", e));
                error!(error = %err, "stream transport error");
                ControlFlow::Break(StreamExit::Failed(err))
            }
            Some(Ok(Message::Ping(payload))) => self.write(sink, Message::Pong(payload)).await,
            Some(Ok(Message::Pong(_) | Message::Frame(_))) => ControlFlow::Continue(()),
            Some(Ok(Message::Close(close))) => {
                debug!(?close, "close frame received");
                ControlFlow::Break(StreamExit::RemoteClosed)
            }
            Some(Ok(Message::Text(text))) => self.handle_payload(&text).await,
            Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                Ok(text) => self.handle_payload(&text).await,
                Err(e) => {
                    self.config.report(&ExchangeError::DeserializationError(format!(
                        "binary frame is not UTF-8: {}",
                        e
                    )));
                    ControlFlow::Continue(())
                }
            },
        }
    }

    async fn handle_payload(&self, text: &str) -> ControlFlow<StreamExit> {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                self.config.report(&ExchangeError::DeserializationError(format!(
                    "frame is not valid JSON: {}",
                    e
                )));
                return ControlFlow::Continue(());
            }
        };

        if let Some(envelope) = ErrorEnvelope::from_value(&frame) {
            if envelope.is_error() {
                let err = ExchangeError::from(envelope);
                error!(error = %err, "server reported a stream error");
                if let Some(hook) = &self.config.error_hook {
                    hook(&err);
                }
                return ControlFlow::Break(StreamExit::Failed(err));
            }
        }

        match self.codec.decode_message(frame) {
            Ok(Some(event)) => self.forward(event).await,
            Ok(None) => ControlFlow::Continue(()),
            Err(e) => {
                self.config.report(&e);
                ControlFlow::Continue(())
            }
        }
    }

    async fn forward(&self, event: C::Message) -> ControlFlow<StreamExit> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => ControlFlow::Break(StreamExit::Cancelled),
            sent = self.events.send(event) => match sent {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => ControlFlow::Break(StreamExit::ConsumerDropped),
            },
        }
    }

    async fn shutdown(self, mut sink: SocketSink, exit: StreamExit) -> StreamExit {
        let Self {
            config,
            events,
            state,
            ..
        } = self;

        // Consumers see end-of-stream from here on.
        drop(events);
        state.send_replace(ConnectionState::Closing);

        match tokio::time::timeout(config.close_timeout, sink.send(Message::Close(None))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "close frame not delivered"),
            Err(_) => debug!("close frame timed out"),
        }

        let final_state = if matches!(exit, StreamExit::Failed(_)) {
            ConnectionState::Failed
        } else {
            ConnectionState::Closed
        };
        state.send_replace(final_state);
        info!(?exit, "stream closed");
        exit
    }
}
