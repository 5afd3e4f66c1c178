//! Push transports for the live-match feed.
//!
//! ```text
//!  WS Server ──push──▶ PushChannel::next_event()
//!                         │  Message(text) / Closed / Error
//!                         ▼
//!                 LiveMatchSync driver task
//! ```
//!
//! `PushTransport::connect` separates two failure kinds: a request that
//! cannot even be built (`ConnectError::Construction`) and one that was sent
//! but never produced a channel (`ConnectError::Handshake`). The sync client
//! falls back to a pull only for the former.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("push transport could not be constructed: {0}")]
    Construction(String),

    #[error("push transport handshake failed: {0}")]
    Handshake(String),
}

/// What an open push channel yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// One payload frame, not yet parsed.
    Message(String),
    /// The peer closed the channel or the stream ended.
    Closed,
    /// Transport-level failure; the channel is unusable afterwards.
    Error(String),
}

/// Opens push subscriptions.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PushChannel>, ConnectError>;

    /// Endpoint description for logging.
    fn describe(&self) -> &str;
}

/// One open push subscription.
#[async_trait]
pub trait PushChannel: Send {
    /// Wait for the next event. After `Closed` or `Error` the channel is spent.
    async fn next_event(&mut self) -> ChannelEvent;

    /// Client-initiated close.
    async fn close(&mut self);
}

/// WebSocket push transport (`wss://.../ws/livematches`).
pub struct WsTransport {
    url: String,
    ping_interval: Duration,
}

impl WsTransport {
    pub fn new(url: &str, ping_interval: Duration) -> Self {
        WsTransport {
            url: url.to_string(),
            ping_interval,
        }
    }

    fn build_request(&self) -> Result<Request, ConnectError> {
        let parsed =
            url::Url::parse(&self.url).map_err(|e| ConnectError::Construction(e.to_string()))?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ConnectError::Construction(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        }
        parsed
            .as_str()
            .into_client_request()
            .map_err(|e| ConnectError::Construction(e.to_string()))
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    fn describe(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<Box<dyn PushChannel>, ConnectError> {
        let request = self.build_request()?;

        info!("Connecting to live matches WebSocket: {}", self.url);
        let (stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;
        info!("Live matches WebSocket connected");

        let mut ping = tokio::time::interval(self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first ping
        // goes out one full interval after connecting.
        ping.reset();

        Ok(Box::new(WsChannel { stream, ping }))
    }
}

struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ping: Interval,
}

#[async_trait]
impl PushChannel for WsChannel {
    async fn next_event(&mut self) -> ChannelEvent {
        loop {
            tokio::select! {
                msg = self.stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            // Text-level keepalive some relays use
                            if text.trim() == "ping" {
                                let _ = self.stream.send(Message::Text("pong".to_string())).await;
                                continue;
                            }
                            return ChannelEvent::Message(text);
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            match String::from_utf8(bytes) {
                                Ok(text) => return ChannelEvent::Message(text),
                                // Malformed payload: dropped, the channel stays open
                                Err(e) => {
                                    warn!(
                                        "Discarding non-UTF-8 live matches frame: {}",
                                        e.utf8_error()
                                    );
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = self.stream.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            warn!("Server closed live matches WebSocket: {:?}", frame);
                            return ChannelEvent::Closed;
                        }
                        Some(Err(e)) => {
                            error!("Live matches WebSocket error: {}", e);
                            return ChannelEvent::Error(e.to_string());
                        }
                        None => {
                            warn!("Live matches WebSocket stream ended");
                            return ChannelEvent::Closed;
                        }
                        _ => {}
                    }
                }
                _ = self.ping.tick() => {
                    if let Err(e) = self.stream.send(Message::Ping(vec![])).await {
                        error!("Live matches WebSocket ping failed: {}", e);
                        return ChannelEvent::Error(e.to_string());
                    }
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("Live matches WebSocket close: {}", e);
        }
    }
}
