//! Live match synchronization client.
//!
//! One background task per instance owns the push channel and the reconnect
//! timer, so every transition for an instance happens in sequence:
//!
//! ```text
//!  idle ──start──▶ connecting ──open──▶ live ──close/error──▶ reconnect-wait
//!                     │  ▲                                       │
//!                     │  └────────────── after delay ────────────┘
//!                     └─construction failure──▶ degraded-polling (one pull)
//!
//!  any ──stop──▶ closed
//! ```
//!
//! The consumer observes a `watch` channel of `SyncSnapshot`s. Every inbound
//! message that parses replaces the whole collection and bumps the revision;
//! malformed messages are logged and dropped without touching the snapshot.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::transport::{ChannelEvent, ConnectError, PushChannel, PushTransport};
use super::{parse_push_payload, sort_by_created_at, ConnectionState, SyncSnapshot};
use crate::faceit::StatsProvider;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Wait between a dropped subscription and the next attempt
    pub reconnect_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Keeps one live feed of match snapshots, preferring push and falling back
/// to a single pull when push cannot be set up at all.
pub struct LiveMatchSync {
    transport: Arc<dyn PushTransport>,
    fallback: Arc<dyn StatsProvider>,
    settings: SyncSettings,
    output: Arc<watch::Sender<SyncSnapshot>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl LiveMatchSync {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        fallback: Arc<dyn StatsProvider>,
        settings: SyncSettings,
    ) -> Self {
        let (output, _) = watch::channel(SyncSnapshot::initial());
        let (shutdown, _) = watch::channel(false);
        LiveMatchSync {
            transport,
            fallback,
            settings,
            output: Arc::new(output),
            shutdown,
            task: None,
        }
    }

    /// Receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.output.subscribe()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.output.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.output.borrow().state
    }

    /// Spawn the sync task. Does nothing if already started or closed.
    pub fn start(&mut self) {
        if self.task.is_some() || self.state() == ConnectionState::Closed {
            debug!("Live match sync already started or closed; ignoring start");
            return;
        }
        info!(
            "Starting live match sync (push: {}, fallback: {})",
            self.transport.describe(),
            self.fallback.name()
        );

        let task = tokio::spawn(sync_loop(
            Arc::clone(&self.transport),
            Arc::clone(&self.fallback),
            self.settings.clone(),
            Publisher(Arc::clone(&self.output)),
            self.shutdown.subscribe(),
        ));
        self.task = Some(task);
    }

    /// Cancel any pending reconnect, close the open channel and move to
    /// `Closed`. Safe to call more than once.
    pub fn stop(&mut self) {
        self.shutdown.send_replace(true);
        let changed = self.output.send_if_modified(|snap| {
            if snap.state == ConnectionState::Closed {
                return false;
            }
            snap.state = ConnectionState::Closed;
            snap.loading = false;
            snap.revision += 1;
            true
        });
        if changed {
            info!("Live match sync stopped");
        }
    }

    /// Wait for the sync task to wind down after `stop()`.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Live match sync task failed: {}", e);
            }
        }
    }
}

impl Drop for LiveMatchSync {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Write side of the snapshot channel as seen by the sync task. Once the
/// snapshot reads `Closed` nothing else is published.
struct Publisher(Arc<watch::Sender<SyncSnapshot>>);

impl Publisher {
    fn publish(&self, update: impl FnOnce(&mut SyncSnapshot)) {
        self.0.send_if_modified(|snap| {
            if snap.state == ConnectionState::Closed {
                return false;
            }
            update(snap);
            snap.revision += 1;
            true
        });
    }
}

/// How a live subscription ended.
enum FeedEnd {
    Dropped,
    Stopped,
}

/// Resolves once `stop()` has been called or the owning instance is gone.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn sync_loop(
    transport: Arc<dyn PushTransport>,
    fallback: Arc<dyn StatsProvider>,
    settings: SyncSettings,
    out: Publisher,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        out.publish(|snap| snap.state = ConnectionState::Connecting);

        let connected = tokio::select! {
            res = transport.connect() => res,
            _ = stop_requested(&mut shutdown) => return,
        };

        match connected {
            Ok(mut channel) => {
                out.publish(|snap| {
                    snap.state = ConnectionState::Live;
                    snap.loading = false;
                });
                if let FeedEnd::Stopped = stream_updates(channel.as_mut(), &out, &mut shutdown).await
                {
                    channel.close().await;
                    return;
                }
            }
            Err(ConnectError::Construction(reason)) => {
                warn!(
                    "Push transport unavailable ({}); falling back to a single pull from {}",
                    reason,
                    fallback.name()
                );
                pull_once(fallback.as_ref(), &out, &mut shutdown).await;
                return;
            }
            Err(ConnectError::Handshake(reason)) => {
                error!("Live matches connection failed: {}", reason);
            }
        }

        out.publish(|snap| snap.state = ConnectionState::ReconnectWait);
        warn!("Reconnecting in {:?}...", settings.reconnect_delay);

        tokio::select! {
            _ = tokio::time::sleep(settings.reconnect_delay) => {}
            _ = stop_requested(&mut shutdown) => return,
        }
        if *shutdown.borrow() {
            return;
        }
        info!("Attempting to reconnect...");
    }
}

async fn stream_updates(
    channel: &mut dyn PushChannel,
    out: &Publisher,
    shutdown: &mut watch::Receiver<bool>,
) -> FeedEnd {
    loop {
        let event = tokio::select! {
            ev = channel.next_event() => ev,
            _ = stop_requested(shutdown) => return FeedEnd::Stopped,
        };

        match event {
            ChannelEvent::Message(text) => match parse_push_payload(&text) {
                Ok(matches) => {
                    debug!("Live matches update: {} matches", matches.len());
                    out.publish(|snap| snap.matches = Arc::new(matches));
                }
                Err(e) => {
                    warn!("Discarding malformed live matches payload: {}", e);
                }
            },
            ChannelEvent::Closed => {
                warn!("Live matches feed disconnected");
                return FeedEnd::Dropped;
            }
            ChannelEvent::Error(reason) => {
                error!("Live matches feed error: {}", reason);
                return FeedEnd::Dropped;
            }
        }
    }
}

/// One-shot fallback. Failure leaves an empty collection in place.
async fn pull_once(
    fallback: &dyn StatsProvider,
    out: &Publisher,
    shutdown: &mut watch::Receiver<bool>,
) {
    out.publish(|snap| {
        snap.state = ConnectionState::DegradedPolling;
        snap.loading = true;
    });

    let result = tokio::select! {
        res = fallback.fetch_live_matches() => res,
        _ = stop_requested(shutdown) => return,
    };

    let matches = match result {
        Ok(mut matches) => {
            sort_by_created_at(&mut matches);
            matches
        }
        Err(e) => {
            error!("Error fetching live matches from {}: {}", fallback.name(), e);
            Vec::new()
        }
    };

    out.publish(|snap| {
        snap.matches = Arc::new(matches);
        snap.loading = false;
    });
}
