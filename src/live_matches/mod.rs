pub mod sync;
pub mod transport;

pub use sync::{LiveMatchSync, SyncSettings};
pub use transport::WsTransport;

use serde::Serialize;
use std::sync::Arc;

use crate::faceit::models::Match;

/// Connection phase of a `LiveMatchSync`, as seen by its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    /// Constructed, `start()` not called yet
    Idle,
    Connecting,
    Live,
    /// Dropped; waiting out the reconnect delay
    ReconnectWait,
    /// Push transport could not be constructed; showing the one-shot pull
    DegradedPolling,
    Closed,
}

/// What the render layer observes on every change.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub state: ConnectionState,
    /// Show the loading indicator
    pub loading: bool,
    /// Oldest-created first
    pub matches: Arc<Vec<Match>>,
    /// Bumped once per published change
    pub revision: u64,
}

impl SyncSnapshot {
    pub fn initial() -> Self {
        SyncSnapshot {
            state: ConnectionState::Idle,
            loading: true,
            matches: Arc::new(Vec::new()),
            revision: 0,
        }
    }
}

/// Sort a batch oldest-created first.
///
/// Stable, so equal timestamps keep input order. Records whose `createdAt`
/// does not parse go last, also in input order.
pub fn sort_by_created_at(matches: &mut [Match]) {
    matches.sort_by_key(|m| {
        let created = m.created_at();
        (created.is_none(), created)
    });
}

/// Parse one push payload (a JSON array of matches) into a sorted collection.
pub fn parse_push_payload(text: &str) -> Result<Vec<Match>, serde_json::Error> {
    let mut matches: Vec<Match> = serde_json::from_str(text)?;
    sort_by_created_at(&mut matches);
    Ok(matches)
}
