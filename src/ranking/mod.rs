//! Paged global ranking view.
//!
//! Every page request is fetched independently and never cancelled. Each one
//! is tagged with a sequence number when issued, and a response is applied
//! only if no newer request has been issued since, so a slow page 2 cannot
//! overwrite a fast page 3.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::faceit::models::{RankingPage, RankingPlayer};
use crate::faceit::StatsProvider;

/// Flag image for a two-letter country code.
pub fn flag_url(country: &str) -> String {
    format!("https://flagcdn.com/24x18/{}.png", country.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    /// "#123"
    pub rank: String,
    pub nickname: String,
    pub country: String,
    pub flag_url: String,
    pub elo: i64,
    pub skill_level: u32,
}

impl From<&RankingPlayer> for RankingRow {
    fn from(p: &RankingPlayer) -> Self {
        RankingRow {
            rank: format!("#{}", p.global_position),
            nickname: p.nickname.clone(),
            country: p.country.to_uppercase(),
            flag_url: flag_url(&p.country),
            elo: p.elo,
            skill_level: p.skill_level,
        }
    }
}

/// One rendered page of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTable {
    /// 1-based
    pub page: u32,
    pub rows: Vec<RankingRow>,
    pub has_previous: bool,
    pub has_next: bool,
    pub showing_from: u32,
    pub showing_to: u32,
}

impl RankingTable {
    pub fn from_page(page: u32, page_size: u32, data: &RankingPage) -> Self {
        let count = data.results.len() as u32;
        let (showing_from, showing_to) = if data.offset > 0 {
            (data.offset.saturating_add(1), data.offset.saturating_add(count))
        } else {
            (1, count)
        };
        RankingTable {
            page,
            rows: data.results.iter().map(RankingRow::from).collect(),
            has_previous: page > 1,
            has_next: count >= page_size,
            showing_from,
            showing_to,
        }
    }
}

/// Result of one `show_page` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Applied(RankingTable),
    /// The fetch failed; the table shows "no ranking data"
    Failed(String),
    /// A newer request was issued while this one was in flight
    Superseded,
}

#[derive(Debug, Default)]
struct ViewState {
    latest_seq: u64,
    current_page: u32,
    loading: bool,
    table: Option<RankingTable>,
}

/// What the ranking view currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingStatus {
    pub page: u32,
    pub loading: bool,
    pub table: Option<RankingTable>,
}

/// Ranking table state shared by every caller of one view.
#[derive(Clone)]
pub struct RankingView {
    provider: Arc<dyn StatsProvider>,
    page_size: u32,
    state: Arc<Mutex<ViewState>>,
}

impl RankingView {
    pub fn new(provider: Arc<dyn StatsProvider>, page_size: u32) -> Self {
        RankingView {
            provider,
            page_size: page_size.max(1),
            state: Arc::new(Mutex::new(ViewState {
                current_page: 1,
                ..ViewState::default()
            })),
        }
    }

    pub async fn status(&self) -> RankingStatus {
        let state = self.state.lock().await;
        RankingStatus {
            page: state.current_page,
            loading: state.loading,
            table: state.table.clone(),
        }
    }

    /// Fetch and show `page` (1-based; 0 is treated as 1).
    ///
    /// The fetch runs on its own task, so dropping this future (a client that
    /// went away) still lets the response land and clear `loading`.
    pub async fn show_page(&self, page: u32) -> PageOutcome {
        let view = self.clone();
        match tokio::spawn(async move { view.fetch_and_apply(page).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Ranking page {} task failed: {}", page, e);
                PageOutcome::Failed(e.to_string())
            }
        }
    }

    async fn fetch_and_apply(&self, page: u32) -> PageOutcome {
        let page = page.max(1);
        let seq = {
            let mut state = self.state.lock().await;
            state.latest_seq += 1;
            state.current_page = page;
            state.loading = true;
            state.latest_seq
        };

        let offset = (page - 1).saturating_mul(self.page_size);
        debug!(
            "Ranking request #{}: page {} (limit={}, offset={})",
            seq, page, self.page_size, offset
        );
        let result = self.provider.fetch_ranking(self.page_size, offset).await;

        let mut state = self.state.lock().await;
        if state.latest_seq != seq {
            debug!(
                "Discarding ranking response #{} (latest is #{})",
                seq, state.latest_seq
            );
            return PageOutcome::Superseded;
        }
        state.loading = false;

        match result {
            Ok(data) => {
                let table = RankingTable::from_page(page, self.page_size, &data);
                state.table = Some(table.clone());
                PageOutcome::Applied(table)
            }
            Err(e) => {
                error!("Error fetching ranking page {}: {}", page, e);
                state.table = None;
                PageOutcome::Failed(e.to_string())
            }
        }
    }
}
