use async_trait::async_trait;

use super::error::ApiError;
use super::models::{Match, PlayerDetails, RankingPage};

/// Trait that every source of already-computed match and player data implements.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Return the currently live matches in whatever order the source has them.
    async fn fetch_live_matches(&self) -> Result<Vec<Match>, ApiError>;

    /// Return one page of the global ranking.
    async fn fetch_ranking(&self, limit: u32, offset: u32) -> Result<RankingPage, ApiError>;

    /// Look up one player by nickname.
    async fn fetch_player(&self, nickname: &str) -> Result<PlayerDetails, ApiError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
