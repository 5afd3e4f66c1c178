use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::error::ApiError;
use super::models::{Match, PlayerDetails, RankingPage};
use super::provider::StatsProvider;

/// Client for the FACEIT data HTTP API (live matches, ranking, player details).
#[derive(Clone)]
pub struct FaceitClient {
    http: Client,
    base_url: Url,
}

impl FaceitClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid stats API base URL: {}", base_url))?;
        Ok(FaceitClient { http, base_url })
    }

    /// `{base}/faceit/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("faceit")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status().as_u16()));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StatsProvider for FaceitClient {
    fn name(&self) -> &str {
        "faceitdata"
    }

    async fn fetch_live_matches(&self) -> Result<Vec<Match>, ApiError> {
        let url = self.endpoint(&["livematches"])?;
        let matches: Vec<Match> = self.get_json(url).await?;
        info!("Pulled {} live matches", matches.len());
        Ok(matches)
    }

    async fn fetch_ranking(&self, limit: u32, offset: u32) -> Result<RankingPage, ApiError> {
        let mut url = self.endpoint(&["ranking"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        self.get_json(url).await
    }

    async fn fetch_player(&self, nickname: &str) -> Result<PlayerDetails, ApiError> {
        let url = self.endpoint(&[nickname])?;
        match self.get_json(url).await {
            Err(ApiError::Status(code)) => {
                debug!("Player lookup for '{}' returned HTTP {}", nickname, code);
                Err(ApiError::PlayerNotFound(nickname.to_string()))
            }
            other => other,
        }
    }
}
