//! JSON view models the dashboard page renders directly.

use serde::Serialize;

use crate::faceit::models::{Factions, Match, PlayerDetails, Team};
use crate::faceit::{ApiError, StatsProvider};
use crate::live_matches::{ConnectionState, SyncSnapshot};
use crate::ranking::flag_url;

pub fn room_url(match_id: &str) -> String {
    format!("https://www.faceit.com/en/cs2/room/{}", match_id)
}

pub fn faceit_profile_url(nickname: &str) -> String {
    format!("https://www.faceit.com/en/players/{}", nickname)
}

pub fn steam_profile_url(steam_id: &str) -> String {
    format!("https://steamcommunity.com/profiles/{}", steam_id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerLine {
    pub nickname: String,
    pub elo: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamCard {
    pub name: String,
    /// Rounded win probability, 0–100
    pub win_percent: i64,
    pub players: Vec<PlayerLine>,
}

impl From<&Team> for TeamCard {
    fn from(team: &Team) -> Self {
        TeamCard {
            name: team.name.clone(),
            win_percent: (team.stats.win_probability * 100.0).round() as i64,
            players: team
                .roster
                .iter()
                .map(|p| PlayerLine {
                    nickname: p.nickname.clone(),
                    elo: p.elo,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCard {
    pub id: String,
    pub region: String,
    pub status: String,
    /// Creation time as "10:05 AM" (UTC)
    pub started_at: String,
    /// "0 - 0" until the first result arrives
    pub score: String,
    pub room_url: String,
    pub teams: Factions<TeamCard>,
}

impl From<&Match> for MatchCard {
    fn from(m: &Match) -> Self {
        MatchCard {
            id: m.id.clone(),
            region: m.region.clone(),
            status: m.status.clone(),
            started_at: m
                .created_at()
                .map(|t| t.format("%I:%M %p").to_string())
                .unwrap_or_else(|| "--:--".to_string()),
            score: m.current_score().to_string(),
            room_url: room_url(&m.id),
            teams: Factions {
                faction1: TeamCard::from(&m.teams.faction1),
                faction2: TeamCard::from(&m.teams.faction2),
            },
        }
    }
}

/// Rendered form of one `SyncSnapshot`.
#[derive(Debug, Clone, Serialize)]
pub struct LiveBoard {
    pub state: ConnectionState,
    pub loading: bool,
    pub revision: u64,
    /// "3 live matches"
    pub headline: String,
    pub matches: Vec<MatchCard>,
}

impl From<&SyncSnapshot> for LiveBoard {
    fn from(snap: &SyncSnapshot) -> Self {
        LiveBoard {
            state: snap.state,
            loading: snap.loading,
            revision: snap.revision,
            headline: format!("{} live matches", snap.matches.len()),
            matches: snap.matches.iter().map(MatchCard::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCard {
    pub nickname: String,
    pub avatar: String,
    pub country: String,
    pub flag_url: String,
    pub elo: i64,
    pub faceit_url: String,
    pub steam_url: String,
}

impl PlayerCard {
    pub fn new(nickname: &str, details: &PlayerDetails) -> Self {
        PlayerCard {
            nickname: nickname.to_string(),
            avatar: details.avatar.clone(),
            country: details.country.to_uppercase(),
            flag_url: flag_url(&details.country),
            elo: details.cs2.faceit_elo,
            faceit_url: faceit_profile_url(nickname),
            steam_url: steam_profile_url(&details.cs2.game_id),
        }
    }
}

/// Fetch a player's details and shape them for the detail overlay.
pub async fn lookup_player(
    provider: &dyn StatsProvider,
    nickname: &str,
) -> Result<PlayerCard, ApiError> {
    let details = provider.fetch_player(nickname).await?;
    Ok(PlayerCard::new(nickname, &details))
}
