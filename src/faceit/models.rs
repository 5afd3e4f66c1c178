use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A live match snapshot as pushed by the FACEIT data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// FACEIT match (room) ID
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    /// e.g. "ONGOING", "READY", "VOTING"
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub teams: Factions<Team>,
    /// RFC 3339 creation timestamp, kept raw so one bad record can't sink a batch
    pub created_at: String,
    /// Score updates in arrival order; the last one is the current score
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<MatchResult>,
}

impl Match {
    /// Creation time as a point in time, if the upstream value parses.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Latest score line. A match with no recorded results reads 0 - 0.
    pub fn current_score(&self) -> ScoreLine {
        match self.results.last() {
            Some(latest) => ScoreLine {
                faction1: latest.factions.faction1.score,
                faction2: latest.factions.faction2.score,
            },
            None => ScoreLine::default(),
        }
    }
}

/// The two sides of a match, keyed the way FACEIT names them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Factions<T> {
    pub faction1: T,
    pub faction2: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leader: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roster: Vec<Player>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: TeamStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nickname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_skill_level: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elo: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    /// Upstream win estimate (0.0–1.0)
    #[serde(default, deserialize_with = "null_as_default")]
    pub win_probability: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub range: SkillRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillRange {
    #[serde(default, deserialize_with = "null_as_default")]
    pub min: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max: u32,
}

/// One score update inside a live match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub asc_score: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub partial: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub factions: Factions<FactionScore>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub afk: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leavers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_kicked: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disqualified: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionScore {
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i32,
}

/// Displayed score of a match card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreLine {
    pub faction1: i32,
    pub faction2: i32,
}

impl std::fmt::Display for ScoreLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.faction1, self.faction2)
    }
}

/// Player profile returned by the details endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetails {
    pub id: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub country: String,
    pub cs2: Cs2Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cs2Profile {
    /// Steam64 ID
    pub game_id: String,
    pub faceit_elo: i64,
    #[serde(default)]
    pub region: String,
}

/// One row of the global ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingPlayer {
    pub position: u32,
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub country: String,
    pub elo: i64,
    #[serde(default)]
    pub skill_level: u32,
    pub global_position: u32,
}

/// A page of the global ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPage {
    pub offset: u32,
    pub limit: u32,
    #[serde(default)]
    pub results: Vec<RankingPlayer>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn team(name: &str, win_probability: f64) -> Team {
        Team {
            name: name.to_string(),
            leader: format!("{}-leader", name),
            score: 0,
            roster: vec![Player {
                nickname: format!("{}-awper", name),
                id: format!("{}-p1", name),
                game_skill_level: 10,
                elo: 3100,
            }],
            stats: TeamStats {
                win_probability,
                skill_level: SkillLevel::default(),
            },
        }
    }

    /// Minimal live match with the given ID and creation timestamp.
    pub fn live_match(id: &str, created_at: &str) -> Match {
        Match {
            id: id.to_string(),
            game: "cs2".to_string(),
            region: "SA".to_string(),
            status: "ONGOING".to_string(),
            tags: vec![],
            teams: Factions {
                faction1: team("team_alpha", 0.55),
                faction2: team("team_bravo", 0.45),
            },
            created_at: created_at.to_string(),
            results: vec![],
        }
    }

    pub fn result(faction1: i32, faction2: i32) -> MatchResult {
        MatchResult {
            asc_score: true,
            partial: true,
            factions: Factions {
                faction1: FactionScore { score: faction1 },
                faction2: FactionScore { score: faction2 },
            },
            afk: vec![],
            leavers: vec![],
            vote_kicked: vec![],
            disqualified: vec![],
        }
    }
}
