pub mod view;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::faceit::StatsProvider;
use crate::live_matches::SyncSnapshot;
use crate::ranking::{PageOutcome, RankingView};
use view::{lookup_player, LiveBoard};

#[derive(Clone)]
pub struct AppState {
    /// Output of the process-wide `LiveMatchSync`
    pub live: watch::Receiver<SyncSnapshot>,
    pub ranking: RankingView,
    pub stats: Arc<dyn StatsProvider>,
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/matches", get(matches_handler))
        .route("/ws/matches", get(matches_ws_handler))
        .route("/api/ranking", get(ranking_handler))
        .route("/api/ranking/status", get(ranking_status_handler))
        .route("/api/players/:nickname", get(player_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn index_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// GET /api/matches
async fn matches_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let board = LiveBoard::from(&*state.live.borrow());
    Json(board)
}

/// GET /ws/matches — pushes the rendered board on every sync update.
async fn matches_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let live = state.live.clone();
    ws.on_upgrade(move |socket| push_board(socket, live))
}

async fn push_board(mut socket: WebSocket, mut live: watch::Receiver<SyncSnapshot>) {
    debug!("Dashboard client subscribed to live matches");
    loop {
        let text = {
            let snap = live.borrow_and_update();
            match serde_json::to_string(&LiveBoard::from(&*snap)) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize live board: {}", e);
                    return;
                }
            }
        };
        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }

        tokio::select! {
            changed = live.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
    debug!("Dashboard client unsubscribed from live matches");
}

#[derive(Debug, Deserialize)]
struct RankingQuery {
    page: Option<u32>,
}

/// GET /api/ranking?page=1
async fn ranking_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RankingQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.ranking.show_page(q.page.unwrap_or(1)).await {
        PageOutcome::Applied(table) => Ok(Json(table)),
        PageOutcome::Failed(_) => Err((
            StatusCode::BAD_GATEWAY,
            "No ranking data available.".to_string(),
        )),
        PageOutcome::Superseded => Err((
            StatusCode::CONFLICT,
            "Superseded by a newer page request".to_string(),
        )),
    }
}

/// GET /api/ranking/status
async fn ranking_status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.ranking.status().await)
}

/// GET /api/players/:nickname
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    lookup_player(state.stats.as_ref(), &nickname)
        .await
        .map(Json)
        .map_err(|e| {
            if e.is_not_found() {
                (StatusCode::NOT_FOUND, "Player not found".to_string())
            } else {
                warn!("Player lookup for '{}' failed: {}", nickname, e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to load player data".to_string(),
                )
            }
        })
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>CS2 SA - Super Matches</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #ff5500;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  nav { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  nav a { color: var(--muted); text-decoration: none; padding: .4rem .8rem; border-radius: 6px; font-size: .9rem; cursor: pointer; }
  nav a.active { background: var(--card); color: var(--text); }
  .status-dot { width: 10px; height: 10px; border-radius: 50%; background: var(--muted); display: inline-block; margin-left: auto; }
  .status-dot.live { background: var(--green); animation: pulse 1.5s infinite; }
  .status-dot.down { background: var(--red); }
  @keyframes pulse { 0%,100% { opacity: 1; } 50% { opacity: .3; } }
  main { padding: 1.5rem 2rem; }
  h1 { font-size: 1.5rem; text-align: center; margin-bottom: .3rem; }
  .sub { color: var(--muted); text-align: center; margin-bottom: 1.5rem; }
  .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 1.5rem; }
  .card { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.2rem; }
  .card-head { display: flex; justify-content: space-between; color: var(--muted); font-size: .8rem; margin-bottom: .8rem; }
  .card-head a { color: var(--muted); text-decoration: none; }
  .score { font-size: 2.2rem; font-weight: 700; text-align: center; margin-bottom: 1rem; }
  .teams { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
  .team-head { display: flex; justify-content: space-between; font-weight: 600; margin-bottom: .5rem; }
  .team-head span { color: var(--muted); font-weight: 400; font-size: .85rem; }
  .player { display: flex; justify-content: space-between; font-size: .85rem; padding: .1rem 0; }
  .nick { color: var(--text); background: none; border: none; cursor: pointer; font: inherit; text-align: left; }
  .nick:hover { color: var(--accent); text-decoration: underline; }
  .muted { color: var(--muted); }
  table { width: 100%; border-collapse: collapse; background: var(--card); border-radius: 10px; overflow: hidden; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  td img { width: 20px; height: 15px; vertical-align: middle; margin-right: .4rem; }
  .pager { display: flex; justify-content: space-between; align-items: center; margin-top: 1rem; color: var(--muted); font-size: .85rem; }
  .pager button { background: none; border: 1px solid var(--border); color: var(--muted); padding: .3rem .8rem; border-radius: 6px; cursor: pointer; }
  .pager button:disabled { opacity: .4; cursor: not-allowed; }
  .empty { color: var(--muted); text-align: center; padding: 3rem; }
  #modal { position: fixed; inset: 0; background: rgba(0,0,0,.55); display: none; align-items: center; justify-content: center; }
  #modal.open { display: flex; }
  .modal-box { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1.4rem; width: 320px; max-width: 90vw; }
  .modal-box img.avatar { width: 48px; height: 48px; border-radius: 50%; }
  .modal-row { display: flex; align-items: center; gap: .8rem; margin-bottom: 1rem; }
  .elo { font-size: 1.6rem; font-weight: 700; text-align: center; }
  .links a { color: var(--accent); margin-right: .8rem; font-size: .85rem; }
  .error { color: var(--red); text-align: center; padding: 1rem; }
</style>
</head>
<body>
<nav>
  <a id="nav-live" class="active" onclick="showView('live')">Live Matches</a>
  <a id="nav-ranking" onclick="showView('ranking')">Ranking</a>
  <span class="status-dot" id="dot" title="connecting"></span>
</nav>

<main>
  <section id="view-live">
    <h1>CS2 SA - Super Matches</h1>
    <p class="sub" id="headline">Loading matches…</p>
    <div class="grid" id="matches"></div>
  </section>

  <section id="view-ranking" style="display:none">
    <h1>CS2 Global Ranking</h1>
    <p class="sub">Top players worldwide</p>
    <div id="ranking"><p class="empty">Loading ranking…</p></div>
    <div class="pager">
      <span id="showing"></span>
      <span>
        <button id="prev" onclick="loadRanking(page - 1)">‹</button>
        <span id="page-label">Page 1</span>
        <button id="next" onclick="loadRanking(page + 1)">›</button>
      </span>
    </div>
  </section>
</main>

<div id="modal" onclick="closeModal()">
  <div class="modal-box" onclick="event.stopPropagation()">
    <div class="modal-row"><strong style="flex:1">Player Details</strong><button class="nick" onclick="closeModal()">✕</button></div>
    <div id="modal-body"></div>
  </div>
</div>

<script>
let page = 1;
const esc = s => String(s ?? '').replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));

function showView(name) {
  document.getElementById('view-live').style.display = name === 'live' ? '' : 'none';
  document.getElementById('view-ranking').style.display = name === 'ranking' ? '' : 'none';
  document.getElementById('nav-live').className = name === 'live' ? 'active' : '';
  document.getElementById('nav-ranking').className = name === 'ranking' ? 'active' : '';
  if (name === 'ranking') loadRanking(page);
}

function teamHtml(t) {
  return `<div>
    <div class="team-head">${esc(t.name)} <span>${t.win_percent}%</span></div>
    ${t.players.map(p => `<div class="player">
      <button class="nick" data-nick="${esc(p.nickname)}">${esc(p.nickname)}</button>
      <span class="muted">${p.elo}</span></div>`).join('')}
  </div>`;
}

function renderBoard(b) {
  const dot = document.getElementById('dot');
  dot.className = 'status-dot ' + (b.state === 'live' ? 'live' : (b.state === 'reconnect-wait' || b.state === 'degraded-polling') ? 'down' : '');
  dot.title = b.state;
  if (b.loading) { document.getElementById('headline').textContent = 'Loading matches…'; return; }
  document.getElementById('headline').textContent = b.headline;
  document.getElementById('matches').innerHTML = b.matches.map(m => `<div class="card">
    <div class="card-head"><span>🕒 ${esc(m.started_at)}</span><a href="${esc(m.room_url)}" target="_blank" rel="noopener">FACEIT ↗</a></div>
    <div class="score">${esc(m.score)}</div>
    <div class="teams">${teamHtml(m.teams.faction1)}${teamHtml(m.teams.faction2)}</div>
  </div>`).join('');
}

function connectBoard() {
  const proto = location.protocol === 'https:' ? 'wss' : 'ws';
  const ws = new WebSocket(`${proto}://${location.host}/ws/matches`);
  ws.onmessage = ev => renderBoard(JSON.parse(ev.data));
  ws.onclose = () => {
    document.getElementById('dot').className = 'status-dot down';
    setTimeout(connectBoard, 3000);
  };
}

async function loadRanking(p) {
  if (p < 1) return;
  page = p;
  document.getElementById('page-label').textContent = 'Page ' + p;
  const r = await fetch('/api/ranking?page=' + p);
  if (r.status === 409) return;
  const el = document.getElementById('ranking');
  if (!r.ok) {
    el.innerHTML = '<p class="empty">No ranking data available.</p>';
    document.getElementById('next').disabled = true;
    return;
  }
  const t = await r.json();
  if (!t.rows.length) { el.innerHTML = '<p class="empty">No ranking data available.</p>'; }
  else {
    el.innerHTML = `<table><thead><tr><th>Rank</th><th>Player</th><th>Country</th><th>ELO</th></tr></thead><tbody>
      ${t.rows.map(r => `<tr><td>${esc(r.rank)}</td>
        <td><button class="nick" data-nick="${esc(r.nickname)}">${esc(r.nickname)}</button></td>
        <td><img src="${esc(r.flag_url)}" onerror="this.style.display='none'">${esc(r.country)}</td>
        <td>${r.elo}</td></tr>`).join('')}
    </tbody></table>`;
  }
  document.getElementById('showing').textContent = `Showing ${t.showing_from} to ${t.showing_to} of many players`;
  document.getElementById('prev').disabled = !t.has_previous;
  document.getElementById('next').disabled = !t.has_next;
}

async function openPlayer(nick) {
  document.getElementById('modal').className = 'open';
  const body = document.getElementById('modal-body');
  body.innerHTML = '<p class="muted" style="text-align:center">Loading…</p>';
  const r = await fetch('/api/players/' + encodeURIComponent(nick));
  if (!r.ok) { body.innerHTML = `<p class="error">${esc(await r.text())}</p>`; return; }
  const p = await r.json();
  body.innerHTML = `<div class="modal-row">
      <img class="avatar" src="${esc(p.avatar)}" alt="${esc(p.nickname)}">
      <div><strong>${esc(p.nickname)}</strong><br>
        <img src="${esc(p.flag_url)}" style="width:20px;height:15px" onerror="this.style.display='none'">
        <span class="muted">${esc(p.country)}</span></div>
    </div>
    <div class="elo">${p.elo}</div><p class="muted" style="text-align:center;margin-bottom:1rem">ELO</p>
    <div class="links"><a href="${esc(p.faceit_url)}" target="_blank" rel="noopener">FACEIT profile</a>
      <a href="${esc(p.steam_url)}" target="_blank" rel="noopener">Steam profile</a></div>`;
}

function closeModal() { document.getElementById('modal').className = ''; }

document.addEventListener('click', e => {
  const el = e.target.closest('[data-nick]');
  if (el) openPlayer(el.dataset.nick);
});

connectBoard();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faceit::models::fixtures::live_match;
    use crate::faceit::models::{Cs2Profile, Match, PlayerDetails, RankingPage, RankingPlayer};
    use crate::faceit::ApiError;
    use crate::live_matches::ConnectionState;
    use async_trait::async_trait;

    struct CannedStats;

    #[async_trait]
    impl StatsProvider for CannedStats {
        fn name(&self) -> &str {
            "canned"
        }

        async fn fetch_live_matches(&self) -> Result<Vec<Match>, ApiError> {
            Ok(vec![])
        }

        async fn fetch_ranking(&self, limit: u32, offset: u32) -> Result<RankingPage, ApiError> {
            if offset >= 1000 {
                return Err(ApiError::Status(500));
            }
            Ok(RankingPage {
                offset,
                limit,
                results: vec![RankingPlayer {
                    position: offset + 1,
                    id: "p".into(),
                    nickname: "coldzera".into(),
                    country: "br".into(),
                    elo: 3800,
                    skill_level: 10,
                    global_position: offset + 1,
                }],
            })
        }

        async fn fetch_player(&self, nickname: &str) -> Result<PlayerDetails, ApiError> {
            match nickname {
                "coldzera" => Ok(PlayerDetails {
                    id: "guid".into(),
                    avatar: String::new(),
                    country: "br".into(),
                    cs2: Cs2Profile {
                        game_id: "765".into(),
                        faceit_elo: 3800,
                        region: "SA".into(),
                    },
                }),
                "flaky" => Err(ApiError::Status(500)),
                other => Err(ApiError::PlayerNotFound(other.to_string())),
            }
        }
    }

    async fn serve(snapshot: SyncSnapshot) -> (String, watch::Sender<SyncSnapshot>) {
        let (tx, rx) = watch::channel(snapshot);
        let stats: Arc<dyn StatsProvider> = Arc::new(CannedStats);
        let app = router(AppState {
            live: rx,
            ranking: RankingView::new(Arc::clone(&stats), 100),
            stats,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), tx)
    }

    #[tokio::test]
    async fn test_matches_endpoint_renders_snapshot() {
        let mut snap = SyncSnapshot::initial();
        snap.state = ConnectionState::Live;
        snap.loading = false;
        snap.matches = Arc::new(vec![live_match("1-abc", "2024-01-01T10:02:00Z")]);
        let (base, _tx) = serve(snap).await;

        let board: serde_json::Value = reqwest::get(format!("{}/api/matches", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(board["state"], "live");
        assert_eq!(board["headline"], "1 live matches");
        assert_eq!(board["matches"][0]["score"], "0 - 0");
    }

    #[tokio::test]
    async fn test_index_served() {
        let (base, _tx) = serve(SyncSnapshot::initial()).await;
        let body = reqwest::get(&base).await.unwrap().text().await.unwrap();
        assert!(body.contains("CS2 SA - Super Matches"));
        // Nicknames reach the click handler only through data attributes
        assert!(body.contains("data-nick="));
        assert!(!body.contains("onclick=\"openPlayer"));
    }

    #[tokio::test]
    async fn test_ranking_endpoint() {
        let (base, _tx) = serve(SyncSnapshot::initial()).await;
        let table: serde_json::Value = reqwest::get(format!("{}/api/ranking?page=2", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(table["page"], 2);
        assert_eq!(table["rows"][0]["rank"], "#101");
        assert_eq!(table["has_next"], false);

        let resp = reqwest::get(format!("{}/api/ranking?page=11", base))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_player_endpoint_statuses() {
        let (base, _tx) = serve(SyncSnapshot::initial()).await;

        let ok = reqwest::get(format!("{}/api/players/coldzera", base))
            .await
            .unwrap();
        assert_eq!(ok.status(), reqwest::StatusCode::OK);
        let card: serde_json::Value = ok.json().await.unwrap();
        assert_eq!(card["steam_url"], "https://steamcommunity.com/profiles/765");

        let missing = reqwest::get(format!("{}/api/players/nobody", base))
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(missing.text().await.unwrap(), "Player not found");

        let flaky = reqwest::get(format!("{}/api/players/flaky", base))
            .await
            .unwrap();
        assert_eq!(flaky.status(), reqwest::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_ws_pushes_every_change() {
        use futures_util::StreamExt;
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        let (base, tx) = serve(SyncSnapshot::initial()).await;
        let url = format!("{}/ws/matches", base.replacen("http", "ws", 1));
        let (mut client, _) = tokio_tungstenite::connect_async(url).await.unwrap();

        let first = match client.next().await.unwrap().unwrap() {
            WsMessage::Text(text) => serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            other => panic!("unexpected frame: {:?}", other),
        };
        assert_eq!(first["state"], "idle");
        assert_eq!(first["loading"], true);

        tx.send_modify(|snap| {
            snap.state = ConnectionState::Live;
            snap.loading = false;
            snap.matches = Arc::new(vec![live_match("1-abc", "2024-01-01T10:02:00Z")]);
            snap.revision += 1;
        });
        let second = match client.next().await.unwrap().unwrap() {
            WsMessage::Text(text) => serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            other => panic!("unexpected frame: {:?}", other),
        };
        assert_eq!(second["state"], "live");
        assert_eq!(second["matches"][0]["id"], "1-abc");
    }
}
