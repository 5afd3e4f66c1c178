use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// CS2 live matches and ranking dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "cs2-live-board", version, about)]
pub struct Config {
    /// Stats API base URL (live matches pull, ranking, player details)
    #[arg(long, env = "API_BASE_URL", default_value = "https://faceitdata.lmao.cl")]
    pub api_base_url: String,

    /// Live matches push feed (WebSocket)
    #[arg(
        long,
        env = "LIVE_MATCHES_WS_URL",
        default_value = "wss://faceitdata.lmao.cl/ws/livematches"
    )]
    pub live_matches_ws_url: String,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// Seconds to wait before reconnecting a dropped push feed
    #[arg(long, env = "RECONNECT_DELAY_SECS", default_value = "3")]
    pub reconnect_delay_secs: u64,

    /// Seconds between client-side WebSocket pings
    #[arg(long, env = "PING_INTERVAL_SECS", default_value = "25")]
    pub ping_interval_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Players per ranking page
    #[arg(long, env = "RANKING_PAGE_SIZE", default_value = "100")]
    pub ranking_page_size: u32,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.reconnect_delay_secs == 0 {
            anyhow::bail!("reconnect_delay_secs must be positive");
        }
        if self.ping_interval_secs == 0 {
            anyhow::bail!("ping_interval_secs must be positive");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be positive");
        }
        if !(1..=500).contains(&self.ranking_page_size) {
            anyhow::bail!("ranking_page_size must be between 1 and 500");
        }
        if self.dashboard_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("dashboard_addr is not a valid socket address: {}", self.dashboard_addr);
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["cs2-live-board"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = parse(&[]);
        assert!(config.validate().is_ok());
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.ranking_page_size, 100);
    }

    #[test]
    fn test_rejects_zero_reconnect_delay() {
        let config = parse(&["--reconnect-delay-secs", "0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_page() {
        let config = parse(&["--ranking-page-size", "1000"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_dashboard_addr() {
        let config = parse(&["--dashboard-addr", "localhost"]);
        assert!(config.validate().is_err());
    }
}
