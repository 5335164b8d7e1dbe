use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Soccer match outcome and scoreline prediction service
#[derive(Parser, Debug, Clone)]
#[command(name = "soccer-predictor", version, about)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8000")]
    pub listen_addr: String,

    /// SQLite match store path
    #[arg(long, env = "DATABASE_PATH", default_value = "soccer.db")]
    pub database_path: String,

    /// Directory holding one `{league}.json` model artifact per league
    #[arg(long, env = "MODELS_DIR", default_value = "models")]
    pub models_dir: String,

    /// Season label whose fixtures are treated as upcoming
    #[arg(long, env = "CURRENT_SEASON", default_value = "2025-2026")]
    pub current_season: String,

    /// Maximum number of leagues kept in memory
    #[arg(long, env = "CACHE_CAPACITY", default_value = "10")]
    pub cache_capacity: usize,

    /// Allowed CORS origin (`*` for any)
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// League ids accepted by the API
    #[arg(
        long,
        env = "ALLOWED_LEAGUES",
        value_delimiter = ',',
        default_value = "premier_league,la_liga,bundesliga,serie_a,ligue_1,mls,ucl,uel,world_cup"
    )]
    pub allowed_leagues: Vec<String>,

    /// Leagues to load at startup
    #[arg(long, env = "WARM_LEAGUES", value_delimiter = ',')]
    pub warm_leagues: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Serve the prediction API (the default)
    Serve,
    /// Append processed match records to a league in the match store
    Import {
        /// League id the records belong to
        #[arg(long)]
        league: String,
        /// JSON array with one object per match
        file: PathBuf,
    },
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache_capacity == 0 {
            anyhow::bail!("cache_capacity must be at least 1");
        }
        if self.allowed_leagues.iter().all(|l| l.trim().is_empty()) {
            anyhow::bail!("allowed_leagues must name at least one league");
        }
        if self.current_season.trim().is_empty() {
            anyhow::bail!("current_season must not be empty");
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen_addr {}: {}", self.listen_addr, e))
    }

    /// Allowed league ids, trimmed, blanks dropped.
    pub fn leagues(&self) -> Vec<String> {
        clean_list(&self.allowed_leagues)
    }

    pub fn warm(&self) -> Vec<String> {
        clean_list(&self.warm_leagues)
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
