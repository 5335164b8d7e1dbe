use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod import;
pub mod models;
use models::*;

/// Thread-safe SQLite match store (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path.
    /// `":memory:"` opens a private in-memory store.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open sqlite db {path}"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL).context("create sqlite schema")?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    // ── Matches ───────────────────────────────────────────────────────────────

    /// Insert many rows in a single transaction
    pub fn insert_matches(&self, league: &str, matches: &[Match]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for m in matches {
            insert_match_row(&tx, league, m)?;
        }
        tx.commit()?;
        Ok(matches.len())
    }

    /// All matches of a league in ingestion order. Empty when the league is unknown.
    pub fn load_league_matches(&self, league: &str) -> Result<Vec<Match>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT home_team, away_team, home_goals, away_goals,
                    date, season, status, features
             FROM matches WHERE league = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![league], map_match_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .enumerate()
            .map(|(i, raw)| {
                raw.into_match()
                    .with_context(|| format!("league '{league}' row {}", i + 1))
            })
            .collect()
    }

    /// Distinct league ids present in the store
    pub fn list_leagues(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT league FROM matches ORDER BY league")?;
        let leagues = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(leagues)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn insert_match_row(conn: &Connection, league: &str, m: &Match) -> Result<()> {
    let features = serde_json::to_string(&m.features).context("serialize match features")?;
    conn.execute(
        "INSERT INTO matches (
            league, home_team, away_team, home_goals, away_goals,
            date, season, status, features
         ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
        params![
            league,
            m.home_team,
            m.away_team,
            m.home_goals,
            m.away_goals,
            m.date,
            m.season,
            m.status.as_str(),
            features,
        ],
    )?;
    Ok(())
}

/// Row as stored, before status and feature decoding.
struct RawMatch {
    home_team: String,
    away_team: String,
    home_goals: Option<u32>,
    away_goals: Option<u32>,
    date: NaiveDate,
    season: String,
    status: String,
    features: Option<String>,
}

impl RawMatch {
    fn into_match(self) -> Result<Match> {
        let status = MatchStatus::parse(&self.status)
            .ok_or_else(|| anyhow!("unknown match status '{}'", self.status))?;
        let features: BTreeMap<String, Option<f64>> = match self.features.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(raw).context("decode features json")?
            }
            _ => BTreeMap::new(),
        };
        Ok(Match {
            home_team: self.home_team,
            away_team: self.away_team,
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            date: self.date,
            season: self.season,
            status,
            features,
        })
    }
}

fn map_match_row(row: &rusqlite::Row) -> rusqlite::Result<RawMatch> {
    Ok(RawMatch {
        home_team: row.get(0)?,
        away_team: row.get(1)?,
        home_goals: row.get(2)?,
        away_goals: row.get(3)?,
        date: row.get(4)?,
        season: row.get(5)?,
        status: row.get(6)?,
        features: row.get(7)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS matches (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    league      TEXT    NOT NULL,
    home_team   TEXT    NOT NULL,
    away_team   TEXT    NOT NULL,
    home_goals  INTEGER,
    away_goals  INTEGER,
    date        TEXT    NOT NULL,
    season      TEXT    NOT NULL,
    status      TEXT    NOT NULL DEFAULT 'played',
    features    TEXT
);

CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league);
CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(league, season);
"#;
