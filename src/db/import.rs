//! Load processed match records (a JSON array) into the match store.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::models::{Match, MatchStatus};
use super::Database;

/// One processed match row. `status` defaults from the presence of goals.
#[derive(Debug, Deserialize)]
struct MatchRecord {
    home_team: String,
    away_team: String,
    #[serde(default)]
    home_goals: Option<u32>,
    #[serde(default)]
    away_goals: Option<u32>,
    date: NaiveDate,
    season: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    features: BTreeMap<String, Option<f64>>,
}

impl MatchRecord {
    fn into_match(self) -> Result<Match> {
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            bail!("blank team name");
        }
        if self.season.trim().is_empty() {
            bail!("blank season");
        }
        let status = match self.status.as_deref() {
            Some(raw) => {
                MatchStatus::parse(raw).ok_or_else(|| anyhow!("unknown match status '{raw}'"))?
            }
            None if self.home_goals.is_some() && self.away_goals.is_some() => MatchStatus::Played,
            None => MatchStatus::Scheduled,
        };
        if status == MatchStatus::Played && (self.home_goals.is_none() || self.away_goals.is_none())
        {
            bail!("{} match without goals", status.as_str());
        }
        Ok(Match {
            home_team: self.home_team.trim().to_string(),
            away_team: self.away_team.trim().to_string(),
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            date: self.date,
            season: self.season.trim().to_string(),
            status,
            features: self.features,
        })
    }
}

/// Parse a JSON array of match records. Any bad record rejects the whole batch.
pub fn parse_matches(raw: &str) -> Result<Vec<Match>> {
    let records: Vec<MatchRecord> = serde_json::from_str(raw).context("parse match records")?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_match().with_context(|| format!("record {}", i + 1)))
        .collect()
}

/// Append the records in `path` to `league`. Returns the number of rows written.
pub fn import_file(db: &Database, league: &str, path: &Path) -> Result<usize> {
    let league = league.trim();
    if league.is_empty() {
        bail!("league must not be empty");
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let matches = parse_matches(&raw).with_context(|| format!("{}", path.display()))?;
    let written = db.insert_matches(league, &matches)?;
    info!("Imported {} match(es) into {} from {}", written, league, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS: &str = r#"[
        {"home_team": "Arsenal", "away_team": "Chelsea", "home_goals": 2, "away_goals": 1,
         "date": "2024-01-01", "season": "2023-2024", "features": {"xg": 1.8, "shots": null}},
        {"home_team": " Leeds ", "away_team": "Everton",
         "date": "2025-10-20", "season": "2025-2026"},
        {"home_team": "Arsenal", "away_team": "Leeds", "home_goals": 0, "away_goals": 0,
         "date": "2024-02-01", "season": "2023-2024", "status": "PLAYED"}
    ]"#;

    fn temp_file(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("soccer-import-{}-{}", std::process::id(), name));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn status_follows_goals_when_omitted() {
        let matches = parse_matches(RECORDS).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].status, MatchStatus::Played);
        assert_eq!(matches[0].feature("xg"), Some(1.8));
        assert_eq!(matches[0].feature("shots"), None);
        assert_eq!(matches[1].status, MatchStatus::Scheduled);
        assert_eq!(matches[1].home_team, "Leeds");
        assert_eq!(matches[2].status, MatchStatus::Played);
    }

    #[test]
    fn bad_records_reject_the_batch() {
        let unknown = r#"[{"home_team": "A", "away_team": "B", "date": "2024-01-01",
                           "season": "2023-2024", "status": "abandoned"}]"#;
        let err = parse_matches(unknown).unwrap_err();
        assert!(format!("{err:#}").contains("unknown match status"));

        let goalless = r#"[{"home_team": "A", "away_team": "B", "date": "2024-01-01",
                            "season": "2023-2024", "status": "played"}]"#;
        assert!(parse_matches(goalless).is_err());

        let blank = r#"[{"home_team": " ", "away_team": "B", "date": "2024-01-01", "season": "2023-2024"}]"#;
        assert!(parse_matches(blank).is_err());
    }

    #[test]
    fn imported_file_is_readable_from_the_store() {
        let db = Database::open(":memory:").unwrap();
        let path = temp_file("ok.json", RECORDS);

        assert_eq!(import_file(&db, "premier_league", &path).unwrap(), 3);
        std::fs::remove_file(&path).ok();

        let loaded = db.load_league_matches("premier_league").unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[1].status, MatchStatus::Scheduled);
        assert_eq!(loaded[0].home_goals, Some(2));
        assert_eq!(db.list_leagues().unwrap(), vec!["premier_league"]);
    }

    #[test]
    fn failed_import_writes_nothing() {
        let db = Database::open(":memory:").unwrap();
        let path = temp_file("bad.json", r#"[{"home_team": "A"}]"#);
        assert!(import_file(&db, "mls", &path).is_err());
        std::fs::remove_file(&path).ok();
        assert!(db.load_league_matches("mls").unwrap().is_empty());

        assert!(import_file(&db, " ", Path::new("/nonexistent.json")).is_err());
    }
}
