use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single historical or scheduled fixture for one league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub home_team: String,
    pub away_team: String,
    /// `None` for fixtures that have not been played yet
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub date: NaiveDate,
    /// Season label, e.g. "2024-2025"
    pub season: String,
    pub status: MatchStatus,
    /// Engineered per-match statistics. `None` means "no data".
    pub features: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Played,
    Scheduled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Played => "played",
            MatchStatus::Scheduled => "scheduled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "played" => Some(MatchStatus::Played),
            "scheduled" => Some(MatchStatus::Scheduled),
            _ => None,
        }
    }
}

/// Match result from the home team's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Draw => "draw",
            Outcome::Loss => "loss",
        }
    }
}

impl Match {
    pub fn is_completed(&self) -> bool {
        self.status != MatchStatus::Scheduled
    }

    pub fn total_goals(&self) -> Option<u32> {
        if !self.is_completed() {
            return None;
        }
        Some(self.home_goals? + self.away_goals?)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_completed() {
            return None;
        }
        let (home, away) = (self.home_goals?, self.away_goals?);
        Some(match home.cmp(&away) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    /// Feature value, or `None` when absent or recorded as missing.
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features
            .get(name)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    pub fn is_home(&self, team_lower: &str) -> bool {
        self.home_team.to_lowercase() == team_lower
    }

    pub fn is_away(&self, team_lower: &str) -> bool {
        self.away_team.to_lowercase() == team_lower
    }
}

/// All stored fixtures of one league, in ingestion order.
#[derive(Debug, Clone, Default)]
pub struct LeagueHistory {
    pub league: String,
    pub matches: Vec<Match>,
}

impl LeagueHistory {
    pub fn new(league: impl Into<String>, matches: Vec<Match>) -> Self {
        LeagueHistory {
            league: league.into(),
            matches,
        }
    }

    /// Sorted, de-duplicated team names appearing home or away.
    pub fn teams(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .matches
            .iter()
            .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
            .filter(|name| !name.trim().is_empty())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn completed(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.is_completed())
    }

    /// Sorted unique season labels.
    pub fn seasons(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.matches.iter().map(|m| m.season.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// A new history holding only the matches accepted by `keep`.
    pub fn filtered(&self, keep: impl Fn(&Match) -> bool) -> LeagueHistory {
        LeagueHistory {
            league: self.league.clone(),
            matches: self.matches.iter().filter(|m| keep(m)).cloned().collect(),
        }
    }

    /// Concatenation of two histories, used when a fixture spans leagues.
    pub fn combined(a: &LeagueHistory, b: &LeagueHistory) -> LeagueHistory {
        let mut matches = Vec::with_capacity(a.matches.len() + b.matches.len());
        matches.extend(a.matches.iter().cloned());
        matches.extend(b.matches.iter().cloned());
        LeagueHistory {
            league: format!("{}+{}", a.league, b.league),
            matches,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn outcome_is_from_home_perspective() {
        assert_eq!(
            played("2024-01-01", "2023-2024", "A", "B", (2, 1), &[]).outcome(),
            Some(Outcome::Win)
        );
        assert_eq!(
            played("2024-01-01", "2023-2024", "A", "B", (0, 3), &[]).outcome(),
            Some(Outcome::Loss)
        );
        assert_eq!(
            scheduled("2024-01-01", "2023-2024", "A", "B").outcome(),
            None
        );
    }

    #[test]
    fn teams_are_sorted_and_unique() {
        let history = LeagueHistory::new(
            "test",
            vec![
                played("2024-01-01", "2023-2024", "Leeds", "Arsenal", (1, 1), &[]),
                played("2024-01-08", "2023-2024", "Arsenal", "Leeds United", (2, 0), &[]),
            ],
        );
        assert_eq!(history.teams(), vec!["Arsenal", "Leeds", "Leeds United"]);
    }

    #[test]
    fn missing_and_non_finite_features_read_as_none() {
        let mut m = played("2024-01-01", "2023-2024", "A", "B", (1, 0), &[("shots", 10.0)]);
        m.features.insert("xg".into(), None);
        m.features.insert("poss".into(), Some(f64::NAN));
        assert_eq!(m.feature("shots"), Some(10.0));
        assert_eq!(m.feature("xg"), None);
        assert_eq!(m.feature("poss"), None);
        assert_eq!(m.feature("absent"), None);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(MatchStatus::parse(" Played "), Some(MatchStatus::Played));
        assert_eq!(MatchStatus::parse("scheduled"), Some(MatchStatus::Scheduled));
        assert_eq!(MatchStatus::parse("postponed"), None);
    }
}
