//! Descriptive league statistics over played matches.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::classifier::ModelArtifact;
use crate::db::models::{LeagueHistory, Match, Outcome};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_matches: usize,
    pub avg_goals_per_match: f64,
    pub home_win_percentage: f64,
    pub draw_percentage: f64,
    pub away_win_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTrend {
    pub season: String,
    /// Mean goals per match in the season.
    pub total_goals: f64,
}

/// Chart-ready `{name, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount<N> {
    pub name: N,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub train_accuracy: Option<f64>,
    pub test_accuracy: f64,
    pub train_report: Option<serde_json::Value>,
    pub test_report: Option<serde_json::Value>,
    pub n_samples: Option<u64>,
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

fn played_matches(history: &LeagueHistory) -> impl Iterator<Item = &Match> {
    history.completed()
}

fn outcome_counts(history: &LeagueHistory) -> HashMap<Outcome, usize> {
    let mut counts = HashMap::new();
    for outcome in played_matches(history).filter_map(Match::outcome) {
        *counts.entry(outcome).or_insert(0) += 1;
    }
    counts
}

pub fn overview(history: &LeagueHistory) -> Overview {
    let total_matches = played_matches(history).count();
    let goals: Vec<u32> = played_matches(history).filter_map(Match::total_goals).collect();
    let avg_goals = if goals.is_empty() {
        0.0
    } else {
        goals.iter().map(|g| *g as f64).sum::<f64>() / goals.len() as f64
    };

    let counts = outcome_counts(history);
    let pct = |o: Outcome| {
        if total_matches == 0 {
            0.0
        } else {
            round_to(
                *counts.get(&o).unwrap_or(&0) as f64 * 100.0 / total_matches as f64,
                1,
            )
        }
    };

    Overview {
        total_matches,
        avg_goals_per_match: round_to(avg_goals, 2),
        home_win_percentage: pct(Outcome::Win),
        draw_percentage: pct(Outcome::Draw),
        away_win_percentage: pct(Outcome::Loss),
    }
}

/// Average goals per match for each season, in season label order.
pub fn season_trends(history: &LeagueHistory) -> Vec<SeasonTrend> {
    let mut by_season: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for m in played_matches(history) {
        if m.season.trim().is_empty() {
            continue;
        }
        if let Some(g) = m.total_goals() {
            let entry = by_season.entry(m.season.as_str()).or_insert((0, 0));
            entry.0 += g as u64;
            entry.1 += 1;
        }
    }
    by_season
        .into_iter()
        .map(|(season, (goals, n))| SeasonTrend {
            season: season.to_string(),
            total_goals: round_to(goals as f64 / n as f64, 2),
        })
        .collect()
}

/// Counts per result label, most frequent first.
pub fn result_distribution(history: &LeagueHistory) -> Vec<NamedCount<String>> {
    let mut dist: Vec<NamedCount<String>> = outcome_counts(history)
        .into_iter()
        .map(|(o, value)| NamedCount {
            name: o.label().to_string(),
            value,
        })
        .collect();
    dist.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    dist
}

pub fn home_away_performance(history: &LeagueHistory) -> Vec<NamedCount<String>> {
    let counts = outcome_counts(history);
    let count = |o: Outcome| *counts.get(&o).unwrap_or(&0);
    vec![
        NamedCount {
            name: "Home Wins".to_string(),
            value: count(Outcome::Win),
        },
        NamedCount {
            name: "Away Wins".to_string(),
            value: count(Outcome::Loss),
        },
        NamedCount {
            name: "Draws".to_string(),
            value: count(Outcome::Draw),
        },
    ]
}

/// Number of matches per total-goal count, ascending by goals.
pub fn goals_distribution(history: &LeagueHistory) -> Vec<NamedCount<u32>> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for g in played_matches(history).filter_map(Match::total_goals) {
        *counts.entry(g).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(name, value)| NamedCount { name, value })
        .collect()
}

pub fn model_metrics(model: &ModelArtifact) -> ModelMetrics {
    ModelMetrics {
        train_accuracy: model.train_accuracy,
        test_accuracy: model.test_accuracy,
        train_report: model.train_report.clone(),
        test_report: model.test_report.clone(),
        n_samples: model.n_samples,
    }
}
