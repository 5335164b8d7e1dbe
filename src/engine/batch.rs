use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::db::models::{LeagueHistory, Match, MatchStatus};

use super::features::{aggregate, FeatureVector};
use super::outcome::predict_from_vectors;
use super::scoreline::estimate_scoreline;
use super::tuning::Tuning;

/// One fixture of the current-week window with its prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingPrediction {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub status: MatchStatus,
    pub predicted_home_win: f64,
    pub predicted_draw: f64,
    pub predicted_away_win: f64,
    pub predicted_home_goals: f64,
    pub predicted_away_goals: f64,
}

/// Sunday starting the week of `today`, and the Saturday 13 days later.
pub fn current_week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let since_sunday = today.weekday().num_days_from_sunday() as i64;
    let start = today - Duration::days(since_sunday);
    (start, start + Duration::days(13))
}

/// Predict every current-season fixture dated within `[start, end]`.
///
/// Team profiles come from completed matches of earlier seasons only. Teams
/// without such history are logged and their fixtures skipped; one bad
/// fixture never fails the batch.
pub fn predict_window(
    history: &LeagueHistory,
    model: &dyn Classifier,
    start: NaiveDate,
    end: NaiveDate,
    current_season: &str,
    tuning: &Tuning,
) -> Vec<UpcomingPrediction> {
    let mut fixtures: Vec<&Match> = history
        .matches
        .iter()
        .filter(|m| m.season == current_season && m.date >= start && m.date <= end)
        .collect();
    if fixtures.is_empty() {
        info!(
            "No {} fixtures for {} between {} and {}",
            current_season, history.league, start, end
        );
        return Vec::new();
    }
    fixtures.sort_by_key(|m| m.date);

    let base = history.filtered(|m| m.is_completed() && m.season != current_season);
    debug!(
        "{}: {} fixtures in window, {} completed matches for team profiles",
        history.league,
        fixtures.len(),
        base.matches.len()
    );

    let columns = model.feature_columns();
    let mut profiles: HashMap<String, Option<FeatureVector>> = HashMap::new();
    for m in &fixtures {
        for team in [&m.home_team, &m.away_team] {
            profiles.entry(team.to_lowercase()).or_insert_with(|| {
                match aggregate(&base, team, columns, tuning) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Could not compute profile for {}: {}", team, e);
                        None
                    }
                }
            });
        }
    }

    let mut predictions = Vec::with_capacity(fixtures.len());
    for m in fixtures {
        let home = profiles.get(&m.home_team.to_lowercase()).and_then(Option::as_ref);
        let away = profiles.get(&m.away_team.to_lowercase()).and_then(Option::as_ref);
        let (Some(home), Some(away)) = (home, away) else {
            warn!(
                "Skipping {} vs {} on {}: missing team profile",
                m.home_team, m.away_team, m.date
            );
            continue;
        };

        let probs = match predict_from_vectors(model, home, away) {
            Ok(p) => p,
            Err(e) => {
                warn!("Error predicting {} vs {}: {}", m.home_team, m.away_team, e);
                continue;
            }
        };
        let score = estimate_scoreline(&base, &m.home_team, &m.away_team, &probs, tuning);

        predictions.push(UpcomingPrediction {
            date: m.date,
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            status: m.status,
            predicted_home_win: probs.home_win,
            predicted_draw: probs.draw,
            predicted_away_win: probs.away_win,
            predicted_home_goals: score.home_goals,
            predicted_away_goals: score.away_goals,
        });
    }

    let generated = predictions.len();
    let mut unique = dedup_fixtures(predictions);
    unique.sort_by_key(|p| p.date);
    info!(
        "{}: {} predictions, {} after de-duplication",
        history.league,
        generated,
        unique.len()
    );
    unique
}

/// Keep the first prediction per `(date, home, away)`, names compared case-insensitively.
fn dedup_fixtures(predictions: Vec<UpcomingPrediction>) -> Vec<UpcomingPrediction> {
    let mut seen = HashSet::new();
    predictions
        .into_iter()
        .filter(|p| {
            let key = (p.date, p.home_team.to_lowercase(), p.away_team.to_lowercase());
            let fresh = seen.insert(key);
            if !fresh {
                debug!(
                    "Removing duplicate {} vs {} on {}",
                    p.home_team, p.away_team, p.date
                );
            }
            fresh
        })
        .collect()
}
