//! Heuristic expected scoreline consistent with the outcome probabilities.

use serde::Serialize;
use tracing::warn;

use crate::db::models::{LeagueHistory, Match};
use crate::error::{PredictError, PredictResult};

use super::outcome::OutcomeProbabilities;
use super::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scoreline {
    pub home_goals: f64,
    pub away_goals: f64,
}

impl Scoreline {
    fn fallback(tuning: &Tuning) -> Self {
        Scoreline {
            home_goals: tuning.fallback_home_goals,
            away_goals: tuning.fallback_away_goals,
        }
    }
}

/// Expected goals for each side, rounded to one decimal.
///
/// Never fails: degenerate history or any internal error yields the fixed
/// fallback scoreline.
pub fn estimate_scoreline(
    history: &LeagueHistory,
    home_team: &str,
    away_team: &str,
    probs: &OutcomeProbabilities,
    tuning: &Tuning,
) -> Scoreline {
    match try_estimate(history, home_team, away_team, probs, tuning) {
        Ok(Some(s)) => s,
        Ok(None) => Scoreline::fallback(tuning),
        Err(e) => {
            warn!(
                "Scoreline estimate for {} vs {} failed, using fallback: {}",
                home_team, away_team, e
            );
            Scoreline::fallback(tuning)
        }
    }
}

/// Goals scored and conceded by one team across its home and away games.
#[derive(Debug, Default)]
struct TeamSamples {
    scored: Vec<f64>,
    conceded: Vec<f64>,
}

impl TeamSamples {
    fn collect<'a>(matches: impl Iterator<Item = &'a Match>, team: &str) -> Self {
        let team = team.to_lowercase();
        let mut s = TeamSamples::default();
        for m in matches {
            let (Some(hg), Some(ag)) = (m.home_goals, m.away_goals) else {
                continue;
            };
            if m.is_home(&team) {
                s.scored.push(hg as f64);
                s.conceded.push(ag as f64);
            }
            if m.is_away(&team) {
                s.scored.push(ag as f64);
                s.conceded.push(hg as f64);
            }
        }
        s
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `Ok(None)` means "no completed matches", which maps to the fallback.
fn try_estimate(
    history: &LeagueHistory,
    home_team: &str,
    away_team: &str,
    probs: &OutcomeProbabilities,
    tuning: &Tuning,
) -> PredictResult<Option<Scoreline>> {
    let completed: Vec<&Match> = history.completed().collect();
    if completed.is_empty() {
        return Ok(None);
    }

    let home_goals: Vec<f64> = completed
        .iter()
        .filter_map(|m| m.home_goals.map(f64::from))
        .collect();
    let away_goals: Vec<f64> = completed
        .iter()
        .filter_map(|m| m.away_goals.map(f64::from))
        .collect();
    let (Some(league_home), Some(league_away)) = (mean(&home_goals), mean(&away_goals)) else {
        return Err(PredictError::Data(
            "completed matches carry no goal counts".into(),
        ));
    };

    let seasons = history.seasons();
    let recent: Vec<&str> = if seasons.len() >= tuning.recent_seasons {
        seasons[seasons.len() - tuning.recent_seasons..]
            .iter()
            .map(String::as_str)
            .collect()
    } else {
        seasons.iter().map(String::as_str).collect()
    };
    let in_window = || {
        history
            .matches
            .iter()
            .filter(|m| recent.contains(&m.season.as_str()))
    };

    let home = TeamSamples::collect(in_window(), home_team);
    let away = TeamSamples::collect(in_window(), away_team);

    let home_scoring = mean(&home.scored).unwrap_or(league_home);
    let home_conceding = mean(&home.conceded).unwrap_or(league_away);
    let away_scoring = mean(&away.scored).unwrap_or(league_away);
    let away_conceding = mean(&away.conceded).unwrap_or(league_home);

    let base_home = (home_scoring + away_conceding) / 2.0;
    let base_away = (away_scoring + home_conceding) / 2.0;

    let (pred_home, pred_away) = adjust(base_home, base_away, probs, tuning);

    if !pred_home.is_finite() || !pred_away.is_finite() {
        return Err(PredictError::Data(format!(
            "non-finite scoreline ({pred_home}, {pred_away})"
        )));
    }
    let (home_goals, away_goals) = favor_clear_favorite(
        round1(pred_home.max(0.0)),
        round1(pred_away.max(0.0)),
        probs,
        tuning,
    );

    Ok(Some(Scoreline {
        home_goals,
        away_goals,
    }))
}

/// Scale base expectations toward the favored side.
fn adjust(
    base_home: f64,
    base_away: f64,
    probs: &OutcomeProbabilities,
    t: &Tuning,
) -> (f64, f64) {
    let OutcomeProbabilities {
        home_win,
        draw,
        away_win,
    } = *probs;
    let gap = (home_win - away_win).abs();
    let factor = (t.factor_base + gap).clamp(t.factor_min, t.factor_max);

    if home_win > away_win {
        (
            base_home * (1.0 + factor * home_win),
            base_away * (1.0 - factor * (home_win - draw) * t.underdog_damping),
        )
    } else if away_win > home_win {
        (
            base_home * (1.0 - factor * (away_win - draw) * t.underdog_damping),
            base_away * (1.0 + factor * away_win),
        )
    } else {
        let boost = 1.0 + t.draw_boost * draw;
        (base_home * boost, base_away * boost)
    }
}

/// Works on the rounded values so a clear favorite is strictly ahead in
/// the reported scoreline, not just before rounding.
fn favor_clear_favorite(
    home: f64,
    away: f64,
    probs: &OutcomeProbabilities,
    t: &Tuning,
) -> (f64, f64) {
    let gap = (probs.home_win - probs.away_win).abs();
    if gap <= t.clear_favorite_gap {
        return (home, away);
    }
    let forced = t.favorite_margin + gap * t.favorite_gap_scale;
    if probs.home_win > probs.away_win {
        if home <= away {
            return (round1(away + forced), away);
        }
    } else if away <= home {
        return (home, round1(home + forced));
    }
    (home, away)
}
