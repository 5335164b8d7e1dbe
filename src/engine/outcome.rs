//! Win/draw/loss probabilities from team feature vectors.
//!
//! Class probabilities are always read by label (`win`, `draw`, `loss`) through
//! the model's declared class order, and every triple leaving this module is
//! normalized with each entry in [0, 1].

use serde::Serialize;
use tracing::debug;

use crate::classifier::{class_probability, Classifier, DRAW, LOSS, WIN};
use crate::db::models::LeagueHistory;
use crate::error::{PredictError, PredictResult};

use super::features::{aggregate, FeatureVector};
use super::resolver::resolve;
use super::tuning::Tuning;

/// Probabilities for a fixture with a home side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

/// Probabilities for a neutral fixture between two leagues' teams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossLeagueProbabilities {
    pub team_a_win: f64,
    pub draw: f64,
    pub team_b_win: f64,
}

impl From<CrossLeagueProbabilities> for OutcomeProbabilities {
    /// Team A takes the home frame, as the scoreline estimator expects.
    fn from(p: CrossLeagueProbabilities) -> Self {
        OutcomeProbabilities {
            home_win: p.team_a_win,
            draw: p.draw,
            away_win: p.team_b_win,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadToHead {
    pub home_team: String,
    pub away_team: String,
    pub probabilities: OutcomeProbabilities,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossLeague {
    pub team_a: String,
    pub team_b: String,
    pub probabilities: CrossLeagueProbabilities,
}

/// Single-league prediction: resolve both names, aggregate, classify `home - away`.
pub fn predict_h2h(
    history: &LeagueHistory,
    model: &dyn Classifier,
    home_team: &str,
    away_team: &str,
    tuning: &Tuning,
) -> PredictResult<HeadToHead> {
    let teams = history.teams();
    let home = resolve(home_team, &teams)?;
    let away = resolve(away_team, &teams)?;

    let columns = model.feature_columns();
    let home_vec = aggregate(history, &home, columns, tuning)?;
    let away_vec = aggregate(history, &away, columns, tuning)?;
    let probabilities = predict_from_vectors(model, &home_vec, &away_vec)?;

    debug!(
        "{} vs {} ({}): H {:.3} D {:.3} A {:.3}",
        home, away, history.league, probabilities.home_win, probabilities.draw, probabilities.away_win
    );

    Ok(HeadToHead {
        home_team: home,
        away_team: away,
        probabilities,
    })
}

/// Classify precomputed vectors (both in the model's column order).
pub fn predict_from_vectors(
    model: &dyn Classifier,
    home: &FeatureVector,
    away: &FeatureVector,
) -> PredictResult<OutcomeProbabilities> {
    let diff = home.difference(away)?;
    let proba = model.predict_proba(&diff)?;
    let (home_win, draw, away_win) = normalized(
        class_probability(model, &proba, WIN)?,
        class_probability(model, &proba, DRAW)?,
        class_probability(model, &proba, LOSS)?,
    )?;
    Ok(OutcomeProbabilities {
        home_win,
        draw,
        away_win,
    })
}

/// Cross-league prediction: jointly standardized vectors fed to both leagues'
/// models, blended by each model's test accuracy.
pub fn predict_cross(
    history_a: &LeagueHistory,
    model_a: &dyn Classifier,
    team_a: &str,
    history_b: &LeagueHistory,
    model_b: &dyn Classifier,
    team_b: &str,
    tuning: &Tuning,
) -> PredictResult<CrossLeague> {
    let weight_a = ensemble_weight(model_a, &history_a.league)?;
    let weight_b = ensemble_weight(model_b, &history_b.league)?;

    let found_a = resolve(team_a, &history_a.teams())?;
    let found_b = resolve(team_b, &history_b.teams())?;

    let vec_a = aggregate(history_a, &found_a, model_a.feature_columns(), tuning)?;
    let vec_b = aggregate(history_b, &found_b, model_b.feature_columns(), tuning)?
        .aligned_to(model_a.feature_columns())?;

    let (std_a, std_b) = standardize_pair(&vec_a.values, &vec_b.values);
    let diff = FeatureVector {
        columns: vec_a.columns.clone(),
        values: std_a.iter().zip(&std_b).map(|(a, b)| a - b).collect(),
    };
    let diff_b = diff.aligned_to(model_b.feature_columns())?;

    let proba_a = model_a.predict_proba(&diff.values)?;
    let proba_b = model_b.predict_proba(&diff_b.values)?;

    let blend = |label: &str| -> PredictResult<f64> {
        let pa = class_probability(model_a, &proba_a, label)?;
        let pb = class_probability(model_b, &proba_b, label)?;
        Ok((pa * weight_a + pb * weight_b) / (weight_a + weight_b))
    };
    let (team_a_win, draw, team_b_win) = normalized(blend(WIN)?, blend(DRAW)?, blend(LOSS)?)?;

    debug!(
        "{} ({}) vs {} ({}): A {:.3} D {:.3} B {:.3}",
        found_a, history_a.league, found_b, history_b.league, team_a_win, draw, team_b_win
    );

    Ok(CrossLeague {
        team_a: found_a,
        team_b: found_b,
        probabilities: CrossLeagueProbabilities {
            team_a_win,
            draw,
            team_b_win,
        },
    })
}

fn ensemble_weight(model: &dyn Classifier, league: &str) -> PredictResult<f64> {
    let w = model.test_accuracy();
    if w.is_finite() && w > 0.0 {
        Ok(w)
    } else {
        Err(PredictError::InvalidInput(format!(
            "model for '{league}' has unusable test accuracy {w}"
        )))
    }
}

/// Zero-mean, unit-variance scaling of each column over exactly the two
/// vectors (population deviation). Constant columns scale by 1.
pub fn standardize_pair(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let mean = (x + y) / 2.0;
            let std = (((x - mean).powi(2) + (y - mean).powi(2)) / 2.0).sqrt();
            let scale = if std < 10.0 * f64::EPSILON { 1.0 } else { std };
            ((x - mean) / scale, (y - mean) / scale)
        })
        .unzip()
}

fn normalized(win: f64, draw: f64, loss: f64) -> PredictResult<(f64, f64, f64)> {
    let sum = win + draw + loss;
    if [win, draw, loss].iter().any(|p| !p.is_finite() || *p < 0.0) || sum <= 0.0 {
        return Err(PredictError::Model(format!(
            "unusable class probabilities ({win}, {draw}, {loss})"
        )));
    }
    Ok((win / sum, draw / sum, loss / sum))
}
