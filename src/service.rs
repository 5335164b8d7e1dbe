//! Request-level composition of the league cache and the prediction engine.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::analytics::{self, ModelMetrics, NamedCount, Overview, SeasonTrend};
use crate::db::models::LeagueHistory;
use crate::engine::{
    current_week_window, estimate_scoreline, predict_cross, predict_h2h, predict_window,
    OutcomeProbabilities, Tuning, UpcomingPrediction,
};
use crate::error::PredictResult;
use crate::league::{LeagueCache, LeagueData};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadPrediction {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
    pub predicted_home_goals: f64,
    pub predicted_away_goals: f64,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossLeaguePrediction {
    pub team_a_win: f64,
    pub draw: f64,
    pub team_b_win: f64,
    pub predicted_team_a_goals: f64,
    pub predicted_team_b_goals: f64,
    pub team_a: String,
    pub team_b: String,
    pub league_a: String,
    pub league_b: String,
}

#[derive(Clone)]
pub struct PredictionService {
    cache: LeagueCache,
    tuning: Tuning,
    current_season: String,
}

impl PredictionService {
    pub fn new(cache: LeagueCache, current_season: impl Into<String>) -> Self {
        PredictionService {
            cache,
            tuning: Tuning::default(),
            current_season: current_season.into(),
        }
    }

    async fn league(&self, league: &str) -> PredictResult<Arc<LeagueData>> {
        self.cache.get(league).await
    }

    pub async fn head_to_head(
        &self,
        league: &str,
        home_team: &str,
        away_team: &str,
    ) -> PredictResult<HeadToHeadPrediction> {
        let data = self.league(league).await?;
        let h2h = predict_h2h(&data.history, &data.model, home_team, away_team, &self.tuning)?;
        let score = estimate_scoreline(
            &data.history,
            &h2h.home_team,
            &h2h.away_team,
            &h2h.probabilities,
            &self.tuning,
        );

        let p = h2h.probabilities;
        Ok(HeadToHeadPrediction {
            home_win: p.home_win,
            draw: p.draw,
            away_win: p.away_win,
            predicted_home_goals: score.home_goals,
            predicted_away_goals: score.away_goals,
            home_team: h2h.home_team,
            away_team: h2h.away_team,
        })
    }

    /// Neutral fixture between teams of two (possibly equal) leagues. The
    /// scoreline treats team A as the home side over both leagues' history.
    pub async fn cross_league(
        &self,
        league_a: &str,
        team_a: &str,
        league_b: &str,
        team_b: &str,
    ) -> PredictResult<CrossLeaguePrediction> {
        let (a, b) = tokio::join!(self.league(league_a), self.league(league_b));
        let (a, b) = (a?, b?);

        let cross = predict_cross(
            &a.history,
            &a.model,
            team_a,
            &b.history,
            &b.model,
            team_b,
            &self.tuning,
        )?;

        let combined = LeagueHistory::combined(&a.history, &b.history);
        let probs: OutcomeProbabilities = cross.probabilities.into();
        let score = estimate_scoreline(&combined, &cross.team_a, &cross.team_b, &probs, &self.tuning);

        let p = cross.probabilities;
        Ok(CrossLeaguePrediction {
            team_a_win: p.team_a_win,
            draw: p.draw,
            team_b_win: p.team_b_win,
            predicted_team_a_goals: score.home_goals,
            predicted_team_b_goals: score.away_goals,
            team_a: cross.team_a,
            team_b: cross.team_b,
            league_a: league_a.to_string(),
            league_b: league_b.to_string(),
        })
    }

    pub async fn teams(&self, league: &str) -> PredictResult<Vec<String>> {
        Ok(self.league(league).await?.history.teams())
    }

    pub async fn leagues(&self) -> PredictResult<Vec<String>> {
        self.cache.available().await
    }

    /// Predictions for the current-week window containing `today`.
    pub async fn upcoming(
        &self,
        league: &str,
        today: NaiveDate,
    ) -> PredictResult<Vec<UpcomingPrediction>> {
        let data = self.league(league).await?;
        let (start, end) = current_week_window(today);
        info!("Upcoming {} fixtures from {} to {}", league, start, end);
        Ok(predict_window(
            &data.history,
            &data.model,
            start,
            end,
            &self.current_season,
            &self.tuning,
        ))
    }

    pub async fn model_metrics(&self, league: &str) -> PredictResult<ModelMetrics> {
        Ok(analytics::model_metrics(&self.league(league).await?.model))
    }

    pub async fn overview(&self, league: &str) -> PredictResult<Overview> {
        Ok(analytics::overview(&self.league(league).await?.history))
    }

    pub async fn season_trends(&self, league: &str) -> PredictResult<Vec<SeasonTrend>> {
        Ok(analytics::season_trends(&self.league(league).await?.history))
    }

    pub async fn result_distribution(&self, league: &str) -> PredictResult<Vec<NamedCount<String>>> {
        Ok(analytics::result_distribution(&self.league(league).await?.history))
    }

    pub async fn home_away_performance(
        &self,
        league: &str,
    ) -> PredictResult<Vec<NamedCount<String>>> {
        Ok(analytics::home_away_performance(&self.league(league).await?.history))
    }

    pub async fn goals_distribution(&self, league: &str) -> PredictResult<Vec<NamedCount<u32>>> {
        Ok(analytics::goals_distribution(&self.league(league).await?.history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictError;
    use crate::league::source::memory::{sample_league, MemorySource};
    use approx::assert_relative_eq;

    fn service() -> PredictionService {
        let source = MemorySource::new(vec![
            sample_league("premier_league", ["Arsenal", "Chelsea", "Leeds"], 0.55),
            sample_league("la_liga", ["Barcelona", "Sevilla", "Getafe"], 0.48),
        ]);
        PredictionService::new(LeagueCache::new(source, 4), "2025-2026")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn head_to_head_resolves_names_and_favors_stronger_side() {
        let p = service().head_to_head("premier_league", "arsenal", "leeds").await.unwrap();
        assert_eq!(p.home_team, "Arsenal");
        assert_eq!(p.away_team, "Leeds");
        assert_relative_eq!(p.home_win + p.draw + p.away_win, 1.0, epsilon = 1e-9);
        assert!(p.home_win > p.away_win);
        assert!(p.predicted_home_goals > p.predicted_away_goals);
    }

    #[tokio::test]
    async fn head_to_head_unknown_team_is_invalid_input() {
        let err = service()
            .head_to_head("premier_league", "Nonexistent FC", "Leeds")
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn unknown_league_is_not_found() {
        let err = service().teams("mls").await.unwrap_err();
        assert!(matches!(err, PredictError::NotFound(_)));
    }

    #[tokio::test]
    async fn cross_league_is_normalized_and_labelled() {
        let p = service()
            .cross_league("premier_league", "Arsenal", "la_liga", "Getafe")
            .await
            .unwrap();
        assert_eq!(p.team_a, "Arsenal");
        assert_eq!(p.team_b, "Getafe");
        assert_eq!(p.league_b, "la_liga");
        assert_relative_eq!(p.team_a_win + p.draw + p.team_b_win, 1.0, epsilon = 1e-9);
        assert!(p.predicted_team_a_goals >= 0.0 && p.predicted_team_b_goals >= 0.0);
    }

    #[tokio::test]
    async fn teams_are_sorted() {
        let teams = service().teams("la_liga").await.unwrap();
        assert_eq!(teams, vec!["Barcelona", "Getafe", "Sevilla"]);
    }

    #[tokio::test]
    async fn upcoming_uses_current_week_window() {
        let svc = service();
        let out = svc.upcoming("premier_league", date("2025-10-22")).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].home_team, "Arsenal");

        let none = svc.upcoming("premier_league", date("2026-03-01")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn analytics_pass_through() {
        let svc = service();
        let o = svc.overview("premier_league").await.unwrap();
        assert_eq!(o.total_matches, 6);
        let m = svc.model_metrics("la_liga").await.unwrap();
        assert_relative_eq!(m.test_accuracy, 0.48);
        assert_eq!(svc.leagues().await.unwrap(), vec!["la_liga", "premier_league"]);
    }
}
