use anyhow::anyhow;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::classifier::ModelArtifact;
use crate::db::models::LeagueHistory;
use crate::db::Database;
use crate::error::{PredictError, PredictResult};

use super::LeagueData;

/// Where league match history and classifiers come from.
#[async_trait]
pub trait LeagueSource: Send + Sync {
    /// Full history plus the trained model for one league.
    async fn load(&self, league: &str) -> PredictResult<LeagueData>;

    /// League ids with stored match data.
    async fn list_leagues(&self) -> PredictResult<Vec<String>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// SQLite match store plus a directory of `{league}.json` model artifacts.
pub struct StoreSource {
    db: Database,
    models_dir: PathBuf,
}

impl StoreSource {
    pub fn new(db: Database, models_dir: impl Into<PathBuf>) -> Self {
        StoreSource {
            db,
            models_dir: models_dir.into(),
        }
    }

    async fn load_history(&self, league: &str) -> PredictResult<LeagueHistory> {
        let db = self.db.clone();
        let id = league.to_string();
        let matches = tokio::task::spawn_blocking(move || db.load_league_matches(&id))
            .await
            .map_err(|e| anyhow!("history loader task failed: {e}"))?
            .map_err(|e| PredictError::Data(format!("{e:#}")))?;

        if matches.is_empty() {
            return Err(PredictError::NotFound(format!(
                "Data for '{league}' not found"
            )));
        }
        Ok(LeagueHistory::new(league, matches))
    }

    async fn load_model(&self, league: &str) -> PredictResult<ModelArtifact> {
        let path = self.models_dir.join(format!("{league}.json"));
        let id = league.to_string();
        tokio::task::spawn_blocking(move || ModelArtifact::load(&path, &id))
            .await
            .map_err(|e| anyhow!("model loader task failed: {e}"))?
    }
}

#[async_trait]
impl LeagueSource for StoreSource {
    async fn load(&self, league: &str) -> PredictResult<LeagueData> {
        let (history, model) = tokio::join!(self.load_history(league), self.load_model(league));
        let (history, model) = (history?, model?);
        debug!(
            "{}: loaded {} matches, model with {} features",
            league,
            history.matches.len(),
            model.feature_cols.len()
        );
        Ok(LeagueData { history, model })
    }

    async fn list_leagues(&self) -> PredictResult<Vec<String>> {
        let db = self.db.clone();
        let leagues = tokio::task::spawn_blocking(move || db.list_leagues())
            .await
            .map_err(|e| anyhow!("league listing task failed: {e}"))??;
        Ok(leagues)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::fixtures::played;
    use std::fs;

    const MODEL_JSON: &str = r#"{
        "feature_cols": ["shots"],
        "classes": ["draw", "loss", "win"],
        "test_accuracy": 0.5,
        "estimator": {
            "kind": "logistic",
            "coefficients": [[0.0], [-0.1], [0.1]],
            "intercepts": [0.0, 0.0, 0.0]
        }
    }"#;

    fn models_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "soccer-predictor-{tag}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn seeded_db() -> Database {
        let db = Database::open(":memory:").unwrap();
        db.insert_matches(
            "premier_league",
            &[played("2024-01-01", "2023-2024", "Arsenal", "Chelsea", (2, 1), &[("shots", 12.0)])],
        )
        .unwrap();
        db
    }

    #[tokio::test]
    async fn loads_history_and_model() {
        let dir = models_dir("load");
        fs::write(dir.join("premier_league.json"), MODEL_JSON).unwrap();
        let source = StoreSource::new(seeded_db(), dir.clone());

        let data = source.load("premier_league").await.unwrap();
        assert_eq!(data.history.league, "premier_league");
        assert_eq!(data.history.matches.len(), 1);
        assert_eq!(data.model.feature_cols, vec!["shots".to_string()]);

        assert_eq!(source.list_leagues().await.unwrap(), vec!["premier_league"]);
    }

    #[tokio::test]
    async fn league_without_rows_is_not_found() {
        let dir = models_dir("norows");
        fs::write(dir.join("la_liga.json"), MODEL_JSON).unwrap();
        let source = StoreSource::new(seeded_db(), dir.clone());

        let err = source.load("la_liga").await.unwrap_err();
        assert!(matches!(err, PredictError::NotFound(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_model_is_not_found() {
        let dir = models_dir("nomodel");
        let source = StoreSource::new(seeded_db(), dir.join("absent"));

        let err = source.load("premier_league").await.unwrap_err();
        assert!(matches!(err, PredictError::NotFound(ref m) if m.contains("Model")), "{err:?}");
    }
}
