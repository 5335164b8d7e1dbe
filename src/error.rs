use thiserror::Error;

/// Errors surfaced by the prediction engine and the league data layer.
///
/// The transport maps these onto status codes: `NotFound` → 404, the
/// invalid-input family → 400, everything else → 500.
#[derive(Debug, Error)]
pub enum PredictError {
    /// League data or model artifact is not available.
    #[error("{0}")]
    NotFound(String),

    /// A team name could not be resolved against the league's team set.
    #[error("Team '{name}' not found. Available teams: {}...", candidates.join(", "))]
    TeamNotFound {
        name: String,
        candidates: Vec<String>,
    },

    #[error("{0}")]
    InvalidInput(String),

    /// The classifier broke its contract (shape mismatch, non-finite output).
    #[error("model error: {0}")]
    Model(String),

    /// Stored match data could not be interpreted.
    #[error("data error: {0}")]
    Data(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PredictError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PredictError::TeamNotFound { .. } | PredictError::InvalidInput(_)
        )
    }

    pub fn team_not_found(name: &str, candidates: Vec<String>) -> Self {
        PredictError::TeamNotFound {
            name: name.to_string(),
            candidates,
        }
    }
}

pub type PredictResult<T> = std::result::Result<T, PredictError>;
