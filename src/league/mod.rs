//! League data access: a pluggable [`LeagueSource`] behind a bounded,
//! single-flight [`LeagueCache`].

pub mod cache;
pub mod source;

pub use cache::LeagueCache;
pub use source::{LeagueSource, StoreSource};

use crate::classifier::ModelArtifact;
use crate::db::models::LeagueHistory;

/// Everything the engine needs for one league, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct LeagueData {
    pub history: LeagueHistory,
    pub model: ModelArtifact,
}
