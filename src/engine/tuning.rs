/// Hand-tuned constants of the feature blend and the scoreline heuristic.
///
/// `Default` reproduces the production values; tests and experiments can
/// override individual fields without touching control flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// Weight of a team's home-match profile in its blended feature vector.
    pub home_weight: f64,
    /// Weight of a team's away-match profile.
    pub away_weight: f64,
    /// Number of most recent seasons used for scoring/conceding rates.
    pub recent_seasons: usize,
    /// Scoreline returned when there is no completed history or on failure.
    pub fallback_home_goals: f64,
    pub fallback_away_goals: f64,
    /// `factor = factor_base + |p_home - p_away|`, clamped to the range below.
    pub factor_base: f64,
    pub factor_min: f64,
    pub factor_max: f64,
    /// Share of `factor * (p_fav - p_draw)` taken off the underdog.
    pub underdog_damping: f64,
    /// Uniform boost per unit of draw probability when neither side is favored.
    pub draw_boost: f64,
    /// Probability gap above which the favorite must out-score the underdog.
    pub clear_favorite_gap: f64,
    /// Forced margin is `favorite_margin + favorite_gap_scale * gap`.
    pub favorite_margin: f64,
    pub favorite_gap_scale: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            home_weight: 0.6,
            away_weight: 0.4,
            recent_seasons: 2,
            fallback_home_goals: 1.5,
            fallback_away_goals: 1.0,
            factor_base: 0.5,
            factor_min: 0.5,
            factor_max: 1.5,
            underdog_damping: 0.5,
            draw_boost: 0.2,
            clear_favorite_gap: 0.15,
            favorite_margin: 0.5,
            favorite_gap_scale: 2.0,
        }
    }
}
