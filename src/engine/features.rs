use serde::Serialize;

use crate::db::models::{LeagueHistory, Match};
use crate::error::{PredictError, PredictResult};

use super::tuning::Tuning;

/// A team's average statistical profile, ordered like the classifier's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub columns: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// Element-wise `self - other`; both vectors must share the column order.
    pub fn difference(&self, other: &FeatureVector) -> PredictResult<Vec<f64>> {
        if self.columns != other.columns {
            return Err(PredictError::InvalidInput(
                "feature vectors have different columns".into(),
            ));
        }
        Ok(self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a - b)
            .collect())
    }

    /// The same values re-ordered to `columns`; every column must be present.
    pub fn aligned_to(&self, columns: &[String]) -> PredictResult<FeatureVector> {
        let values = columns
            .iter()
            .map(|c| {
                self.get(c).ok_or_else(|| {
                    PredictError::InvalidInput(format!("feature column '{c}' is not shared"))
                })
            })
            .collect::<PredictResult<Vec<f64>>>()?;
        Ok(FeatureVector {
            columns: columns.to_vec(),
            values,
        })
    }
}

/// Blend of a team's mean home profile and mean away profile.
///
/// An empty partition contributes zeros. A column with no defined values in a
/// non-empty partition makes the blended value undefined, which is reported
/// as 0.
pub fn aggregate(
    history: &LeagueHistory,
    team: &str,
    columns: &[String],
    tuning: &Tuning,
) -> PredictResult<FeatureVector> {
    let team_lower = team.to_lowercase();
    let home: Vec<&Match> = history
        .matches
        .iter()
        .filter(|m| m.is_home(&team_lower))
        .collect();
    let away: Vec<&Match> = history
        .matches
        .iter()
        .filter(|m| m.is_away(&team_lower))
        .collect();

    if home.is_empty() && away.is_empty() {
        return Err(PredictError::team_not_found(team, Vec::new()));
    }

    let values = columns
        .iter()
        .map(|col| {
            let h = partition_mean(&home, col);
            let a = partition_mean(&away, col);
            match (h, a) {
                (Some(h), Some(a)) => {
                    let v = h * tuning.home_weight + a * tuning.away_weight;
                    if v.is_finite() {
                        v
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            }
        })
        .collect();

    Ok(FeatureVector {
        columns: columns.to_vec(),
        values,
    })
}

/// Mean of defined values; `Some(0.0)` for an empty partition, `None` when
/// the partition has rows but none define the column.
fn partition_mean(rows: &[&Match], column: &str) -> Option<f64> {
    if rows.is_empty() {
        return Some(0.0);
    }
    let (sum, n) = rows
        .iter()
        .filter_map(|m| m.feature(column))
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::fixtures::played;
    use approx::assert_relative_eq;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn history() -> LeagueHistory {
        LeagueHistory::new(
            "test",
            vec![
                played("2024-01-01", "2023-2024", "Arsenal", "Chelsea", (2, 0), &[("shots", 10.0), ("xg", 2.0)]),
                played("2024-01-08", "2023-2024", "Arsenal", "Leeds", (1, 1), &[("shots", 20.0), ("xg", 1.0)]),
                played("2024-01-15", "2023-2024", "Chelsea", "arsenal", (0, 1), &[("shots", 5.0), ("xg", 0.5)]),
            ],
        )
    }

    #[test]
    fn blends_home_and_away_means() {
        let v = aggregate(&history(), "Arsenal", &cols(&["shots", "xg"]), &Tuning::default()).unwrap();
        // home mean shots 15, away 5 → 0.6*15 + 0.4*5
        assert_relative_eq!(v.values[0], 11.0, epsilon = 1e-12);
        assert_relative_eq!(v.values[1], 0.6 * 1.5 + 0.4 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn empty_partition_contributes_zero() {
        // Leeds only ever played away
        let v = aggregate(&history(), "Leeds", &cols(&["shots"]), &Tuning::default()).unwrap();
        assert_relative_eq!(v.values[0], 0.4 * 20.0, epsilon = 1e-12);
    }

    #[test]
    fn undefined_column_becomes_zero() {
        let v = aggregate(&history(), "Arsenal", &cols(&["possession"]), &Tuning::default()).unwrap();
        assert_eq!(v.values, vec![0.0]);
    }

    #[test]
    fn length_matches_columns_without_nan() {
        let columns = cols(&["xg", "shots", "corners", "possession"]);
        for team in ["Arsenal", "Chelsea", "Leeds"] {
            let v = aggregate(&history(), team, &columns, &Tuning::default()).unwrap();
            assert_eq!(v.values.len(), columns.len());
            assert_eq!(v.columns, columns);
            assert!(v.values.iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn output_follows_requested_column_order() {
        let a = aggregate(&history(), "Arsenal", &cols(&["shots", "xg"]), &Tuning::default()).unwrap();
        let b = aggregate(&history(), "Arsenal", &cols(&["xg", "shots"]), &Tuning::default()).unwrap();
        assert_eq!(a.values[0], b.values[1]);
        assert_eq!(a.values[1], b.values[0]);
    }

    #[test]
    fn unknown_team_fails() {
        let err = aggregate(&history(), "Nonexistent FC", &cols(&["shots"]), &Tuning::default())
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn alignment_reorders_by_name() {
        let v = FeatureVector {
            columns: cols(&["a", "b"]),
            values: vec![1.0, 2.0],
        };
        assert_eq!(v.aligned_to(&cols(&["b", "a"])).unwrap().values, vec![2.0, 1.0]);
        assert!(v.aligned_to(&cols(&["c"])).is_err());
    }
}
