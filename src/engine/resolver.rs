use crate::error::{PredictError, PredictResult};

/// How many candidate names a "team not found" error carries as a hint.
const HINT_LIMIT: usize = 10;

/// Map a free-text team name onto the canonical name in `available`.
///
/// Exact case-insensitive equality wins over substring containment; ties
/// resolve to the first name in sorted order so the result does not depend
/// on the caller's ordering.
pub fn resolve(input: &str, available: &[String]) -> PredictResult<String> {
    let wanted = input.trim().to_lowercase();

    let mut sorted: Vec<&String> = available
        .iter()
        .filter(|name| !name.trim().is_empty())
        .collect();
    sorted.sort();
    sorted.dedup();

    if !wanted.is_empty() {
        if let Some(exact) = sorted.iter().find(|name| name.to_lowercase() == wanted) {
            return Ok((*exact).clone());
        }
        if let Some(partial) = sorted.iter().find(|name| name.to_lowercase().contains(&wanted)) {
            return Ok((*partial).clone());
        }
    }

    Err(PredictError::team_not_found(
        &wanted,
        sorted.into_iter().take(HINT_LIMIT).cloned().collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_beats_substring() {
        let available = teams(&["Leeds United", "Leeds"]);
        assert_eq!(resolve("leeds", &available).unwrap(), "Leeds");
    }

    #[test]
    fn exact_match_ignores_case_and_whitespace() {
        let available = teams(&["Arsenal", "Chelsea"]);
        assert_eq!(resolve("  CHELSEA ", &available).unwrap(), "Chelsea");
    }

    #[test]
    fn substring_picks_first_sorted_team() {
        let available = teams(&["Manchester Utd", "Manchester City"]);
        assert_eq!(resolve("manchester", &available).unwrap(), "Manchester City");
    }

    #[test]
    fn case_variants_resolve_deterministically() {
        let a = teams(&["arsenal", "Arsenal"]);
        let b = teams(&["Arsenal", "arsenal"]);
        assert_eq!(resolve("ARSENAL", &a).unwrap(), resolve("ARSENAL", &b).unwrap());
    }

    #[test]
    fn unknown_team_is_invalid_input_with_bounded_hint() {
        let available: Vec<String> = (0..15).map(|i| format!("Team {i:02}")).collect();
        let err = resolve("Nonexistent FC", &available).unwrap_err();
        assert!(err.is_invalid_input());
        match err {
            PredictError::TeamNotFound { name, candidates } => {
                assert_eq!(name, "nonexistent fc");
                assert_eq!(candidates.len(), 10);
                assert_eq!(candidates[0], "Team 00");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn blank_input_does_not_match_everything() {
        let available = teams(&["Arsenal"]);
        assert!(resolve("   ", &available).is_err());
    }
}
