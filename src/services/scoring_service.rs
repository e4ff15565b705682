use serde_json::Value as JsonValue;

/// Derived score fields of a test result. `open_score` is never part of
/// this struct: it is graded manually and supplied as an input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub closed_score: f64,
    pub total_score: f64,
    pub percent: f64,
}

pub struct ScoringService;

impl ScoringService {
    /// Recompute the derived fields of a result from its `details` list
    /// and the manually graded `open_score`. Runs on every
    /// administrative save, replacing whatever aggregates were stored.
    ///
    /// Never fails: a malformed `details` value counts as an empty list,
    /// an entry without a numeric `score` contributes 0, and an entry
    /// without a `type` is treated as closed.
    pub fn recompute(details: &JsonValue, open_score: f64, max_score: f64) -> ScoreBreakdown {
        let entries: &[JsonValue] = details.as_array().map(Vec::as_slice).unwrap_or(&[]);

        let closed_score: f64 = entries
            .iter()
            .filter(|entry| entry.get("type").and_then(JsonValue::as_str) != Some("open"))
            .map(|entry| entry.get("score").and_then(JsonValue::as_f64).unwrap_or(0.0))
            .sum();

        let total_score = closed_score + open_score;
        let percent = if max_score != 0.0 {
            total_score / max_score * 100.0
        } else {
            0.0
        };

        ScoreBreakdown {
            closed_score,
            total_score,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sums_closed_entries_and_adds_open_score() {
        let details = json!([
            {"type": "closed", "score": 2},
            {"type": "open", "score": 5},
            {"score": 1},
        ]);

        let breakdown = ScoringService::recompute(&details, 5.0, 10.0);
        assert_eq!(breakdown.closed_score, 3.0);
        assert_eq!(breakdown.total_score, 8.0);
        assert_eq!(breakdown.percent, 80.0);
    }

    #[test]
    fn entry_without_type_counts_as_closed() {
        let details = json!([{"score": 4.5}]);
        let breakdown = ScoringService::recompute(&details, 0.0, 9.0);
        assert_eq!(breakdown.closed_score, 4.5);
        assert_eq!(breakdown.percent, 50.0);
    }

    #[test]
    fn zero_max_score_yields_zero_percent() {
        let details = json!([{"type": "closed", "score": 3}]);
        let breakdown = ScoringService::recompute(&details, 0.0, 0.0);
        assert_eq!(breakdown.total_score, 3.0);
        assert_eq!(breakdown.percent, 0.0);
    }

    #[test]
    fn malformed_details_degrade_to_empty() {
        let breakdown = ScoringService::recompute(&json!("garbage"), 2.0, 4.0);
        assert_eq!(breakdown.closed_score, 0.0);
        assert_eq!(breakdown.total_score, 2.0);
        assert_eq!(breakdown.percent, 50.0);
    }

    #[test]
    fn non_numeric_score_contributes_nothing() {
        let details = json!([
            {"type": "closed", "score": "three"},
            {"type": "closed"},
            {"type": "closed", "score": 1},
        ]);
        let breakdown = ScoringService::recompute(&details, 0.0, 10.0);
        assert_eq!(breakdown.closed_score, 1.0);
    }

    #[test]
    fn recompute_is_idempotent() {
        let details = json!([
            {"type": "closed", "score": 2.5},
            {"type": "open", "score": 4},
        ]);

        let first = ScoringService::recompute(&details, 4.0, 13.0);
        let second = ScoringService::recompute(&details, 4.0, 13.0);
        assert_eq!(first, second);
    }
}
