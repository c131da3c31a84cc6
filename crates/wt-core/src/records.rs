//! Personal record math.

/// Estimated one-rep max via the Epley formula: `weight * (1 + reps / 30)`.
///
/// Returns `None` for non-positive weight or reps below 1; reps above
/// `u32::MAX` are likewise rejected rather than wrapped.
#[must_use]
pub fn estimated_one_rep_max(weight_kg: f64, reps: i64) -> Option<f64> {
    if weight_kg <= 0.0 || reps < 1 {
        return None;
    }
    let reps = u32::try_from(reps).ok()?;
    Some(weight_kg * (1.0 + f64::from(reps) / 30.0))
}

/// Whether a candidate estimate strictly beats the current record.
/// `None` means no record exists yet, so any estimate qualifies.
#[must_use]
pub fn improves_record(candidate: f64, current: Option<f64>) -> bool {
    current.is_none_or(|best| candidate > best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rep_estimate_is_the_weight_itself_plus_margin() {
        let estimate = estimated_one_rep_max(90.0, 1).unwrap();
        assert!((estimate - 93.0).abs() < 1e-9);
    }

    #[test]
    fn epley_formula_matches_known_values() {
        // 100kg x 10 -> 100 * (1 + 10/30)
        let estimate = estimated_one_rep_max(100.0, 10).unwrap();
        assert!((estimate - 133.333_333_333).abs() < 1e-6);
    }

    #[test]
    fn invalid_inputs_yield_no_estimate() {
        assert_eq!(estimated_one_rep_max(0.0, 5), None);
        assert_eq!(estimated_one_rep_max(-80.0, 5), None);
        assert_eq!(estimated_one_rep_max(80.0, 0), None);
        assert_eq!(estimated_one_rep_max(80.0, -3), None);
    }

    #[test]
    fn any_estimate_beats_a_missing_record() {
        assert!(improves_record(50.0, None));
    }

    #[test]
    fn ties_do_not_replace_the_record() {
        assert!(!improves_record(100.0, Some(100.0)));
        assert!(improves_record(100.1, Some(100.0)));
    }
}
