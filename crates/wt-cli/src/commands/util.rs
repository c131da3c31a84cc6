//! Shared utilities for CLI commands.

/// Formats a second count as a compact human-readable duration.
///
/// Negative values render as `0s`; they only arise from corrupted rows.
#[must_use]
pub fn format_seconds(total: i64) -> String {
    let total = total.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Renders an optional estimate, with `unknown` as the `None` sentinel.
///
/// A plan estimate is `None` when nothing was estimable, which is distinct
/// from an estimate of zero and must not render as `0s`.
#[must_use]
pub fn format_estimate(estimate: Option<i64>) -> String {
    estimate.map_or_else(|| "unknown".to_string(), format_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn seconds_only() {
        assert_snapshot!(format_seconds(45), @"45s");
    }

    #[test]
    fn minutes_and_seconds() {
        assert_snapshot!(format_seconds(360), @"6m 00s");
    }

    #[test]
    fn hours_pad_minutes_and_seconds() {
        assert_snapshot!(format_seconds(3725), @"1h 02m 05s");
    }

    #[test]
    fn negative_clamps_to_zero() {
        assert_snapshot!(format_seconds(-10), @"0s");
    }

    #[test]
    fn missing_estimate_is_unknown_not_zero() {
        assert_snapshot!(format_estimate(None), @"unknown");
        assert_snapshot!(format_estimate(Some(0)), @"0s");
    }
}
