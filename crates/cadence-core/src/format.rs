//! Human-readable countdown formatting.

/// Format milliseconds as `MM:SS.mmm`.
///
/// Minutes are not wrapped into hours, so long programs show e.g.
/// `125:00.000`.
pub fn format_duration(duration_ms: u64) -> String {
    let minutes = duration_ms / 60_000;
    let seconds = (duration_ms % 60_000) / 1_000;
    let millis = duration_ms % 1_000;
    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_each_field() {
        assert_eq!(format_duration(0), "00:00.000");
        assert_eq!(format_duration(9_999), "00:09.999");
        assert_eq!(format_duration(61_005), "01:01.005");
    }

    #[test]
    fn minutes_grow_past_two_digits() {
        assert_eq!(format_duration(125 * 60_000), "125:00.000");
    }
}
