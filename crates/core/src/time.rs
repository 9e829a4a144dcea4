// SPDX-FileCopyrightText: © 2025 VoxJob Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Timestamp formatting shared by the subtitle formatter and the HTTP
//! surface.
//!
//! Grounded on `world-of-asr`'s `format_timestamp`: seconds are rounded to
//! the nearest millisecond, not truncated, before decomposition.

/// Renders a timestamp in `HH:MM:SS.mmm` (or `HH:MM:SS,mmm` with a comma
/// decimal marker, as SRT requires).
///
/// `always_include_hours` forces the `HH:` prefix even when it is zero
/// (SRT always does; VTT only does once the job runs past an hour).
///
/// # Errors
///
/// Returns `Err(seconds)` if `seconds` is negative — segment/word offsets
/// are supposed to originate from a monotonically increasing decode clock,
/// but a recognizer backend (including an external subprocess) is free to
/// emit whatever it likes, so this is a recoverable validation failure, not
/// an invariant callers may assume away.
pub fn format_timestamp(seconds: f64, always_include_hours: bool, decimal_marker: char) -> Result<String, f64> {
    if seconds < 0.0 {
        return Err(seconds);
    }

    let total_millis = (seconds * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    let hours_marker = if always_include_hours || hours > 0 {
        format!("{hours:02}:")
    } else {
        String::new()
    };

    Ok(format!("{hours_marker}{minutes:02}:{secs:02}{decimal_marker}{millis:03}"))
}

/// Parses a `format_timestamp` rendering back into seconds, accepting
/// either decimal marker and an optional `HH:` prefix. Used by spec §8's
/// timestamp-roundtrip property test; not needed by the formatter/pipeline
/// itself, which only ever produces timestamps, never consumes them.
///
/// # Errors
///
/// Returns `Err` if `text` does not match `[HH:]MM:SS[.,]mmm`.
pub fn parse_timestamp(text: &str) -> Result<f64, String> {
    let (time_part, millis_part) = text
        .split_once(['.', ','])
        .ok_or_else(|| format!("missing decimal marker in timestamp: {text}"))?;
    let millis: u64 = millis_part.parse().map_err(|_| format!("invalid milliseconds: {millis_part}"))?;

    let fields: Vec<&str> = time_part.split(':').collect();
    let (hours, minutes, secs) = match fields.as_slice() {
        [h, m, s] => (
            h.parse::<u64>().map_err(|_| format!("invalid hours: {h}"))?,
            m.parse::<u64>().map_err(|_| format!("invalid minutes: {m}"))?,
            s.parse::<u64>().map_err(|_| format!("invalid seconds: {s}"))?,
        ),
        [m, s] => (
            0,
            m.parse::<u64>().map_err(|_| format!("invalid minutes: {m}"))?,
            s.parse::<u64>().map_err(|_| format!("invalid seconds: {s}"))?,
        ),
        _ => return Err(format!("malformed timestamp: {text}")),
    };

    let total_millis = hours * 3_600_000 + minutes * 60_000 + secs * 1000 + millis;
    Ok(total_millis as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_format_and_parse_matches_rounded_milliseconds() {
        for t in [0.0, 0.5, 2.5, 59.999, 3600.0, 3661.25, 86399.999] {
            let rendered = format_timestamp(t, false, '.').unwrap();
            let parsed = parse_timestamp(&rendered).unwrap();
            let expected = (t * 1000.0).round() / 1000.0;
            assert!((parsed - expected).abs() < 1e-9, "t={t} rendered={rendered} parsed={parsed} expected={expected}");
        }
    }

    #[test]
    fn parse_handles_srt_comma_marker_and_forced_hours() {
        assert_eq!(parse_timestamp("01:00:01,500").unwrap(), 3601.5);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(parse_timestamp("not-a-timestamp").is_err());
    }

    #[test]
    fn zero_seconds_without_forced_hours() {
        assert_eq!(format_timestamp(0.0, false, '.').unwrap(), "00:00.000");
    }

    #[test]
    fn zero_seconds_with_forced_hours() {
        assert_eq!(format_timestamp(0.0, true, ',').unwrap(), "00:00:00,000");
    }

    #[test]
    fn rounds_to_nearest_millisecond() {
        assert_eq!(format_timestamp(1.9996, false, '.').unwrap(), "00:02.000");
    }

    #[test]
    fn crosses_into_hours_without_forcing() {
        assert_eq!(format_timestamp(3661.25, false, '.').unwrap(), "01:01:01.250");
    }

    #[test]
    fn negative_seconds_is_an_error() {
        assert_eq!(format_timestamp(-1.0, false, '.'), Err(-1.0));
    }
}
