use std::ops::RangeInclusive;

use super::{Decoded, FieldProblem, INT_MISSING};

/// Service days can run well past midnight; some trains run for three days.
pub const HOURS: RangeInclusive<i32> = 0..=72;
pub const MINUTES: RangeInclusive<i32> = 0..=59;
pub const SECONDS: RangeInclusive<i32> = 0..=59;

/// `HH:MM:SS` to seconds since midnight. Out-of-range components are flagged but
/// the total is still computed.
pub fn decode_time(raw: &str) -> Decoded<i32> {
    let mut parts = raw.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Decoded::failed(INT_MISSING, FieldProblem::TimeParse);
    };
    let (Ok(hours), Ok(minutes), Ok(seconds)) = (h.parse::<i32>(), m.parse::<i32>(), s.parse::<i32>())
    else {
        return Decoded::failed(INT_MISSING, FieldProblem::TimeParse);
    };

    let total = i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds);
    let total = match i32::try_from(total) {
        Ok(t) if t != INT_MISSING => t,
        _ => return Decoded::failed(INT_MISSING, FieldProblem::TimeParse),
    };

    let mut decoded = Decoded::clean(total);
    decoded.check_range(&HOURS, hours);
    decoded.check_range(&MINUTES, minutes);
    decoded.check_range(&SECONDS, seconds);
    decoded
}

/// Seconds since midnight back to zero-padded `HH:MM:SS`. Hours are not wrapped at 24.
pub fn encode_time(secs_since_midnight: i32) -> String {
    if secs_since_midnight == INT_MISSING {
        return String::new();
    }
    let hours = secs_since_midnight / 3600;
    let minutes = (secs_since_midnight % 3600) / 60;
    let seconds = secs_since_midnight % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_midnight_is_clean() {
        let d = decode_time("25:30:00");
        assert_eq!(d.value, 91_800);
        assert!(d.is_clean());
    }

    #[test]
    fn hours_over_ceiling_still_compute() {
        let d = decode_time("99:00:00");
        assert_eq!(d.value, 356_400);
        assert_eq!(
            d.problems,
            vec![FieldProblem::Range {
                min: 0.0,
                max: 72.0,
                actual: 99.0
            }]
        );
    }

    #[test]
    fn every_bad_component_is_reported() {
        let d = decode_time("08:61:75");
        assert_eq!(d.value, 8 * 3600 + 61 * 60 + 75);
        assert_eq!(d.problems.len(), 2);
    }

    #[test]
    fn wrong_shape_is_a_parse_problem() {
        for raw in ["8:00", "08:00:00:00", "08:xx:00", "0800", "12:00:"] {
            let d = decode_time(raw);
            assert_eq!(d.value, INT_MISSING, "{raw}");
            assert_eq!(d.problems, vec![FieldProblem::TimeParse], "{raw}");
        }
    }

    #[test]
    fn single_digit_hours_are_accepted() {
        assert_eq!(decode_time("7:05:09").value, 7 * 3600 + 5 * 60 + 9);
    }

    #[test]
    fn encodes_unclamped_hours() {
        assert_eq!(encode_time(91_800), "25:30:00");
        assert_eq!(encode_time(0), "00:00:00");
        assert_eq!(encode_time(3 * 86_400 + 61), "72:01:01");
        assert_eq!(encode_time(INT_MISSING), "");
    }

    #[test]
    fn encoded_times_decode_to_the_same_seconds() {
        for secs in [0, 59, 3_599, 43_200, 86_399, 91_800, 259_199] {
            assert_eq!(decode_time(&encode_time(secs)).value, secs);
        }
    }
}
