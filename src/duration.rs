use std::{sync::OnceLock, time::Duration};

use regex::Regex;

// contentDetails.duration, e.g. PT1H2M3S or P1DT2H for very long streams
const ISO8601_DURATION: &str =
    r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$";

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ISO8601_DURATION).expect("duration regex is valid"))
}

/// Parses an ISO-8601 duration as YouTube reports it. Anything that does not
/// parse, or does not fit in a [`Duration`], is treated as zero length.
pub fn parse_iso8601_duration(value: &str) -> Duration {
    let Some(caps) = duration_regex().captures(value.trim()) else {
        return Duration::ZERO;
    };

    // None on overflow
    let int = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let component = |i: usize, unit: u64| int(i)?.checked_mul(unit);

    let whole = [
        component(1, 7 * 86_400),
        component(2, 86_400),
        component(3, 3_600),
        component(4, 60),
    ]
    .into_iter()
    .try_fold(0u64, |acc, secs| acc.checked_add(secs?));

    let seconds = caps
        .get(5)
        .map_or(Some(0.0), |m| m.as_str().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

    match (whole, seconds) {
        (Some(whole), Some(seconds)) => Duration::from_secs(whole)
            .checked_add(seconds)
            .unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    }
}

pub fn minutes(duration: Duration) -> f64 {
    duration.as_secs_f64() / 60.0
}
