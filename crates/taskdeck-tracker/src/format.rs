/*
[INPUT]:  Elapsed seconds, possibly missing or malformed
[OUTPUT]: `HH:MM:SS` strings and their inverse
[POS]:    Shared helpers - duration display
[UPDATE]: When the duration display format changes
*/

/// Render seconds as zero-padded `HH:MM:SS`.
///
/// Missing, negative, NaN and infinite inputs render as `00:00:00`; fractional
/// seconds are floored. Past `99:59:59` the hour field widens (`100:00:00`).
pub fn format_elapsed(seconds: Option<f64>) -> String {
    let whole = match seconds {
        Some(value) if value.is_finite() && value > 0.0 => value.floor() as u64,
        _ => 0,
    };
    format_seconds(whole)
}

/// Render whole seconds as `HH:MM:SS`
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parse `H..H:MM:SS` back into seconds
pub fn parse_elapsed(text: &str) -> Option<u64> {
    let mut parts = text.trim().split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let secs = parts.next()?;
    if parts.next().is_some() || hours.len() < 2 || minutes.len() != 2 || secs.len() != 2 {
        return None;
    }

    let all_digits = |field: &str| field.bytes().all(|b| b.is_ascii_digit());
    if !(all_digits(hours) && all_digits(minutes) && all_digits(secs)) {
        return None;
    }

    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let secs: u64 = secs.parse().ok()?;
    if minutes > 59 || secs > 59 {
        return None;
    }

    hours.checked_mul(3600)?.checked_add(minutes * 60 + secs)
}
