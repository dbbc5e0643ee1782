//! Number formatting for mitigation displays.
//!
//! Renderers format every value through this module so that party frames,
//! the local summary and the CLI agree, including European-style number
//! formatting (swapping `.` and `,`).

/// Swap `.` and `,` in an already formatted number.
fn europeanize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '.' => ',',
            ',' => '.',
            _ => c,
        })
        .collect()
}

#[inline]
fn maybe_eu(s: String, european: bool) -> String {
    if european { europeanize(&s) } else { s }
}

/// Format a damage reduction percentage with one decimal place.
///
/// Zero (or anything that rounds to it) renders as `"-"` so empty party
/// slots don't read as "0.0%" of something.
///
/// # Examples
/// ```
/// use aegis_types::formatting::format_reduction;
/// assert_eq!(format_reduction(32.0, false), "32.0%");
/// assert_eq!(format_reduction(12.34, true), "12,3%");
/// assert_eq!(format_reduction(0.0, false), "-");
/// ```
pub fn format_reduction(pct: f32, european: bool) -> String {
    if pct < 0.05 {
        return "-".to_string();
    }
    maybe_eu(format!("{:.1}%", pct), european)
}

/// Format a shield amount with K/M suffix.
///
/// # Examples
/// ```
/// use aegis_types::formatting::format_shield;
/// assert_eq!(format_shield(0.0, false), "0");
/// assert_eq!(format_shield(850.0, false), "850");
/// assert_eq!(format_shield(12_500.0, false), "12.50K");
/// assert_eq!(format_shield(1_250_000.0, true), "1,25M");
/// ```
pub fn format_shield(amount: f32, european: bool) -> String {
    let n = amount.max(0.0) as f64;
    let s = if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.0}", n)
    };
    maybe_eu(s, european)
}

/// Format the remaining time of an active effect.
///
/// - `>= 60s`: `Xm`
/// - `>= 10s`: whole seconds
/// - `< 10s`: one decimal place
/// - `<= 0`: empty (permanent or untimed effects)
///
/// # Examples
/// ```
/// use aegis_types::formatting::format_remaining;
/// assert_eq!(format_remaining(75.3, false), "1m");
/// assert_eq!(format_remaining(15.7, false), "16");
/// assert_eq!(format_remaining(3.5, true), "3,5");
/// assert_eq!(format_remaining(0.0, false), "");
/// ```
pub fn format_remaining(secs: f32, european: bool) -> String {
    if secs <= 0.0 {
        String::new()
    } else if secs >= 60.0 {
        format!("{}m", (secs / 60.0).floor() as u32)
    } else if secs >= 10.0 {
        format!("{:.0}", secs)
    } else {
        maybe_eu(format!("{:.1}", secs), european)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_reduction() {
        assert_eq!(format_reduction(10.0, false), "10.0%");
        assert_eq!(format_reduction(32.000_004, false), "32.0%");
        assert_eq!(format_reduction(15.0, true), "15,0%");
        assert_eq!(format_reduction(0.01, false), "-");
    }

    #[test]
    fn test_format_shield() {
        assert_eq!(format_shield(999.0, false), "999");
        assert_eq!(format_shield(1_000.0, false), "1.00K");
        assert_eq!(format_shield(15_000.0, true), "15,00K");
        assert_eq!(format_shield(-5.0, false), "0");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(120.0, false), "2m");
        assert_eq!(format_remaining(10.0, false), "10");
        assert_eq!(format_remaining(9.96, false), "10.0");
        assert_eq!(format_remaining(-1.0, true), "");
    }

    #[test]
    fn test_europeanize_swaps_both_separators() {
        assert_eq!(europeanize("1,234.5"), "1.234,5");
    }
}
