//! Small text helpers shared by the aggregator and the renderer.

use std::time::Duration;

/// Fit `text` into exactly `size` columns: pad with spaces, or cut and end
/// with `...` when too long.
pub fn pad(text: &str, size: usize) -> String {
    let len = text.chars().count();
    if len > size {
        if size < 3 {
            return ".".repeat(size);
        }
        let mut cut: String = text.chars().take(size - 3).collect();
        cut.push_str("...");
        cut
    } else {
        let mut padded = String::with_capacity(text.len() + size - len);
        padded.push_str(text);
        padded.extend(std::iter::repeat_n(' ', size - len));
        padded
    }
}

/// Render an age rounded to the second, e.g. `45s`, `1m10s`, `2h0m3s`.
pub fn age(d: Duration) -> String {
    let millis = d.as_millis();
    let secs = (millis + 500) / 1000;
    hms(secs, None)
}

/// Render a latency rounded to the millisecond, e.g. `87ms`, `1.204s`.
pub fn latency(d: Duration) -> String {
    let micros = d.as_micros();
    let millis = (micros + 500) / 1000;
    if millis == 0 {
        "0s".to_string()
    } else if millis < 1000 {
        format!("{millis}ms")
    } else {
        hms(millis / 1000, Some(millis % 1000))
    }
}

fn hms(secs: u128, frac_millis: Option<u128>) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&seconds.to_string());
    if let Some(frac) = frac_millis.filter(|f| *f > 0) {
        let digits = format!("{frac:03}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push('s');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("abc", 6, "abc   " ; "pads short")]
    #[test_case("abcdef", 6, "abcdef" ; "exact fit")]
    #[test_case("abcdefgh", 6, "abc..." ; "truncates long")]
    #[test_case("héllo wörld", 8, "héllo..." ; "counts chars not bytes")]
    #[test_case("abcdef", 2, ".." ; "tiny width")]
    fn pad_cases(input: &str, size: usize, expected: &str) {
        assert_eq!(pad(input, size), expected);
    }

    #[test_case(0, "0s" ; "zero")]
    #[test_case(45_400, "45s" ; "rounds down")]
    #[test_case(45_500, "46s" ; "rounds up")]
    #[test_case(70_000, "1m10s" ; "minutes")]
    #[test_case(3_600_000, "1h0m0s" ; "hour")]
    #[test_case(3_725_000, "1h2m5s" ; "hour minutes seconds")]
    fn age_cases(millis: u64, expected: &str) {
        assert_eq!(age(Duration::from_millis(millis)), expected);
    }

    #[test_case(0, "0s" ; "zero")]
    #[test_case(87_000, "87ms" ; "millis")]
    #[test_case(1_500_000, "1.5s" ; "fraction trimmed")]
    #[test_case(1_204_000, "1.204s" ; "three digits")]
    #[test_case(61_000_000, "1m1s" ; "minute")]
    fn latency_cases(micros: u64, expected: &str) {
        assert_eq!(latency(Duration::from_micros(micros)), expected);
    }
}
