//! Small formatting helpers: human-readable sizes and elapsed durations.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

const UNITS: [&str; 8] = ["KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Decimal (powers of 1000) size string: `"512 bytes"`, `"1.5 MB"`, `"16 GB"`.
pub fn format_size(b: u64) -> String {
    if b == 1 {
        return "1 byte".into();
    }
    if b < 1000 {
        return format!("{b} bytes");
    }
    let mut v = b as f64;
    let mut unit = UNITS[0];
    for u in UNITS {
        v /= 1000.0;
        unit = u;
        if v < 1000.0 {
            break;
        }
    }
    format!("{} {unit}", trim_decimals(v))
}

// Two decimals at most, trailing zeros dropped.
fn trim_decimals(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// Percentage of `part` in `total`, rounded to one decimal; 0 when total is 0.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 1000.0).round() / 10.0
}

/// A span of time that always crosses the wire as text.
///
/// Rendered as `H:MM:SS`, prefixed with `N day[s], ` once it exceeds a day,
/// e.g. 3661s -> `"1:01:01"` and 90061s -> `"1 day, 1:01:01"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Elapsed(pub Duration);

impl Elapsed {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl From<Duration> for Elapsed {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs();
        let days = total / 86_400;
        let rem = total % 86_400;
        let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
        match days {
            0 => write!(f, "{h}:{m:02}:{s:02}"),
            1 => write!(f, "1 day, {h}:{m:02}:{s:02}"),
            d => write!(f, "{d} days, {h}:{m:02}:{s:02}"),
        }
    }
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
