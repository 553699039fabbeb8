//! Magnitude-abbreviated number labels for legend bounds

use serde::{Deserialize, Serialize};

/// How legend bounds are abbreviated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumberFormat {
    /// Head counts: ten-thousand and hundred-million units, comma grouping below that.
    Count {
        ten_thousand_suffix: String,
        hundred_million_suffix: String,
    },
    /// Densities: thousands suffix, whole numbers below that.
    Density { thousand_suffix: String },
}

impl NumberFormat {
    /// Count format with romanized Korean unit suffixes (`man` = 10⁴, `eok` = 10⁸).
    pub fn count() -> Self {
        NumberFormat::Count {
            ten_thousand_suffix: "man".to_string(),
            hundred_million_suffix: "eok".to_string(),
        }
    }

    pub fn density() -> Self {
        NumberFormat::Density { thousand_suffix: "k".to_string() }
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            NumberFormat::Count { ten_thousand_suffix, hundred_million_suffix } => {
                if value >= 100_000_000.0 {
                    format!("{:.1}{}", round_to_tenth(value / 100_000_000.0), hundred_million_suffix)
                } else if value >= 10_000.0 {
                    format!("{}{}", (value / 10_000.0).round() as i64, ten_thousand_suffix)
                } else {
                    group_thousands(value)
                }
            }
            NumberFormat::Density { thousand_suffix } => {
                if value >= 1_000.0 {
                    format!("{:.1}{}", round_to_tenth(value / 1_000.0), thousand_suffix)
                } else {
                    format!("{}", value.round() as i64)
                }
            }
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::count()
    }
}

// Half away from zero, so 2.25 -> 2.3 regardless of formatter rounding mode
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `1234567.5` -> `1,234,567.5`; at most three fraction digits.
pub fn group_thousands(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let abs = rounded.abs();
    let whole = abs.trunc() as u64;
    let digits = whole.to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 5);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let frac = abs - whole as f64;
    if frac > 0.0 {
        let fixed = format!("{:.3}", frac);
        let trimmed = fixed.trim_start_matches('0').trim_end_matches('0');
        if trimmed.len() > 1 {
            out.push_str(trimmed);
        }
    }
    out
}
