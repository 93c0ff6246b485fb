use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, HighlightResult};

/// Separator between magnitude and phase in a transmittance label.
pub const ANGLE_SEPARATOR: char = '∠';

/// Edge transmittance as delivered by the analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub magnitude: f64,
    /// Degrees.
    pub phase: f64,
    #[serde(default)]
    pub symbolic: String,
}

impl Weight {
    pub fn new(magnitude: f64, phase: f64) -> Self {
        Self {
            magnitude,
            phase,
            symbolic: String::new(),
        }
    }

    pub fn with_symbolic(mut self, symbolic: impl Into<String>) -> Self {
        self.symbolic = symbolic.into();
        self
    }

    /// The label shown on the edge, e.g. `2.00e+0∠-90.00`.
    pub fn label(&self) -> String {
        // -0.00 would read oddly next to the angle sign
        let phase = if self.phase == 0.0 { 0.0 } else { self.phase };
        format!(
            "{}{}{:.2}",
            to_exponential(self.magnitude, 2),
            ANGLE_SEPARATOR,
            phase
        )
    }
}

/// Fractional digits that spell out any finite `f64` exactly.
const EXACT_DIGITS: usize = 800;

/// Formats `value` with `digits` fractional mantissa digits, the way
/// `Number.prototype.toExponential` does (`6.00e+0`, `1.50e-3`).
///
/// Rounding works on the exact decimal expansion and sends ties away from
/// zero, so `1.125` gives `1.13e+0` where `{:.2e}` would give `1.12e+0`.
/// `digits` is clamped to 100.
pub fn to_exponential(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let digits = digits.min(100);
    let exact = format!("{:.*e}", EXACT_DIGITS, value.abs());
    let Some((mantissa, exponent)) = exact.split_once('e') else {
        return exact;
    };
    let mut exponent: i32 = exponent.parse().unwrap_or_default();
    let expansion: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    let mut kept = expansion[..=digits].to_vec();
    if expansion[digits + 1] >= 5 {
        round_up(&mut kept, &mut exponent);
    }

    let mut out = String::with_capacity(digits + 8);
    if value < 0.0 {
        out.push('-');
    }
    out.push(char::from(b'0' + kept[0]));
    if digits > 0 {
        out.push('.');
        out.extend(kept[1..].iter().map(|d| char::from(b'0' + d)));
    }
    if exponent < 0 {
        out.push_str(&format!("e{}", exponent));
    } else {
        out.push_str(&format!("e+{}", exponent));
    }
    out
}

/// Adds one unit in the last kept place, carrying into the exponent when
/// every digit was a nine.
fn round_up(kept: &mut Vec<u8>, exponent: &mut i32) {
    for digit in kept.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
    kept.insert(0, 1);
    kept.pop();
    *exponent += 1;
}

/// Extracts the magnitude from a transmittance label.
///
/// Only the text before the angle separator is read; a label without a
/// separator is parsed whole. Non-finite values are rejected so a bad label
/// can never poison a gain product.
pub fn parse_magnitude(edge: &str, label: &str) -> HighlightResult<f64> {
    let magnitude_text = label
        .split(ANGLE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim();

    match magnitude_text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(HighlightError::MalformedWeight {
            edge: edge.to_string(),
            label: label.to_string(),
        }),
    }
}
