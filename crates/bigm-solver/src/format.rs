//! Display strings for tableau values.
//!
//! Every value in a Big-M tableau is a real number of the form `c + k·M`.
//! [`BigMFormat`] splits it back into the symbolic form for display and
//! [`to_fraction`] renders the plain remainder as a short rational.

use num_rational::Rational64;

/// Default penalty constant for artificial variables
pub const DEFAULT_BIG_M: f64 = 1000.0;

/// Largest denominator [`to_fraction`] will print
pub const MAX_DENOMINATOR: i64 = 1000;

const INTEGER_TOLERANCE: f64 = 1e-9;
const FRACTION_TOLERANCE: f64 = 1e-6;
const CONSTANT_EPSILON: f64 = 1e-4;
/// Past this magnitude convergents would overflow `i64`
const MAX_RATIONAL_MAGNITUDE: f64 = 1e12;

/// Render a finite real number as an integer, a low-denominator fraction
/// `p/q`, or a decimal with at most 6 places.
pub fn to_fraction(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }

    let nearest = value.round();
    if (value - nearest).abs() < INTEGER_TOLERANCE {
        if nearest == 0.0 {
            return "0".to_string();
        }
        return format!("{}", nearest);
    }

    if value.abs() < MAX_RATIONAL_MAGNITUDE {
        if let Some(ratio) = approximate(value) {
            return ratio.to_string();
        }
    }

    decimal(value)
}

/// Continued-fraction expansion, stopping at the first convergent that is
/// close enough or when the denominator grows past [`MAX_DENOMINATOR`].
fn approximate(value: f64) -> Option<Rational64> {
    let target = value.abs();
    let (mut h_prev, mut h) = (0_i64, 1_i64);
    let (mut k_prev, mut k) = (1_i64, 0_i64);
    let mut remainder = target;

    for _ in 0..64 {
        let a = remainder.floor();
        let a_int = a as i64;
        let h_next = a_int.checked_mul(h)?.checked_add(h_prev)?;
        let k_next = a_int.checked_mul(k)?.checked_add(k_prev)?;
        if k_next > MAX_DENOMINATOR {
            return None;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);

        if k > 0 && (h as f64 / k as f64 - target).abs() < FRACTION_TOLERANCE {
            let numer = if value < 0.0 { -h } else { h };
            return Some(Rational64::new(numer, k));
        }

        let frac = remainder - a;
        if frac < 1e-12 {
            return None;
        }
        remainder = 1.0 / frac;
    }
    None
}

fn decimal(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" || text.is_empty() {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Formats values of the form `constant + coefficient·M`.
///
/// The decomposition `coefficient = round(value / M)` is only exact because
/// every tableau value is a multiple of `M` plus a remainder much smaller
/// than `M`. It is not a general parser for real numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigMFormat {
    big_m: f64,
}

impl Default for BigMFormat {
    fn default() -> Self {
        Self { big_m: DEFAULT_BIG_M }
    }
}

impl BigMFormat {
    pub fn new(big_m: f64) -> Self {
        Self { big_m }
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    /// Split a value into its `M` coefficient and constant remainder
    pub fn split(&self, value: f64) -> (i64, f64) {
        // Half-way values round towards +inf so that -M/2 renders as "-500"
        // rather than "-M + 500".
        let coefficient = (value / self.big_m + 0.5).floor();
        let constant = value - coefficient * self.big_m;
        (coefficient as i64, constant)
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return "—".to_string();
        }

        let (coefficient, constant) = self.split(value);
        let mut out = match coefficient {
            0 => String::new(),
            1 => "M".to_string(),
            -1 => "-M".to_string(),
            k => format!("{}M", k),
        };

        if constant.abs() > CONSTANT_EPSILON {
            let frac = to_fraction(constant.abs());
            if out.is_empty() {
                if constant < 0.0 {
                    out.push('-');
                }
                out.push_str(&frac);
            } else {
                out.push_str(if constant > 0.0 { " + " } else { " - " });
                out.push_str(&frac);
            }
        }

        if out.is_empty() {
            out.push('0');
        }
        out
    }

    /// Format an optional value, keeping `None` as `None`
    pub fn format_opt(&self, value: Option<f64>) -> Option<String> {
        value.map(|v| self.format(v))
    }

    pub fn format_all(&self, values: &[f64]) -> Vec<String> {
        values.iter().map(|v| self.format(*v)).collect()
    }
}
