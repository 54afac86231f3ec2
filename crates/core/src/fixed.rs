//! Micro-precision fixed-point conversions.
//!
//! Tree traversal and scoring work on raw scaled `i64` values so that
//! inference is bit-for-bit reproducible across platforms. Floating point
//! exists only at the boundaries: CSV ingestion (log-transforming the
//! target) and the HTTP response (inverting that transform).

/// Scaling factor: 1 unit = 1e-6.
pub const SCALE: i64 = 1_000_000;

/// Convert an `f64` into a micro-scaled integer, rounding to the nearest unit.
#[inline]
pub fn micros_from_f64(value: f64) -> i64 {
    (value * SCALE as f64).round() as i64
}

/// Convert a micro-scaled integer back to `f64`.
#[inline]
pub fn f64_from_micros(micros: i64) -> f64 {
    micros as f64 / SCALE as f64
}

/// Scale an ordinal category code into feature space.
///
/// Codes must ride at full micro scale so that threshold quantization
/// during training cannot collapse adjacent categories.
#[inline]
pub fn micros_from_code(code: i64) -> i64 {
    code.saturating_mul(SCALE)
}

/// Log-transform a raw target value: `ln(1 + loss)` in micro units.
#[inline]
pub fn log_micros_from_loss(loss: f64) -> i64 {
    micros_from_f64(loss.ln_1p())
}

/// Invert the target transform: `exp(x) - 1` on a micro-scaled log value.
#[inline]
pub fn loss_from_log_micros(log_micros: i64) -> f64 {
    f64_from_micros(log_micros).exp_m1()
}
