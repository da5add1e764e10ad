//! Tolerance verification and ADC conversion helpers.
//!
//! Pure functions, no I/O. Every pass/fail judgement in the jig — rail
//! voltage checks, short detection, jumper bands — funnels through
//! [`within_tolerance`] so the window semantics live in exactly one place.

use crate::ports::ADC_FULL_SCALE;

/// True iff `measured` lies within the closed symmetric window
/// `[expected·(1 − p/100), expected·(1 + p/100)]`.
///
/// `allowed_percent` is not clamped: a negative percentage collapses the
/// window (upper bound below lower bound) and fails everything, and a value
/// above 100 widens it past zero. Both are caller errors that degrade to a
/// deterministic verdict rather than a panic.
pub fn within_tolerance(measured: f32, expected: f32, allowed_percent: f32) -> bool {
    let fraction = allowed_percent / 100.0;
    measured <= expected * (1.0 + fraction) && measured >= expected * (1.0 - fraction)
}

/// Convert normalised 10-bit ADC counts to volts, given the jig VCC.
pub fn counts_to_volts(counts: u16, vcc: f32) -> f32 {
    vcc / f32::from(ADC_FULL_SCALE) * f32::from(counts)
}
