//! Cost estimation from token usage and catalog pricing.

use crate::types::ModelDescriptor;

/// Estimated USD cost of a call.
///
/// `(input / 1000) * input_cost_per_1k + (output / 1000) * output_cost_per_1k`.
/// Not rounded; callers round for display with [`round_to()`].
pub fn estimate(model: &ModelDescriptor, input_tokens: u32, output_tokens: u32) -> f64 {
    let input_cost = f64::from(input_tokens) / 1000.0 * model.input_cost_per_1k;
    let output_cost = f64::from(output_tokens) / 1000.0 * model.output_cost_per_1k;
    input_cost + output_cost
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
