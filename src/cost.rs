//! Request cost from vendor list prices.

use crate::types::{ModelDescriptor, Usage};

const PER_MILLION: f64 = 1_000_000.0;

/// Cost of one request.
///
/// `input_units / 1e6 * input_rate + output_units / 1e6 * output_rate`, or
/// `0.0` when usage is missing or the descriptor carries no usable pricing.
/// No rounding is applied.
pub fn cost(usage: Option<&Usage>, descriptor: &ModelDescriptor) -> f64 {
    let (Some(usage), Some(pricing)) = (usage, descriptor.pricing) else {
        return 0.0;
    };
    let rates = [pricing.input_per_million, pricing.output_per_million];
    if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
        return 0.0;
    }

    usage.input_units as f64 / PER_MILLION * pricing.input_per_million
        + usage.output_units as f64 / PER_MILLION * pricing.output_per_million
}
