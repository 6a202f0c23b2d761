//! Per-token pricing for known models.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) USD cost per token for `model`, zero when unknown.
pub(crate) fn model_cost(model: &str) -> (Decimal, Decimal) {
    let per_million = if model.contains("opus") {
        (dec!(15), dec!(75))
    } else if model.contains("sonnet") {
        (dec!(3), dec!(15))
    } else if model.contains("haiku") {
        (dec!(0.8), dec!(4))
    } else if model.starts_with("gpt-4o-mini") {
        (dec!(0.15), dec!(0.6))
    } else if model.starts_with("gpt-4o") {
        (dec!(2.5), dec!(10))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let million = dec!(1_000_000);
    (per_million.0 / million, per_million.1 / million)
}

/// Estimated USD cost of one call.
pub(crate) fn estimate(costs: (Decimal, Decimal), input_tokens: u32, output_tokens: u32) -> Decimal {
    costs.0 * Decimal::from(input_tokens) + costs.1 * Decimal::from(output_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonnet_pricing() {
        let (input, output) = model_cost("claude-sonnet-4-20250514");
        assert_eq!(input * dec!(1_000_000), dec!(3));
        assert_eq!(output * dec!(1_000_000), dec!(15));
    }

    #[test]
    fn mini_matches_before_full_gpt4o() {
        let (input, _) = model_cost("gpt-4o-mini");
        assert_eq!(input * dec!(1_000_000), dec!(0.15));
    }

    #[test]
    fn unknown_model_is_free() {
        assert_eq!(model_cost("stub"), (Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn estimate_sums_both_directions() {
        let cost = estimate((dec!(0.001), dec!(0.002)), 100, 50);
        assert_eq!(cost, dec!(0.2));
    }
}
