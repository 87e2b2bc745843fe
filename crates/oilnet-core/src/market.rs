//! Market dynamics: the bounded price walk and elastic demand.

use oilnet_types::MarketState;
use rust_decimal::{Decimal, MathematicalOps};

use crate::config::MarketConfig;
use crate::random::RandomSource;

/// Decimal places kept on posted prices.
const PRICE_DP: u32 = 2;
/// Decimal places kept on barrel volumes derived from ratios.
const VOLUME_DP: u32 = 4;

/// Build the opening market from configuration.
pub fn opening_market(config: &MarketConfig) -> MarketState {
    let mut market = MarketState {
        crude_price: config.crude_price,
        refined_price: config.refined_price,
        reference_price: config.reference_price,
        elasticity: config.elasticity,
        terminal_fee: config.terminal_fee,
    };
    enforce_refined_floor(&mut market, config.refined_margin);
    market
}

/// Move `price` by a random relative step of at most `volatility`, then
/// clamp it into `[floor, ceiling]`.
pub fn walk_price(
    price: Decimal,
    volatility: Decimal,
    floor: Decimal,
    ceiling: Decimal,
    rng: &mut dyn RandomSource,
) -> Decimal {
    let step = rng.jitter(volatility);
    let moved = Decimal::ONE
        .checked_add(step)
        .and_then(|factor| price.checked_mul(factor))
        .unwrap_or(price)
        .round_dp(PRICE_DP);
    moved.max(floor).min(ceiling)
}

/// Advance both global prices one turn. Crude is drawn before refined.
pub fn update_prices(market: &mut MarketState, config: &MarketConfig, rng: &mut dyn RandomSource) {
    market.crude_price = walk_price(
        market.crude_price,
        config.volatility,
        config.price_floor,
        config.price_ceiling,
        rng,
    );
    market.refined_price = walk_price(
        market.refined_price,
        config.volatility,
        config.price_floor,
        config.price_ceiling,
        rng,
    );
    enforce_refined_floor(market, config.refined_margin);
}

/// Refined product never trades below crude; when it would, it is reset to
/// crude plus the fixed margin.
pub fn enforce_refined_floor(market: &mut MarketState, margin: Decimal) {
    if market.refined_price < market.crude_price {
        market.refined_price = market.crude_price.saturating_add(margin);
    }
}

/// Elastic demand at a node:
///
/// ```text
/// demand = base * (reference / price) ^ elasticity
/// ```
///
/// Returns `base` unchanged for zero elasticity, a non-positive price, or
/// when the power overflows.
pub fn elastic_demand(
    base: Decimal,
    reference: Decimal,
    price: Decimal,
    elasticity: Decimal,
) -> Decimal {
    if elasticity.is_zero() || price <= Decimal::ZERO {
        return base;
    }
    reference
        .checked_div(price)
        .and_then(|ratio| ratio.checked_powd(elasticity))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(base, |d| d.round_dp(VOLUME_DP).max(Decimal::ZERO))
}

/// Compound a base demand by one turn of growth plus noise on the rate.
pub fn grow_demand(base: Decimal, growth_rate: Decimal, jitter: Decimal) -> Decimal {
    Decimal::ONE
        .checked_add(growth_rate)
        .and_then(|f| f.checked_add(jitter))
        .and_then(|f| base.checked_mul(f))
        .map_or(base, |d| d.round_dp(VOLUME_DP).max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::random::{NoJitter, SeededRandom};

    /// Always returns `+amplitude`.
    #[derive(Debug)]
    struct MaxUp;

    impl RandomSource for MaxUp {
        fn jitter(&mut self, amplitude: Decimal) -> Decimal {
            amplitude
        }
    }

    /// Always returns `-amplitude`.
    #[derive(Debug)]
    struct MaxDown;

    impl RandomSource for MaxDown {
        fn jitter(&mut self, amplitude: Decimal) -> Decimal {
            -amplitude
        }
    }

    #[test]
    fn walk_without_noise_is_flat() {
        let price = walk_price(dec!(20), dec!(0.05), dec!(5), dec!(100), &mut NoJitter);
        assert_eq!(price, dec!(20));
    }

    #[test]
    fn walk_moves_by_volatility() {
        assert_eq!(
            walk_price(dec!(20), dec!(0.05), dec!(5), dec!(100), &mut MaxUp),
            dec!(21)
        );
        assert_eq!(
            walk_price(dec!(20), dec!(0.05), dec!(5), dec!(100), &mut MaxDown),
            dec!(19)
        );
    }

    #[test]
    fn walk_is_clamped() {
        assert_eq!(
            walk_price(dec!(99), dec!(0.5), dec!(5), dec!(100), &mut MaxUp),
            dec!(100)
        );
        assert_eq!(
            walk_price(dec!(6), dec!(0.5), dec!(5), dec!(100), &mut MaxDown),
            dec!(5)
        );
    }

    #[test]
    fn seeded_walk_stays_in_band() {
        let mut rng = SeededRandom::new(3);
        let mut price = dec!(50);
        for _ in 0..200 {
            price = walk_price(price, dec!(0.2), dec!(10), dec!(80), &mut rng);
            assert!(price >= dec!(10) && price <= dec!(80));
        }
    }

    #[test]
    fn refined_never_below_crude() {
        let config = MarketConfig {
            crude_price: dec!(40),
            refined_price: dec!(30),
            ..MarketConfig::default()
        };
        let market = opening_market(&config);
        assert_eq!(market.refined_price, dec!(45));

        let mut market = market;
        market.refined_price = dec!(41);
        update_prices(&mut market, &config, &mut NoJitter);
        assert_eq!(market.refined_price, dec!(41));
    }

    #[test]
    fn price_at_reference_keeps_base_demand() {
        assert_eq!(
            elastic_demand(dec!(80), dec!(20), dec!(20), dec!(0.5)),
            dec!(80)
        );
    }

    #[test]
    fn higher_price_lowers_demand() {
        // (20 / 80) ^ 0.5 = 0.5
        let demand = elastic_demand(dec!(80), dec!(20), dec!(80), dec!(0.5));
        assert!((demand - dec!(40)).abs() < dec!(0.001));
        assert!(elastic_demand(dec!(80), dec!(20), dec!(10), dec!(1)) > dec!(80));
    }

    #[test]
    fn zero_elasticity_is_inelastic() {
        assert_eq!(elastic_demand(dec!(50), dec!(35), dec!(19), Decimal::ZERO), dec!(50));
        assert_eq!(elastic_demand(dec!(50), dec!(35), Decimal::ZERO, dec!(1)), dec!(50));
    }

    #[test]
    fn growth_compounds_rate_plus_jitter() {
        assert_eq!(grow_demand(dec!(100), dec!(0.02), Decimal::ZERO), dec!(102));
        assert_eq!(grow_demand(dec!(100), dec!(0.02), dec!(0.01)), dec!(103));
        assert_eq!(grow_demand(dec!(100), dec!(-2), Decimal::ZERO), Decimal::ZERO);
    }
}
