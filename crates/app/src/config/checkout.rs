//! Checkout Config

use clap::Args;
use sacola::fees::DeliveryFeePolicy;

/// Fee and payment rules.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Delivery fee in centavos
    #[arg(long, env = "SACOLA_DELIVERY_FEE", default_value_t = 10_00i64, global = true)]
    pub delivery_fee: i64,

    /// Subtotal in centavos from which delivery is free
    #[arg(long, env = "SACOLA_FREE_DELIVERY_FROM", global = true)]
    pub free_delivery_from: Option<i64>,

    /// Express delivery surcharge in centavos
    #[arg(long, env = "SACOLA_EXPRESS_FEE", default_value_t = 5_00i64, global = true)]
    pub express_fee: i64,

    /// Accept stored cards without a processor token
    #[arg(long, env = "SACOLA_ALLOW_TOKENLESS_CARD", default_value_t = false, global = true)]
    pub allow_tokenless_card: bool,
}

impl CheckoutConfig {
    /// Delivery fee policy for the bag.
    #[must_use]
    pub fn fee_policy(&self) -> DeliveryFeePolicy {
        match self.free_delivery_from {
            Some(threshold) => DeliveryFeePolicy::free_from(self.delivery_fee, threshold),
            None => DeliveryFeePolicy::Flat(self.delivery_fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(free_delivery_from: Option<i64>) -> CheckoutConfig {
        CheckoutConfig {
            delivery_fee: 10_00,
            free_delivery_from,
            express_fee: 5_00,
            allow_tokenless_card: false,
        }
    }

    #[test]
    fn flat_fee_without_threshold() {
        assert_eq!(config(None).fee_policy(), DeliveryFeePolicy::Flat(10_00));
    }

    #[test]
    fn threshold_waives_fee() {
        let policy = config(Some(80_00)).fee_policy();

        assert_eq!(policy.fee_for(50_00, false), 10_00);
        assert_eq!(policy.fee_for(80_00, false), 0);
    }
}
