//! Delivery Fees

/// A tier of a tiered delivery fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTier {
    /// Smallest subtotal (centavos) this tier applies to.
    pub min_subtotal: i64,

    /// Fee charged (centavos) once the subtotal reaches `min_subtotal`.
    pub fee: i64,
}

/// Policy deciding the delivery fee for a subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFeePolicy {
    /// Same fee for every non-empty cart.
    Flat(i64),

    /// Fee picked from the highest tier the subtotal reaches. Subtotals below
    /// every tier pay the fee of the lowest tier.
    Tiered(Vec<FeeTier>),
}

impl DeliveryFeePolicy {
    /// Flat fee up to `threshold`, free from there on.
    pub fn free_from(fee: i64, threshold: i64) -> Self {
        Self::Tiered(vec![
            FeeTier {
                min_subtotal: 0,
                fee,
            },
            FeeTier {
                min_subtotal: threshold,
                fee: 0,
            },
        ])
    }

    /// Fee for a cart with the given subtotal and line count.
    ///
    /// Empty carts are never charged.
    pub fn fee_for(&self, subtotal: i64, is_empty: bool) -> i64 {
        if is_empty {
            return 0;
        }

        match self {
            Self::Flat(fee) => *fee,
            Self::Tiered(tiers) => tiers
                .iter()
                .filter(|tier| subtotal >= tier.min_subtotal)
                .max_by_key(|tier| tier.min_subtotal)
                .or_else(|| tiers.iter().min_by_key(|tier| tier.min_subtotal))
                .map_or(0, |tier| tier.fee),
        }
    }
}

impl Default for DeliveryFeePolicy {
    fn default() -> Self {
        Self::Flat(10_00)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_fee_applies_to_any_non_empty_cart() {
        let policy = DeliveryFeePolicy::Flat(10_00);

        assert_eq!(policy.fee_for(1, false), 10_00);
        assert_eq!(policy.fee_for(500_00, false), 10_00);
    }

    #[test]
    fn empty_cart_pays_nothing() {
        assert_eq!(DeliveryFeePolicy::Flat(10_00).fee_for(0, true), 0);
    }

    #[test]
    fn tiered_fee_uses_highest_reached_tier() {
        let policy = DeliveryFeePolicy::free_from(10_00, 80_00);

        assert_eq!(policy.fee_for(79_99, false), 10_00);
        assert_eq!(policy.fee_for(80_00, false), 0);
    }

    #[test]
    fn tiered_fee_below_every_tier_uses_lowest() {
        let policy = DeliveryFeePolicy::Tiered(vec![
            FeeTier {
                min_subtotal: 20_00,
                fee: 8_00,
            },
            FeeTier {
                min_subtotal: 50_00,
                fee: 4_00,
            },
        ]);

        assert_eq!(policy.fee_for(5_00, false), 8_00);
    }
}
