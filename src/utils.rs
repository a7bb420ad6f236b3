use ethers::types::{U256, U512};

/// Largest integer every value up to which `f64` holds exactly.
const F64_EXACT_LIMIT: u64 = 1 << 53;
/// Significant bits kept in the scaled quotient before the single rounding.
const QUOTIENT_BITS: i32 = 64;

/// Divides two on-chain integers and returns the quotient as `f64`.
///
/// The result is the correctly rounded value of `numerator / denominator`,
/// so it equals plain `f64` division whenever both operands are exactly
/// representable. Larger operands are divided on a quotient scaled by a
/// power of two to at least 64 significant bits, with the remainder folded
/// into a sticky bit, and rounded once. Returns `None` when `denominator`
/// is zero.
pub fn ratio_to_f64(numerator: U256, denominator: U256) -> Option<f64> {
    if denominator.is_zero() {
        return None;
    }
    if numerator.is_zero() {
        return Some(0.0);
    }
    let limit = U256::from(F64_EXACT_LIMIT);
    if numerator <= limit && denominator <= limit {
        return Some(numerator.low_u64() as f64 / denominator.low_u64() as f64);
    }

    // numerator * 2^shift / denominator lands in (2^63, 2^65)
    let shift = QUOTIENT_BITS - numerator.bits() as i32 + denominator.bits() as i32;
    let (scaled_num, scaled_den) = if shift >= 0 {
        (U512::from(numerator) << shift as usize, U512::from(denominator))
    } else {
        (U512::from(numerator), U512::from(denominator) << (-shift) as usize)
    };
    let (quotient, remainder) = scaled_num.div_mod(scaled_den);
    let mut quotient = quotient.low_u128();
    if !remainder.is_zero() {
        quotient |= 1;
    }
    Some(quotient as f64 * pow2(-shift))
}

/// Exact `2^exp` for exponents in the normal `f64` range.
fn pow2(exp: i32) -> f64 {
    f64::from_bits(((1023 + exp) as u64) << 52)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(numerator: u128, denominator: u128) -> f64 {
        ratio_to_f64(U256::from(numerator), U256::from(denominator)).unwrap()
    }

    #[test]
    fn matches_float_division_for_small_values() {
        assert_eq!(ratio(300_000, 15_000_000), 0.02);
        assert_eq!(ratio(7, 3_000_000_000_000_000), 7f64 / 3e15);
        assert_eq!(
            ratio(1_234_567_891_234, 987_654_321_987_654),
            1_234_567_891_234f64 / 987_654_321_987_654f64
        );
    }

    #[test]
    fn tiny_ratio_keeps_significant_digits() {
        assert_eq!(ratio(1, 10_000_000_000_000_000_000), 1f64 / 1e19);
        assert_eq!(ratio(3, 7 << 70), 3f64 / (7u128 << 70) as f64);
    }

    #[test]
    fn wei_scale_operands_match_exact_division() {
        // powers of two times small factors are exact in f64 at any magnitude
        let distribute = 5u128 << 90;
        let circ = 3u128 << 100;
        assert_eq!(ratio(distribute, circ), distribute as f64 / circ as f64);

        let distribute = 1_500_000_000_000_000_000u128;
        let circ = 1_000_000_000_000_000_000_000u128;
        assert_eq!(ratio(distribute, circ), 0.0015);
    }

    #[test]
    fn zero_denominator() {
        assert_eq!(ratio_to_f64(U256::one(), U256::zero()), None);
    }

    #[test]
    fn zero_numerator() {
        assert_eq!(ratio(0, 1 << 100), 0.0);
    }

    #[test]
    fn large_quotient() {
        let rebase = ratio_to_f64(U256::exp10(40), U256::from(4u64)).unwrap();
        assert_eq!(rebase, 2.5e39);
    }
}
