//! Weighted checksum algorithms used by boleto barcodes and our-numbers.
//!
//! The modulo-11 helpers return the raw remainder; mapping a remainder to a
//! final check digit is a per-bank decision and lives next to the caller.

use crate::error::{BoletoError, Result};

/// Parses a non-empty ASCII digit string into its digit values.
fn digits_of(input: &str) -> Result<Vec<u32>> {
    if input.is_empty() {
        return Err(BoletoError::InvalidInput(input.to_string()));
    }
    input
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| BoletoError::InvalidInput(input.to_string()))
}

/// Classic boleto modulo-10 digit.
///
/// Multipliers alternate 2, 1, 2, ... starting at the rightmost digit; a
/// product of 10 or more contributes the sum of its digits. The result is
/// `10 - (sum mod 10)`, with 10 folded to 0.
///
/// ```
/// use boleto_engine::checksum::modulo10;
///
/// assert_eq!(modulo10("261533").unwrap(), 4);
/// ```
pub fn modulo10(input: &str) -> Result<u8> {
    let sum: u32 = digits_of(input)?
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            let product = if i % 2 == 0 { d * 2 } else { *d };
            if product > 9 {
                product - 9
            } else {
                product
            }
        })
        .sum();
    Ok(((10 - sum % 10) % 10) as u8)
}

/// Weighted modulo-11 remainder.
///
/// Weights start at `min_weight` on the rightmost digit and grow by one per
/// digit up to `max_weight`, then wrap back to `min_weight`. Returns
/// `sum mod 11` untouched.
pub fn modulo11(input: &str, min_weight: u32, max_weight: u32) -> Result<u32> {
    Ok(weighted_sum(input, min_weight, max_weight)? % 11)
}

/// Modulo-11 in the "sum × 10" form.
///
/// Computes `(sum × 10) mod 11` with the same weight cycle as [`modulo11`];
/// a result of 10 cannot be a single digit and is replaced by
/// `digit_on_ten`.
pub fn modulo11_times_ten(
    input: &str,
    min_weight: u32,
    max_weight: u32,
    digit_on_ten: u8,
) -> Result<u8> {
    let remainder = (weighted_sum(input, min_weight, max_weight)? * 10) % 11;
    if remainder == 10 {
        Ok(digit_on_ten)
    } else {
        Ok(remainder as u8)
    }
}

fn weighted_sum(input: &str, min_weight: u32, max_weight: u32) -> Result<u32> {
    if min_weight == 0 || min_weight > max_weight {
        return Err(BoletoError::InvalidInput(format!(
            "weights {}..{}",
            min_weight, max_weight
        )));
    }
    let mut weight = min_weight;
    let mut sum = 0;
    for digit in digits_of(input)?.iter().rev() {
        sum += digit * weight;
        weight = if weight == max_weight {
            min_weight
        } else {
            weight + 1
        };
    }
    Ok(sum)
}

/// General barcode check digit (position 5 of the 44-digit barcode).
///
/// Remainders 0, 1 and 10 all collapse to `1`; anything else is
/// `11 - remainder`.
pub fn barcode_check_digit(payload: &str) -> Result<u8> {
    let remainder = modulo11(payload, 2, 9)?;
    Ok(match remainder {
        r if r <= 1 || r >= 10 => 1,
        r => (11 - r) as u8,
    })
}

/// Check character appended to a Sisprime our-number.
///
/// Runs [`modulo11`] with weights 2..9 over `wallet + number`. Remainder 1
/// yields the literal `'P'`, remainder 0 yields `'0'`, anything else is the
/// digit `11 - remainder`. This mapping is distinct from
/// [`barcode_check_digit`] and must stay that way.
pub fn sisprime_our_number_check(wallet: &str, number: &str) -> Result<char> {
    let remainder = modulo11(&format!("{}{}", wallet, number), 2, 9)?;
    Ok(match remainder {
        0 => '0',
        1 => 'P',
        r => char::from_digit(11 - r, 10).unwrap_or('0'),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulo10_known_values() {
        // right to left: 2*3=6, 3, 2*5=10->1, 1, 2*6=12->3, 2 => 16 -> 4
        assert_eq!(modulo10("261533").unwrap(), 4);
        assert_eq!(modulo10("0").unwrap(), 0);
        assert_eq!(modulo10("5").unwrap(), 9);
    }

    #[test]
    fn test_modulo10_folds_ten_to_zero() {
        // 2*5=10->1, 9 => 10 -> 0
        assert_eq!(modulo10("95").unwrap(), 0);
    }

    #[test]
    fn test_modulo10_rejects_bad_input() {
        assert!(matches!(modulo10(""), Err(BoletoError::InvalidInput(_))));
        assert!(matches!(modulo10("12a4"), Err(BoletoError::InvalidInput(_))));
    }

    #[test]
    fn test_modulo11_weight_cycle() {
        // rightmost to leftmost weights: 2..9 then 2 again
        // "100000000" -> leftmost digit gets weight 2 after wrap
        assert_eq!(modulo11("100000000", 2, 9).unwrap(), 2);
        // "12" -> 2*2 + 1*3 = 7
        assert_eq!(modulo11("12", 2, 9).unwrap(), 7);
        // "99999" -> 9*(2+3+4+5+6) = 180, 180 % 11 = 4
        assert_eq!(modulo11("99999", 2, 9).unwrap(), 4);
    }

    #[test]
    fn test_modulo11_rejects_bad_weights() {
        assert!(modulo11("123", 0, 9).is_err());
        assert!(modulo11("123", 9, 2).is_err());
    }

    #[test]
    fn test_modulo11_times_ten() {
        // "12": sum 7, 70 % 11 = 4
        assert_eq!(modulo11_times_ten("12", 2, 9, 0).unwrap(), 4);
        // "5": sum 10, 100 % 11 = 1
        assert_eq!(modulo11_times_ten("5", 2, 9, 0).unwrap(), 1);
        // "1": sum 2, 20 % 11 = 9
        assert_eq!(modulo11_times_ten("1", 2, 9, 0).unwrap(), 9);
        // "6": sum 12, 120 % 11 = 10 -> replacement digit
        assert_eq!(modulo11_times_ten("6", 2, 9, 0).unwrap(), 0);
        assert_eq!(modulo11_times_ten("6", 2, 9, 1).unwrap(), 1);
    }

    #[test]
    fn test_barcode_check_digit_collapses_edge_remainders() {
        // "5": 10 % 11 = 10 -> 1
        assert_eq!(barcode_check_digit("5").unwrap(), 1);
        // "0": remainder 0 -> 1
        assert_eq!(barcode_check_digit("0").unwrap(), 1);
        // "6": 12 % 11 = 1 -> 1
        assert_eq!(barcode_check_digit("6").unwrap(), 1);
        // "12": remainder 7 -> 4
        assert_eq!(barcode_check_digit("12").unwrap(), 4);
    }

    #[test]
    fn test_sisprime_our_number_check_mapping() {
        // "900000000001": 1*2 + 9*(weight for 12th digit from right)
        // weights right-to-left: 2,3,4,5,6,7,8,9,2,3,4,5 -> 9*5 = 45, +2 = 47, 47 % 11 = 3
        assert_eq!(sisprime_our_number_check("9", "00000000001").unwrap(), '8');
        // "6": 12 % 11 = 1 -> 'P'
        assert_eq!(sisprime_our_number_check("", "6").unwrap(), 'P');
        // "0": 0 -> '0'
        assert_eq!(sisprime_our_number_check("0", "0").unwrap(), '0');
    }
}
