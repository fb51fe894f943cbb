//! Utils

use crate::Amount;

/// Split an amount into cashu denominations (powers of two), ascending.
///
/// `splitAmount(100) == [4, 32, 64]`.
pub fn split_amount(amount: Amount) -> Vec<Amount> {
    let mut chunks = Vec::new();
    let value = amount.to_sat();
    for i in 0..64 {
        let mask = 1 << i;
        if (value & mask) != 0 {
            chunks.push(Amount::from_sat(2u64.pow(i as u32)));
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_amount_ascending() {
        assert_eq!(split_amount(Amount::from_sat(0)), Vec::<Amount>::new());
        assert_eq!(split_amount(Amount::from_sat(1)), vec![Amount::from_sat(1)]);
        assert_eq!(
            split_amount(Amount::from_sat(7)),
            vec![Amount::from_sat(1), Amount::from_sat(2), Amount::from_sat(4)]
        );
        assert_eq!(
            split_amount(Amount::from_sat(100)),
            vec![Amount::from_sat(4), Amount::from_sat(32), Amount::from_sat(64)]
        );
        assert_eq!(
            split_amount(Amount::from_sat(128)),
            vec![Amount::from_sat(128)]
        );
    }
}
