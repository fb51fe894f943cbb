// https://github.com/clarkmoody/cashu-rs
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Amount error
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    /// Summing amounts overflowed
    #[error("Amount overflow")]
    AmountOverflow,
    /// [`SplitTarget::Values`] did not sum to the amount being split
    #[error("Split values do not sum to the amount being split")]
    SplitValuesMismatch,
    /// No combination of the keyset's denominations sums to this amount
    #[error("Amount cannot be split into the keyset's denominations")]
    UnsplittableAmount,
}

/// How a total amount should be broken up into individual blinded outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SplitTarget {
    /// Use the default ascending power-of-two split.
    #[default]
    None,
    /// Split so that no single output exceeds this value.
    Value(Amount),
    /// Use these exact output amounts. The caller is responsible for making
    /// sure they sum to the amount being split.
    Values(Vec<Amount>),
}

/// A keyset's fee rate and the denominations it signs for.
///
/// Used alongside [`SplitTarget`] to turn an amount into outputs the mint
/// will actually accept; an empty `amounts` means "any power of two".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeAndAmounts {
    /// Fee, in parts-per-thousand, charged per input spent from this keyset.
    pub fee_ppk: u64,
    /// Denominations the keyset signs for. Empty means "all powers of two".
    pub amounts: Vec<Amount>,
}

/// Number of satoshis (or the smallest unit of whatever currency unit applies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(#[serde(with = "bitcoin::amount::serde::as_sat")] bitcoin::Amount);

impl Amount {
    /// Zero amount
    pub const ZERO: Amount = Amount(bitcoin::Amount::ZERO);

    /// Split into powers of two, descending (largest denomination first).
    ///
    /// Used for greedy proof selection, where picking the largest
    /// denominations first minimizes the number of proofs spent.
    pub fn split_descending(&self) -> Vec<Self> {
        let sats = self.0.to_sat();
        (0_u64..64)
            .rev()
            .filter_map(|bit| {
                let part = 1 << bit;
                ((sats & part) == part).then_some(Self::from(part))
            })
            .collect()
    }

    /// Sum an iterator of amounts, erroring on overflow.
    pub fn try_sum<I: IntoIterator<Item = Amount>>(iter: I) -> Result<Self, Error> {
        let mut total: u64 = 0;
        for amount in iter {
            total = total
                .checked_add(amount.to_sat())
                .ok_or(Error::AmountOverflow)?;
        }
        Ok(Amount::from_sat(total))
    }

    /// Get value in the base unit (e.g. sat).
    pub fn to_sat(&self) -> u64 {
        self.0.to_sat()
    }

    /// Get value in the millis-unit (e.g. msat).
    pub fn to_msat(&self) -> u64 {
        self.0.to_sat() * 1000
    }

    /// Construct from the base unit.
    pub fn from_sat(sat: u64) -> Self {
        Self(bitcoin::Amount::from_sat(sat))
    }

    /// Construct from the millis-unit, truncating to whole base units.
    pub fn from_msat(msat: u64) -> Self {
        Self(bitcoin::Amount::from_sat(msat / 1000))
    }

    /// Split into powers of two, ascending (smallest denomination first).
    pub fn split_ascending(&self) -> Vec<Self> {
        let mut parts = self.split_descending();
        parts.reverse();
        parts
    }

    /// Split into blinded-message denominations per `target`, optionally
    /// constrained to the denominations a keyset actually signs for.
    pub fn split_targeted(
        &self,
        target: &SplitTarget,
        fee_and_amounts: &FeeAndAmounts,
    ) -> Result<Vec<Amount>, Error> {
        match target {
            SplitTarget::None => {
                if fee_and_amounts.amounts.is_empty() {
                    Ok(self.split_ascending())
                } else {
                    self.split_into_denominations(&fee_and_amounts.amounts)
                }
            }
            SplitTarget::Value(max_part) => {
                let max_part = *max_part;
                if max_part == Amount::ZERO || max_part >= *self {
                    return Ok(self.split_ascending());
                }

                let mut parts = Vec::new();
                let mut remaining = *self;
                while remaining > Amount::ZERO {
                    let part = if remaining > max_part {
                        max_part
                    } else {
                        remaining
                    };
                    parts.extend(part.split_ascending());
                    remaining = remaining - part;
                }
                Ok(parts)
            }
            SplitTarget::Values(values) => {
                let sum = Amount::try_sum(values.iter().copied())?;
                if sum != *self {
                    return Err(Error::SplitValuesMismatch);
                }
                Ok(values.clone())
            }
        }
    }

    /// Greedily decompose into the largest-first denominations in `denominations`.
    fn split_into_denominations(&self, denominations: &[Amount]) -> Result<Vec<Amount>, Error> {
        let mut sorted = denominations.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));

        let mut remaining = self.to_sat();
        let mut parts = Vec::new();
        for denom in sorted {
            let d = denom.to_sat();
            if d == 0 {
                continue;
            }
            while remaining >= d {
                parts.push(denom);
                remaining -= d;
            }
        }

        if remaining != 0 {
            return Err(Error::UnsplittableAmount);
        }

        parts.reverse();
        Ok(parts)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(bitcoin::Amount::from_sat(value))
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0.to_sat()
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl core::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let sats: u64 = iter.map(|amt| amt.0.to_sat()).sum();
        Amount::from(sats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_descending() {
        assert_eq!(
            Amount::from_sat(3).split_descending(),
            vec![Amount::from_sat(2), Amount::from_sat(1)]
        );
        let amounts: Vec<Amount> = [8, 2, 1].iter().map(|a| Amount::from_sat(*a)).collect();
        assert_eq!(Amount::from_sat(11).split_descending(), amounts);
    }

    #[test]
    fn test_try_sum() {
        let amounts = vec![Amount::from_sat(1), Amount::from_sat(2), Amount::from_sat(4)];
        assert_eq!(Amount::try_sum(amounts).unwrap(), Amount::from_sat(7));
    }

    #[test]
    fn test_split_targeted_none_is_powers_of_two() {
        let parts = Amount::from_sat(100)
            .split_targeted(&SplitTarget::None, &FeeAndAmounts::default())
            .unwrap();
        assert_eq!(
            parts,
            vec![Amount::from_sat(4), Amount::from_sat(32), Amount::from_sat(64)]
        );
    }

    #[test]
    fn test_split_targeted_values_mismatch() {
        let target = SplitTarget::Values(vec![Amount::from_sat(1), Amount::from_sat(1)]);
        assert!(Amount::from_sat(100)
            .split_targeted(&target, &FeeAndAmounts::default())
            .is_err());
    }

    #[test]
    fn test_split_targeted_values_exact() {
        let values = vec![Amount::from_sat(3), Amount::from_sat(7)];
        let target = SplitTarget::Values(values.clone());
        let parts = Amount::from_sat(10)
            .split_targeted(&target, &FeeAndAmounts::default())
            .unwrap();
        assert_eq!(parts, values);
    }

    #[test]
    fn test_split_targeted_value_caps_parts() {
        let target = SplitTarget::Value(Amount::from_sat(4));
        let parts = Amount::from_sat(10)
            .split_targeted(&target, &FeeAndAmounts::default())
            .unwrap();
        assert_eq!(Amount::try_sum(parts).unwrap(), Amount::from_sat(10));
    }
}
