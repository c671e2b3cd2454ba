//! Integer amount type for credits and reserve-asset units
//!
//! Amounts are unsigned integers in the smallest unit. Division always
//! floors; callers see overflow as `None` and map it to their own error.

/// Credit or reserve-asset quantity in the smallest unit.
pub type Amount = u128;

/// Pro-rata share: `floor(part * total / whole)`.
///
/// Returns `Some(0)` when `whole` is zero and `None` if the intermediate
/// product overflows.
pub fn pro_rata(part: Amount, total: Amount, whole: Amount) -> Option<Amount> {
    if whole == 0 {
        return Some(0);
    }
    part.checked_mul(total).map(|product| product / whole)
}
