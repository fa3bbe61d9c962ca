//! Structural value hashing.
//!
//! Every value caches a [`ValueHash`] equal to what a from-scratch hash of
//! its current content would produce, so structural equality checks never
//! need a full traversal. Container hashes are combined with wrapping
//! addition, which makes single-member updates an O(1) subtract-then-add
//! patch and keeps unordered containers order-independent.

use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A cached structural hash of a value.
///
/// Arithmetic is wrapping so that member contributions can be removed as
/// exactly as they were added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueHash(pub u64);

impl ValueHash {
    /// Hashes a raw 64-bit payload through the finalising mixer.
    pub fn of_u64(payload: u64) -> ValueHash {
        ValueHash(mix64(payload))
    }

    /// Hashes a signed payload.
    pub fn of_i64(payload: i64) -> ValueHash {
        ValueHash::of_u64(payload as u64)
    }

    /// Hashes a member contribution at an ordered position.
    ///
    /// Ordered containers combine `of_indexed(i, h)` per member; moving a
    /// member changes its contribution, so position swaps are visible.
    pub fn of_indexed(index: usize, member: ValueHash) -> ValueHash {
        ValueHash(mix64((index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ member.0))
    }

    /// Scales a contribution by a repeat count (multiset members).
    pub fn repeated(self, count: u64) -> ValueHash {
        ValueHash(self.0.wrapping_mul(count))
    }
}

impl Add for ValueHash {
    type Output = ValueHash;
    fn add(self, other: ValueHash) -> ValueHash {
        ValueHash(self.0.wrapping_add(other.0))
    }
}

impl Sub for ValueHash {
    type Output = ValueHash;
    fn sub(self, other: ValueHash) -> ValueHash {
        ValueHash(self.0.wrapping_sub(other.0))
    }
}

impl AddAssign for ValueHash {
    fn add_assign(&mut self, other: ValueHash) {
        self.0 = self.0.wrapping_add(other.0);
    }
}

impl SubAssign for ValueHash {
    fn sub_assign(&mut self, other: ValueHash) {
        self.0 = self.0.wrapping_sub(other.0);
    }
}

impl std::fmt::Display for ValueHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// splitmix64 finaliser; avalanches every input bit across the output.
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_sub_is_identity() {
        let base = ValueHash::of_i64(17);
        let member = ValueHash::of_i64(-3);
        assert_eq!(base + member - member, base);
    }

    #[test]
    fn unordered_combination_commutes() {
        let a = ValueHash::of_i64(1);
        let b = ValueHash::of_i64(2);
        assert_eq!(a + b, b + a);
    }

    #[test]
    fn indexed_contribution_depends_on_position() {
        let m = ValueHash::of_i64(5);
        assert_ne!(ValueHash::of_indexed(0, m), ValueHash::of_indexed(1, m));
    }

    #[test]
    fn distinct_payloads_distinct_hashes() {
        // Not a guarantee in general, but these must not collide.
        assert_ne!(ValueHash::of_i64(0), ValueHash::of_i64(1));
        assert_ne!(ValueHash::of_i64(1), ValueHash::of_i64(-1));
    }
}
