//! Scalar value kinds: bool, int, enum.

use crate::hash::ValueHash;

use super::ValueBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolValue {
    pub base: ValueBase,
    pub value: bool,
}

impl BoolValue {
    pub fn new(value: bool) -> BoolValue {
        BoolValue {
            base: ValueBase::detached(),
            value,
        }
    }

    pub fn hash(&self) -> ValueHash {
        ValueHash::of_u64(self.value as u64)
    }

    /// Violation of this value when read as a constraint: satisfied iff true.
    pub fn violation(&self) -> u64 {
        if self.value {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntValue {
    pub base: ValueBase,
    pub value: i64,
}

impl IntValue {
    pub fn new(value: i64) -> IntValue {
        IntValue {
            base: ValueBase::detached(),
            value,
        }
    }

    pub fn hash(&self) -> ValueHash {
        ValueHash::of_i64(self.value)
    }
}

/// An enum assignment, stored as the ordinal into its domain's name list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub base: ValueBase,
    pub index: usize,
}

impl EnumValue {
    pub fn new(index: usize) -> EnumValue {
        EnumValue {
            base: ValueBase::detached(),
            index,
        }
    }

    pub fn hash(&self) -> ValueHash {
        ValueHash::of_u64(self.index as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_violation_tracks_value() {
        assert_eq!(BoolValue::new(true).violation(), 0);
        assert_eq!(BoolValue::new(false).violation(), 1);
    }

    #[test]
    fn scalar_hashes_differ_by_payload() {
        assert_ne!(IntValue::new(1).hash(), IntValue::new(2).hash());
        assert_ne!(EnumValue::new(0).hash(), EnumValue::new(1).hash());
    }
}
