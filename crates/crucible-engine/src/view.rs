//! Cached node views.

/// The cached, currently-evaluated result of an expression node.
///
/// Boolean nodes expose a violation count (0 = satisfied); int nodes the
/// current value; range nodes the materialised sequence. Container leaves
/// carry their data in the leaf [`Value`](crucible_core::Value) itself and
/// use `Unit` as a defined marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The node currently has no meaningful value.
    Undefined,
    /// Defined, payload lives in the leaf value.
    Unit,
    Int(i64),
    Bool { violation: u64 },
    IntSeq(Vec<i64>),
}

impl View {
    pub fn is_defined(&self) -> bool {
        !matches!(self, View::Undefined)
    }

    /// The integer payload. Reading an undefined or non-int view is a
    /// programming error: callers must check definedness first.
    pub fn expect_int(&self) -> i64 {
        match self {
            View::Int(v) => *v,
            View::Undefined => panic!("read of undefined view; check definedness first"),
            other => panic!("expected int view, found {other:?}"),
        }
    }

    /// The violation count of a boolean node.
    pub fn expect_violation(&self) -> u64 {
        match self {
            View::Bool { violation } => *violation,
            View::Undefined => panic!("read of undefined view; check definedness first"),
            other => panic!("expected bool view, found {other:?}"),
        }
    }

    pub fn expect_seq(&self) -> &[i64] {
        match self {
            View::IntSeq(seq) => seq,
            View::Undefined => panic!("read of undefined view; check definedness first"),
            other => panic!("expected sequence view, found {other:?}"),
        }
    }

    /// The integer payload, if this is a defined int view.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            View::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn violation(&self) -> Option<u64> {
        match self {
            View::Bool { violation } => Some(*violation),
            _ => None,
        }
    }

    /// True for satisfied boolean views.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, View::Bool { violation: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_accessors() {
        assert_eq!(View::Int(4).expect_int(), 4);
        assert_eq!(View::Bool { violation: 2 }.expect_violation(), 2);
        assert!(View::Bool { violation: 0 }.is_satisfied());
        assert!(!View::Undefined.is_defined());
    }

    #[test]
    #[should_panic(expected = "undefined view")]
    fn undefined_read_is_fatal() {
        View::Undefined.expect_int();
    }
}
