//! Tuple values: fixed arity, heterogeneous members.

use crate::hash::ValueHash;

use super::{attach, Value, ValueBase};

/// A tuple assignment. Arity never changes after construction; the only
/// mutation is in-place change of one member.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleValue {
    pub base: ValueBase,
    members: Vec<Value>,
    cached: ValueHash,
}

impl TupleValue {
    pub fn new(mut members: Vec<Value>) -> TupleValue {
        let mut tuple = TupleValue {
            base: ValueBase::detached(),
            members: Vec::new(),
            cached: ValueHash::default(),
        };
        for (i, m) in members.iter_mut().enumerate() {
            attach(m, tuple.base.id, i);
            tuple.cached += ValueHash::of_indexed(i, m.hash());
        }
        tuple.members = members;
        tuple
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, index: usize) -> Option<&Value> {
        self.members.get(index)
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Starts an in-place mutation of member `index`; pair with
    /// [`TupleValue::member_change_commit`].
    pub fn member_change_begin(&mut self, index: usize) -> &mut Value {
        let hash = self.members[index].hash();
        self.cached -= ValueHash::of_indexed(index, hash);
        &mut self.members[index]
    }

    pub fn member_change_commit(&mut self, index: usize) {
        let hash = self.members[index].hash();
        self.cached += ValueHash::of_indexed(index, hash);
    }

    pub fn cached_hash(&self) -> ValueHash {
        self.cached
    }

    pub fn recompute_hash(&self) -> ValueHash {
        self.members
            .iter()
            .enumerate()
            .fold(ValueHash::default(), |acc, (i, m)| {
                acc + ValueHash::of_indexed(i, m.recompute_hash())
            })
    }

    pub(super) fn for_each_member(&self, mut f: impl FnMut(&Value, usize)) {
        for (i, m) in self.members.iter().enumerate() {
            f(m, i);
        }
    }

    pub(super) fn assign_member_ids(&mut self, parent: u64, next_id: &mut u64) {
        for (i, m) in self.members.iter_mut().enumerate() {
            m.assign_ids(next_id);
            attach(m, parent, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{BoolValue, IntValue};

    #[test]
    fn member_change_roundtrip_restores_hash() {
        let mut tuple = TupleValue::new(vec![
            Value::Int(IntValue::new(1)),
            Value::Bool(BoolValue::new(true)),
        ]);
        let before = tuple.cached_hash();
        if let Value::Int(iv) = tuple.member_change_begin(0) {
            iv.value = 9;
        }
        tuple.member_change_commit(0);
        assert_ne!(tuple.cached_hash(), before);
        if let Value::Int(iv) = tuple.member_change_begin(0) {
            iv.value = 1;
        }
        tuple.member_change_commit(0);
        assert_eq!(tuple.cached_hash(), before);
        assert_eq!(tuple.cached_hash(), tuple.recompute_hash());
    }
}
