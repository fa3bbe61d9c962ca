//! Multiset values: members with duplicates allowed.

use crate::hash::ValueHash;

use super::{attach, Container, Value, ValueBase};

/// A multiset assignment. Duplicate members are legal, so there is no
/// uniqueness index; the cached hash is the commutative sum of member
/// hashes, which counts duplicates once per occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSetValue {
    pub base: ValueBase,
    members: Vec<Value>,
    cached: ValueHash,
}

impl MultiSetValue {
    pub fn new() -> MultiSetValue {
        MultiSetValue {
            base: ValueBase::detached(),
            members: Vec::new(),
            cached: ValueHash::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, index: usize) -> Option<&Value> {
        self.members.get(index)
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    pub fn add(&mut self, mut member: Value) {
        self.cached += member.hash();
        attach(&mut member, self.base.id, self.members.len());
        self.members.push(member);
    }

    /// Swap-removes the member at `index`, repairing the moved member's
    /// back-reference.
    pub fn remove(&mut self, index: usize) -> Value {
        let mut removed = self.members.swap_remove(index);
        self.cached -= removed.hash();
        if index < self.members.len() {
            attach(&mut self.members[index], self.base.id, index);
        }
        removed.base_mut().container = Container::None;
        removed
    }

    /// Starts an in-place mutation of member `index`; pair with
    /// [`MultiSetValue::member_change_commit`].
    pub fn member_change_begin(&mut self, index: usize) -> &mut Value {
        let hash = self.members[index].hash();
        self.cached -= hash;
        &mut self.members[index]
    }

    pub fn member_change_commit(&mut self, index: usize) {
        self.cached += self.members[index].hash();
    }

    pub fn cached_hash(&self) -> ValueHash {
        self.cached
    }

    pub fn recompute_hash(&self) -> ValueHash {
        self.members
            .iter()
            .fold(ValueHash::default(), |acc, m| acc + m.recompute_hash())
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

impl Default for MultiSetValue {
    fn default() -> Self {
        MultiSetValue::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IntValue;

    fn int(v: i64) -> Value {
        Value::Int(IntValue::new(v))
    }

    #[test]
    fn duplicates_are_allowed_and_hashed_per_occurrence() {
        let mut mset = MultiSetValue::new();
        mset.add(int(4));
        let one = mset.cached_hash();
        mset.add(int(4));
        assert_eq!(mset.len(), 2);
        assert_ne!(mset.cached_hash(), one);
        assert_eq!(mset.cached_hash(), mset.recompute_hash());
    }

    #[test]
    fn remove_restores_previous_hash() {
        let mut mset = MultiSetValue::new();
        mset.add(int(1));
        mset.add(int(2));
        let before = mset.cached_hash();
        mset.add(int(3));
        mset.remove(2);
        assert_eq!(mset.cached_hash(), before);
    }

    #[test]
    fn member_change_patches_hash() {
        let mut mset = MultiSetValue::new();
        mset.add(int(1));
        mset.add(int(2));
        if let Value::Int(iv) = mset.member_change_begin(1) {
            iv.value = 7;
        }
        mset.member_change_commit(1);
        assert_eq!(mset.cached_hash(), mset.recompute_hash());
    }
}
