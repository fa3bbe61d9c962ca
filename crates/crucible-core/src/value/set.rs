//! Set values: distinct members, identity by structural hash.

use std::collections::HashSet;

use crate::hash::ValueHash;

use super::{attach, Container, Value, ValueBase};

/// A set assignment.
///
/// Membership identity is the members' structural hash: two members are
/// the same element iff their hashes are equal. The `member_hashes` index
/// makes duplicate detection O(1); keeping it consistent with `members`
/// is a fatal invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct SetValue {
    pub base: ValueBase,
    members: Vec<Value>,
    member_hashes: HashSet<ValueHash>,
    cached: ValueHash,
}

impl SetValue {
    pub fn new() -> SetValue {
        SetValue {
            base: ValueBase::detached(),
            members: Vec::new(),
            member_hashes: HashSet::new(),
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

    pub fn contains_hash(&self, hash: ValueHash) -> bool {
        self.member_hashes.contains(&hash)
    }

    /// Adds a member. Returns false (and drops the candidate) when an
    /// equal member is already present.
    pub fn add(&mut self, mut member: Value) -> bool {
        let hash = member.hash();
        if !self.member_hashes.insert(hash) {
            return false;
        }
        attach(&mut member, self.base.id, self.members.len());
        self.members.push(member);
        self.cached += hash;
        true
    }

    /// Removes the member at `index` by swap-remove; the member moved into
    /// the hole has its back-reference repaired.
    pub fn remove(&mut self, index: usize) -> Value {
        let mut removed = self.members.swap_remove(index);
        let hash = removed.hash();
        if !self.member_hashes.remove(&hash) {
            panic!(
                "set {}: member hash index lost hash {hash} held by member {index}",
                self.base.id
            );
        }
        self.cached -= hash;
        if index < self.members.len() {
            attach(&mut self.members[index], self.base.id, index);
        }
        removed.base_mut().container = Container::None;
        removed
    }

    /// Starts an in-place mutation of member `index`: the member's current
    /// contribution is retired from the hash and the uniqueness index, and
    /// a mutable borrow is handed out. Must be paired with
    /// [`SetValue::member_change_commit`].
    pub fn member_change_begin(&mut self, index: usize) -> &mut Value {
        let hash = self.members[index].hash();
        if !self.member_hashes.remove(&hash) {
            panic!(
                "set {}: member hash index lost hash {hash} held by member {index}",
                self.base.id
            );
        }
        self.cached -= hash;
        &mut self.members[index]
    }

    /// Finishes an in-place member mutation. Returns false when the new
    /// content collides with another member; the member then stays retired
    /// (as after `member_change_begin`) and the caller must restore its old
    /// content and commit again. Do not call `member_change_begin` twice.
    #[must_use]
    pub fn member_change_commit(&mut self, index: usize) -> bool {
        let hash = self.members[index].hash();
        if !self.member_hashes.insert(hash) {
            return false;
        }
        self.cached += hash;
        true
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

impl Default for SetValue {
    fn default() -> Self {
        SetValue::new()
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
    fn rejects_duplicate_member() {
        let mut set = SetValue::new();
        assert!(set.add(int(1)));
        assert!(!set.add(int(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_repairs_swapped_backref() {
        let mut set = SetValue::new();
        set.base.id = 7;
        set.add(int(1));
        set.add(int(2));
        set.add(int(3));
        set.remove(0);
        // the former last member now sits at index 0
        Value::Set(set).assert_member_backrefs();
    }

    #[test]
    fn add_remove_restores_hash() {
        let mut set = SetValue::new();
        set.add(int(1));
        set.add(int(2));
        let before = set.cached_hash();
        set.add(int(9));
        set.remove(2);
        assert_eq!(set.cached_hash(), before);
        assert_eq!(set.cached_hash(), set.recompute_hash());
    }

    #[test]
    fn member_change_keeps_index_consistent() {
        let mut set = SetValue::new();
        set.add(int(1));
        set.add(int(2));
        {
            let member = set.member_change_begin(0);
            if let Value::Int(iv) = member {
                iv.value = 5;
            }
        }
        assert!(set.member_change_commit(0));
        assert!(set.contains_hash(int(5).hash()));
        assert!(!set.contains_hash(int(1).hash()));
        assert_eq!(set.cached_hash(), set.recompute_hash());
    }

    #[test]
    fn member_change_collision_reported() {
        let mut set = SetValue::new();
        set.add(int(1));
        set.add(int(2));
        {
            let member = set.member_change_begin(0);
            if let Value::Int(iv) = member {
                iv.value = 2;
            }
        }
        assert!(!set.member_change_commit(0));
        // member 0 is still retired: restore old content, commit again
        if let Some(Value::Int(iv)) = set.members.get_mut(0) {
            iv.value = 1;
        }
        assert!(set.member_change_commit(0));
        assert_eq!(set.cached_hash(), set.recompute_hash());
    }
}
