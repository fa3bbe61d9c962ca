//! Sequence values: ordered members, optional injectivity.

use std::collections::HashSet;

use crate::hash::ValueHash;

use super::{attach, Container, Value, ValueBase};

/// A sequence assignment.
///
/// The cached hash combines each member's hash with its position, so
/// position swaps are observable. Inserting or removing in the middle
/// shifts every later member; their indexed contributions are repaired in
/// the same pass that repairs their back-references.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceValue {
    pub base: ValueBase,
    members: Vec<Value>,
    /// Uniqueness index, maintained only for injective sequences.
    member_hashes: Option<HashSet<ValueHash>>,
    cached: ValueHash,
}

impl SequenceValue {
    pub fn new(injective: bool) -> SequenceValue {
        SequenceValue {
            base: ValueBase::detached(),
            members: Vec::new(),
            member_hashes: injective.then(HashSet::new),
            cached: ValueHash::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_injective(&self) -> bool {
        self.member_hashes.is_some()
    }

    pub fn member(&self, index: usize) -> Option<&Value> {
        self.members.get(index)
    }

    /// Whether an equal member is present. Always false for
    /// non-injective sequences, which keep no uniqueness index.
    pub fn contains_hash(&self, hash: ValueHash) -> bool {
        self.member_hashes
            .as_ref()
            .is_some_and(|set| set.contains(&hash))
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Inserts at `index`, shifting later members. Returns false when the
    /// sequence is injective and an equal member is already present.
    pub fn insert(&mut self, index: usize, mut member: Value) -> bool {
        let hash = member.hash();
        if let Some(index_set) = &mut self.member_hashes {
            if !index_set.insert(hash) {
                return false;
            }
        }
        attach(&mut member, self.base.id, index);
        self.members.insert(index, member);
        self.repair_from(index);
        true
    }

    pub fn push(&mut self, member: Value) -> bool {
        self.insert(self.members.len(), member)
    }

    /// Removes at `index`, shifting later members down.
    pub fn remove(&mut self, index: usize) -> Value {
        let mut removed = self.members.remove(index);
        let hash = removed.hash();
        if let Some(index_set) = &mut self.member_hashes {
            if !index_set.remove(&hash) {
                panic!(
                    "sequence {}: uniqueness index lost hash {hash} held by member {index}",
                    self.base.id
                );
            }
        }
        self.repair_from(index);
        removed.base_mut().container = Container::None;
        removed
    }

    /// Swaps members `i` and `j`; an O(1) hash patch.
    pub fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let hi = self.members[i].hash();
        let hj = self.members[j].hash();
        self.cached -= ValueHash::of_indexed(i, hi) + ValueHash::of_indexed(j, hj);
        self.cached += ValueHash::of_indexed(i, hj) + ValueHash::of_indexed(j, hi);
        self.members.swap(i, j);
        let parent = self.base.id;
        attach(&mut self.members[i], parent, i);
        attach(&mut self.members[j], parent, j);
    }

    /// Starts an in-place mutation of member `index`; pair with
    /// [`SequenceValue::member_change_commit`].
    pub fn member_change_begin(&mut self, index: usize) -> &mut Value {
        let hash = self.members[index].hash();
        if let Some(index_set) = &mut self.member_hashes {
            index_set.remove(&hash);
        }
        self.cached -= ValueHash::of_indexed(index, hash);
        &mut self.members[index]
    }

    /// Finishes an in-place member mutation; false means an injectivity
    /// collision, with the member left retired for the caller to restore.
    #[must_use]
    pub fn member_change_commit(&mut self, index: usize) -> bool {
        let hash = self.members[index].hash();
        if let Some(index_set) = &mut self.member_hashes {
            if !index_set.insert(hash) {
                return false;
            }
        }
        self.cached += ValueHash::of_indexed(index, hash);
        true
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

    // Rebuilds positional contributions and back-references from `index`
    // to the end after a shift.
    fn repair_from(&mut self, index: usize) {
        let parent = self.base.id;
        let mut partial = ValueHash::default();
        for (i, m) in self.members.iter().enumerate().take(index) {
            partial += ValueHash::of_indexed(i, m.hash());
        }
        for i in index..self.members.len() {
            attach(&mut self.members[i], parent, i);
            partial += ValueHash::of_indexed(i, self.members[i].hash());
        }
        self.cached = partial;
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
