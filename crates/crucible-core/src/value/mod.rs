//! Mutable value assignments.
//!
//! A [`Value`] is the live counterpart of a [`Domain`](crate::Domain): the
//! current assignment of one variable, owning its nested sub-values. Every
//! value carries a numeric identity, a weak back-reference to its owning
//! aggregate and a cached structural hash; container kinds patch the hash
//! incrementally on every mutation so it always equals what a from-scratch
//! hash of the current content would produce.

mod function;
mod mset;
mod partition;
mod scalar;
mod sequence;
mod set;
mod tuple;

pub use function::FunctionValue;
pub use mset::MultiSetValue;
pub use partition::PartitionValue;
pub use scalar::{BoolValue, EnumValue, IntValue};
pub use sequence::SequenceValue;
pub use set::SetValue;
pub use tuple::TupleValue;

use crate::hash::ValueHash;

/// Where a value lives.
///
/// This is bookkeeping only: the back-reference is an id, never used for
/// lifetime or access, only for questions like "am I a root variable" and
/// "which slot of my container do I occupy".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Not attached anywhere (detached values under construction).
    None,
    /// A root decision variable of the model.
    Root,
    /// Member `index` of the value with id `parent`.
    Member { parent: u64, index: usize },
}

/// Identity and ownership bookkeeping shared by every value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueBase {
    pub id: u64,
    pub container: Container,
}

impl ValueBase {
    pub fn detached() -> ValueBase {
        ValueBase {
            id: 0,
            container: Container::None,
        }
    }
}

/// The current assignment of one variable, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(BoolValue),
    Int(IntValue),
    Enum(EnumValue),
    Set(SetValue),
    MultiSet(MultiSetValue),
    Sequence(SequenceValue),
    Tuple(TupleValue),
    Function(FunctionValue),
    Partition(PartitionValue),
}

impl Value {
    pub fn base(&self) -> &ValueBase {
        match self {
            Value::Bool(v) => &v.base,
            Value::Int(v) => &v.base,
            Value::Enum(v) => &v.base,
            Value::Set(v) => &v.base,
            Value::MultiSet(v) => &v.base,
            Value::Sequence(v) => &v.base,
            Value::Tuple(v) => &v.base,
            Value::Function(v) => &v.base,
            Value::Partition(v) => &v.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ValueBase {
        match self {
            Value::Bool(v) => &mut v.base,
            Value::Int(v) => &mut v.base,
            Value::Enum(v) => &mut v.base,
            Value::Set(v) => &mut v.base,
            Value::MultiSet(v) => &mut v.base,
            Value::Sequence(v) => &mut v.base,
            Value::Tuple(v) => &mut v.base,
            Value::Function(v) => &mut v.base,
            Value::Partition(v) => &mut v.base,
        }
    }

    pub fn id(&self) -> u64 {
        self.base().id
    }

    pub fn container(&self) -> Container {
        self.base().container
    }

    pub fn is_root(&self) -> bool {
        self.base().container == Container::Root
    }

    /// The cached structural hash of the current content.
    pub fn hash(&self) -> ValueHash {
        match self {
            Value::Bool(v) => v.hash(),
            Value::Int(v) => v.hash(),
            Value::Enum(v) => v.hash(),
            Value::Set(v) => v.cached_hash(),
            Value::MultiSet(v) => v.cached_hash(),
            Value::Sequence(v) => v.cached_hash(),
            Value::Tuple(v) => v.cached_hash(),
            Value::Function(v) => v.cached_hash(),
            Value::Partition(v) => v.cached_hash(),
        }
    }

    /// Recomputes the hash from scratch, ignoring caches. Sanity checks
    /// compare this against [`Value::hash`].
    pub fn recompute_hash(&self) -> ValueHash {
        match self {
            Value::Bool(v) => v.hash(),
            Value::Int(v) => v.hash(),
            Value::Enum(v) => v.hash(),
            Value::Set(v) => v.recompute_hash(),
            Value::MultiSet(v) => v.recompute_hash(),
            Value::Sequence(v) => v.recompute_hash(),
            Value::Tuple(v) => v.recompute_hash(),
            Value::Function(v) => v.recompute_hash(),
            Value::Partition(v) => v.recompute_hash(),
        }
    }

    /// Number of members, for container kinds; 0 for scalars.
    pub fn member_count(&self) -> usize {
        match self {
            Value::Bool(_) | Value::Int(_) | Value::Enum(_) => 0,
            Value::Set(v) => v.len(),
            Value::MultiSet(v) => v.len(),
            Value::Sequence(v) => v.len(),
            Value::Tuple(v) => v.len(),
            Value::Function(v) => v.len(),
            Value::Partition(v) => v.element_count(),
        }
    }

    /// Borrows member `index`, for container kinds that own members.
    pub fn member(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Set(v) => v.member(index),
            Value::MultiSet(v) => v.member(index),
            Value::Sequence(v) => v.member(index),
            Value::Tuple(v) => v.member(index),
            Value::Function(v) => v.image(index),
            _ => None,
        }
    }

    /// Replaces this value's content while keeping its identity and
    /// container back-reference. Used for whole-value assignment and for
    /// restoring a backup on revert.
    pub fn assign_content(&mut self, mut content: Value) {
        let base = *self.base();
        *content.base_mut() = base;
        *self = content;
    }

    /// Assigns fresh ids to this value and every nested member, repairing
    /// all member back-references. Called once when a value is registered
    /// with the expression graph.
    pub fn assign_ids(&mut self, next_id: &mut u64) {
        self.base_mut().id = *next_id;
        *next_id += 1;
        self.assign_member_ids(next_id);
    }

    /// Assigns fresh ids to nested members only, keeping this value's own
    /// id; used when the owner's id is managed externally (root variables
    /// get dense ids from the graph).
    pub fn assign_member_ids(&mut self, next_id: &mut u64) {
        let parent = self.id();
        match self {
            Value::Set(v) => v.assign_member_ids(parent, next_id),
            Value::MultiSet(v) => v.assign_member_ids(parent, next_id),
            Value::Sequence(v) => v.assign_member_ids(parent, next_id),
            Value::Tuple(v) => v.assign_member_ids(parent, next_id),
            Value::Function(v) => v.assign_member_ids(parent, next_id),
            _ => {}
        }
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Enum(_) => "enum",
            Value::Set(_) => "set",
            Value::MultiSet(_) => "multiset",
            Value::Sequence(_) => "sequence",
            Value::Tuple(_) => "tuple",
            Value::Function(_) => "function",
            Value::Partition(_) => "partition",
        }
    }

    /// The integer payload, for scalar kinds usable as int operands.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(v.value),
            Value::Enum(v) => Some(v.index as i64),
            Value::Bool(v) => Some(v.value as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(v.value),
            _ => None,
        }
    }

    /// Checks the `container`/`id` back-references of every nested member
    /// against its actual position. Fatal on mismatch; called from the
    /// debug sanity pass.
    pub fn assert_member_backrefs(&self) {
        let parent = self.id();
        let check = |member: &Value, index: usize| {
            match member.container() {
                Container::Member { parent: p, index: i } if p == parent && i == index => {}
                other => panic!(
                    "corrupt back-reference: member {index} of value {parent} \
                     ({}) records {other:?}",
                    self.kind_name()
                ),
            }
            member.assert_member_backrefs();
        };
        match self {
            Value::Set(v) => v.for_each_member(check),
            Value::MultiSet(v) => v.for_each_member(check),
            Value::Sequence(v) => v.for_each_member(check),
            Value::Tuple(v) => v.for_each_member(check),
            Value::Function(v) => v.for_each_image(check),
            _ => {}
        }
    }
}

pub(crate) fn attach(member: &mut Value, parent: u64, index: usize) {
    member.base_mut().container = Container::Member { parent, index };
}
