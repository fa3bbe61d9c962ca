//! Incremental propagation.
//!
//! Every mutation runs the same three steps:
//!
//! 1. **Snapshot pass** — walk the transitive subscriber closure of the
//!    leaf about to change and record each node's current view, stamped
//!    with a fresh epoch. Delta handlers read these snapshots as the
//!    "old" side of a change, so scalar deltas carry no payload.
//! 2. **Leaf mutation** — patch the leaf value and its cached view.
//! 3. **Notification walk** — hand each subscriber a [`Delta`] describing
//!    the change; a handler patches its own cached view in O(1) and the
//!    walk forwards outward only along edges whose view actually changed.
//!
//! The functions in this module are the only sanctioned way to mutate a
//! leaf once the graph is built; mutating a value behind the graph's back
//! leaves stale caches that the sanity pass reports as fatal.

use crucible_core::{Value, ValueHash};

use crate::event::{Delta, Subscriber};
use crate::graph::{Graph, NodeId};
use crate::ops::{apply_delta, leaf_view, Outcome};
use crate::view::View;

/// Records the pre-change view of `source` and of every node reachable
/// through subscriber edges, stamped with the current epoch. Nodes already
/// stamped this epoch are skipped, so nested walks never clobber the
/// snapshots of an enclosing one.
pub(crate) fn snapshot_from(g: &mut Graph, source: NodeId) {
    let epoch = g.epoch;
    let mut stack = vec![source];
    while let Some(id) = stack.pop() {
        let node = g.node_mut(id);
        if node.snapshot_epoch == epoch {
            continue;
        }
        node.snapshot = node.view.clone();
        node.snapshot_epoch = epoch;
        stack.extend(node.subscribers.iter().map(|s| s.node));
    }
}

/// Delivers `delta` to every subscriber of `source`, then forwards each
/// resulting view change outward. Definedness flips forward as
/// [`Delta::DefinednessFlipped`], plain payload changes as
/// [`Delta::Scalar`]; unchanged views stop the walk along that edge.
pub(crate) fn notify(g: &mut Graph, source: NodeId, delta: Delta) {
    let subscribers: Vec<Subscriber> = g.node(source).subscribers.to_vec();
    for sub in subscribers {
        if let Some(member) = sub.member {
            if !delta.concerns_member(member) {
                continue;
            }
        }
        match apply_delta(g, sub.node, source, sub.member, delta) {
            Outcome::Unchanged => {}
            Outcome::Changed => notify(g, sub.node, Delta::Scalar),
            Outcome::FlippedDefinedness => notify(g, sub.node, Delta::DefinednessFlipped),
        }
    }
}

fn begin(g: &mut Graph, leaf: NodeId) {
    g.epoch += 1;
    tracing::trace!(epoch = g.epoch, %leaf, "begin propagation");
    snapshot_from(g, leaf);
}

// ---- scalar leaves ----------------------------------------------------

/// Sets an int variable to `value`.
pub fn set_int(g: &mut Graph, var: NodeId, value: i64) {
    if g.value(var).as_int() == Some(value) {
        return;
    }
    begin(g, var);
    match g.value_mut(var) {
        Value::Int(v) => v.value = value,
        other => panic!("set_int on a {} leaf", other.kind_name()),
    }
    g.node_mut(var).view = View::Int(value);
    notify(g, var, Delta::Scalar);
}

/// Sets a bool variable to `value`.
pub fn set_bool(g: &mut Graph, var: NodeId, value: bool) {
    if g.value(var).as_bool() == Some(value) {
        return;
    }
    begin(g, var);
    match g.value_mut(var) {
        Value::Bool(v) => v.value = value,
        other => panic!("set_bool on a {} leaf", other.kind_name()),
    }
    g.node_mut(var).view = View::Bool {
        violation: u64::from(!value),
    };
    notify(g, var, Delta::Scalar);
}

/// Sets an enum variable to the ordinal `index`.
pub fn set_enum(g: &mut Graph, var: NodeId, index: usize) {
    begin(g, var);
    match g.value_mut(var) {
        Value::Enum(v) => {
            if v.index == index {
                return;
            }
            v.index = index;
        }
        other => panic!("set_enum on a {} leaf", other.kind_name()),
    }
    g.node_mut(var).view = View::Int(index as i64);
    notify(g, var, Delta::Scalar);
}

/// Replaces the whole content of a variable while keeping its identity.
/// The replacement is typically built detached; its members receive fresh
/// ids here.
pub fn assign_value(g: &mut Graph, var: NodeId, mut content: Value) {
    begin(g, var);
    g.assign_member_ids(&mut content);
    g.value_mut(var).assign_content(content);
    g.node_mut(var).view = leaf_view(g.value(var));
    notify(g, var, Delta::Scalar);
}

// ---- set and multiset leaves -------------------------------------------

/// Adds a member to a set variable. Returns false (dropping the candidate,
/// propagating nothing) when an equal member is already present.
pub fn set_add(g: &mut Graph, var: NodeId, mut member: Value) -> bool {
    begin(g, var);
    g.register_member(&mut member);
    let payload = member.as_int();
    let index = match g.value_mut(var) {
        Value::Set(s) => {
            let index = s.len();
            if !s.add(member) {
                return false;
            }
            index
        }
        other => panic!("set_add on a {} leaf", other.kind_name()),
    };
    notify(g, var, Delta::MemberAdded { index, value: payload });
    true
}

/// Removes the member at `index` from a set variable (swap-remove) and
/// returns it, detached, for a possible later re-add.
pub fn set_remove(g: &mut Graph, var: NodeId, index: usize) -> Value {
    begin(g, var);
    let removed = match g.value_mut(var) {
        Value::Set(s) => s.remove(index),
        other => panic!("set_remove on a {} leaf", other.kind_name()),
    };
    let payload = removed.as_int();
    notify(
        g,
        var,
        Delta::MemberRemoved {
            index,
            value: payload,
            shifted: false,
        },
    );
    removed
}

/// Adds a member to a multiset variable; duplicates are always accepted.
pub fn mset_add(g: &mut Graph, var: NodeId, mut member: Value) {
    begin(g, var);
    g.register_member(&mut member);
    let payload = member.as_int();
    let index = match g.value_mut(var) {
        Value::MultiSet(s) => {
            let index = s.len();
            s.add(member);
            index
        }
        other => panic!("mset_add on a {} leaf", other.kind_name()),
    };
    notify(g, var, Delta::MemberAdded { index, value: payload });
}

/// Removes the member at `index` from a multiset variable (swap-remove).
pub fn mset_remove(g: &mut Graph, var: NodeId, index: usize) -> Value {
    begin(g, var);
    let removed = match g.value_mut(var) {
        Value::MultiSet(s) => s.remove(index),
        other => panic!("mset_remove on a {} leaf", other.kind_name()),
    };
    let payload = removed.as_int();
    notify(
        g,
        var,
        Delta::MemberRemoved {
            index,
            value: payload,
            shifted: false,
        },
    );
    removed
}

// ---- sequence leaves ----------------------------------------------------

/// Inserts a member at `index`, shifting later members. Returns false for
/// an injectivity collision; nothing propagates in that case.
pub fn seq_insert(g: &mut Graph, var: NodeId, index: usize, mut member: Value) -> bool {
    begin(g, var);
    g.register_member(&mut member);
    let payload = member.as_int();
    match g.value_mut(var) {
        Value::Sequence(s) => {
            if !s.insert(index, member) {
                return false;
            }
        }
        other => panic!("seq_insert on a {} leaf", other.kind_name()),
    }
    notify(g, var, Delta::MemberAdded { index, value: payload });
    true
}

/// Removes the member at `index`, shifting later members down.
pub fn seq_remove(g: &mut Graph, var: NodeId, index: usize) -> Value {
    begin(g, var);
    let removed = match g.value_mut(var) {
        Value::Sequence(s) => s.remove(index),
        other => panic!("seq_remove on a {} leaf", other.kind_name()),
    };
    let payload = removed.as_int();
    notify(
        g,
        var,
        Delta::MemberRemoved {
            index,
            value: payload,
            shifted: true,
        },
    );
    removed
}

/// Swaps the members at positions `i` and `j`.
pub fn seq_swap(g: &mut Graph, var: NodeId, i: usize, j: usize) {
    if i == j {
        return;
    }
    begin(g, var);
    match g.value_mut(var) {
        Value::Sequence(s) => s.swap(i, j),
        other => panic!("seq_swap on a {} leaf", other.kind_name()),
    }
    notify(g, var, Delta::MembersSwapped { i, j });
}

// ---- in-place member mutation --------------------------------------------

/// Sets the int member at `index` of a container variable in place.
/// Returns false when a uniqueness constraint rejects the new value; the
/// container is left untouched and nothing propagates.
pub fn member_set_int(g: &mut Graph, var: NodeId, index: usize, value: i64) -> bool {
    begin(g, var);
    let old = match g.value_mut(var) {
        Value::Set(s) => {
            if s.contains_hash(ValueHash::of_i64(value)) {
                // covers old == value too: the member itself is indexed
                return member_payload(s.member(index)) == value;
            }
            let old = retarget_int(s.member_change_begin(index), value);
            let committed = s.member_change_commit(index);
            debug_assert!(committed, "collision screened before mutation");
            old
        }
        Value::Sequence(s) => {
            if s.contains_hash(ValueHash::of_i64(value)) {
                return member_payload(s.member(index)) == value;
            }
            let old = retarget_int(s.member_change_begin(index), value);
            let committed = s.member_change_commit(index);
            debug_assert!(committed, "collision screened before mutation");
            if old == value {
                return true;
            }
            old
        }
        Value::MultiSet(s) => {
            let old = retarget_int(s.member_change_begin(index), value);
            s.member_change_commit(index);
            if old == value {
                return true;
            }
            old
        }
        Value::Tuple(t) => {
            let old = retarget_int(t.member_change_begin(index), value);
            t.member_change_commit(index);
            if old == value {
                return true;
            }
            old
        }
        Value::Function(f) => {
            let old = retarget_int(f.image_change_begin(index), value);
            f.image_change_commit(index);
            if old == value {
                return true;
            }
            old
        }
        other => panic!("member_set_int on a {} leaf", other.kind_name()),
    };
    notify(
        g,
        var,
        Delta::MemberChanged {
            index,
            old: Some(old),
            new: Some(value),
        },
    );
    true
}

fn member_payload(member: Option<&Value>) -> i64 {
    match member.and_then(Value::as_int) {
        Some(v) => v,
        None => panic!("member_set_int on a non-int member"),
    }
}

// Writes the int payload, returning the previous one.
fn retarget_int(member: &mut Value, value: i64) -> i64 {
    match member {
        Value::Int(v) => std::mem::replace(&mut v.value, value),
        other => panic!("member_set_int on a {} member", other.kind_name()),
    }
}

// ---- function and partition leaves ---------------------------------------

/// Swaps the images of two points of a function variable.
pub fn func_swap_images(g: &mut Graph, var: NodeId, i: usize, j: usize) {
    if i == j {
        return;
    }
    begin(g, var);
    match g.value_mut(var) {
        Value::Function(f) => f.swap_images(i, j),
        other => panic!("func_swap_images on a {} leaf", other.kind_name()),
    }
    notify(g, var, Delta::MembersSwapped { i, j });
}

/// Moves `element` of a partition variable into `part`. Partitions expose
/// no per-member operand view, so the change propagates as a whole-value
/// delta.
pub fn partition_move(g: &mut Graph, var: NodeId, element: usize, part: usize) {
    begin(g, var);
    match g.value_mut(var) {
        Value::Partition(p) => {
            if p.part_of(element) == part {
                return;
            }
            p.move_element(element, part);
        }
        other => panic!("partition_move on a {} leaf", other.kind_name()),
    }
    notify(g, var, Delta::Scalar);
}

/// Exchanges the parts of two elements of a partition variable.
pub fn partition_swap(g: &mut Graph, var: NodeId, a: usize, b: usize) {
    begin(g, var);
    match g.value_mut(var) {
        Value::Partition(p) => {
            if p.part_of(a) == p.part_of(b) {
                return;
            }
            p.swap_parts(a, b);
        }
        other => panic!("partition_swap on a {} leaf", other.kind_name()),
    }
    notify(g, var, Delta::Scalar);
}
