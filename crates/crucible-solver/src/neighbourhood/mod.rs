//! Neighbourhood generators.
//!
//! Every generator runs the same state machine: propose a local change,
//! apply it to the leaf (propagation makes the root views reflect the
//! candidate immediately), let the parent check veto it (revert and
//! re-propose, up to the try limit), then hand the candidate to the
//! strategy for the commit-or-revert verdict. Reverts are the inverse
//! mutation, so cached hashes, violations and definedness return to their
//! pre-move state exactly.

mod function;
mod mset;
mod partition;
mod scalar;
mod sequence;
mod set;
mod tuple;

use crucible_core::{Domain, IntDomain, SolverRng, Value};
use crucible_engine::{propagate, Graph, NodeId};

use crate::assign;
use crate::violation::ViolationContainer;

/// The root-level readings for one tentatively applied change.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Root constraint violation; `u64::MAX` when the root is undefined.
    pub violation: u64,
    pub objective: Option<i64>,
    /// Whether the root constraint is currently defined.
    pub defined: bool,
}

/// Terminal state of one neighbourhood activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A candidate was applied and the strategy kept it.
    Committed,
    /// A candidate was applied and reverted on the strategy's verdict.
    Rejected,
    /// No admissible candidate was found within the try limit.
    NotFound,
}

/// One named move operator bound to a model variable.
#[derive(Debug, Clone)]
pub struct Neighbourhood {
    pub name: String,
    /// Index into the model's variable list.
    pub var: usize,
    pub kind: NbKind,
}

/// The move operator catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbKind {
    AssignRandom,
    IntAssignInWindow,
    SetAdd,
    SetRemove,
    SetSwapMember,
    MSetAdd,
    MSetRemove,
    MSetLiftSingle,
    SeqAdd,
    SeqRemove,
    SeqSwapPositions,
    SeqLiftSingle,
    TupleLiftSingle,
    FuncLiftImage,
    FuncSwapImages,
    PartitionSwapParts,
}

impl NbKind {
    fn label(self) -> &'static str {
        match self {
            NbKind::AssignRandom => "assign_random",
            NbKind::IntAssignInWindow => "assign_in_violation_window",
            NbKind::SetAdd | NbKind::MSetAdd | NbKind::SeqAdd => "add",
            NbKind::SetRemove | NbKind::MSetRemove | NbKind::SeqRemove => "remove",
            NbKind::SetSwapMember => "swap_member",
            NbKind::MSetLiftSingle | NbKind::SeqLiftSingle | NbKind::TupleLiftSingle => {
                "lift_single"
            }
            NbKind::SeqSwapPositions => "swap_positions",
            NbKind::FuncLiftImage => "lift_image",
            NbKind::FuncSwapImages => "swap_images",
            NbKind::PartitionSwapParts => "swap_parts",
        }
    }

    /// Runs the full propose/check/commit-or-revert protocol once.
    pub fn apply(self, p: &mut NeighbourhoodParams) -> MoveOutcome {
        match self {
            NbKind::AssignRandom => match p.domain {
                Domain::Bool | Domain::Int(_) | Domain::Enum(_) => scalar::assign_random(p),
                _ => assign_whole(p),
            },
            NbKind::IntAssignInWindow => scalar::assign_in_violation_window(p),
            NbKind::SetAdd => set::add(p),
            NbKind::SetRemove => set::remove(p),
            NbKind::SetSwapMember => set::swap_member(p),
            NbKind::MSetAdd => mset::add(p),
            NbKind::MSetRemove => mset::remove(p),
            NbKind::MSetLiftSingle => mset::lift_single(p),
            NbKind::SeqAdd => sequence::add(p),
            NbKind::SeqRemove => sequence::remove(p),
            NbKind::SeqSwapPositions => sequence::swap_positions(p),
            NbKind::SeqLiftSingle => sequence::lift_single(p),
            NbKind::TupleLiftSingle => tuple::lift_single(p),
            NbKind::FuncLiftImage => function::lift_image(p),
            NbKind::FuncSwapImages => function::swap_images(p),
            NbKind::PartitionSwapParts => partition::swap_parts(p),
        }
    }
}

/// Everything one generator activation needs, threaded by reference so the
/// caller keeps ownership of the graph and the strategy.
pub struct NeighbourhoodParams<'a> {
    pub graph: &'a mut Graph,
    /// The leaf node of the variable being mutated.
    pub var: NodeId,
    pub domain: &'a Domain,
    pub constraint: NodeId,
    pub objective: Option<NodeId>,
    pub violations: &'a ViolationContainer,
    pub rng: &'a mut SolverRng,
    /// Re-proposals allowed after a failed parent check.
    pub try_limit: u32,
    /// Budget retries per generated random value.
    pub assignment_attempt_limit: u32,
    /// Admissibility gate bubbled up from the root; a failure reverts and
    /// re-proposes.
    pub parent_check: &'a mut dyn FnMut(&Candidate) -> bool,
    /// The strategy's commit-or-revert verdict.
    pub accept: &'a mut dyn FnMut(&Candidate) -> bool,
}

/// Verdict on one tentatively applied candidate.
pub(crate) enum Decision {
    Keep,
    ParentFailed,
    Rejected,
}

impl NeighbourhoodParams<'_> {
    /// Reads the root views for the currently applied candidate.
    pub(crate) fn candidate(&self) -> Candidate {
        let view = self.graph.view(self.constraint);
        Candidate {
            defined: view.is_defined(),
            violation: view.violation().unwrap_or(u64::MAX),
            objective: self.objective.and_then(|o| self.graph.view(o).as_int()),
        }
    }

    pub(crate) fn decide(&mut self) -> Decision {
        let candidate = self.candidate();
        if !(self.parent_check)(&candidate) {
            return Decision::ParentFailed;
        }
        if (self.accept)(&candidate) {
            Decision::Keep
        } else {
            Decision::Rejected
        }
    }

    pub(crate) fn member_count(&self) -> usize {
        self.graph.value(self.var).member_count()
    }

    /// A member index, weighted by recorded per-member blame when the
    /// violation container has any for this variable, uniform otherwise.
    pub(crate) fn pick_member(&mut self) -> Option<usize> {
        let len = self.member_count();
        if len == 0 {
            return None;
        }
        let id = self.graph.value(self.var).id();
        if let Some(child) = self.violations.child_violations(id) {
            if child.total_violation() > 0 {
                let index = child.select_random_var(len as u64 - 1, self.rng) as usize;
                return Some(index);
            }
        }
        Some(self.rng.index(len))
    }

    /// One random value of `domain`, grown-budget retries included.
    pub(crate) fn random_member(&mut self, domain: &Domain) -> Option<Value> {
        assign::random_value_with_retries(domain, self.rng, self.assignment_attempt_limit)
    }
}

/// Whole-value random assignment for container variables. The old value
/// is kept as the revert backup; identity survives both directions.
fn assign_whole(p: &mut NeighbourhoodParams) -> MoveOutcome {
    for _ in 0..p.try_limit {
        let backup = p.graph.value(p.var).clone();
        if !assign::assign_random(p.graph, p.var, p.domain, p.rng, p.assignment_attempt_limit) {
            return MoveOutcome::NotFound;
        }
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::assign_value(p.graph, p.var, backup);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => propagate::assign_value(p.graph, p.var, backup),
        }
    }
    MoveOutcome::NotFound
}

/// Shared body of the lift generators: mutate one int member in place.
/// `positions` restricts the choice (tuples lift only their int slots);
/// `None` picks any member, blame-weighted.
pub(crate) fn lift_int_member(
    p: &mut NeighbourhoodParams,
    inner: &IntDomain,
    positions: Option<&[usize]>,
) -> MoveOutcome {
    if inner.size() < 2 {
        return MoveOutcome::NotFound;
    }
    for _ in 0..p.try_limit {
        let index = match positions {
            Some(list) => {
                if list.is_empty() {
                    return MoveOutcome::NotFound;
                }
                *p.rng.pick(list)
            }
            None => match p.pick_member() {
                Some(index) => index,
                None => return MoveOutcome::NotFound,
            },
        };
        let old = member_int(p.graph, p.var, index);
        let new = repick(inner, old, p.rng);
        // uniqueness rejection (injective containers) counts as a failed
        // proposal
        if !propagate::member_set_int(p.graph, p.var, index, new) {
            continue;
        }
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                restore_member(p.graph, p.var, index, old);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => restore_member(p.graph, p.var, index, old),
        }
    }
    MoveOutcome::NotFound
}

/// Random domain value different from `old`.
pub(crate) fn repick(domain: &IntDomain, old: i64, rng: &mut SolverRng) -> i64 {
    loop {
        let v = domain.random_value(rng);
        if v != old {
            return v;
        }
    }
}

pub(crate) fn member_int(g: &Graph, var: NodeId, index: usize) -> i64 {
    match g.value(var).member(index).and_then(Value::as_int) {
        Some(v) => v,
        None => panic!("lift on a non-int member: {}", g.dump_node(var)),
    }
}

fn restore_member(g: &mut Graph, var: NodeId, index: usize, old: i64) {
    let restored = propagate::member_set_int(g, var, index, old);
    debug_assert!(restored, "revert re-inserted a value that was just removed");
}

/// Expects an int inner domain; lifts are only generated for those.
pub(crate) fn int_inner(domain: &Domain) -> &IntDomain {
    match domain {
        Domain::Int(d) => d,
        other => panic!("lift generated for a non-int inner domain: {other:?}"),
    }
}

/// Appends the generator catalogue for one variable, gated by the
/// domain's size attribute: exact-size containers get no add/remove, and
/// lifts appear only over int inner domains.
pub fn generate_neighbourhoods(
    var: usize,
    name: &str,
    domain: &Domain,
    out: &mut Vec<Neighbourhood>,
) {
    let mut push = |kind: NbKind, out: &mut Vec<Neighbourhood>| {
        out.push(Neighbourhood {
            name: format!("{name}.{}", kind.label()),
            var,
            kind,
        });
    };
    match domain {
        Domain::Bool | Domain::Enum(_) => push(NbKind::AssignRandom, out),
        Domain::Int(_) => {
            push(NbKind::AssignRandom, out);
            push(NbKind::IntAssignInWindow, out);
        }
        Domain::Set(d) => {
            push(NbKind::AssignRandom, out);
            if !d.size.is_exact() {
                push(NbKind::SetAdd, out);
                push(NbKind::SetRemove, out);
            }
            push(NbKind::SetSwapMember, out);
        }
        Domain::MultiSet(d) => {
            push(NbKind::AssignRandom, out);
            if !d.size.is_exact() {
                push(NbKind::MSetAdd, out);
                push(NbKind::MSetRemove, out);
            }
            if matches!(*d.inner, Domain::Int(_)) {
                push(NbKind::MSetLiftSingle, out);
            }
        }
        Domain::Sequence(d) => {
            push(NbKind::AssignRandom, out);
            if !d.size.is_exact() {
                push(NbKind::SeqAdd, out);
                push(NbKind::SeqRemove, out);
            }
            push(NbKind::SeqSwapPositions, out);
            if matches!(*d.inner, Domain::Int(_)) {
                push(NbKind::SeqLiftSingle, out);
            }
        }
        Domain::Tuple(d) => {
            if d.members.iter().any(|m| matches!(m, Domain::Int(_))) {
                push(NbKind::TupleLiftSingle, out);
            }
        }
        Domain::Function(d) => {
            push(NbKind::AssignRandom, out);
            if matches!(*d.image, Domain::Int(_)) {
                push(NbKind::FuncLiftImage, out);
            }
            push(NbKind::FuncSwapImages, out);
        }
        Domain::Partition(_) => push(NbKind::PartitionSwapParts, out),
    }
}
