//! Random whole-value generation.
//!
//! Values are generated detached from the graph and committed in one
//! whole-value assignment, so a failed attempt never leaves partial state
//! behind. Every generated element costs one budget unit from the
//! [`ResourceTracker`](crate::resource::ResourceTracker).

use crucible_core::value::{BoolValue, EnumValue, IntValue};
use crucible_core::{
    Domain, FunctionValue, MultiSetValue, PartitionValue, SequenceValue, SetValue, SolverRng,
    TupleValue, Value,
};
use crucible_engine::{propagate, Graph, NodeId};

use crate::resource::{ResourceAllocator, ResourceTracker};

/// Generates one random value of `domain`, detached. Returns `None` when
/// the budget runs out before a legal value is complete.
pub fn random_value(
    domain: &Domain,
    tracker: &mut ResourceTracker,
    rng: &mut SolverRng,
) -> Option<Value> {
    match domain {
        Domain::Bool => {
            if !tracker.request_resource() {
                return None;
            }
            Some(Value::Bool(BoolValue::new(rng.chance(0.5))))
        }
        Domain::Int(d) => {
            if !tracker.request_resource() {
                return None;
            }
            Some(Value::Int(IntValue::new(d.random_value(rng))))
        }
        Domain::Enum(d) => {
            if !tracker.request_resource() {
                return None;
            }
            Some(Value::Enum(EnumValue::new(rng.index(d.len()))))
        }
        Domain::Set(d) => {
            if !tracker.request_resource() {
                return None;
            }
            let target =
                tracker.random_number_elements(d.size.min_size(), d.size.max_size(), &d.inner, rng);
            let mut set = SetValue::new();
            while (set.len() as u64) < target {
                let still_needed = target - set.len() as u64 - 1;
                let member = {
                    let mut held = tracker.reserve(still_needed, &d.inner);
                    random_value(&d.inner, held.tracker(), rng)
                };
                match member {
                    // a duplicate is silently dropped; the budget spent on
                    // it bounds how long we keep colliding
                    Some(m) => {
                        set.add(m);
                    }
                    None => break,
                }
            }
            ((set.len() as u64) >= d.size.min_size()).then_some(Value::Set(set))
        }
        Domain::MultiSet(d) => {
            if !tracker.request_resource() {
                return None;
            }
            let target =
                tracker.random_number_elements(d.size.min_size(), d.size.max_size(), &d.inner, rng);
            let mut mset = MultiSetValue::new();
            while (mset.len() as u64) < target {
                let still_needed = target - mset.len() as u64 - 1;
                let member = {
                    let mut held = tracker.reserve(still_needed, &d.inner);
                    random_value(&d.inner, held.tracker(), rng)
                };
                match member {
                    Some(m) => mset.add(m),
                    None => break,
                }
            }
            ((mset.len() as u64) >= d.size.min_size()).then_some(Value::MultiSet(mset))
        }
        Domain::Sequence(d) => {
            if !tracker.request_resource() {
                return None;
            }
            let target =
                tracker.random_number_elements(d.size.min_size(), d.size.max_size(), &d.inner, rng);
            let mut seq = SequenceValue::new(d.injective);
            while (seq.len() as u64) < target {
                let still_needed = target - seq.len() as u64 - 1;
                let member = {
                    let mut held = tracker.reserve(still_needed, &d.inner);
                    random_value(&d.inner, held.tracker(), rng)
                };
                match member {
                    Some(m) => {
                        seq.push(m);
                    }
                    None => break,
                }
            }
            ((seq.len() as u64) >= d.size.min_size()).then_some(Value::Sequence(seq))
        }
        Domain::Tuple(d) => {
            if !tracker.request_resource() {
                return None;
            }
            let mut members = Vec::with_capacity(d.members.len());
            for (i, inner) in d.members.iter().enumerate() {
                let left: u64 = d.members[i + 1..]
                    .iter()
                    .map(Domain::resource_lower_bound)
                    .sum();
                let member = {
                    let mut held = tracker.reserve_units(left);
                    random_value(inner, held.tracker(), rng)?
                };
                members.push(member);
            }
            Some(Value::Tuple(TupleValue::new(members)))
        }
        Domain::Function(d) => {
            if !tracker.request_resource() {
                return None;
            }
            let mut images = Vec::with_capacity(d.from_size as usize);
            for point in 0..d.from_size {
                let image = {
                    let mut held = tracker.reserve(d.from_size - point - 1, &d.image);
                    random_value(&d.image, held.tracker(), rng)?
                };
                images.push(image);
            }
            Some(Value::Function(FunctionValue::new(images)))
        }
        Domain::Partition(d) => {
            let mut part_of = vec![0usize; d.element_count];
            let mut elements: Vec<usize> = (0..d.element_count).collect();
            rng.shuffle(&mut elements);
            // the first element per part keeps every part non-empty
            for (i, &element) in elements.iter().enumerate() {
                if !tracker.request_resource() {
                    return None;
                }
                part_of[element] = if i < d.num_parts {
                    i
                } else {
                    rng.index(d.num_parts)
                };
            }
            Some(Value::Partition(PartitionValue::new(part_of, d.num_parts)))
        }
    }
}

/// As [`random_value`], retrying with a geometrically larger budget on
/// each failed attempt, up to `attempt_limit` attempts.
pub fn random_value_with_retries(
    domain: &Domain,
    rng: &mut SolverRng,
    attempt_limit: u32,
) -> Option<Value> {
    let mut allocator = ResourceAllocator::new(domain);
    for attempt in 0..attempt_limit {
        let mut tracker = allocator.tracker();
        if let Some(content) = random_value(domain, &mut tracker, rng) {
            return Some(content);
        }
        tracing::trace!(attempt, "generation ran out of budget, growing");
        allocator.request_larger_resource();
    }
    None
}

/// Replaces the whole value of `var` with a random one. Returns false when
/// every generation attempt ran out of budget; the graph is untouched in
/// that case.
pub fn assign_random(
    g: &mut Graph,
    var: NodeId,
    domain: &Domain,
    rng: &mut SolverRng,
    attempt_limit: u32,
) -> bool {
    match random_value_with_retries(domain, rng, attempt_limit) {
        Some(content) => {
            propagate::assign_value(g, var, content);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_core::{IntDomain, PartitionDomain, SetDomain, SizeAttr};

    fn int_domain(lo: i64, hi: i64) -> Domain {
        Domain::Int(IntDomain::range(lo, hi).unwrap())
    }

    #[test]
    fn exhausted_budget_yields_nothing() {
        let mut tracker = ResourceTracker::new(0);
        let mut rng = SolverRng::from_seed(1);
        assert!(random_value(&int_domain(1, 9), &mut tracker, &mut rng).is_none());
    }

    #[test]
    fn set_respects_declared_size_bounds() {
        let domain = Domain::Set(SetDomain {
            size: SizeAttr::range(2, 4).unwrap(),
            inner: Box::new(int_domain(1, 50)),
        });
        let mut rng = SolverRng::from_seed(7);
        for _ in 0..40 {
            let mut tracker = ResourceTracker::new(100);
            let value = random_value(&domain, &mut tracker, &mut rng).unwrap();
            let len = value.member_count() as u64;
            assert!((2..=4).contains(&len), "set of size {len}");
        }
    }

    #[test]
    fn partition_keeps_every_part_occupied() {
        let domain = Domain::Partition(PartitionDomain::new(6, 3).unwrap());
        let mut rng = SolverRng::from_seed(3);
        for _ in 0..40 {
            let mut tracker = ResourceTracker::new(100);
            match random_value(&domain, &mut tracker, &mut rng).unwrap() {
                Value::Partition(p) => {
                    for part in 0..3 {
                        assert!(p.part_size(part) > 0, "part {part} is empty");
                    }
                }
                other => panic!("expected a partition, got a {}", other.kind_name()),
            }
        }
    }

    #[test]
    fn impossible_set_fails_without_touching_the_graph() {
        // only 3 distinct inner values exist; a min size of 5 cannot be met
        let domain = Domain::Set(SetDomain {
            size: SizeAttr::Min(5),
            inner: Box::new(int_domain(1, 3)),
        });
        let mut g = Graph::new();
        let var = g.add_variable(Value::Set(SetValue::new()));
        let before = g.value(var).hash();
        let mut rng = SolverRng::from_seed(4);
        assert!(!assign_random(&mut g, var, &domain, &mut rng, 5));
        assert_eq!(g.value(var).hash(), before);
        assert_eq!(g.value(var).member_count(), 0);
    }
}
