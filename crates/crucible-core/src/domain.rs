//! Domain descriptors.
//!
//! A [`Domain`] is the immutable description of the legal value space of
//! one variable. Container domains own their inner domains, forming a
//! tree; the tree is built once by the model layer and never mutated
//! during search.

use crate::error::{CoreError, Result};
use crate::rng::SolverRng;
use crate::size_attr::SizeAttr;

/// Description of the legal value space for one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    Bool,
    Int(IntDomain),
    Enum(EnumDomain),
    Set(SetDomain),
    MultiSet(MultiSetDomain),
    Sequence(SequenceDomain),
    Tuple(TupleDomain),
    Function(FunctionDomain),
    Partition(PartitionDomain),
}

impl Domain {
    /// Number of distinct values in the domain, saturating at `u64::MAX`.
    pub fn domain_size(&self) -> u64 {
        match self {
            Domain::Bool => 2,
            Domain::Int(d) => d.size,
            Domain::Enum(d) => d.names.len() as u64,
            Domain::Set(d) => combinations_up_to(d.inner.domain_size(), &d.size),
            Domain::MultiSet(d) => combinations_up_to(d.inner.domain_size(), &d.size)
                .saturating_mul(2),
            Domain::Sequence(d) => {
                let inner = d.inner.domain_size();
                let mut total = 0u64;
                let max = d.size.max_size().min(8);
                for len in d.size.min_size()..=max {
                    total = total.saturating_add(saturating_pow(inner, len));
                }
                total.max(1)
            }
            Domain::Tuple(d) => d
                .members
                .iter()
                .fold(1u64, |acc, m| acc.saturating_mul(m.domain_size())),
            Domain::Function(d) => {
                saturating_pow(d.image.domain_size(), d.from_size)
            }
            Domain::Partition(d) => {
                saturating_pow(d.num_parts as u64, d.element_count as u64)
            }
        }
    }

    /// Cheap structural lower bound on the cost of generating one random
    /// value of this domain, in resource units (one unit per element).
    ///
    /// Consumed by the neighbourhood resource tracker to budget generative
    /// assignment over unbounded domains.
    pub fn resource_lower_bound(&self) -> u64 {
        match self {
            Domain::Bool | Domain::Int(_) | Domain::Enum(_) => 1,
            Domain::Set(d) => 1 + d.size.min_size().saturating_mul(d.inner.resource_lower_bound()),
            Domain::MultiSet(d) => {
                1 + d.size.min_size().saturating_mul(d.inner.resource_lower_bound())
            }
            Domain::Sequence(d) => {
                1 + d.size.min_size().saturating_mul(d.inner.resource_lower_bound())
            }
            Domain::Tuple(d) => {
                1 + d.members.iter().map(Domain::resource_lower_bound).sum::<u64>()
            }
            Domain::Function(d) => {
                1 + d.from_size.saturating_mul(d.image.resource_lower_bound())
            }
            Domain::Partition(d) => 1 + d.element_count as u64,
        }
    }

    /// The declared size attribute, for container domains.
    pub fn size_attr(&self) -> Option<SizeAttr> {
        match self {
            Domain::Set(d) => Some(d.size),
            Domain::MultiSet(d) => Some(d.size),
            Domain::Sequence(d) => Some(d.size),
            _ => None,
        }
    }
}

fn saturating_pow(base: u64, exp: u64) -> u64 {
    let mut acc = 1u64;
    for _ in 0..exp.min(64) {
        acc = acc.saturating_mul(base);
        if acc == u64::MAX {
            break;
        }
    }
    acc
}

// Loose upper-bound style count for subset-like domains; only ever used
// for ordering heuristics, never for correctness.
fn combinations_up_to(inner: u64, size: &SizeAttr) -> u64 {
    let max = size.max_size().min(inner).min(8);
    let mut total = 0u64;
    for len in size.min_size()..=max {
        total = total.saturating_add(saturating_pow(inner, len));
    }
    total.max(1)
}

/// Integer domain: a sorted list of disjoint inclusive bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntDomain {
    bounds: Vec<(i64, i64)>,
    size: u64,
}

impl IntDomain {
    /// Builds an integer domain from inclusive bounds.
    ///
    /// Bounds must be non-empty, individually ordered, sorted and disjoint.
    pub fn new(bounds: Vec<(i64, i64)>) -> Result<IntDomain> {
        if bounds.is_empty() {
            return Err(CoreError::InvalidIntDomain("no bounds".into()));
        }
        let mut size = 0u64;
        let mut prev_end: Option<i64> = None;
        for &(lo, hi) in &bounds {
            if lo > hi {
                return Err(CoreError::InvalidIntDomain(format!(
                    "bound ({lo}, {hi}) is inverted"
                )));
            }
            if let Some(end) = prev_end {
                if lo <= end {
                    return Err(CoreError::InvalidIntDomain(format!(
                        "bound starting at {lo} overlaps previous end {end}"
                    )));
                }
            }
            prev_end = Some(hi);
            size += (hi - lo) as u64 + 1;
        }
        Ok(IntDomain { bounds, size })
    }

    /// Single contiguous range `lo..=hi`.
    pub fn range(lo: i64, hi: i64) -> Result<IntDomain> {
        IntDomain::new(vec![(lo, hi)])
    }

    pub fn bounds(&self) -> &[(i64, i64)] {
        &self.bounds
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn min(&self) -> i64 {
        self.bounds[0].0
    }

    pub fn max(&self) -> i64 {
        self.bounds[self.bounds.len() - 1].1
    }

    pub fn contains(&self, v: i64) -> bool {
        self.bounds.iter().any(|&(lo, hi)| lo <= v && v <= hi)
    }

    /// The `index`th smallest value of the domain.
    pub fn value_at(&self, mut index: u64) -> i64 {
        debug_assert!(index < self.size);
        for &(lo, hi) in &self.bounds {
            let bound_size = (hi - lo) as u64 + 1;
            if index < bound_size {
                return lo + index as i64;
            }
            index -= bound_size;
        }
        unreachable!("index out of range for int domain")
    }

    /// Uniformly random value of the domain.
    pub fn random_value(&self, rng: &mut SolverRng) -> i64 {
        self.value_at(rng.range(0..self.size))
    }

    /// Random value within `[min_value, max_value]`, snapped into the
    /// domain: a pick that lands in a gap between bounds is moved to the
    /// closer neighbouring bound edge (ties broken randomly).
    pub fn random_value_between(
        &self,
        rng: &mut SolverRng,
        min_value: i64,
        max_value: i64,
    ) -> i64 {
        let min_value = min_value.max(self.min());
        let max_value = max_value.min(self.max());
        let picked = if min_value >= max_value {
            min_value.min(max_value)
        } else {
            rng.range(min_value..=max_value)
        };
        for (i, &(lo, hi)) in self.bounds.iter().enumerate() {
            if lo <= picked && picked <= hi {
                return picked;
            }
            if i + 1 < self.bounds.len() && picked < self.bounds[i + 1].0 {
                return Self::closer_bound_edge(rng, hi, self.bounds[i + 1].0, picked);
            }
        }
        // picked below the first bound
        self.min()
    }

    fn closer_bound_edge(rng: &mut SolverRng, below: i64, above: i64, v: i64) -> i64 {
        let dist_below = v - below;
        let dist_above = above - v;
        if dist_below < dist_above {
            below
        } else if dist_above < dist_below {
            above
        } else if rng.chance(0.5) {
            below
        } else {
            above
        }
    }
}

/// Enumerated domain: a fixed list of named constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDomain {
    pub names: Vec<String>,
}

impl EnumDomain {
    pub fn new(names: Vec<String>) -> Result<EnumDomain> {
        if names.is_empty() {
            return Err(CoreError::InvalidDomain("empty enum".into()));
        }
        Ok(EnumDomain { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Set domain: distinct members drawn from `inner`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDomain {
    pub size: SizeAttr,
    pub inner: Box<Domain>,
}

/// Multiset domain: members drawn from `inner`, duplicates allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiSetDomain {
    pub size: SizeAttr,
    pub inner: Box<Domain>,
}

/// Sequence domain: ordered members drawn from `inner`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDomain {
    pub size: SizeAttr,
    pub inner: Box<Domain>,
    /// No member may occur twice.
    pub injective: bool,
}

/// Tuple domain: fixed arity, one inner domain per position.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDomain {
    pub members: Vec<Domain>,
}

impl TupleDomain {
    pub fn new(members: Vec<Domain>) -> Result<TupleDomain> {
        if members.is_empty() {
            return Err(CoreError::InvalidDomain("zero-arity tuple".into()));
        }
        Ok(TupleDomain { members })
    }
}

/// Total function domain from an indexed finite set of size `from_size`
/// onto `image`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDomain {
    pub from_size: u64,
    pub image: Box<Domain>,
}

impl FunctionDomain {
    pub fn new(from_size: u64, image: Domain) -> Result<FunctionDomain> {
        if from_size == 0 {
            return Err(CoreError::InvalidDomain("empty function domain".into()));
        }
        Ok(FunctionDomain {
            from_size,
            image: Box::new(image),
        })
    }
}

/// Partition of `element_count` fixed elements into `num_parts` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDomain {
    pub element_count: usize,
    pub num_parts: usize,
}

impl PartitionDomain {
    pub fn new(element_count: usize, num_parts: usize) -> Result<PartitionDomain> {
        if num_parts == 0 || element_count < num_parts {
            return Err(CoreError::InvalidDomain(format!(
                "cannot partition {element_count} elements into {num_parts} parts"
            )));
        }
        Ok(PartitionDomain {
            element_count,
            num_parts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_domain_counts_disjoint_bounds() {
        let d = IntDomain::new(vec![(1, 3), (7, 8)]).unwrap();
        assert_eq!(d.size(), 5);
        assert_eq!(d.value_at(0), 1);
        assert_eq!(d.value_at(2), 3);
        assert_eq!(d.value_at(3), 7);
        assert!(d.contains(8));
        assert!(!d.contains(5));
    }

    #[test]
    fn int_domain_rejects_overlap_and_inversion() {
        assert!(IntDomain::new(vec![(3, 1)]).is_err());
        assert!(IntDomain::new(vec![(1, 5), (4, 9)]).is_err());
        assert!(IntDomain::new(vec![]).is_err());
    }

    #[test]
    fn random_value_lands_in_domain() {
        let d = IntDomain::new(vec![(-2, 0), (10, 12)]).unwrap();
        let mut rng = SolverRng::from_seed(3);
        for _ in 0..200 {
            assert!(d.contains(d.random_value(&mut rng)));
        }
    }

    #[test]
    fn windowed_random_snaps_into_domain() {
        let d = IntDomain::new(vec![(0, 2), (10, 12)]).unwrap();
        let mut rng = SolverRng::from_seed(9);
        for _ in 0..200 {
            let v = d.random_value_between(&mut rng, 0, 12);
            assert!(d.contains(v), "{v} escaped the domain");
        }
    }

    #[test]
    fn resource_lower_bound_scales_with_min_size() {
        let inner = Domain::Int(IntDomain::range(1, 10).unwrap());
        let set = Domain::Set(SetDomain {
            size: SizeAttr::Min(4),
            inner: Box::new(inner),
        });
        assert_eq!(set.resource_lower_bound(), 5);
    }
}
