//! Resource budgeting for generative assignment.
//!
//! Unbounded container domains make "assign a random value" potentially
//! unbounded work. A [`ResourceTracker`] carries a unit budget (one unit
//! per generated element) consulted at every recursion point; an exhausted
//! budget fails the whole attempt and the caller retries with a larger
//! budget from the [`ResourceAllocator`].

use crucible_core::{Domain, SolverRng};

/// A unit budget for one generation attempt.
#[derive(Debug)]
pub struct ResourceTracker {
    limit: u64,
    consumed: u64,
    reserved: u64,
}

impl ResourceTracker {
    pub fn new(limit: u64) -> ResourceTracker {
        ResourceTracker {
            limit,
            consumed: 0,
            reserved: 0,
        }
    }

    /// Consumes one unit. Returns false on exhaustion; the attempt is then
    /// abandoned, never partially applied.
    pub fn request_resource(&mut self) -> bool {
        if self.remaining() == 0 {
            return false;
        }
        self.consumed += 1;
        true
    }

    /// Units still available to the current position, net of reservations.
    pub fn remaining(&self) -> u64 {
        self.limit - self.consumed - self.reserved
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Picks how many members a random container should hold: uniform over
    /// `min..=max`, capped so the expected per-member cost of `inner` fits
    /// the remaining budget.
    pub fn random_number_elements(
        &self,
        min: u64,
        max: u64,
        inner: &Domain,
        rng: &mut SolverRng,
    ) -> u64 {
        let per_element = inner.resource_lower_bound().max(1);
        let cap = self.remaining() / per_element + 1;
        let max = max.min(cap);
        if max <= min {
            min
        } else {
            rng.range(min..=max)
        }
    }

    /// Holds back budget for `elements` members not yet generated, so the
    /// member being generated now cannot eat the whole budget. The hold is
    /// released when the guard drops.
    pub fn reserve(&mut self, elements: u64, inner: &Domain) -> Reserved<'_> {
        self.reserve_units(elements.saturating_mul(inner.resource_lower_bound()))
    }

    /// As [`ResourceTracker::reserve`], with a precomputed unit amount
    /// (used where the pending members have heterogeneous domains).
    pub fn reserve_units(&mut self, amount: u64) -> Reserved<'_> {
        let amount = amount.min(self.remaining());
        self.reserved += amount;
        Reserved { tracker: self, amount }
    }
}

/// Budget hold for not-yet-generated members; releases on drop.
#[derive(Debug)]
pub struct Reserved<'a> {
    tracker: &'a mut ResourceTracker,
    amount: u64,
}

impl Reserved<'_> {
    /// The tracker with the hold in effect.
    pub fn tracker(&mut self) -> &mut ResourceTracker {
        self.tracker
    }
}

impl Drop for Reserved<'_> {
    fn drop(&mut self) {
        self.tracker.reserved -= self.amount;
    }
}

/// Geometric budget schedule across retries of one assignment.
///
/// Starts a little above the domain's structural lower bound and grows the
/// budget by roughly 10% on every failed attempt.
#[derive(Debug)]
pub struct ResourceAllocator {
    current: u64,
}

impl ResourceAllocator {
    pub fn new(domain: &Domain) -> ResourceAllocator {
        let lb = domain.resource_lower_bound();
        ResourceAllocator {
            current: lb + lb / 10 + 500,
        }
    }

    /// A fresh tracker carrying the current budget.
    pub fn tracker(&self) -> ResourceTracker {
        ResourceTracker::new(self.current)
    }

    /// Grows the budget for the next attempt.
    pub fn request_larger_resource(&mut self) {
        self.current += (self.current / 10).max(1);
    }
}
