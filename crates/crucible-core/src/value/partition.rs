//! Partition values: fixed elements grouped into interchangeable parts.

use crate::hash::ValueHash;

use super::ValueBase;

/// A partition assignment: element `e` (of a fixed universe
/// `0..element_count`) belongs to part `part_of[e]`.
///
/// Part labels carry no identity: two assignments that induce the same
/// grouping hash equally. The hash is the commutative sum over parts of
/// `mix(sum of member hashes)`, maintained through per-part running sums.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionValue {
    pub base: ValueBase,
    part_of: Vec<usize>,
    part_sums: Vec<ValueHash>,
    part_sizes: Vec<usize>,
    cached: ValueHash,
}

impl PartitionValue {
    /// Builds a partition from an element-to-part map.
    pub fn new(part_of: Vec<usize>, num_parts: usize) -> PartitionValue {
        let mut part_sums = vec![ValueHash::default(); num_parts];
        let mut part_sizes = vec![0usize; num_parts];
        for (element, &part) in part_of.iter().enumerate() {
            assert!(part < num_parts, "element {element} assigned to part {part}");
            part_sums[part] += Self::element_hash(element);
            part_sizes[part] += 1;
        }
        let cached = part_sums
            .iter()
            .fold(ValueHash::default(), |acc, s| acc + ValueHash::of_u64(s.0));
        PartitionValue {
            base: ValueBase::detached(),
            part_of,
            part_sums,
            part_sizes,
            cached,
        }
    }

    fn element_hash(element: usize) -> ValueHash {
        ValueHash::of_u64(element as u64)
    }

    pub fn element_count(&self) -> usize {
        self.part_of.len()
    }

    pub fn num_parts(&self) -> usize {
        self.part_sums.len()
    }

    pub fn part_of(&self, element: usize) -> usize {
        self.part_of[element]
    }

    pub fn part_size(&self, part: usize) -> usize {
        self.part_sizes[part]
    }

    /// Moves `element` into `new_part`. The caller gates this on part-size
    /// constraints (a part must not be emptied).
    pub fn move_element(&mut self, element: usize, new_part: usize) {
        let old_part = self.part_of[element];
        if old_part == new_part {
            return;
        }
        let eh = Self::element_hash(element);
        self.cached -= ValueHash::of_u64(self.part_sums[old_part].0);
        self.cached -= ValueHash::of_u64(self.part_sums[new_part].0);
        self.part_sums[old_part] -= eh;
        self.part_sums[new_part] += eh;
        self.cached += ValueHash::of_u64(self.part_sums[old_part].0);
        self.cached += ValueHash::of_u64(self.part_sums[new_part].0);
        self.part_sizes[old_part] -= 1;
        self.part_sizes[new_part] += 1;
        self.part_of[element] = new_part;
    }

    /// Exchanges the parts of two elements; part sizes are preserved.
    pub fn swap_parts(&mut self, a: usize, b: usize) {
        let pa = self.part_of[a];
        let pb = self.part_of[b];
        if pa == pb {
            return;
        }
        // two moves, but sizes net out
        self.move_element(a, pb);
        self.move_element(b, pa);
    }

    pub fn cached_hash(&self) -> ValueHash {
        self.cached
    }

    pub fn recompute_hash(&self) -> ValueHash {
        let mut sums = vec![ValueHash::default(); self.num_parts()];
        for (element, &part) in self.part_of.iter().enumerate() {
            sums[part] += Self::element_hash(element);
        }
        sums.iter()
            .fold(ValueHash::default(), |acc, s| acc + ValueHash::of_u64(s.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_labels_do_not_matter() {
        // {0,1}{2} under two labellings
        let a = PartitionValue::new(vec![0, 0, 1], 2);
        let b = PartitionValue::new(vec![1, 1, 0], 2);
        assert_eq!(a.cached_hash(), b.cached_hash());
    }

    #[test]
    fn different_groupings_differ() {
        let a = PartitionValue::new(vec![0, 0, 1], 2);
        let b = PartitionValue::new(vec![0, 1, 0], 2);
        assert_ne!(a.cached_hash(), b.cached_hash());
    }

    #[test]
    fn swap_parts_roundtrip_restores_hash() {
        let mut p = PartitionValue::new(vec![0, 0, 1, 1], 2);
        let before = p.cached_hash();
        p.swap_parts(0, 2);
        assert_eq!(p.part_of(0), 1);
        assert_eq!(p.part_of(2), 0);
        assert_eq!(p.cached_hash(), p.recompute_hash());
        p.swap_parts(0, 2);
        assert_eq!(p.cached_hash(), before);
    }

    #[test]
    fn move_element_tracks_sizes() {
        let mut p = PartitionValue::new(vec![0, 0, 1], 2);
        p.move_element(0, 1);
        assert_eq!(p.part_size(0), 1);
        assert_eq!(p.part_size(1), 2);
        assert_eq!(p.cached_hash(), p.recompute_hash());
    }
}
