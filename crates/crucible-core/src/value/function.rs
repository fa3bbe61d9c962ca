//! Function values: a total function stored as its image vector.

use crate::hash::ValueHash;

use super::{attach, Value, ValueBase};

/// A total function assignment over an indexed finite domain: the image
/// of point `i` is `images[i]`. Hashed like an ordered container.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub base: ValueBase,
    images: Vec<Value>,
    cached: ValueHash,
}

impl FunctionValue {
    pub fn new(mut images: Vec<Value>) -> FunctionValue {
        let mut func = FunctionValue {
            base: ValueBase::detached(),
            images: Vec::new(),
            cached: ValueHash::default(),
        };
        for (i, m) in images.iter_mut().enumerate() {
            attach(m, func.base.id, i);
            func.cached += ValueHash::of_indexed(i, m.hash());
        }
        func.images = images;
        func
    }

    /// Number of points in the function's domain.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, point: usize) -> Option<&Value> {
        self.images.get(point)
    }

    pub fn images(&self) -> &[Value] {
        &self.images
    }

    /// Swaps the images of two points; an O(1) hash patch.
    pub fn swap_images(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let hi = self.images[i].hash();
        let hj = self.images[j].hash();
        self.cached -= ValueHash::of_indexed(i, hi) + ValueHash::of_indexed(j, hj);
        self.cached += ValueHash::of_indexed(i, hj) + ValueHash::of_indexed(j, hi);
        self.images.swap(i, j);
        let parent = self.base.id;
        attach(&mut self.images[i], parent, i);
        attach(&mut self.images[j], parent, j);
    }

    /// Starts an in-place mutation of the image of `point`; pair with
    /// [`FunctionValue::image_change_commit`].
    pub fn image_change_begin(&mut self, point: usize) -> &mut Value {
        let hash = self.images[point].hash();
        self.cached -= ValueHash::of_indexed(point, hash);
        &mut self.images[point]
    }

    pub fn image_change_commit(&mut self, point: usize) {
        let hash = self.images[point].hash();
        self.cached += ValueHash::of_indexed(point, hash);
    }

    pub fn cached_hash(&self) -> ValueHash {
        self.cached
    }

    pub fn recompute_hash(&self) -> ValueHash {
        self.images
            .iter()
            .enumerate()
            .fold(ValueHash::default(), |acc, (i, m)| {
                acc + ValueHash::of_indexed(i, m.recompute_hash())
            })
    }

    pub(super) fn for_each_image(&self, mut f: impl FnMut(&Value, usize)) {
        for (i, m) in self.images.iter().enumerate() {
            f(m, i);
        }
    }

    pub(super) fn assign_member_ids(&mut self, parent: u64, next_id: &mut u64) {
        for (i, m) in self.images.iter_mut().enumerate() {
            m.assign_ids(next_id);
            attach(m, parent, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IntValue;

    fn func_of(values: &[i64]) -> FunctionValue {
        FunctionValue::new(values.iter().map(|&v| Value::Int(IntValue::new(v))).collect())
    }

    #[test]
    fn swap_images_matches_reference() {
        let mut f = func_of(&[10, 20, 30]);
        let reference = func_of(&[30, 20, 10]);
        f.swap_images(0, 2);
        assert_eq!(f.cached_hash(), reference.cached_hash());
        Value::Function(f).assert_member_backrefs();
    }

    #[test]
    fn image_change_patches_hash() {
        let mut f = func_of(&[1, 2]);
        if let Value::Int(iv) = f.image_change_begin(1) {
            iv.value = 4;
        }
        f.image_change_commit(1);
        assert_eq!(f.cached_hash(), f.recompute_hash());
    }
}
