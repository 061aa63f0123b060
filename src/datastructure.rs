use serde::{Deserialize, Serialize};

/// Custom datastructure built for reducing cache misses. A list of sequences is stored as one
/// flat buffer and the offsets at which each sequence starts. Empty sequences are kept: every
/// input vector owns exactly one slot.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Serialize, Deserialize)]
pub(crate) struct FlatVecs<T> {
    pub(crate) items: Box<[T]>,
    pub(crate) indices: Box<[usize]>,
}

impl<T> Default for FlatVecs<T> {
    fn default() -> Self {
        Self {
            items: Box::new([]),
            indices: Box::new([0]),
        }
    }
}

impl<T> FlatVecs<T> {
    pub(crate) fn new(vecs: Vec<Vec<T>>) -> Self {
        Self::from(vecs)
    }

    /// Number of sequences.
    pub(crate) fn len(&self) -> usize {
        self.indices.len().saturating_sub(1)
    }

    /// Returns the `index`-th sequence.
    pub(crate) fn get(&self, index: usize) -> Option<&[T]> {
        let start = *self.indices.get(index)?;
        let end = *self.indices.get(index + 1)?;
        self.items.get(start..end)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub(crate) fn iter_vec(&self) -> VecsIter<'_, T> {
        VecsIter::new(self)
    }
}

impl<T> From<Vec<Vec<T>>> for FlatVecs<T> {
    #[inline(always)]
    fn from(value: Vec<Vec<T>>) -> Self {
        let length: usize = value.iter().map(|v| v.len()).sum();
        let mut flattened = Vec::with_capacity(length);
        let mut indices = Vec::with_capacity(value.len() + 1);
        indices.push(0);
        for vec in value.into_iter() {
            flattened.extend(vec);
            indices.push(flattened.len());
        }
        Self {
            items: flattened.into_boxed_slice(),
            indices: indices.into_boxed_slice(),
        }
    }
}

impl<T> FromIterator<Vec<T>> for FlatVecs<T> {
    fn from_iter<I: IntoIterator<Item = Vec<T>>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

pub(crate) struct VecsIter<'a, T>
where
    T: 'a,
{
    flat_vecs: &'a FlatVecs<T>,
    counter: usize,
}

impl<'a, T> VecsIter<'a, T> {
    fn new(flat_vecs: &'a FlatVecs<T>) -> Self {
        Self {
            flat_vecs,
            counter: 0,
        }
    }
}

impl<'a, T> Iterator for VecsIter<'a, T> {
    type Item = &'a [T];
    fn next(&mut self) -> Option<Self::Item> {
        let next = self.flat_vecs.get(self.counter)?;
        self.counter += 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.flat_vecs.len().saturating_sub(self.counter);
        (remaining, Some(remaining))
    }
}

impl<'a, T> ExactSizeIterator for VecsIter<'a, T> {}

/// This method allocates. It should only be used in the testing environment.
#[cfg(test)]
impl<T> From<FlatVecs<T>> for Vec<Vec<T>>
where
    T: Clone,
{
    fn from(value: FlatVecs<T>) -> Self {
        value.iter_vec().map(Vec::from).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_flat_vecs() {
        let actual = FlatVecs::new(build_vecs());
        let expected = FlatVecs {
            items: Box::new(["PER", "LOC", "ORG", "LOC"]) as Box<[&str]>,
            indices: Box::new([0usize, 2, 2, 4]) as Box<[usize]>,
        };
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_iter_flat_vecs_len() {
        let flat = FlatVecs::new(build_vecs());
        assert_eq!(flat.len(), 3);
        assert_eq!(flat.iter_vec().count(), 3);
        assert_eq!(flat.iter_vec().len(), 3);
        assert_eq!(flat.iter().count(), 4);
    }

    #[test]
    fn test_iter_flat_vecs_keeps_empty_sequences() {
        let flat = FlatVecs::new(build_vecs());
        let back: Vec<Vec<&str>> = flat.into();
        assert_eq!(back, build_vecs());
    }

    #[test]
    fn test_get() {
        let flat = FlatVecs::new(build_vecs());
        assert_eq!(flat.get(0), Some(&["PER", "LOC"][..]));
        assert_eq!(flat.get(1), Some(&[][..]));
        assert_eq!(flat.get(3), None);
    }

    #[test]
    fn test_default_is_empty() {
        let flat: FlatVecs<u8> = FlatVecs::default();
        assert_eq!(flat.len(), 0);
        assert_eq!(flat.iter_vec().next(), None);
    }

    fn build_vecs() -> Vec<Vec<&'static str>> {
        vec![vec!["PER", "LOC"], vec![], vec!["ORG", "LOC"]]
    }
}
