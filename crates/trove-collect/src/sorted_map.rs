use crate::error::CollectError;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Borrowed entries in ascending key order.
pub type Entries<'a, K, V> = Box<dyn Iterator<Item = (&'a K, &'a V)> + 'a>;

/// A map whose keys are kept in ascending order.
pub trait SortedMap {
    type Key: Ord;
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;
    fn contains_key(&self, key: &Self::Key) -> bool;
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;
    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn first_key(&self) -> Option<&Self::Key>;
    fn last_key(&self) -> Option<&Self::Key>;

    /// Entries with keys strictly less than `to`.
    fn head_map(&self, to: &Self::Key) -> Entries<'_, Self::Key, Self::Value>;

    /// Entries with keys greater than or equal to `from`.
    fn tail_map(&self, from: &Self::Key) -> Entries<'_, Self::Key, Self::Value>;

    /// Entries with `from <= key < to`.
    fn sub_map(
        &self,
        from: &Self::Key,
        to: &Self::Key,
    ) -> Result<Entries<'_, Self::Key, Self::Value>, CollectError>;
}

impl<K: Ord, V> SortedMap for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    fn contains_key(&self, key: &K) -> bool {
        BTreeMap::contains_key(self, key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        BTreeMap::remove(self, key)
    }

    fn first_key(&self) -> Option<&K> {
        self.keys().next()
    }

    fn last_key(&self) -> Option<&K> {
        self.keys().next_back()
    }

    fn head_map(&self, to: &K) -> Entries<'_, K, V> {
        Box::new(self.range::<K, _>((Bound::Unbounded, Bound::Excluded(to))))
    }

    fn tail_map(&self, from: &K) -> Entries<'_, K, V> {
        Box::new(self.range::<K, _>((Bound::Included(from), Bound::Unbounded)))
    }

    fn sub_map(&self, from: &K, to: &K) -> Result<Entries<'_, K, V>, CollectError> {
        if from > to {
            return Err(CollectError::InvertedRange);
        }
        Ok(Box::new(self.range::<K, _>((
            Bound::Included(from),
            Bound::Excluded(to),
        ))))
    }
}
