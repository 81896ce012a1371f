use crate::error::CollectError;
use crate::sorted_map::{Entries, SortedMap};

type KeyOf<M> = <<M as ForwardingSortedMap>::Delegate as SortedMap>::Key;
type ValueOf<M> = <<M as ForwardingSortedMap>::Delegate as SortedMap>::Value;

/// A [`SortedMap`] decorator.
///
/// Implementors supply the delegate; every operation forwards to it unless
/// overridden. All implementors are `SortedMap`s themselves.
///
/// Implementors are normally used through the base trait. With both traits
/// in scope a call like `map.len()` is ambiguous; name the trait instead,
/// e.g. `SortedMap::len(&map)`.
pub trait ForwardingSortedMap {
    type Delegate: SortedMap;

    fn delegate(&self) -> &Self::Delegate;
    fn delegate_mut(&mut self) -> &mut Self::Delegate;

    fn len(&self) -> usize {
        self.delegate().len()
    }

    fn is_empty(&self) -> bool {
        self.delegate().is_empty()
    }

    fn get(&self, key: &KeyOf<Self>) -> Option<&ValueOf<Self>> {
        self.delegate().get(key)
    }

    fn contains_key(&self, key: &KeyOf<Self>) -> bool {
        self.delegate().contains_key(key)
    }

    fn insert(&mut self, key: KeyOf<Self>, value: ValueOf<Self>) -> Option<ValueOf<Self>> {
        self.delegate_mut().insert(key, value)
    }

    fn remove(&mut self, key: &KeyOf<Self>) -> Option<ValueOf<Self>> {
        self.delegate_mut().remove(key)
    }

    fn first_key(&self) -> Option<&KeyOf<Self>> {
        self.delegate().first_key()
    }

    fn last_key(&self) -> Option<&KeyOf<Self>> {
        self.delegate().last_key()
    }

    fn head_map(&self, to: &KeyOf<Self>) -> Entries<'_, KeyOf<Self>, ValueOf<Self>> {
        self.delegate().head_map(to)
    }

    fn tail_map(&self, from: &KeyOf<Self>) -> Entries<'_, KeyOf<Self>, ValueOf<Self>> {
        self.delegate().tail_map(from)
    }

    fn sub_map(
        &self,
        from: &KeyOf<Self>,
        to: &KeyOf<Self>,
    ) -> Result<Entries<'_, KeyOf<Self>, ValueOf<Self>>, CollectError> {
        self.delegate().sub_map(from, to)
    }
}

impl<M: ForwardingSortedMap> SortedMap for M {
    type Key = KeyOf<M>;
    type Value = ValueOf<M>;

    fn len(&self) -> usize {
        ForwardingSortedMap::len(self)
    }

    fn is_empty(&self) -> bool {
        ForwardingSortedMap::is_empty(self)
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value> {
        ForwardingSortedMap::get(self, key)
    }

    fn contains_key(&self, key: &Self::Key) -> bool {
        ForwardingSortedMap::contains_key(self, key)
    }

    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        ForwardingSortedMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &Self::Key) -> Option<Self::Value> {
        ForwardingSortedMap::remove(self, key)
    }

    fn first_key(&self) -> Option<&Self::Key> {
        ForwardingSortedMap::first_key(self)
    }

    fn last_key(&self) -> Option<&Self::Key> {
        ForwardingSortedMap::last_key(self)
    }

    fn head_map(&self, to: &Self::Key) -> Entries<'_, Self::Key, Self::Value> {
        ForwardingSortedMap::head_map(self, to)
    }

    fn tail_map(&self, from: &Self::Key) -> Entries<'_, Self::Key, Self::Value> {
        ForwardingSortedMap::tail_map(self, from)
    }

    fn sub_map(
        &self,
        from: &Self::Key,
        to: &Self::Key,
    ) -> Result<Entries<'_, Self::Key, Self::Value>, CollectError> {
        ForwardingSortedMap::sub_map(self, from, to)
    }
}
