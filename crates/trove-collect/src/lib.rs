pub mod error;
pub mod forwarding;
pub mod sorted_map;

// `ForwardingSortedMap` stays behind its module path: its methods share
// names with `SortedMap`, and importing both makes method calls ambiguous.
pub use error::*;
pub use sorted_map::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Wrapped(BTreeMap<u8, u8>);

    impl forwarding::ForwardingSortedMap for Wrapped {
        type Delegate = BTreeMap<u8, u8>;

        fn delegate(&self) -> &Self::Delegate {
            &self.0
        }

        fn delegate_mut(&mut self) -> &mut Self::Delegate {
            &mut self.0
        }
    }

    #[test]
    fn glob_import_calls_forwarding_map_methods() {
        let mut map = Wrapped(BTreeMap::new());
        assert!(map.is_empty());
        map.insert(1, 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&2));
    }
}
