//! The wire store: evaluated bit per wire, owned by the orchestrator.

use boolcirc_core::WireId;

#[derive(Debug)]
pub struct WireStore<T> {
    values: Vec<Option<T>>,
    filled: usize,
}

impl<T: Clone> WireStore<T> {
    pub fn new(len: usize) -> Self {
        WireStore {
            values: vec![None; len],
            filled: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of wires holding a value.
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn get(&self, wire: WireId) -> Option<&T> {
        self.values.get(wire.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, wire: WireId) -> bool {
        self.get(wire).is_some()
    }

    /// Stores `value` for `wire`. Returns false, leaving the store unchanged,
    /// if the wire is out of range or already holds a value.
    pub fn insert(&mut self, wire: WireId, value: T) -> bool {
        match self.values.get_mut(wire.index()) {
            Some(slot @ None) => {
                *slot = Some(value);
                self.filled += 1;
                true
            }
            _ => false,
        }
    }

    /// Clones the values of `wires`, or `None` if any is missing.
    pub fn collect(&self, wires: &[WireId]) -> Option<Vec<T>> {
        wires.iter().map(|w| self.get(*w).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_write_once() {
        let mut store = WireStore::new(3);
        assert!(store.insert(WireId(1), true));
        assert!(!store.insert(WireId(1), false));
        assert!(!store.insert(WireId(7), false));
        assert_eq!(store.get(WireId(1)), Some(&true));
        assert_eq!(store.filled(), 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn collect_requires_every_operand() {
        let mut store = WireStore::new(2);
        store.insert(WireId(0), 5u8);
        assert_eq!(store.collect(&[WireId(0), WireId(0)]), Some(vec![5, 5]));
        assert_eq!(store.collect(&[WireId(0), WireId(1)]), None);
    }
}
