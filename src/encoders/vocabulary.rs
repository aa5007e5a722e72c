//! Append-once vocabulary tables with reserved ids.
//!
//! A [`Vocabulary`] assigns dense integer ids to sample items, after a
//! fixed block of reserved ids (padding/unknown, close sentinels). Built
//! once at training-setup time and read-only afterwards; serialization
//! stores the item list and the index map is rebuilt on load, so snapshots
//! round-trip through any serde format.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashMap;
use std::hash::Hash;

/// A frozen id table: `reserved` leading ids, then one id per item in
/// first-seen sample order.
#[derive(Debug, Clone)]
pub struct Vocabulary<T: Eq + Hash + Clone> {
    reserved: usize,
    items: Vec<T>,
    index: HashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> Vocabulary<T> {
    /// Build a vocabulary from samples.
    ///
    /// Items are deduplicated preserving first-seen order; items occurring
    /// fewer than `min_occurrences` times across the samples are excluded.
    pub fn new(
        reserved: usize,
        samples: impl IntoIterator<Item = T>,
        min_occurrences: usize,
    ) -> Self {
        let mut counts: HashMap<T, usize> = HashMap::new();
        let mut order: Vec<T> = Vec::new();
        for sample in samples {
            let count = counts.entry(sample.clone()).or_insert(0);
            if *count == 0 {
                order.push(sample);
            }
            *count += 1;
        }
        let items: Vec<T> =
            order.into_iter().filter(|item| counts[item] >= min_occurrences).collect();
        Self::from_parts(reserved, items)
    }

    /// Rebuild a vocabulary from its persisted parts. `items` must already
    /// be deduplicated.
    #[must_use]
    pub fn from_parts(reserved: usize, items: Vec<T>) -> Self {
        let index =
            items.iter().enumerate().map(|(offset, item)| (item.clone(), offset)).collect();
        Self { reserved, items, index }
    }

    /// Id of `item`, or `None` when the item is out of vocabulary.
    #[must_use]
    pub fn id_of(&self, item: &T) -> Option<i64> {
        self.index.get(item).map(|offset| (self.reserved + offset) as i64)
    }

    /// Item at `id`; `None` for reserved or out-of-range ids.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&T> {
        let id = usize::try_from(id).ok()?;
        self.items.get(id.checked_sub(self.reserved)?)
    }

    /// Total table size, reserved ids included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reserved + self.items.len()
    }

    /// True iff the table has no ids at all (no reserved block, no items).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of leading reserved ids.
    #[must_use]
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// The non-reserved items, in id order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: Eq + Hash + Clone> PartialEq for Vocabulary<T> {
    fn eq(&self, other: &Self) -> bool {
        self.reserved == other.reserved && self.items == other.items
    }
}

impl<T: Eq + Hash + Clone> Eq for Vocabulary<T> {}

impl<T: Eq + Hash + Clone + Serialize> Serialize for Vocabulary<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Vocabulary", 2)?;
        state.serialize_field("reserved", &self.reserved)?;
        state.serialize_field("items", &self.items)?;
        state.end()
    }
}

impl<'de, T: Eq + Hash + Clone + Deserialize<'de>> Deserialize<'de> for Vocabulary<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Snapshot<T> {
            reserved: usize,
            items: Vec<T>,
        }
        let snapshot = Snapshot::<T>::deserialize(deserializer)?;
        Ok(Self::from_parts(snapshot.reserved, snapshot.items))
    }
}
