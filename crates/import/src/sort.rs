//! Stable dependency ordering for parent/child batches.

use std::collections::{HashMap, HashSet};

use crate::categorize::ChangedAsset;
use crate::record::AssetRecord;

/// Something with a key and an optional parent key.
pub trait DependencyNode {
    /// This node's key.
    fn key(&self) -> &str;

    /// The parent's key, if any.
    fn parent_key(&self) -> Option<&str>;
}

impl DependencyNode for AssetRecord {
    fn key(&self) -> &str {
        &self.external_id
    }

    fn parent_key(&self) -> Option<&str> {
        self.parent_external_id.as_deref()
    }
}

impl DependencyNode for ChangedAsset {
    fn key(&self) -> &str {
        self.record.key()
    }

    fn parent_key(&self) -> Option<&str> {
        self.record.parent_key()
    }
}

/// Orders `items` so every parent precedes its children in the batch.
///
/// Items are visited in input order; before an item is emitted, its
/// not-yet-emitted ancestors within the batch are emitted root first.
/// Unrelated items keep their relative order, and items whose parent is
/// outside the batch stay where they are. An ancestor chain that loops
/// back on itself is cut where it closes.
pub fn sort_by_dependency_order<T: DependencyNode>(items: Vec<T>) -> Vec<T> {
    let order = {
        let mut position: HashMap<&str, usize> = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            position.entry(item.key()).or_insert(i);
        }

        let mut emitted = vec![false; items.len()];
        let mut order = Vec::with_capacity(items.len());

        for start in 0..items.len() {
            if emitted[start] {
                continue;
            }

            let mut chain = vec![start];
            let mut on_chain = HashSet::from([start]);
            let mut cursor = start;
            while let Some(&parent) = items[cursor]
                .parent_key()
                .and_then(|key| position.get(key))
            {
                if emitted[parent] || !on_chain.insert(parent) {
                    break;
                }
                chain.push(parent);
                cursor = parent;
            }

            for &index in chain.iter().rev() {
                emitted[index] = true;
                order.push(index);
            }
        }

        order
    };

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use arbor_persistence::types::AssetFields;

    use super::*;

    fn record(id: &str, parent: Option<&str>) -> AssetRecord {
        let record = AssetRecord::new(id, AssetFields::named(id));
        match parent {
            Some(p) => record.with_parent(p),
            None => record,
        }
    }

    fn keys(items: &[AssetRecord]) -> Vec<&str> {
        items.iter().map(|r| r.external_id.as_str()).collect()
    }

    fn assert_parents_first(items: &[AssetRecord]) {
        let position: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(i, r)| (r.external_id.as_str(), i))
            .collect();
        for (i, item) in items.iter().enumerate() {
            if let Some(parent) = item.parent_key().and_then(|p| position.get(p)) {
                assert!(*parent < i, "{} placed before its parent", item.key());
            }
        }
    }

    #[test]
    fn test_children_before_parents_are_reordered() {
        let sorted = sort_by_dependency_order(vec![
            record("E1", Some("A1")),
            record("A1", Some("P1")),
            record("P1", None),
        ]);
        assert_eq!(keys(&sorted), vec!["P1", "A1", "E1"]);
    }

    #[test]
    fn test_unrelated_items_keep_input_order() {
        let sorted = sort_by_dependency_order(vec![
            record("X", None),
            record("E1", Some("A1")),
            record("Y", Some("EXISTING")),
            record("A1", None),
            record("Z", None),
        ]);
        assert_eq!(keys(&sorted), vec!["X", "A1", "E1", "Y", "Z"]);
    }

    #[test]
    fn test_already_sorted_is_unchanged() {
        let input = vec![
            record("P1", None),
            record("A1", Some("P1")),
            record("E1", Some("A1")),
            record("E2", Some("A1")),
        ];
        let sorted = sort_by_dependency_order(input.clone());
        assert_eq!(sorted, input);
    }

    #[test]
    fn test_shuffled_inputs_always_put_parents_first() {
        // Binary tree of 63 nodes, fed in several deterministic permutations
        let nodes: Vec<AssetRecord> = (1..64)
            .map(|i: usize| {
                let parent = (i > 1).then(|| format!("N{}", i / 2));
                record(&format!("N{i}"), parent.as_deref())
            })
            .collect();

        for stride in [1usize, 5, 11, 17, 31, 62] {
            let shuffled: Vec<AssetRecord> = (0..nodes.len())
                .map(|i| nodes[(i * stride) % nodes.len()].clone())
                .collect();
            let mut reversed = shuffled.clone();
            reversed.reverse();

            for input in [shuffled, reversed] {
                let sorted = sort_by_dependency_order(input);
                assert_eq!(sorted.len(), nodes.len());
                assert_parents_first(&sorted);
            }
        }
    }

    #[test]
    fn test_loop_does_not_hang() {
        let sorted = sort_by_dependency_order(vec![record("A", Some("B")), record("B", Some("A"))]);
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let depth = 100_000;
        let input: Vec<AssetRecord> = (0..depth)
            .rev()
            .map(|i| {
                let parent = (i > 0).then(|| format!("N{}", i - 1));
                record(&format!("N{i}"), parent.as_deref())
            })
            .collect();

        let sorted = sort_by_dependency_order(input);
        assert_eq!(sorted[0].external_id, "N0");
        assert_eq!(sorted[depth - 1].external_id, format!("N{}", depth - 1));
    }
}
