use std::collections::HashMap;

use serde::Serialize;

use crate::content::models::ContentItem;

/// Binding of one item instance to one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub slot_index: usize,
    /// Index into the plan's item list.
    pub item_index: usize,
}

/// Round-robin expansion of repeat counts: each sweep over the items in declared order
/// emits one assignment per item that still has repeats left.
///
/// `[3, 1, 2]` → A, B, C, A, C, A.
pub fn build_assignments(items: &[ContentItem]) -> Vec<Assignment> {
    let mut remaining: Vec<u32> = items.iter().map(ContentItem::repeat_count).collect();
    let target: usize = remaining.iter().map(|&n| n as usize).sum();
    let mut assignments = Vec::with_capacity(target);

    while assignments.len() < target {
        for (item_index, left) in remaining.iter_mut().enumerate() {
            if *left == 0 {
                continue;
            }
            *left -= 1;
            assignments.push(Assignment {
                slot_index: assignments.len(),
                item_index,
            });
        }
    }
    assignments
}

/// Per-run count of how many times each logical item has been assigned so far.
#[derive(Debug, Default)]
pub struct VariationCounter {
    seen: HashMap<String, u32>,
}

impl VariationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one more occurrence of `item` and returns its 1-based variation index.
    pub fn next(&mut self, item: &ContentItem) -> u32 {
        let count = self.seen.entry(item.identity_key()).or_insert(0);
        *count += 1;
        *count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::models::ProductSource;

    fn single(url: &str, repeat_count: u32) -> ContentItem {
        ContentItem::Single {
            source: ProductSource::Url { url: url.to_string() },
            product_name: None,
            repeat_count,
        }
    }

    #[test]
    fn test_round_robin_interleaves() {
        let items = vec![single("a", 3), single("b", 1), single("c", 2)];
        let order: Vec<usize> = build_assignments(&items).iter().map(|a| a.item_index).collect();
        assert_eq!(order, vec![0, 1, 2, 0, 2, 0]);
    }

    #[test]
    fn test_counts_match_repeat_counts() {
        let items = vec![single("a", 5), single("b", 2), single("c", 1), single("d", 4)];
        let assignments = build_assignments(&items);
        assert_eq!(assignments.len(), 12);
        for (i, item) in items.iter().enumerate() {
            let n = assignments.iter().filter(|a| a.item_index == i).count();
            assert_eq!(n as u32, item.repeat_count());
        }
        assert!(assignments.iter().enumerate().all(|(i, a)| a.slot_index == i));
    }

    #[test]
    fn test_empty_plan_has_no_assignments() {
        assert!(build_assignments(&[]).is_empty());
    }

    #[test]
    fn test_variation_index_counts_per_item() {
        let a = single("https://shop.example/a", 3);
        let b = single("https://shop.example/b", 1);
        let mut counter = VariationCounter::new();
        assert_eq!(counter.next(&a), 1);
        assert_eq!(counter.next(&b), 1);
        assert_eq!(counter.next(&a), 2);
        assert_eq!(counter.next(&a), 3);
    }

    #[test]
    fn test_same_source_declared_twice_shares_a_counter() {
        let first = single("https://shop.example/a", 1);
        let again = single("https://shop.example/a ", 2);
        let mut counter = VariationCounter::new();
        assert_eq!(counter.next(&first), 1);
        assert_eq!(counter.next(&again), 2);
    }
}
