//! Grow-and-refine — the policy that caps the knowledge set.
//!
//! Items are ranked by a total order:
//!
//! 1. `effectiveness * priority`, highest first
//! 2. `updated_at`, most recent first
//! 3. position in the set, earliest first
//!
//! When the set holds more than `threshold` items, the top
//! `min(threshold, max(floor, len / 2))` survive and keep their relative
//! order; the rest are discarded. A set at or under the threshold is left
//! untouched, so running refine twice is the same as running it once.

use std::cmp::Ordering;

use ace_core::KnowledgeItem;
use serde::{Deserialize, Serialize};

/// What a refine pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefineReport {
    pub before: usize,
    pub after: usize,
    /// Discarded ids, in their former set order.
    pub removed_ids: Vec<String>,
}

impl RefineReport {
    pub fn is_noop(&self) -> bool {
        self.removed_ids.is_empty()
    }
}

/// Compare two items (with their set positions) by refine rank.
/// `Ordering::Less` means `a` ranks higher.
pub fn compare_rank(a: (usize, &KnowledgeItem), b: (usize, &KnowledgeItem)) -> Ordering {
    let (ia, a) = a;
    let (ib, b) = b;
    b.score()
        .total_cmp(&a.score())
        .then_with(|| b.updated_at().cmp(&a.updated_at()))
        .then_with(|| ia.cmp(&ib))
}

/// Set positions of `items`, best first.
pub fn rank(items: &[KnowledgeItem]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| compare_rank((a, &items[a]), (b, &items[b])));
    order
}

/// How many items survive a refine of `len` items.
pub fn retain_count(len: usize, threshold: usize, floor: usize) -> usize {
    if len <= threshold {
        return len;
    }
    threshold.min(floor.max(len / 2))
}

/// Prune `items` in place. Returns the report; survivors keep set order.
pub fn refine_items(items: &mut Vec<KnowledgeItem>, threshold: usize, floor: usize) -> RefineReport {
    let before = items.len();
    let keep_count = retain_count(before, threshold, floor);
    if keep_count == before {
        return RefineReport {
            before,
            after: before,
            removed_ids: Vec::new(),
        };
    }

    let mut keep = vec![false; before];
    for &i in rank(items).iter().take(keep_count) {
        keep[i] = true;
    }

    let mut removed_ids = Vec::with_capacity(before - keep_count);
    let mut position = 0;
    items.retain(|item| {
        let kept = keep[position];
        position += 1;
        if !kept {
            removed_ids.push(item.id().to_string());
        }
        kept
    });

    RefineReport {
        before,
        after: items.len(),
        removed_ids,
    }
}
