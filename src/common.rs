use std::cmp::Ordering;

use crate::itemset::FrequentItemset;
use crate::rule::ScoredRule;

/// True when every element of sorted `needle` occurs in sorted `haystack`.
#[inline]
pub(crate) fn is_sorted_subset<T: Ord>(needle: &[T], haystack: &[T]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    let mut h = haystack.iter();
    'outer: for n in needle {
        for x in h.by_ref() {
            match x.cmp(n) {
                Ordering::Less => continue,
                Ordering::Equal => continue 'outer,
                Ordering::Greater => return false,
            }
        }
        return false;
    }
    true
}

/// Union of two sorted, duplicate-free slices.
pub(crate) fn merge_sorted<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Flatten `(support, items)` pairs into supports, CSR-style offsets and one
/// flat item buffer.
pub fn flatten_results(results: Vec<(u64, Vec<u32>)>) -> (Vec<u64>, Vec<u32>, Vec<u32>) {
    let mut supports = Vec::with_capacity(results.len());
    let mut offsets = Vec::with_capacity(results.len() + 1);

    let total_items: usize = results.iter().map(|(_, items)| items.len()).sum();
    let mut all_items = Vec::with_capacity(total_items);

    offsets.push(0);
    for (support, mut items) in results {
        supports.push(support);
        all_items.append(&mut items);
        offsets.push(all_items.len() as u32);
    }

    (supports, offsets, all_items)
}

/// Flatten frequent levels of `u32` items in level order, see [`flatten_results`].
pub fn flatten_levels(levels: &[Vec<FrequentItemset<u32>>]) -> (Vec<u64>, Vec<u32>, Vec<u32>) {
    flatten_results(
        levels
            .iter()
            .flatten()
            .map(|f| (f.count(), f.items().to_vec()))
            .collect(),
    )
}

/// Rules as antecedent offsets/items, consequent offsets/items and confidences.
pub type FlatRules = (Vec<u32>, Vec<u32>, Vec<u32>, Vec<u32>, Vec<f64>);

pub fn flatten_rules(rules: &[ScoredRule<u32>]) -> FlatRules {
    let mut ant_offsets = Vec::with_capacity(rules.len() + 1);
    let mut con_offsets = Vec::with_capacity(rules.len() + 1);
    let mut ant_items = Vec::new();
    let mut con_items = Vec::new();
    let mut confidences = Vec::with_capacity(rules.len());

    ant_offsets.push(0);
    con_offsets.push(0);
    for rule in rules {
        ant_items.extend_from_slice(rule.antecedent().items());
        con_items.extend_from_slice(rule.consequent().items());
        ant_offsets.push(ant_items.len() as u32);
        con_offsets.push(con_items.len() as u32);
        confidences.push(rule.confidence());
    }

    (ant_offsets, ant_items, con_offsets, con_items, confidences)
}
