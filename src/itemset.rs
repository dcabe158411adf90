use std::fmt;
use std::hash::{Hash, Hasher};

use crate::common::{is_sorted_subset, merge_sorted};

/// Anything usable as a transaction item.
pub trait Item: Clone + Eq + Ord + Hash + fmt::Debug + Send + Sync {}

impl<T: Clone + Eq + Ord + Hash + fmt::Debug + Send + Sync> Item for T {}

/// A set of unique items, kept sorted so equality and hashing are by content.
///
/// An `Itemset` carries no support. Support only exists on a
/// [`FrequentItemset`], which a [`Database`](crate::Database) hands back once
/// the count is known.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Itemset<I> {
    items: Vec<I>,
}

impl<I: Item> Default for Itemset<I> {
    fn default() -> Self {
        Itemset { items: Vec::new() }
    }
}

impl<I: Item> Itemset<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(item: I) -> Self {
        Itemset { items: vec![item] }
    }

    /// Build from any items; duplicates collapse.
    pub fn from_items<T: IntoIterator<Item = I>>(items: T) -> Self {
        let mut items: Vec<I> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Itemset { items }
    }

    /// Insert `item`, returning `false` when it was already present.
    pub fn insert(&mut self, item: I) -> bool {
        match self.items.binary_search(&item) {
            Ok(_) => false,
            Err(pos) => {
                self.items.insert(pos, item);
                true
            }
        }
    }

    /// Remove `item`, returning `false` when it was absent.
    pub fn remove(&mut self, item: &I) -> bool {
        match self.items.binary_search(item) {
            Ok(pos) => {
                self.items.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    #[inline]
    pub fn contains(&self, item: &I) -> bool {
        self.items.binary_search(item).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in ascending order.
    #[inline]
    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, I> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<I> {
        self.items
    }

    pub fn union(&self, other: &Itemset<I>) -> Itemset<I> {
        Itemset { items: merge_sorted(&self.items, &other.items) }
    }

    pub fn is_subset_of(&self, other: &Itemset<I>) -> bool {
        is_sorted_subset(&self.items, &other.items)
    }

    pub fn is_disjoint(&self, other: &Itemset<I>) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            match self.items[i].cmp(&other.items[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return false,
            }
        }
        true
    }

    /// Every subset with exactly one item fewer, in item order of the dropped item.
    pub fn subsets(&self) -> Vec<Itemset<I>> {
        (0..self.items.len())
            .map(|skip| {
                let mut items = Vec::with_capacity(self.items.len() - 1);
                items.extend_from_slice(&self.items[..skip]);
                items.extend_from_slice(&self.items[skip + 1..]);
                Itemset { items }
            })
            .collect()
    }

    /// Prefix join of two k-itemsets into a (k+1)-itemset.
    ///
    /// Succeeds only when both have the same size k >= 1, agree on their first
    /// k-1 items, and differ in the last one.
    pub fn join(&self, other: &Itemset<I>) -> Option<Itemset<I>> {
        let k = self.items.len();
        if k == 0 || other.items.len() != k {
            return None;
        }
        if self.items[..k - 1] != other.items[..k - 1] {
            return None;
        }
        let (a, b) = (&self.items[k - 1], &other.items[k - 1]);
        if a == b {
            return None;
        }
        let mut items = Vec::with_capacity(k + 1);
        items.extend_from_slice(&self.items[..k - 1]);
        if a < b {
            items.push(a.clone());
            items.push(b.clone());
        } else {
            items.push(b.clone());
            items.push(a.clone());
        }
        Some(Itemset { items })
    }
}

impl<I: Item> FromIterator<I> for Itemset<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Itemset::from_items(iter)
    }
}

impl<I: Item> From<Vec<I>> for Itemset<I> {
    fn from(items: Vec<I>) -> Self {
        Itemset::from_items(items)
    }
}

impl<'a, I> IntoIterator for &'a Itemset<I> {
    type Item = &'a I;
    type IntoIter = std::slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<I: fmt::Debug> fmt::Debug for Itemset<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

/// A support count as returned by a [`Database`](crate::Database).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// The number of transactions containing the itemset.
    Exact(u64),
    /// A lower bound: counting stopped once the threshold was reached.
    AtLeast(u64),
}

impl Support {
    /// The recorded count; a lower bound for `AtLeast`.
    #[inline]
    pub fn count(self) -> u64 {
        match self {
            Support::Exact(n) | Support::AtLeast(n) => n,
        }
    }

    #[inline]
    pub fn is_exact(self) -> bool {
        matches!(self, Support::Exact(_))
    }

    #[inline]
    pub fn exact(self) -> Option<u64> {
        match self {
            Support::Exact(n) => Some(n),
            Support::AtLeast(_) => None,
        }
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Exact(n) => write!(f, "{n}"),
            Support::AtLeast(n) => write!(f, ">={n}"),
        }
    }
}

/// An itemset that passed a min-support filter, with its support attached.
///
/// Equality and hashing look at the items only.
#[derive(Clone)]
pub struct FrequentItemset<I> {
    itemset: Itemset<I>,
    support: Support,
}

impl<I: Item> FrequentItemset<I> {
    pub fn new(itemset: Itemset<I>, support: Support) -> Self {
        FrequentItemset { itemset, support }
    }

    pub fn exact(itemset: Itemset<I>, count: u64) -> Self {
        Self::new(itemset, Support::Exact(count))
    }

    #[inline]
    pub fn itemset(&self) -> &Itemset<I> {
        &self.itemset
    }

    #[inline]
    pub fn items(&self) -> &[I] {
        self.itemset.items()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.itemset.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.itemset.is_empty()
    }

    #[inline]
    pub fn support(&self) -> Support {
        self.support
    }

    /// Shorthand for `support().count()`.
    #[inline]
    pub fn count(&self) -> u64 {
        self.support.count()
    }

    /// Replace the support with an exact count.
    pub fn refresh_support(&mut self, count: u64) {
        self.support = Support::Exact(count);
    }

    pub fn into_itemset(self) -> Itemset<I> {
        self.itemset
    }
}

impl<I: Item> PartialEq for FrequentItemset<I> {
    fn eq(&self, other: &Self) -> bool {
        self.itemset == other.itemset
    }
}

impl<I: Item> Eq for FrequentItemset<I> {}

impl<I: Item> Hash for FrequentItemset<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.itemset.hash(state);
    }
}

impl<I: fmt::Debug> fmt::Debug for FrequentItemset<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.itemset, self.support)
    }
}
