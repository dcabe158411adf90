use rayon::prelude::*;

use crate::common::is_sorted_subset;
use crate::error::{AprioriError, Result};
use crate::itemset::{FrequentItemset, Item, Itemset, Support};

const PAR_CANDIDATES_CUTOFF: usize = 64;

/// The transaction store the miner and the rule engine query for supports.
///
/// Implementations own every support count; the search never counts anything
/// itself. Queries may be issued from several threads at once.
pub trait Database<I: Item>: Sync {
    /// Every item that occurs in at least one transaction.
    fn distinct_items(&self) -> Result<Vec<I>>;

    /// Keep the candidates whose support reaches `min_support`, in input order,
    /// with support attached.
    ///
    /// When `exact` is false an implementation may stop counting once the
    /// threshold is reached and report [`Support::AtLeast`].
    fn filter_by_min_support(
        &self,
        candidates: Vec<Itemset<I>>,
        min_support: u64,
        exact: bool,
    ) -> Result<Vec<FrequentItemset<I>>>;

    /// Overwrite the support of every itemset with its exact count.
    fn recompute_support_exact(&self, itemsets: &mut [FrequentItemset<I>]) -> Result<()>;

    /// Exact support of each itemset, positionally.
    fn compute_support(&self, itemsets: &[Itemset<I>]) -> Result<Vec<u64>>;

    /// Number of transactions, when the store knows it.
    fn n_transactions(&self) -> Option<u64> {
        None
    }
}

/// In-memory horizontal transaction store.
///
/// Each transaction is kept sorted and duplicate-free, so an item repeated in
/// one basket is counted once.
#[derive(Debug, Clone)]
pub struct TransactionDatabase<I> {
    transactions: Vec<Vec<I>>,
}

impl<I: Item> TransactionDatabase<I> {
    pub fn from_transactions<T, R>(transactions: T) -> Self
    where
        T: IntoIterator<Item = R>,
        R: IntoIterator<Item = I>,
    {
        let transactions = transactions
            .into_iter()
            .map(|row| {
                let mut items: Vec<I> = row.into_iter().collect();
                items.sort_unstable();
                items.dedup();
                items
            })
            .collect();
        TransactionDatabase { transactions }
    }

    /// Number of transactions, empty ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Vec<I>] {
        &self.transactions
    }

    /// Count transactions containing `items`. With `limit`, stop as soon as the
    /// count reaches it.
    fn count(&self, items: &[I], limit: Option<u64>) -> Support {
        if limit == Some(0) {
            return Support::AtLeast(0);
        }
        let mut n = 0u64;
        for row in &self.transactions {
            if is_sorted_subset(items, row) {
                n += 1;
                if limit.is_some_and(|l| n >= l) {
                    return Support::AtLeast(n);
                }
            }
        }
        Support::Exact(n)
    }

    fn count_all(&self, itemsets: &[Itemset<I>]) -> Vec<u64> {
        if itemsets.len() >= PAR_CANDIDATES_CUTOFF {
            itemsets
                .par_iter()
                .map(|s| self.count(s.items(), None).count())
                .collect()
        } else {
            itemsets.iter().map(|s| self.count(s.items(), None).count()).collect()
        }
    }
}

impl TransactionDatabase<u32> {
    /// Build from a CSR matrix: row `r` holds `indices[indptr[r]..indptr[r + 1]]`.
    /// Negative column indices are skipped.
    pub fn from_csr(indptr: &[i32], indices: &[i32]) -> Result<Self> {
        if indptr.is_empty() {
            return Err(AprioriError::invalid_parameter("indptr must not be empty"));
        }
        let mut rows = Vec::with_capacity(indptr.len() - 1);
        for w in indptr.windows(2) {
            let (start, end) = (w[0], w[1]);
            if start < 0 || end < start || end as usize > indices.len() {
                return Err(AprioriError::invalid_parameter(format!(
                    "invalid indptr range {start}..{end} for {} indices",
                    indices.len()
                )));
            }
            rows.push(
                indices[start as usize..end as usize]
                    .iter()
                    .filter(|&&c| c >= 0)
                    .map(|&c| c as u32)
                    .collect::<Vec<u32>>(),
            );
        }
        Ok(Self::from_transactions(rows))
    }

    /// Build from a row-major dense 0/1 matrix of shape `(n_rows, n_cols)`.
    ///
    /// A matrix with rows but no columns holds `n_rows` empty transactions.
    pub fn from_dense(flat: &[u8], n_rows: usize, n_cols: usize) -> Result<Self> {
        let expected = n_rows.checked_mul(n_cols).ok_or_else(|| {
            AprioriError::invalid_parameter(format!("shape ({n_rows}, {n_cols}) overflows"))
        })?;
        if flat.len() != expected {
            return Err(AprioriError::invalid_parameter(format!(
                "{} cells do not match shape ({n_rows}, {n_cols})",
                flat.len()
            )));
        }
        if n_cols == 0 {
            return Ok(Self::from_transactions(vec![Vec::<u32>::new(); n_rows]));
        }
        let rows = flat.chunks(n_cols).map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, &v)| v != 0)
                .map(|(col, _)| col as u32)
                .collect::<Vec<u32>>()
        });
        Ok(Self::from_transactions(rows))
    }
}

impl<I: Item> Database<I> for TransactionDatabase<I> {
    fn distinct_items(&self) -> Result<Vec<I>> {
        let mut items: Vec<I> = self.transactions.iter().flatten().cloned().collect();
        items.sort_unstable();
        items.dedup();
        Ok(items)
    }

    fn filter_by_min_support(
        &self,
        candidates: Vec<Itemset<I>>,
        min_support: u64,
        exact: bool,
    ) -> Result<Vec<FrequentItemset<I>>> {
        let limit = if exact { None } else { Some(min_support) };
        let keep = |itemset: Itemset<I>| {
            let support = self.count(itemset.items(), limit);
            (support.count() >= min_support).then(|| FrequentItemset::new(itemset, support))
        };
        let frequent: Vec<FrequentItemset<I>> = if candidates.len() >= PAR_CANDIDATES_CUTOFF {
            candidates.into_par_iter().filter_map(keep).collect()
        } else {
            candidates.into_iter().filter_map(keep).collect()
        };
        Ok(frequent)
    }

    fn recompute_support_exact(&self, itemsets: &mut [FrequentItemset<I>]) -> Result<()> {
        let refresh = |f: &mut FrequentItemset<I>| {
            let n = self.count(f.items(), None).count();
            f.refresh_support(n);
        };
        if itemsets.len() >= PAR_CANDIDATES_CUTOFF {
            itemsets.par_iter_mut().for_each(refresh);
        } else {
            itemsets.iter_mut().for_each(refresh);
        }
        Ok(())
    }

    fn compute_support(&self, itemsets: &[Itemset<I>]) -> Result<Vec<u64>> {
        Ok(self.count_all(itemsets))
    }

    fn n_transactions(&self) -> Option<u64> {
        Some(self.transactions.len() as u64)
    }
}
