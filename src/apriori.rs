//! Level-wise Apriori search over a [`Database`].
//!
//! Level k+1 is built from level k only: prefix-join every pair of frequent
//! k-itemsets, drop candidates with an infrequent k-subset, then let the
//! database filter the survivors by support. The search stops at the first
//! empty level.
use ahash::AHashSet;
use log::{debug, trace};
use rayon::prelude::*;

use crate::association_rules::derive_rules;
use crate::database::Database;
use crate::error::{AprioriError, Result};
use crate::itemset::{FrequentItemset, Item, Itemset};
use crate::rule::ScoredRule;

const PAR_ITEMS_CUTOFF: usize = 4;

/// One level of the search: frequent itemsets of a single size, sorted by items.
pub type Level<I> = Vec<FrequentItemset<I>>;

/// How supports are counted while the levels are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupportStrategy {
    /// Count only up to the threshold during the search, then recount every
    /// retained itemset exactly once the search is over.
    #[default]
    PartialThenRefine,
    /// Count exactly during the search.
    AlwaysExact,
    /// Count only up to the threshold and keep the lower bounds.
    NeverRefine,
}

impl std::str::FromStr for SupportStrategy {
    type Err = AprioriError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "partial_then_refine" => Ok(SupportStrategy::PartialThenRefine),
            "exact" | "always_exact" => Ok(SupportStrategy::AlwaysExact),
            "never_refine" => Ok(SupportStrategy::NeverRefine),
            other => Err(AprioriError::invalid_parameter(format!(
                "Unknown support strategy: '{other}'"
            ))),
        }
    }
}

impl SupportStrategy {
    #[inline]
    fn exact_filter(self) -> bool {
        matches!(self, SupportStrategy::AlwaysExact)
    }

    #[inline]
    fn refines(self) -> bool {
        matches!(self, SupportStrategy::PartialThenRefine)
    }
}

/// Configuration for the miner.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    pub strategy: SupportStrategy,
    /// Largest itemset size to generate; `None` for no bound.
    pub max_len: Option<usize>,
    /// Level size from which candidate joins run on the rayon pool.
    pub parallel_cutoff: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            strategy: SupportStrategy::default(),
            max_len: None,
            parallel_cutoff: PAR_ITEMS_CUTOFF,
        }
    }
}

impl MinerConfig {
    pub fn with_strategy(mut self, strategy: SupportStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_parallel_cutoff(mut self, cutoff: usize) -> Self {
        self.parallel_cutoff = cutoff;
        self
    }
}

/// Frequent levels and the rules derived from them.
#[derive(Debug, Clone)]
pub struct AprioriOutput<I> {
    pub levels: Vec<Level<I>>,
    pub rules: Vec<ScoredRule<I>>,
}

/// Level-wise miner over a borrowed [`Database`].
///
/// The store answers every support query; the miner only generates and prunes
/// candidates. `D` may be a trait object such as `dyn Database<I>`.
pub struct Apriori<'a, D: ?Sized> {
    database: &'a D,
    config: MinerConfig,
}

impl<'a, D: ?Sized> Apriori<'a, D> {
    pub fn new(database: &'a D) -> Self {
        Self { database, config: MinerConfig::default() }
    }

    pub fn with_config(database: &'a D, config: MinerConfig) -> Self {
        Self { database, config }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Mine every frequent itemset with support of at least `min_support`.
    ///
    /// `levels[k - 1]` holds the frequent k-itemsets. Empty levels are never
    /// returned.
    pub fn mine<I: Item>(&self, min_support: u64) -> Result<Vec<Level<I>>>
    where
        D: Database<I>,
    {
        let mut levels: Vec<Level<I>> = Vec::new();
        if self.config.max_len == Some(0) {
            return Ok(levels);
        }
        let exact = self.config.strategy.exact_filter();

        let mut items = self.database.distinct_items()?;
        items.sort_unstable();
        items.dedup();
        let singletons: Vec<Itemset<I>> = items.into_iter().map(Itemset::singleton).collect();
        let n_items = singletons.len();
        let mut current = self.database.filter_by_min_support(singletons, min_support, exact)?;
        sort_level(&mut current);
        debug!("level 1: {} distinct items, {} frequent", n_items, current.len());

        while !current.is_empty() {
            let k = levels.len() + 1;
            levels.push(current);
            if self.config.max_len.is_some_and(|ml| k >= ml) {
                debug!("reached max_len {k}, stopping");
                break;
            }
            current = self.next_level(&levels[k - 1], min_support, exact)?;
        }

        if self.config.strategy.refines() {
            for level in levels.iter_mut() {
                self.database.recompute_support_exact(level)?;
            }
            debug!("recounted exact support for {} levels", levels.len());
        }

        Ok(levels)
    }

    /// Derive association rules with confidence of at least `min_confidence`
    /// from levels produced by [`Apriori::mine`].
    pub fn derive_rules<I: Item>(
        &self,
        levels: &[Level<I>],
        min_confidence: f64,
    ) -> Result<Vec<ScoredRule<I>>>
    where
        D: Database<I>,
    {
        derive_rules(self.database, levels, min_confidence)
    }

    /// Mine, then derive rules from the result.
    pub fn run<I: Item>(&self, min_support: u64, min_confidence: f64) -> Result<AprioriOutput<I>>
    where
        D: Database<I>,
    {
        let levels = self.mine(min_support)?;
        let rules = self.derive_rules(&levels, min_confidence)?;
        Ok(AprioriOutput { levels, rules })
    }

    fn next_level<I: Item>(
        &self,
        level: &[FrequentItemset<I>],
        min_support: u64,
        exact: bool,
    ) -> Result<Level<I>>
    where
        D: Database<I>,
    {
        let k = level.first().map_or(0, |f| f.len());
        let joined = self.join_candidates(level);
        let n_joined = joined.len();

        let frequent: AHashSet<&Itemset<I>> = level.iter().map(|f| f.itemset()).collect();
        let candidates: Vec<Itemset<I>> = joined
            .into_iter()
            .filter(|c| {
                let keep = c.subsets().iter().all(|s| frequent.contains(s));
                if !keep {
                    trace!("pruned {c:?}: infrequent subset");
                }
                keep
            })
            .collect();
        let n_candidates = candidates.len();

        let mut next = self.database.filter_by_min_support(candidates, min_support, exact)?;
        sort_level(&mut next);
        debug!(
            "level {}: {} joined, {} pruned, {} frequent",
            k + 1,
            n_joined,
            n_joined - n_candidates,
            next.len()
        );
        Ok(next)
    }

    /// Every distinct (k+1)-itemset obtained by prefix-joining two members of
    /// a sorted level.
    fn join_candidates<I: Item>(&self, level: &[FrequentItemset<I>]) -> Vec<Itemset<I>> {
        // Sorted order keeps itemsets sharing a (k-1)-prefix contiguous.
        let join_row = |i: usize| -> Vec<Itemset<I>> {
            let a = level[i].itemset();
            let prefix = &a.items()[..a.len().saturating_sub(1)];
            level[i + 1..]
                .iter()
                .take_while(|b| b.items().starts_with(prefix))
                .filter_map(|b| a.join(b.itemset()))
                .collect()
        };

        let joined: Vec<Itemset<I>> = if level.len() >= self.config.parallel_cutoff {
            (0..level.len()).into_par_iter().flat_map_iter(join_row).collect()
        } else {
            (0..level.len()).flat_map(join_row).collect()
        };

        let mut seen = AHashSet::with_capacity(joined.len());
        joined.into_iter().filter(|c| seen.insert(c.clone())).collect()
    }
}

fn sort_level<I: Item>(level: &mut [FrequentItemset<I>]) {
    level.sort_unstable_by(|a, b| a.itemset().cmp(b.itemset()));
}
