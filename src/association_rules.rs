use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::database::Database;
use crate::error::{AprioriError, Result};
use crate::itemset::{FrequentItemset, Item, Itemset};
use crate::rule::{confidence, Rule, ScoredRule};

/// Exact supports known so far, keyed by itemset.
///
/// Seeded from the frequent levels; everything else is asked of the database
/// once and remembered.
struct SupportCache<I> {
    map: AHashMap<Itemset<I>, u64>,
}

impl<I: Item> SupportCache<I> {
    fn from_levels(levels: &[Vec<FrequentItemset<I>>]) -> Self {
        let map = levels
            .iter()
            .flatten()
            .filter_map(|f| f.support().exact().map(|n| (f.itemset().clone(), n)))
            .collect();
        SupportCache { map }
    }

    #[inline]
    fn peek(&self, itemset: &Itemset<I>) -> Option<u64> {
        self.map.get(itemset).copied()
    }

    /// Exact support of each of `itemsets`, querying the database for misses.
    fn supports_of<D>(&mut self, database: &D, itemsets: &[Itemset<I>]) -> Result<Vec<u64>>
    where
        D: Database<I> + ?Sized,
    {
        let mut seen: AHashSet<&Itemset<I>> = AHashSet::new();
        let missing: Vec<Itemset<I>> = itemsets
            .iter()
            .filter(|s| !self.map.contains_key(*s) && seen.insert(*s))
            .cloned()
            .collect();

        if !missing.is_empty() {
            let counts = database.compute_support(&missing)?;
            if counts.len() != missing.len() {
                return Err(AprioriError::SupportCountMismatch {
                    expected: missing.len(),
                    got: counts.len(),
                });
            }
            self.map.extend(missing.into_iter().zip(counts));
        }

        itemsets
            .iter()
            .map(|s| {
                self.peek(s)
                    .ok_or_else(|| AprioriError::database(format!("no support returned for {s:?}")))
            })
            .collect()
    }
}

/// Derive every association rule reaching `min_confidence` from frequent levels.
///
/// Level 0 holds one rule per item of each frequent itemset of size >= 2, with
/// that item as consequent. Level n+1 moves one antecedent item of a surviving
/// level-n rule into its consequent. Rules below `min_confidence` are dropped
/// at every level, and the search ends at the first level with no survivors.
/// The result lists levels in order.
pub fn derive_rules<I, D>(
    database: &D,
    levels: &[Vec<FrequentItemset<I>>],
    min_confidence: f64,
) -> Result<Vec<ScoredRule<I>>>
where
    I: Item,
    D: Database<I> + ?Sized,
{
    if min_confidence.is_nan() {
        return Err(AprioriError::invalid_parameter("min_confidence must not be NaN"));
    }
    let mut supports = SupportCache::from_levels(levels);
    let n_transactions = database.n_transactions();

    let seeds: Vec<Rule<I>> = levels
        .iter()
        .flatten()
        .filter(|f| f.len() >= 2)
        .flat_map(|f| Rule::simple_rules(f.itemset()))
        .collect();
    let n_seeds = seeds.len();
    let mut current =
        evaluate(database, &mut supports, seeds, min_confidence, n_transactions)?;
    debug!("rule level 0: {} candidates, {} kept", n_seeds, current.len());

    let mut rules = Vec::new();
    let mut depth = 0;
    while !current.is_empty() {
        depth += 1;
        let derived = derive_level(&current);
        let n_derived = derived.len();
        rules.append(&mut current);
        current = evaluate(database, &mut supports, derived, min_confidence, n_transactions)?;
        debug!("rule level {}: {} derived, {} kept", depth, n_derived, current.len());
    }

    Ok(rules)
}

/// Distinct children of every rule in `parents`, in parent order.
fn derive_level<I: Item>(parents: &[ScoredRule<I>]) -> Vec<Rule<I>> {
    let mut seen: AHashSet<Rule<I>> = AHashSet::new();
    parents
        .iter()
        .flat_map(|p| p.rule().derive())
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

fn evaluate<I, D>(
    database: &D,
    supports: &mut SupportCache<I>,
    candidates: Vec<Rule<I>>,
    min_confidence: f64,
    n_transactions: Option<u64>,
) -> Result<Vec<ScoredRule<I>>>
where
    I: Item,
    D: Database<I> + ?Sized,
{
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let mut queries = Vec::with_capacity(candidates.len() * 2);
    for rule in &candidates {
        queries.push(rule.antecedent().clone());
        queries.push(rule.itemset());
    }
    let counts = supports.supports_of(database, &queries)?;

    let kept = candidates
        .into_iter()
        .zip(counts.chunks_exact(2))
        .filter_map(|(rule, pair)| {
            let (s_a, s_ac) = (pair[0], pair[1]);
            if confidence(s_ac, s_a) < min_confidence {
                return None;
            }
            let s_c = supports.peek(rule.consequent());
            Some(ScoredRule::new(rule, s_a, s_ac, s_c, n_transactions))
        })
        .collect();
    Ok(kept)
}
