//! Scenario tests for the miner and the rule engine against instrumented stores.

use std::sync::Mutex;

use apriori::{
    derive_rules, Apriori, AprioriError, Database, FrequentItemset, Itemset, MinerConfig,
    Result, Support, SupportStrategy, TransactionDatabase,
};

/// Wraps a `TransactionDatabase` and records every query it answers.
struct RecordingDatabase {
    inner: TransactionDatabase<char>,
    filtered: Mutex<Vec<Vec<Itemset<char>>>>,
    refreshed: Mutex<usize>,
    computed: Mutex<Vec<Itemset<char>>>,
}

impl RecordingDatabase {
    fn new(rows: Vec<Vec<char>>) -> Self {
        RecordingDatabase {
            inner: TransactionDatabase::from_transactions(rows),
            filtered: Mutex::new(Vec::new()),
            refreshed: Mutex::new(0),
            computed: Mutex::new(Vec::new()),
        }
    }
}

impl Database<char> for RecordingDatabase {
    fn distinct_items(&self) -> Result<Vec<char>> {
        self.inner.distinct_items()
    }

    fn filter_by_min_support(
        &self,
        candidates: Vec<Itemset<char>>,
        min_support: u64,
        exact: bool,
    ) -> Result<Vec<FrequentItemset<char>>> {
        self.filtered.lock().unwrap().push(candidates.clone());
        self.inner.filter_by_min_support(candidates, min_support, exact)
    }

    fn recompute_support_exact(&self, itemsets: &mut [FrequentItemset<char>]) -> Result<()> {
        *self.refreshed.lock().unwrap() += 1;
        self.inner.recompute_support_exact(itemsets)
    }

    fn compute_support(&self, itemsets: &[Itemset<char>]) -> Result<Vec<u64>> {
        self.computed.lock().unwrap().extend_from_slice(itemsets);
        self.inner.compute_support(itemsets)
    }
}

/// Answers mining queries, but fails or misbehaves on support queries.
struct BrokenSupport {
    inner: TransactionDatabase<char>,
    short: bool,
}

impl Database<char> for BrokenSupport {
    fn distinct_items(&self) -> Result<Vec<char>> {
        self.inner.distinct_items()
    }

    fn filter_by_min_support(
        &self,
        candidates: Vec<Itemset<char>>,
        min_support: u64,
        exact: bool,
    ) -> Result<Vec<FrequentItemset<char>>> {
        self.inner.filter_by_min_support(candidates, min_support, exact)
    }

    fn recompute_support_exact(&self, _itemsets: &mut [FrequentItemset<char>]) -> Result<()> {
        Err(AprioriError::database("store offline"))
    }

    fn compute_support(&self, itemsets: &[Itemset<char>]) -> Result<Vec<u64>> {
        if self.short {
            Ok(vec![0; itemsets.len().saturating_sub(1)])
        } else {
            Err(AprioriError::database("store offline"))
        }
    }
}

/// Reports one of its items twice from `distinct_items`.
struct RepeatingItems {
    inner: TransactionDatabase<char>,
    repeated: char,
}

impl Database<char> for RepeatingItems {
    fn distinct_items(&self) -> Result<Vec<char>> {
        let mut items = self.inner.distinct_items()?;
        items.push(self.repeated);
        Ok(items)
    }

    fn filter_by_min_support(
        &self,
        candidates: Vec<Itemset<char>>,
        min_support: u64,
        exact: bool,
    ) -> Result<Vec<FrequentItemset<char>>> {
        self.inner.filter_by_min_support(candidates, min_support, exact)
    }

    fn recompute_support_exact(&self, itemsets: &mut [FrequentItemset<char>]) -> Result<()> {
        self.inner.recompute_support_exact(itemsets)
    }

    fn compute_support(&self, itemsets: &[Itemset<char>]) -> Result<Vec<u64>> {
        self.inner.compute_support(itemsets)
    }
}

fn set(items: &[char]) -> Itemset<char> {
    items.iter().copied().collect()
}

fn abc_rows() -> Vec<Vec<char>> {
    vec![vec!['a', 'b', 'c'], vec!['a', 'b'], vec!['a', 'c'], vec!['b', 'c']]
}

#[test]
fn abc_levels_and_rules() {
    let db = TransactionDatabase::from_transactions(abc_rows());
    let out = Apriori::new(&db).run(2, 0.5).unwrap();

    let level_sizes: Vec<usize> = out.levels.iter().map(Vec::len).collect();
    assert_eq!(level_sizes, vec![3, 3]);
    for f in &out.levels[0] {
        assert_eq!(f.support(), Support::Exact(3));
    }
    for f in &out.levels[1] {
        assert_eq!(f.support(), Support::Exact(2));
    }

    let a_b = out
        .rules
        .iter()
        .find(|r| r.antecedent() == &set(&['a']) && r.consequent() == &set(&['b']))
        .unwrap();
    assert!((a_b.confidence() - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn pruned_candidates_never_reach_the_database() {
    // ab and ac are frequent, bc is not: abc joins from ab+ac but must be pruned
    let db = RecordingDatabase::new(vec![
        vec!['a', 'b', 'c'],
        vec!['a', 'b'],
        vec!['a', 'b'],
        vec!['a', 'c'],
        vec!['a', 'c'],
    ]);
    let levels = Apriori::new(&db).mine(2).unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(
        levels[1].iter().map(|f| f.itemset().clone()).collect::<Vec<_>>(),
        vec![set(&['a', 'b']), set(&['a', 'c'])]
    );

    let filtered = db.filtered.lock().unwrap();
    assert!(filtered.iter().flatten().all(|c| c != &set(&['a', 'b', 'c'])));
    assert!(filtered.last().unwrap().is_empty());
}

#[test]
fn refine_pass_runs_once_per_level_only_when_configured() {
    let db = RecordingDatabase::new(abc_rows());
    let levels = Apriori::new(&db).mine(2).unwrap();
    assert_eq!(*db.refreshed.lock().unwrap(), levels.len());

    for strategy in [SupportStrategy::AlwaysExact, SupportStrategy::NeverRefine] {
        let db = RecordingDatabase::new(abc_rows());
        let config = MinerConfig::default().with_strategy(strategy);
        Apriori::with_config(&db, config).mine(2).unwrap();
        assert_eq!(*db.refreshed.lock().unwrap(), 0);
    }
}

#[test]
fn rules_reuse_exact_supports_from_levels() {
    let db = RecordingDatabase::new(abc_rows());
    let levels = Apriori::new(&db).mine(1).unwrap();
    derive_rules(&db, &levels, 0.0).unwrap();
    // every antecedent and every rule itemset is itself frequent here
    assert!(db.computed.lock().unwrap().is_empty());
}

#[test]
fn rules_query_the_database_for_lower_bounds() {
    let db = RecordingDatabase::new(abc_rows());
    let config = MinerConfig::default().with_strategy(SupportStrategy::NeverRefine);
    let levels = Apriori::with_config(&db, config).mine(2).unwrap();
    let rules = derive_rules(&db, &levels, 0.5).unwrap();
    assert_eq!(rules.len(), 6);

    let computed = db.computed.lock().unwrap();
    let mut distinct = computed.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), computed.len());
    assert!(computed.contains(&set(&['a', 'b'])));
}

#[test]
fn trait_objects_are_accepted() {
    let db = TransactionDatabase::from_transactions(abc_rows());
    let dyn_db: &dyn Database<char> = &db;
    let levels = Apriori::new(dyn_db).mine(2).unwrap();
    let rules = derive_rules(dyn_db, &levels, 0.9).unwrap();
    assert_eq!(levels.len(), 2);
    assert!(rules.is_empty());
}

#[test]
fn database_failures_abort_the_run() {
    let db = BrokenSupport { inner: TransactionDatabase::from_transactions(abc_rows()), short: false };
    assert!(matches!(Apriori::new(&db).mine(2), Err(AprioriError::Database(_))));

    let config = MinerConfig::default().with_strategy(SupportStrategy::NeverRefine);
    let levels = Apriori::with_config(&db, config).mine(2).unwrap();
    assert!(matches!(derive_rules(&db, &levels, 0.5), Err(AprioriError::Database(_))));
}

#[test]
fn short_support_answers_are_reported() {
    let db = BrokenSupport { inner: TransactionDatabase::from_transactions(abc_rows()), short: true };
    let config = MinerConfig::default().with_strategy(SupportStrategy::NeverRefine);
    let levels = Apriori::with_config(&db, config).mine(2).unwrap();
    assert!(matches!(
        derive_rules(&db, &levels, 0.5),
        Err(AprioriError::SupportCountMismatch { .. })
    ));
}

#[test]
fn duplicate_items_do_not_inflate_support() {
    let db = TransactionDatabase::from_transactions(vec![
        vec!['a', 'a', 'b'],
        vec!['b', 'b'],
    ]);
    let levels = Apriori::new(&db).mine(2).unwrap();
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0].len(), 1);
    assert_eq!(levels[0][0].itemset(), &set(&['b']));
    assert_eq!(levels[0][0].count(), 2);
}

#[test]
fn empty_transactions_count_but_add_no_items() {
    let db = TransactionDatabase::from_transactions(vec![vec![], vec!['x'], vec![]]);
    let out = Apriori::new(&db).run(1, 0.0).unwrap();
    assert_eq!(out.levels.len(), 1);
    assert!(out.rules.is_empty());
    assert_eq!(db.len(), 3);
    assert_eq!(db.n_transactions(), Some(3));
}

#[test]
fn repeated_distinct_items_yield_one_singleton() {
    let db = RepeatingItems { inner: TransactionDatabase::from_transactions(abc_rows()), repeated: 'a' };
    let out = Apriori::new(&db).run(2, 0.5).unwrap();
    assert_eq!(
        out.levels[0].iter().map(|f| f.itemset().clone()).collect::<Vec<_>>(),
        vec![set(&['a']), set(&['b']), set(&['c'])]
    );
    assert!(out.levels[0].iter().all(|f| f.support() == Support::Exact(3)));
    assert_eq!(out.levels[1].len(), 3);
    assert_eq!(out.rules.len(), 6);

    // lower bounds from the search are replaced by exact counts for the boundary rule
    let config = MinerConfig::default().with_strategy(SupportStrategy::NeverRefine);
    let levels = Apriori::with_config(&db, config).mine(1).unwrap();
    assert_eq!(levels[0].len(), 3);
    let rules = derive_rules(&db, &levels, 0.5).unwrap();
    let ab_c = rules
        .iter()
        .find(|r| r.antecedent() == &set(&['a', 'b']) && r.consequent() == &set(&['c']))
        .unwrap();
    assert_eq!(ab_c.confidence(), 0.5);
}
