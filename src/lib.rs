//! Frequent itemsets and association rules with the level-wise Apriori search.
//!
//! ```
//! use apriori::{Apriori, TransactionDatabase};
//!
//! let db = TransactionDatabase::from_transactions(vec![
//!     vec!["a", "b", "c"],
//!     vec!["a", "b"],
//!     vec!["a", "c"],
//!     vec!["b", "c"],
//! ]);
//! let out = Apriori::new(&db).run(2, 0.5).unwrap();
//! assert_eq!(out.levels.len(), 2);
//! assert_eq!(out.rules.len(), 6);
//! ```

#[cfg(feature = "python")]
use mimalloc::MiMalloc;

#[cfg(feature = "python")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod apriori;
mod association_rules;
mod common;
mod database;
mod error;
mod itemset;
mod rule;

#[cfg(feature = "python")]
mod python;

pub use apriori::{Apriori, AprioriOutput, Level, MinerConfig, SupportStrategy};
pub use association_rules::derive_rules;
pub use common::{flatten_levels, flatten_results, flatten_rules, FlatRules};
pub use database::{Database, TransactionDatabase};
pub use error::{AprioriError, GenericError, Result};
pub use itemset::{FrequentItemset, Item, Itemset, Support};
pub use rule::{Rule, ScoredRule};
