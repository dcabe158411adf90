use std::fmt;

use crate::error::{AprioriError, Result};
use crate::itemset::{Item, Itemset};

/// A candidate association rule `antecedent -> consequent`.
///
/// The two sides are disjoint and non-empty. A `Rule` has no confidence; the
/// rule engine turns survivors of the confidence filter into [`ScoredRule`]s.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rule<I> {
    antecedent: Itemset<I>,
    consequent: Itemset<I>,
}

impl<I: Item> Rule<I> {
    pub fn new(antecedent: Itemset<I>, consequent: Itemset<I>) -> Result<Self> {
        if antecedent.is_empty() || consequent.is_empty() {
            return Err(AprioriError::invalid_parameter(
                "rule sides must both be non-empty",
            ));
        }
        if !antecedent.is_disjoint(&consequent) {
            return Err(AprioriError::invalid_parameter(format!(
                "antecedent {antecedent:?} and consequent {consequent:?} overlap"
            )));
        }
        Ok(Rule { antecedent, consequent })
    }

    #[inline]
    pub fn antecedent(&self) -> &Itemset<I> {
        &self.antecedent
    }

    #[inline]
    pub fn consequent(&self) -> &Itemset<I> {
        &self.consequent
    }

    /// `antecedent ∪ consequent`, the itemset whose support is the rule's support.
    pub fn itemset(&self) -> Itemset<I> {
        self.antecedent.union(&self.consequent)
    }

    /// One rule per item of `itemset`, with that item alone as consequent.
    /// Itemsets of fewer than two items yield nothing.
    pub fn simple_rules(itemset: &Itemset<I>) -> Vec<Rule<I>> {
        if itemset.len() < 2 {
            return Vec::new();
        }
        itemset
            .iter()
            .map(|item| {
                let mut antecedent = itemset.clone();
                antecedent.remove(item);
                Rule { antecedent, consequent: Itemset::singleton(item.clone()) }
            })
            .collect()
    }

    /// Move each antecedent item, one at a time, into the consequent.
    ///
    /// A rule whose antecedent has a single item is terminal.
    pub fn derive(&self) -> Vec<Rule<I>> {
        if self.antecedent.len() < 2 {
            return Vec::new();
        }
        self.antecedent
            .iter()
            .map(|item| {
                let mut antecedent = self.antecedent.clone();
                let mut consequent = self.consequent.clone();
                antecedent.remove(item);
                consequent.insert(item.clone());
                Rule { antecedent, consequent }
            })
            .collect()
    }
}

impl<I: fmt::Debug> fmt::Debug for Rule<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.antecedent, self.consequent)
    }
}

/// A rule that passed the confidence filter, with the supports it was scored on.
#[derive(Clone, PartialEq)]
pub struct ScoredRule<I> {
    rule: Rule<I>,
    antecedent_support: u64,
    support: u64,
    consequent_support: Option<u64>,
    n_transactions: Option<u64>,
}

impl<I: Item> ScoredRule<I> {
    pub(crate) fn new(
        rule: Rule<I>,
        antecedent_support: u64,
        support: u64,
        consequent_support: Option<u64>,
        n_transactions: Option<u64>,
    ) -> Self {
        ScoredRule { rule, antecedent_support, support, consequent_support, n_transactions }
    }

    #[inline]
    pub fn rule(&self) -> &Rule<I> {
        &self.rule
    }

    #[inline]
    pub fn antecedent(&self) -> &Itemset<I> {
        self.rule.antecedent()
    }

    #[inline]
    pub fn consequent(&self) -> &Itemset<I> {
        self.rule.consequent()
    }

    /// Support of the antecedent alone.
    #[inline]
    pub fn antecedent_support(&self) -> u64 {
        self.antecedent_support
    }

    /// Support of `antecedent ∪ consequent`.
    #[inline]
    pub fn support(&self) -> u64 {
        self.support
    }

    #[inline]
    pub fn confidence(&self) -> f64 {
        confidence(self.support, self.antecedent_support)
    }

    /// `confidence / P(consequent)`; `None` unless both the consequent's
    /// support and the transaction count are known.
    pub fn lift(&self) -> Option<f64> {
        let (s_c, n) = (self.consequent_support?, self.n_transactions?);
        if s_c == 0 || n == 0 {
            return None;
        }
        Some(self.confidence() / (s_c as f64 / n as f64))
    }

    pub fn into_rule(self) -> Rule<I> {
        self.rule
    }
}

impl<I: fmt::Debug> fmt::Debug for ScoredRule<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} (support {}, confidence {:.3})",
            self.rule,
            self.support,
            confidence(self.support, self.antecedent_support)
        )
    }
}

/// `support(A ∪ C) / support(A)`; zero when the antecedent never occurs.
#[inline]
pub(crate) fn confidence(support: u64, antecedent_support: u64) -> f64 {
    if antecedent_support == 0 {
        0.0
    } else {
        support as f64 / antecedent_support as f64
    }
}
