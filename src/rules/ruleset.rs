//! A loaded rule set: validated store, strata and compiled evaluator.

use std::collections::BTreeSet;

use log::info;

use super::evaluator::Evaluator;
use super::store::RuleStore;
use super::stratify::{stratify, Strata};
use crate::core::{Atom, Rule};
use crate::error::RulesetError;

/// Everything computed once per game description.
///
/// Immutable after [`load`](Self::load); share it behind an `Arc` to
/// evaluate from several threads.
#[derive(Clone, Debug)]
pub struct Ruleset {
    store: RuleStore,
    strata: Strata,
    evaluator: Evaluator,
}

impl Ruleset {
    /// Validate, stratify and compile a rule set.
    ///
    /// ```
    /// use rust_ggp::core::{Atom, Literal, Rule, Term};
    /// use rust_ggp::rules::Ruleset;
    ///
    /// // p(X) :- q(X), not p(X).
    /// let rules = vec![Rule::new(
    ///     Atom::new("p", vec![Term::var("X")]),
    ///     vec![
    ///         Literal::pos("q", vec![Term::var("X")]),
    ///         Literal::neg("p", vec![Term::var("X")]),
    ///     ],
    /// )];
    /// assert!(Ruleset::load(rules).is_err());
    /// ```
    pub fn load(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RulesetError> {
        let store = RuleStore::new(rules)?;
        let strata = stratify(store.graph())?;
        let evaluator = Evaluator::new(&store, &strata);
        info!(
            "Loaded rule set: {} rules, {} predicates, {} strata",
            store.len(),
            store.graph().node_count(),
            strata.stratum_count()
        );
        Ok(Self {
            store,
            strata,
            evaluator,
        })
    }

    /// The validated rules.
    #[must_use]
    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// The stratum order.
    #[must_use]
    pub fn strata(&self) -> &Strata {
        &self.strata
    }

    /// The compiled evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Shorthand for `self.evaluator().evaluate(input, targets)`.
    pub fn evaluate<I>(&self, input: I, targets: &[&str]) -> BTreeSet<Atom>
    where
        I: IntoIterator<Item = Atom>,
    {
        self.evaluator.evaluate(input, targets)
    }
}
