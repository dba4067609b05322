//! Semi-naive bottom-up evaluation.
//!
//! ## Compilation
//!
//! Each rule is compiled once into a plan: positive body literals become
//! joins in their written order, and every negated literal or `distinct`
//! test is scheduled right after the first join that binds all of its
//! variables. Filters therefore only ever see ground terms.
//!
//! ## Evaluation
//!
//! Per call, only the strata the requested targets (transitively) depend on
//! are evaluated. The fact store is seeded with the caller's extensional
//! facts and the rule set's ground facts, then strata run in order. A
//! non-recursive stratum needs one pass. A recursive stratum runs a naive
//! first round, then semi-naive rounds in which, for every body position
//! over a predicate of the stratum, that position reads only the facts new
//! in the previous round while all other positions read the full store.
//! A stratum is done when a round derives nothing new.
//!
//! Negation is closed-world: `not p(t)` holds when the ground instance is
//! absent from the store. Stratification guarantees `p` is complete by then.

use std::collections::BTreeSet;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use super::store::RuleStore;
use super::stratify::Strata;
use crate::core::literal::match_atom;
use crate::core::{substitute, Atom, Binding, Literal, Rule, Symbol, Term};

/// Ground facts grouped by predicate, with O(1) membership.
#[derive(Clone, Debug, Default)]
pub struct FactStore {
    relations: FxHashMap<Symbol, Relation>,
}

#[derive(Clone, Debug, Default)]
struct Relation {
    facts: Vec<Atom>,
    seen: FxHashSet<Atom>,
}

impl FactStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ground fact. Returns `false` if it was already present.
    pub fn insert(&mut self, fact: Atom) -> bool {
        let relation = self.relations.entry(fact.predicate.clone()).or_default();
        if relation.seen.contains(&fact) {
            return false;
        }
        relation.seen.insert(fact.clone());
        relation.facts.push(fact);
        true
    }

    /// True if `fact` is present.
    #[must_use]
    pub fn contains(&self, fact: &Atom) -> bool {
        self.relations
            .get(fact.predicate.as_str())
            .is_some_and(|r| r.seen.contains(fact))
    }

    /// Facts of `predicate`, in insertion order.
    #[must_use]
    pub fn facts(&self, predicate: &str) -> &[Atom] {
        match self.relations.get(predicate) {
            Some(relation) => &relation.facts,
            None => &[],
        }
    }

    /// Total number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.values().map(|r| r.facts.len()).sum()
    }

    /// True if no fact is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<Atom> for FactStore {
    fn extend<I: IntoIterator<Item = Atom>>(&mut self, iter: I) {
        for fact in iter {
            self.insert(fact);
        }
    }
}

type Delta = FxHashMap<Symbol, Vec<Atom>>;

#[derive(Clone, Debug)]
enum Step {
    /// Bind variables against every fact of the atom's predicate.
    Join(Atom),
    /// Ground instance must be absent.
    Absent(Atom),
    /// `distinct` (`equal == false`) or `not distinct` (`equal == true`).
    Compare { left: Term, right: Term, equal: bool },
}

/// A compiled rule.
#[derive(Clone, Debug)]
struct Plan {
    head: Atom,
    steps: Vec<Step>,
}

impl Plan {
    fn compile(rule: &Rule) -> Self {
        let mut steps = Vec::with_capacity(rule.body.len());
        let mut bound: FxHashSet<&Symbol> = FxHashSet::default();
        let mut pending: Vec<&Literal> = rule
            .body
            .iter()
            .filter(|l| l.is_negative() || l.is_distinct())
            .collect();

        flush(&mut pending, &bound, &mut steps);
        for literal in rule.body.iter().filter(|l| !l.is_negative() && !l.is_distinct()) {
            steps.push(Step::Join(literal.atom.clone()));
            bound.extend(literal.atom.variables());
            flush(&mut pending, &bound, &mut steps);
        }
        // Unreachable for validated stores; kept so a plan never drops a literal.
        steps.extend(pending.into_iter().map(filter_step));

        Self {
            head: rule.head.atom.clone(),
            steps,
        }
    }

    /// Run the body from step `depth` under `binding`, pushing every derived
    /// head onto `out`. When `delta_at` names a join step, that step reads
    /// from `delta` instead of the full store.
    fn fire(
        &self,
        depth: usize,
        binding: &Binding,
        delta_at: Option<usize>,
        store: &FactStore,
        delta: &Delta,
        out: &mut Vec<Atom>,
    ) {
        let Some(step) = self.steps.get(depth) else {
            out.push(self.head.substitute(binding));
            return;
        };
        match step {
            Step::Join(atom) => {
                let source: &[Atom] = if delta_at == Some(depth) {
                    match delta.get(atom.predicate.as_str()) {
                        Some(facts) => facts,
                        None => &[],
                    }
                } else {
                    store.facts(atom.predicate.as_str())
                };
                for fact in source {
                    if let Some(extended) = match_atom(atom, fact, binding) {
                        self.fire(depth + 1, &extended, delta_at, store, delta, out);
                    }
                }
            }
            Step::Absent(atom) => {
                if !store.contains(&atom.substitute(binding)) {
                    self.fire(depth + 1, binding, delta_at, store, delta, out);
                }
            }
            Step::Compare { left, right, equal } => {
                let same = substitute(left, binding) == substitute(right, binding);
                if same == *equal {
                    self.fire(depth + 1, binding, delta_at, store, delta, out);
                }
            }
        }
    }

    fn join_positions(&self) -> impl Iterator<Item = (usize, &Symbol)> {
        self.steps.iter().enumerate().filter_map(|(i, step)| match step {
            Step::Join(atom) => Some((i, &atom.predicate)),
            _ => None,
        })
    }
}

/// Move every pending filter whose variables are all bound into `steps`.
fn flush<'r>(pending: &mut Vec<&'r Literal>, bound: &FxHashSet<&Symbol>, steps: &mut Vec<Step>) {
    pending.retain(|literal| {
        let ready = literal.atom.variables().iter().all(|v| bound.contains(v));
        if ready {
            steps.push(filter_step(literal));
        }
        !ready
    });
}

fn filter_step(literal: &Literal) -> Step {
    if literal.is_distinct() {
        Step::Compare {
            left: literal.atom.args[0].clone(),
            right: literal.atom.args[1].clone(),
            equal: literal.is_negative(),
        }
    } else {
        Step::Absent(literal.atom.clone())
    }
}

#[derive(Clone, Debug)]
struct ComponentPlan {
    predicates: Vec<Symbol>,
    recursive: bool,
    plans: Vec<Plan>,
}

/// Compiled evaluator for one rule set.
///
/// Immutable after construction and `Sync`, so one evaluator may serve many
/// threads evaluating independent states.
#[derive(Clone, Debug)]
pub struct Evaluator {
    components: Vec<ComponentPlan>,
    facts: FxHashMap<Symbol, Vec<Atom>>,
    sources: FxHashMap<Symbol, Vec<Symbol>>,
}

impl Evaluator {
    /// Compile every rule of `store` into per-stratum plans.
    ///
    /// `strata` must come from stratifying `store`'s own dependency graph.
    #[must_use]
    pub fn new(store: &RuleStore, strata: &Strata) -> Self {
        let mut components: Vec<ComponentPlan> = strata
            .strata()
            .iter()
            .map(|stratum| ComponentPlan {
                predicates: stratum.predicates.clone(),
                recursive: stratum.recursive,
                plans: Vec::new(),
            })
            .collect();
        let mut facts: FxHashMap<Symbol, Vec<Atom>> = FxHashMap::default();

        for rule in store.rules() {
            if rule.is_fact() {
                facts
                    .entry(rule.head_predicate().clone())
                    .or_default()
                    .push(rule.head.atom.clone());
            } else if let Some(stratum) = strata.stratum_of(rule.head_predicate().as_str()) {
                components[stratum].plans.push(Plan::compile(rule));
            }
        }

        let mut sources: FxHashMap<Symbol, Vec<Symbol>> = FxHashMap::default();
        for edge in store.graph().edges() {
            sources.entry(edge.to.clone()).or_default().push(edge.from.clone());
        }

        Self {
            components,
            facts,
            sources,
        }
    }

    /// Derive every fact of the `targets` predicates that follows from the
    /// rule set plus `input` (the `true/1` and `does/2` facts of one step).
    ///
    /// The result is the perfect model restricted to `targets`, so it does
    /// not depend on rule order.
    pub fn evaluate<I>(&self, input: I, targets: &[&str]) -> BTreeSet<Atom>
    where
        I: IntoIterator<Item = Atom>,
    {
        let relevant = self.relevant(targets);
        let mut store = FactStore::new();
        store.extend(input);
        for predicate in &relevant {
            if let Some(facts) = self.facts.get(predicate.as_str()) {
                store.extend(facts.iter().cloned());
            }
        }

        let mut evaluated = 0;
        for component in &self.components {
            if component.plans.is_empty() || !component.predicates.iter().any(|p| relevant.contains(p)) {
                continue;
            }
            self.saturate(component, &mut store);
            evaluated += 1;
        }

        debug!(
            "Evaluated {} of {} strata for {:?}: {} facts",
            evaluated,
            self.components.len(),
            targets,
            store.len()
        );

        targets
            .iter()
            .flat_map(|target| store.facts(target).iter().cloned())
            .collect()
    }

    /// Predicates `targets` depend on, including the targets themselves.
    fn relevant(&self, targets: &[&str]) -> FxHashSet<Symbol> {
        let mut relevant: FxHashSet<Symbol> = FxHashSet::default();
        let mut frontier: Vec<Symbol> = targets.iter().map(Symbol::new).collect();
        while let Some(predicate) = frontier.pop() {
            if let Some(sources) = self.sources.get(predicate.as_str()) {
                frontier.extend(sources.iter().filter(|s| !relevant.contains(*s)).cloned());
            }
            relevant.insert(predicate);
        }
        relevant
    }

    fn saturate(&self, component: &ComponentPlan, store: &mut FactStore) {
        let empty = Delta::default();
        let mut derived = Vec::new();
        for plan in &component.plans {
            plan.fire(0, &Binding::new(), None, store, &empty, &mut derived);
        }
        let mut delta = absorb(store, derived);
        trace!("Stratum {:?} round 0: {} new facts", component.predicates, delta_size(&delta));

        if !component.recursive {
            return;
        }

        let mut round = 1;
        while !delta.is_empty() {
            let mut derived = Vec::new();
            for plan in &component.plans {
                for (position, predicate) in plan.join_positions() {
                    if delta.contains_key(predicate.as_str()) {
                        plan.fire(0, &Binding::new(), Some(position), store, &delta, &mut derived);
                    }
                }
            }
            delta = absorb(store, derived);
            trace!(
                "Stratum {:?} round {}: {} new facts",
                component.predicates,
                round,
                delta_size(&delta)
            );
            round += 1;
        }
        debug!("Fixpoint for {:?} reached after {} rounds", component.predicates, round);
    }
}

/// Insert derived facts, returning those that were new, by predicate.
fn absorb(store: &mut FactStore, derived: Vec<Atom>) -> Delta {
    let mut delta = Delta::default();
    for fact in derived {
        if store.insert(fact.clone()) {
            delta.entry(fact.predicate.clone()).or_default().push(fact);
        }
    }
    delta
}

fn delta_size(delta: &Delta) -> usize {
    delta.values().map(Vec::len).sum()
}

/// One-shot evaluation: compile `store` and evaluate `input` for `targets`.
///
/// Callers evaluating repeatedly should build an [`Evaluator`] once.
pub fn evaluate<I>(store: &RuleStore, strata: &Strata, input: I, targets: &[&str]) -> BTreeSet<Atom>
where
    I: IntoIterator<Item = Atom>,
{
    Evaluator::new(store, strata).evaluate(input, targets)
}
