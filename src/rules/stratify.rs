//! Stratification of the predicate dependency graph.
//!
//! Each strongly-connected component of the dependency graph becomes one
//! stratum; strata are ordered so that every component comes after all the
//! components it depends on. A negative edge inside a component means a
//! predicate depends negatively on itself and no stratified model exists.
//!
//! Components come out of Tarjan's algorithm in reverse topological order.
//! Nodes and successors are visited in symbol order, so the stratum order is
//! a pure function of the rule set.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::store::DependencyGraph;
use crate::core::Symbol;
use crate::error::RulesetError;

/// One stratum: a strongly-connected set of predicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratum {
    /// Predicates, sorted.
    pub predicates: Vec<Symbol>,
    /// True if some predicate of this stratum depends on the stratum itself
    /// (a cycle or a self-loop), so its fixpoint needs more than one round.
    pub recursive: bool,
}

/// A total order over predicate strata, dependencies first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strata {
    strata: Vec<Stratum>,
    index: FxHashMap<Symbol, usize>,
}

impl Strata {
    /// Strata in evaluation order.
    #[must_use]
    pub fn strata(&self) -> &[Stratum] {
        &self.strata
    }

    /// Number of strata.
    #[must_use]
    pub fn stratum_count(&self) -> usize {
        self.strata.len()
    }

    /// Stratum index of `predicate`, if it appears in the graph.
    #[must_use]
    pub fn stratum_of(&self, predicate: &str) -> Option<usize> {
        self.index.get(predicate).copied()
    }
}

/// Partition `graph` into strata.
///
/// Fails with [`RulesetError::Unstratifiable`] naming the predicates of the
/// first component (in evaluation order) that contains a negative edge.
pub fn stratify(graph: &DependencyGraph) -> Result<Strata, RulesetError> {
    let mut successors: FxHashMap<&Symbol, Vec<&Symbol>> = FxHashMap::default();
    for edge in graph.edges() {
        successors.entry(&edge.from).or_default().push(&edge.to);
    }
    for targets in successors.values_mut() {
        targets.sort();
        targets.dedup();
    }

    let mut tarjan = Tarjan {
        successors: &successors,
        next_index: 0,
        indices: FxHashMap::default(),
        lowlinks: FxHashMap::default(),
        on_stack: FxHashMap::default(),
        stack: Vec::new(),
        components: Vec::new(),
    };
    for node in graph.nodes() {
        if !tarjan.indices.contains_key(node) {
            tarjan.connect(node);
        }
    }

    // Tarjan emits dependents before their dependencies.
    let mut components = tarjan.components;
    components.reverse();

    let mut index = FxHashMap::default();
    for (i, component) in components.iter().enumerate() {
        for &predicate in component {
            index.insert(predicate.clone(), i);
        }
    }

    let mut recursive = vec![false; components.len()];
    let mut offending: Option<usize> = None;
    for edge in graph.edges() {
        let (from, to) = (index[edge.from.as_str()], index[edge.to.as_str()]);
        if from == to {
            recursive[from] = true;
            if edge.negative {
                offending = Some(offending.map_or(from, |o| o.min(from)));
            }
        }
    }
    if let Some(stratum) = offending {
        let mut predicates: Vec<Symbol> = components[stratum].iter().map(|&s| s.clone()).collect();
        predicates.sort();
        return Err(RulesetError::Unstratifiable { predicates });
    }

    let strata = components
        .into_iter()
        .zip(recursive)
        .map(|(component, recursive)| {
            let mut predicates: Vec<Symbol> = component.into_iter().cloned().collect();
            predicates.sort();
            Stratum {
                predicates,
                recursive,
            }
        })
        .collect();

    Ok(Strata { strata, index })
}

struct Tarjan<'g> {
    successors: &'g FxHashMap<&'g Symbol, Vec<&'g Symbol>>,
    next_index: usize,
    indices: FxHashMap<&'g Symbol, usize>,
    lowlinks: FxHashMap<&'g Symbol, usize>,
    on_stack: FxHashMap<&'g Symbol, bool>,
    stack: Vec<&'g Symbol>,
    components: Vec<Vec<&'g Symbol>>,
}

impl<'g> Tarjan<'g> {
    /// Visit everything reachable from `root`. Frames of (node, next
    /// successor) live on the heap; graph depth never touches the call stack.
    fn connect(&mut self, root: &'g Symbol) {
        let successors: &'g FxHashMap<&'g Symbol, Vec<&'g Symbol>> = self.successors;
        let mut work: Vec<(&'g Symbol, usize)> = vec![(root, 0)];
        self.enter(root);

        while let Some(frame) = work.last_mut() {
            let (node, cursor) = *frame;
            let children = successors.get(node).map_or(&[][..], Vec::as_slice);
            if let Some(&next) = children.get(cursor) {
                frame.1 += 1;
                if !self.indices.contains_key(next) {
                    self.enter(next);
                    work.push((next, 0));
                } else if self.on_stack.get(next).copied().unwrap_or(false) {
                    let low = self.indices[next].min(self.lowlinks[node]);
                    self.lowlinks.insert(node, low);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                let low = self.lowlinks[node].min(self.lowlinks[parent]);
                self.lowlinks.insert(parent, low);
            }
            if self.lowlinks[node] == self.indices[node] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.insert(member, false);
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                self.components.push(component);
            }
        }
    }

    fn enter(&mut self, node: &'g Symbol) {
        self.indices.insert(node, self.next_index);
        self.lowlinks.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Atom, Literal, Rule, Term};
    use crate::rules::store::RuleStore;

    fn v(name: &str) -> Term {
        Term::var(name)
    }

    fn rule(head: &str, body: Vec<Literal>) -> Rule {
        Rule::new(Atom::new(head, vec![v("X")]), body)
    }

    fn strata_for(rules: Vec<Rule>) -> Result<Strata, RulesetError> {
        let store = RuleStore::new(rules).unwrap();
        stratify(store.graph())
    }

    #[test]
    fn test_self_negation_rejected() {
        // p(X) :- q(X), not p(X).
        let err = strata_for(vec![rule(
            "p",
            vec![Literal::pos("q", vec![v("X")]), Literal::neg("p", vec![v("X")])],
        )])
        .unwrap_err();

        assert_eq!(
            err,
            RulesetError::Unstratifiable {
                predicates: vec![Symbol::new("p")]
            }
        );
    }

    #[test]
    fn test_negation_through_cycle_rejected() {
        // p :- not q. q :- p.
        let err = strata_for(vec![
            rule("p", vec![Literal::pos("base", vec![v("X")]), Literal::neg("q", vec![v("X")])]),
            rule("q", vec![Literal::pos("p", vec![v("X")])]),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            RulesetError::Unstratifiable {
                predicates: vec![Symbol::new("p"), Symbol::new("q")]
            }
        );
    }

    #[test]
    fn test_negation_on_earlier_predicate_accepted() {
        // q(X) :- base(X).  p(X) :- base(X), not q(X).
        let strata = strata_for(vec![
            rule("q", vec![Literal::pos("base", vec![v("X")])]),
            rule("p", vec![Literal::pos("base", vec![v("X")]), Literal::neg("q", vec![v("X")])]),
        ])
        .unwrap();

        let q = strata.stratum_of("q").unwrap();
        let p = strata.stratum_of("p").unwrap();
        let base = strata.stratum_of("base").unwrap();
        assert!(q < p);
        assert!(base < q);
    }

    #[test]
    fn test_positive_recursion_shares_stratum() {
        // path(X) :- edge(X).  path(X) :- path(X), hop(X).  reach(X) :- path(X).
        let strata = strata_for(vec![
            rule("path", vec![Literal::pos("edge", vec![v("X")])]),
            rule("path", vec![Literal::pos("path", vec![v("X")]), Literal::pos("hop", vec![v("X")])]),
            rule("reach", vec![Literal::pos("path", vec![v("X")])]),
        ])
        .unwrap();

        let path = strata.stratum_of("path").unwrap();
        assert!(strata.strata()[path].recursive);
        assert!(!strata.strata()[strata.stratum_of("reach").unwrap()].recursive);
        assert!(strata.stratum_of("edge").unwrap() < path);
        assert!(path < strata.stratum_of("reach").unwrap());
    }

    #[test]
    fn test_mutual_recursion_single_stratum() {
        let strata = strata_for(vec![
            rule("even", vec![Literal::pos("odd", vec![v("X")])]),
            rule("odd", vec![Literal::pos("even", vec![v("X")])]),
            rule("even", vec![Literal::pos("zero", vec![v("X")])]),
        ])
        .unwrap();

        assert_eq!(strata.stratum_of("even"), strata.stratum_of("odd"));
        let stratum = &strata.strata()[strata.stratum_of("even").unwrap()];
        assert_eq!(stratum.predicates, vec![Symbol::new("even"), Symbol::new("odd")]);
        assert!(stratum.recursive);
    }

    #[test]
    fn test_order_is_deterministic() {
        let rules = || {
            vec![
                rule("a", vec![Literal::pos("x", vec![v("X")])]),
                rule("b", vec![Literal::pos("y", vec![v("X")])]),
                rule("c", vec![Literal::pos("a", vec![v("X")]), Literal::neg("b", vec![v("X")])]),
            ]
        };
        let first = strata_for(rules()).unwrap();
        let second = strata_for(rules().into_iter().rev().collect()).unwrap();
        assert_eq!(first.strata(), second.strata());
    }

    #[test]
    fn test_long_chain_on_small_stack() {
        // p0(X) :- base(X).  p{i}(X) :- p{i-1}(X).
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut rules = vec![rule("p0", vec![Literal::pos("base", vec![v("X")])])];
                rules.extend((1..20_000).map(|i| {
                    rule(&format!("p{i}"), vec![Literal::pos(format!("p{}", i - 1), vec![v("X")])])
                }));
                strata_for(rules).unwrap()
            })
            .unwrap();
        let strata = handle.join().unwrap();

        assert_eq!(strata.stratum_count(), 20_001);
        assert_eq!(strata.stratum_of("base"), Some(0));
        assert_eq!(strata.stratum_of("p19999"), Some(20_000));
    }
}
