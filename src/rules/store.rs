//! Rule storage and the predicate dependency graph.
//!
//! A [`RuleStore`] is validated once at construction and immutable
//! afterwards. Its [`DependencyGraph`] is a flat edge list over predicate
//! symbols; recursion in the rule set is a cycle in that list, never a cycle
//! of owned objects.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{reserved, Literal, Rule, Symbol};
use crate::error::MalformedRuleset;

/// A body-predicate → head-predicate dependency.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: Symbol,
    pub to: Symbol,
    /// The body literal is negated.
    pub negative: bool,
}

/// Predicate dependency graph.
///
/// Nodes are every predicate named by any rule (heads and body literals),
/// except the `distinct/2` builtin, which is a test rather than a relation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: BTreeSet<Symbol>,
    edges: BTreeSet<Edge>,
}

impl DependencyGraph {
    /// Build the graph for a set of rules.
    #[must_use]
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        let mut graph = Self::default();
        for rule in rules {
            let head = rule.head_predicate();
            graph.nodes.insert(head.clone());
            for literal in rule.body.iter().filter(|l| !l.is_distinct()) {
                graph.nodes.insert(literal.predicate().clone());
                graph.edges.insert(Edge {
                    from: literal.predicate().clone(),
                    to: head.clone(),
                    negative: literal.is_negative(),
                });
            }
        }
        graph
    }

    /// Predicates in symbol order.
    pub fn nodes(&self) -> impl Iterator<Item = &Symbol> {
        self.nodes.iter()
    }

    /// Edges, sorted by (from, to, polarity). A pair used both positively
    /// and negatively contributes two edges.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Number of predicates.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// The validated rules of one game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleStore {
    rules: Vec<Rule>,
    by_head: FxHashMap<Symbol, Vec<usize>>,
    arities: FxHashMap<Symbol, usize>,
    graph: DependencyGraph,
}

impl RuleStore {
    /// Validate and store a rule set.
    ///
    /// Rejects negated heads, `true`/`does`/`distinct` heads, inconsistent
    /// arities (including against the reserved predicates), non-ground facts
    /// and unsafe variables.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, MalformedRuleset> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let mut arities: FxHashMap<Symbol, usize> = reserved::ARITIES
            .iter()
            .map(|(name, arity)| (Symbol::new(name), *arity))
            .collect();
        let mut by_head: FxHashMap<Symbol, Vec<usize>> = FxHashMap::default();

        for (index, rule) in rules.iter().enumerate() {
            check_head(rule)?;
            check_arity(&mut arities, &rule.head, rule)?;
            for literal in &rule.body {
                check_arity(&mut arities, literal, rule)?;
            }
            if rule.is_fact() {
                if !rule.head.atom.is_ground() {
                    return Err(MalformedRuleset::NonGroundFact {
                        rule: rule.to_string(),
                    });
                }
            } else {
                check_safety(rule)?;
            }
            by_head.entry(rule.head_predicate().clone()).or_default().push(index);
        }

        let graph = DependencyGraph::from_rules(&rules);
        Ok(Self {
            rules,
            by_head,
            arities,
            graph,
        })
    }

    /// All rules, in load order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the store holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose head is `predicate`, in load order.
    pub fn rules_for<'a>(&'a self, predicate: &str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.by_head
            .get(predicate)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rules[i])
    }

    /// True if at least one rule or fact defines `predicate`.
    #[must_use]
    pub fn defines(&self, predicate: &str) -> bool {
        self.by_head.contains_key(predicate)
    }

    /// Arity of `predicate`, if it is reserved or used by any rule.
    #[must_use]
    pub fn arity(&self, predicate: &str) -> Option<usize> {
        self.arities.get(predicate).copied()
    }

    /// The predicate dependency graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

fn check_head(rule: &Rule) -> Result<(), MalformedRuleset> {
    if rule.head.is_negative() {
        return Err(MalformedRuleset::NegatedHead {
            rule: rule.to_string(),
        });
    }
    let predicate = rule.head_predicate();
    if reserved::is_extensional(predicate.as_str()) || rule.head.is_distinct() {
        return Err(MalformedRuleset::ExtensionalHead {
            predicate: predicate.clone(),
            rule: rule.to_string(),
        });
    }
    Ok(())
}

fn check_arity(
    arities: &mut FxHashMap<Symbol, usize>,
    literal: &Literal,
    rule: &Rule,
) -> Result<(), MalformedRuleset> {
    let found = literal.atom.arity();
    let expected = *arities.entry(literal.predicate().clone()).or_insert(found);
    if expected != found {
        return Err(MalformedRuleset::ArityMismatch {
            predicate: literal.predicate().clone(),
            expected,
            found,
            rule: rule.to_string(),
        });
    }
    Ok(())
}

/// Every variable in the head, in a negated literal or in `distinct` must be
/// bound by some positive relational body literal.
fn check_safety(rule: &Rule) -> Result<(), MalformedRuleset> {
    let mut bound: BTreeSet<&Symbol> = BTreeSet::new();
    for literal in &rule.body {
        if !literal.is_negative() && !literal.is_distinct() {
            bound.extend(literal.atom.variables());
        }
    }

    let restricted = rule
        .body
        .iter()
        .filter(|l| l.is_negative() || l.is_distinct())
        .chain(std::iter::once(&rule.head));
    for literal in restricted {
        if let Some(variable) = literal.atom.variables().into_iter().find(|v| !bound.contains(v)) {
            return Err(MalformedRuleset::UnsafeVariable {
                variable: variable.clone(),
                rule: rule.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Atom, Term};

    fn v(name: &str) -> Term {
        Term::var(name)
    }

    fn c(name: &str) -> Term {
        Term::constant(name)
    }

    #[test]
    fn test_store_partitions_by_head() {
        let store = RuleStore::new(vec![
            Rule::fact(Atom::new("role", vec![c("first")])),
            Rule::fact(Atom::new("role", vec![c("second")])),
            Rule::new(
                Atom::new("legal", vec![v("R"), c("noop")]),
                vec![Literal::pos("role", vec![v("R")])],
            ),
        ])
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.rules_for("role").count(), 2);
        assert_eq!(store.rules_for("legal").count(), 1);
        assert_eq!(store.rules_for("next").count(), 0);
        assert!(store.defines("legal"));
        assert!(!store.defines("terminal"));
        assert_eq!(store.arity("legal"), Some(2));
    }

    #[test]
    fn test_negated_head_rejected() {
        let rule = Rule {
            head: Literal::neg("p", vec![c("a")]),
            body: vec![],
        };
        let err = RuleStore::new(vec![rule]).unwrap_err();
        assert!(matches!(err, MalformedRuleset::NegatedHead { .. }));
    }

    #[test]
    fn test_extensional_head_rejected() {
        let heads = [
            Atom::new("true", vec![c("a")]),
            Atom::new("does", vec![c("r"), c("m")]),
            Atom::new("distinct", vec![c("a"), c("b")]),
        ];
        for head in heads {
            let expected = head.predicate.clone();
            let err = RuleStore::new(vec![Rule::fact(head)]).unwrap_err();
            match err {
                MalformedRuleset::ExtensionalHead { predicate, .. } => assert_eq!(predicate, expected),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_arity_mismatch_between_heads() {
        let err = RuleStore::new(vec![
            Rule::fact(Atom::new("cell", vec![c("1"), c("1")])),
            Rule::fact(Atom::new("cell", vec![c("1")])),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            MalformedRuleset::ArityMismatch {
                predicate: Symbol::new("cell"),
                expected: 2,
                found: 1,
                rule: "cell(1).".into(),
            }
        );
    }

    #[test]
    fn test_arity_mismatch_against_reserved() {
        let err = RuleStore::new(vec![Rule::fact(Atom::new("legal", vec![c("first")]))]).unwrap_err();
        assert!(matches!(err, MalformedRuleset::ArityMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_non_ground_fact_rejected() {
        let err = RuleStore::new(vec![Rule::fact(Atom::new("p", vec![v("X")]))]).unwrap_err();
        assert!(matches!(err, MalformedRuleset::NonGroundFact { .. }));
    }

    #[test]
    fn test_unsafe_variables_rejected() {
        let head_only = Rule::new(Atom::new("p", vec![v("X")]), vec![Literal::pos("q", vec![c("a")])]);
        let negated_only = Rule::new(
            Atom::new("p", vec![v("X")]),
            vec![Literal::pos("q", vec![v("X")]), Literal::neg("r", vec![v("Y")])],
        );
        let distinct_only = Rule::new(
            Atom::new("p", vec![v("X")]),
            vec![Literal::pos("q", vec![v("X")]), Literal::distinct(v("X"), v("Z"))],
        );

        for rule in [head_only, negated_only, distinct_only] {
            let err = RuleStore::new(vec![rule]).unwrap_err();
            assert!(matches!(err, MalformedRuleset::UnsafeVariable { .. }), "{err}");
        }
    }

    #[test]
    fn test_dependency_graph_edges() {
        let store = RuleStore::new(vec![
            Rule::new(
                Atom::new("p", vec![v("X")]),
                vec![
                    Literal::pos("q", vec![v("X")]),
                    Literal::neg("r", vec![v("X")]),
                    Literal::distinct(v("X"), c("a")),
                ],
            ),
            Rule::fact(Atom::new("q", vec![c("b")])),
        ])
        .unwrap();

        let graph = store.graph();
        let nodes: Vec<&str> = graph.nodes().map(Symbol::as_str).collect();
        assert_eq!(nodes, vec!["p", "q", "r"]);

        let edges: Vec<(&str, &str, bool)> = graph
            .edges()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.negative))
            .collect();
        assert_eq!(edges, vec![("q", "p", false), ("r", "p", true)]);
    }
}
