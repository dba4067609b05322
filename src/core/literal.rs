//! Atoms, literals and rules.
//!
//! An [`Atom`] is a predicate applied to an argument tuple. Ground atoms are
//! the facts the evaluator derives. A [`Literal`] is an atom with a polarity,
//! and a [`Rule`] is a head literal plus an ordered body of literals.
//!
//! Rule text syntax is out of scope: rule sets are built from these values
//! directly (see `crate::games` for examples).

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::term::{match_ground, Binding, Symbol, Term};

/// Names of the predicates with fixed meaning to the engine.
pub mod reserved {
    pub const ROLE: &str = "role";
    pub const INIT: &str = "init";
    pub const TRUE: &str = "true";
    pub const NEXT: &str = "next";
    pub const LEGAL: &str = "legal";
    pub const DOES: &str = "does";
    pub const GOAL: &str = "goal";
    pub const TERMINAL: &str = "terminal";
    pub const SEES: &str = "sees";
    pub const DISTINCT: &str = "distinct";

    /// Fixed arity of each reserved predicate.
    pub const ARITIES: [(&str, usize); 10] = [
        (ROLE, 1),
        (INIT, 1),
        (TRUE, 1),
        (NEXT, 1),
        (LEGAL, 2),
        (DOES, 2),
        (GOAL, 2),
        (TERMINAL, 0),
        (SEES, 2),
        (DISTINCT, 2),
    ];

    /// Arity of a reserved predicate, if `name` is reserved.
    #[must_use]
    pub fn arity(name: &str) -> Option<usize> {
        ARITIES.iter().find(|(n, _)| *n == name).map(|(_, a)| *a)
    }

    /// Predicates whose extension is supplied by the caller, never derived.
    #[must_use]
    pub fn is_extensional(name: &str) -> bool {
        name == TRUE || name == DOES
    }
}

/// A predicate applied to an ordered tuple of terms.
///
/// SmallVec keeps the common case (≤3 arguments) off the heap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    /// Predicate symbol.
    pub predicate: Symbol,
    /// Arguments.
    pub args: SmallVec<[Term; 3]>,
}

impl Atom {
    /// Create an atom.
    #[must_use]
    pub fn new(predicate: impl AsRef<str>, args: Vec<Term>) -> Self {
        Self {
            predicate: Symbol::new(predicate),
            args: SmallVec::from_vec(args),
        }
    }

    /// Create a zero-arity atom (`terminal`).
    #[must_use]
    pub fn proposition(predicate: impl AsRef<str>) -> Self {
        Self::new(predicate, Vec::new())
    }

    /// Number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// True if every argument is ground.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }

    /// Argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Term> {
        self.args.get(index)
    }

    /// Apply a binding to every argument.
    #[must_use]
    pub fn substitute(&self, binding: &Binding) -> Atom {
        Atom {
            predicate: self.predicate.clone(),
            args: self
                .args
                .iter()
                .map(|arg| super::term::substitute(arg, binding))
                .collect(),
        }
    }

    /// Variables of this atom, in order of first occurrence.
    #[must_use]
    pub fn variables(&self) -> Vec<&Symbol> {
        let mut all = Vec::new();
        for arg in &self.args {
            arg.collect_variables(&mut all);
        }
        let mut seen = Vec::with_capacity(all.len());
        for var in all {
            if !seen.contains(&var) {
                seen.push(var);
            }
        }
        seen
    }

    /// `true(fluent)`
    #[must_use]
    pub fn holds(fluent: Term) -> Self {
        Self::new(reserved::TRUE, vec![fluent])
    }

    /// `does(role, move)`
    #[must_use]
    pub fn does(role: Term, action: Term) -> Self {
        Self::new(reserved::DOES, vec![role, action])
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Literal polarity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    /// Negation as failure. Only meaningful in rule bodies.
    Negative,
}

/// An atom with a polarity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub atom: Atom,
    pub polarity: Polarity,
}

impl Literal {
    /// Positive literal.
    #[must_use]
    pub fn pos(predicate: impl AsRef<str>, args: Vec<Term>) -> Self {
        Self {
            atom: Atom::new(predicate, args),
            polarity: Polarity::Positive,
        }
    }

    /// Negated literal.
    #[must_use]
    pub fn neg(predicate: impl AsRef<str>, args: Vec<Term>) -> Self {
        Self {
            atom: Atom::new(predicate, args),
            polarity: Polarity::Negative,
        }
    }

    /// `distinct(a, b)`
    #[must_use]
    pub fn distinct(a: Term, b: Term) -> Self {
        Self::pos(reserved::DISTINCT, vec![a, b])
    }

    /// Predicate symbol.
    #[must_use]
    pub fn predicate(&self) -> &Symbol {
        &self.atom.predicate
    }

    /// True if negated.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.polarity == Polarity::Negative
    }

    /// True if this is a use of the `distinct/2` builtin.
    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.atom.predicate.as_str() == reserved::DISTINCT
    }
}

impl From<Atom> for Literal {
    fn from(atom: Atom) -> Self {
        Self {
            atom,
            polarity: Polarity::Positive,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.polarity {
            Polarity::Positive => write!(f, "{}", self.atom),
            Polarity::Negative => write!(f, "not {}", self.atom),
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A Horn-style rule: `head :- body`. An empty body makes it a fact.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub head: Literal,
    pub body: Vec<Literal>,
}

impl Rule {
    /// Create a rule.
    #[must_use]
    pub fn new(head: Atom, body: Vec<Literal>) -> Self {
        Self {
            head: head.into(),
            body,
        }
    }

    /// Create a fact (body-less rule).
    #[must_use]
    pub fn fact(head: Atom) -> Self {
        Self::new(head, Vec::new())
    }

    /// True if the body is empty.
    #[must_use]
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    /// Head predicate symbol.
    #[must_use]
    pub fn head_predicate(&self) -> &Symbol {
        self.head.predicate()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.body.is_empty() {
            f.write_str(" :- ")?;
            for (i, literal) in self.body.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{literal}")?;
            }
        }
        f.write_str(".")
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Unify a body literal's arguments against a ground fact under a partial
/// binding. Polarity is ignored; the caller decides what a match means.
///
/// Returns the extended binding, or `None` if predicate, arity or any
/// argument disagrees.
#[must_use]
pub fn match_literal(literal: &Literal, fact: &Atom, partial: &Binding) -> Option<Binding> {
    match_atom(&literal.atom, fact, partial)
}

pub(crate) fn match_atom(pattern: &Atom, fact: &Atom, partial: &Binding) -> Option<Binding> {
    if pattern.predicate != fact.predicate || pattern.args.len() != fact.args.len() {
        return None;
    }
    let mut binding = partial.clone();
    for (p, g) in pattern.args.iter().zip(&fact.args) {
        if !match_ground(p, g, &mut binding) {
            return None;
        }
    }
    Some(binding)
}
