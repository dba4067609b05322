//! Terms: constants, variables, and compound terms.
//!
//! ## Symbol
//!
//! Reference-counted interned-by-value name. Cloning is a pointer copy, so
//! terms can be shared freely between fact sets, states and records.
//!
//! ## Term
//!
//! Immutable tagged union. Two terms are equal iff structurally identical;
//! `distinct/2` is decided by this equality, never by unification.
//!
//! ## Binding
//!
//! Variable → term mapping produced by [`unify`] and extended by rule
//! evaluation. Rules rarely have more than a handful of variables, so the
//! binding is an inline `SmallVec` searched linearly.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// A predicate, functor, constant or variable name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Create a symbol from a name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Symbol::from)
    }
}

/// A term of the rule language.
///
/// ```
/// use rust_ggp::core::Term;
///
/// let t = Term::compound("take", vec![Term::var("N")]);
/// assert!(!t.is_ground());
/// assert_eq!(t.to_string(), "take(?N)");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// An atomic constant (`first`, `100`).
    Constant(Symbol),
    /// A universally quantified rule variable.
    Variable(Symbol),
    /// A functor applied to ordered arguments.
    Compound(Symbol, Vec<Term>),
}

impl Term {
    /// Create a constant.
    #[must_use]
    pub fn constant(name: impl AsRef<str>) -> Self {
        Term::Constant(Symbol::new(name))
    }

    /// Create a variable.
    #[must_use]
    pub fn var(name: impl AsRef<str>) -> Self {
        Term::Variable(Symbol::new(name))
    }

    /// Create an integer constant.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Term::Constant(Symbol::from(value.to_string()))
    }

    /// Create a compound term. A compound with no arguments is a constant.
    #[must_use]
    pub fn compound(functor: impl AsRef<str>, args: Vec<Term>) -> Self {
        if args.is_empty() {
            Term::constant(functor)
        } else {
            Term::Compound(Symbol::new(functor), args)
        }
    }

    /// True if the term contains no variable at any depth.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Variable(_) => false,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
        }
    }

    /// True if this is a variable.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// The constant name or compound functor. `None` for variables.
    #[must_use]
    pub fn functor(&self) -> Option<&Symbol> {
        match self {
            Term::Constant(name) | Term::Compound(name, _) => Some(name),
            Term::Variable(_) => None,
        }
    }

    /// Arguments of a compound term (empty for constants and variables).
    #[must_use]
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(_, args) => args,
            _ => &[],
        }
    }

    /// Interpret a constant as an integer: an optional `-` then digits.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        let Term::Constant(name) = self else {
            return None;
        };
        let text = name.as_str();
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse().ok()
    }

    /// Push every variable of this term (with repetitions) onto `out`.
    pub fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Symbol>) {
        match self {
            Term::Constant(_) => {}
            Term::Variable(name) => out.push(name),
            Term::Compound(_, args) => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(name) => write!(f, "{name}"),
            Term::Variable(name) => write!(f, "?{name}"),
            Term::Compound(functor, args) => {
                write!(f, "{functor}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A variable → term mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    entries: SmallVec<[(Symbol, Term); 4]>,
}

impl Binding {
    /// Create an empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the term bound to a variable.
    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.entries
            .iter()
            .find(|(name, _)| name.as_str() == variable)
            .map(|(_, term)| term)
    }

    /// Bind a variable. Rebinding an already-bound variable replaces it.
    pub fn bind(&mut self, variable: Symbol, term: Term) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == variable) {
            entry.1 = term;
        } else {
            self.entries.push((variable, term));
        }
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (variable, term) pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Term)> {
        self.entries.iter().map(|(name, term)| (name, term))
    }
}

impl FromIterator<(Symbol, Term)> for Binding {
    fn from_iter<I: IntoIterator<Item = (Symbol, Term)>>(iter: I) -> Self {
        let mut binding = Binding::new();
        for (name, term) in iter {
            binding.bind(name, term);
        }
        binding
    }
}

/// Apply a binding to a term, returning a new term.
///
/// Bound variables are replaced (transitively, so chains produced by
/// [`unify`] resolve fully); unbound variables are left in place.
#[must_use]
pub fn substitute(term: &Term, binding: &Binding) -> Term {
    match term {
        Term::Constant(_) => term.clone(),
        Term::Variable(name) => match binding.get(name.as_str()) {
            Some(bound) if bound != term => substitute(bound, binding),
            _ => term.clone(),
        },
        Term::Compound(functor, args) => Term::Compound(
            functor.clone(),
            args.iter().map(|arg| substitute(arg, binding)).collect(),
        ),
    }
}

/// Most general unifier of two terms, or `None` if they do not unify.
///
/// No occurs check: terms handled by the engine are finite and evaluation
/// never builds self-referential terms.
///
/// ```
/// use rust_ggp::core::{unify, substitute, Term};
///
/// let a = Term::compound("cell", vec![Term::var("X"), Term::constant("b")]);
/// let b = Term::compound("cell", vec![Term::constant("1"), Term::var("Y")]);
/// let binding = unify(&a, &b).unwrap();
/// assert_eq!(substitute(&a, &binding), substitute(&b, &binding));
/// ```
#[must_use]
pub fn unify(a: &Term, b: &Term) -> Option<Binding> {
    unify_with(a, b, Binding::new())
}

/// Unify two terms, extending an existing binding.
#[must_use]
pub fn unify_with(a: &Term, b: &Term, mut binding: Binding) -> Option<Binding> {
    if unify_in_place(a, b, &mut binding) {
        Some(binding)
    } else {
        None
    }
}

fn walk<'a>(term: &'a Term, binding: &'a Binding) -> &'a Term {
    let mut current = term;
    while let Term::Variable(name) = current {
        match binding.get(name.as_str()) {
            Some(next) if next != current => current = next,
            _ => break,
        }
    }
    current
}

fn unify_in_place(a: &Term, b: &Term, binding: &mut Binding) -> bool {
    let a = walk(a, binding).clone();
    let b = walk(b, binding).clone();
    match (&a, &b) {
        _ if a == b => true,
        (Term::Variable(name), other) | (other, Term::Variable(name)) => {
            binding.bind(name.clone(), other.clone());
            true
        }
        (Term::Compound(fa, args_a), Term::Compound(fb, args_b)) => {
            fa == fb
                && args_a.len() == args_b.len()
                && args_a
                    .iter()
                    .zip(args_b)
                    .all(|(x, y)| unify_in_place(x, y, binding))
        }
        _ => false,
    }
}

/// One-way match of a pattern against a ground term.
///
/// Only variables of `pattern` are bound. Faster than [`unify`] and the
/// primitive used when joining rule bodies against facts.
pub(crate) fn match_ground(pattern: &Term, ground: &Term, binding: &mut Binding) -> bool {
    match pattern {
        Term::Constant(_) => pattern == ground,
        Term::Variable(name) => match binding.get(name.as_str()) {
            Some(bound) => bound == ground,
            None => {
                binding.bind(name.clone(), ground.clone());
                true
            }
        },
        Term::Compound(functor, args) => match ground {
            Term::Compound(g_functor, g_args) => {
                functor == g_functor
                    && args.len() == g_args.len()
                    && args
                        .iter()
                        .zip(g_args)
                        .all(|(p, g)| match_ground(p, g, binding))
            }
            _ => false,
        },
    }
}
