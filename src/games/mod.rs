//! Sample rule sets, built directly from the term/rule data model.
//!
//! - `counter`: two roles alternately take 1 or 2 from a counter
//! - `hidden`: one role picks a secret, the other guesses it (`sees/2`)
//! - `ballot`: n roles mark a ballot simultaneously

pub mod counter;
pub mod hidden;
pub mod ballot;

use crate::core::{Atom, Literal, Rule, Term};

fn c(name: &str) -> Term {
    Term::constant(name)
}

fn v(name: &str) -> Term {
    Term::var(name)
}

fn f(functor: &str, args: Vec<Term>) -> Term {
    Term::compound(functor, args)
}

fn fact(predicate: &str, args: Vec<Term>) -> Rule {
    Rule::fact(Atom::new(predicate, args))
}

fn rule(predicate: &str, args: Vec<Term>, body: Vec<Literal>) -> Rule {
    Rule::new(Atom::new(predicate, args), body)
}

fn pos(predicate: &str, args: Vec<Term>) -> Literal {
    Literal::pos(predicate, args)
}

fn neg(predicate: &str, args: Vec<Term>) -> Literal {
    Literal::neg(predicate, args)
}

/// `true(fluent)`
fn holds(fluent: Term) -> Literal {
    Literal::pos("true", vec![fluent])
}
