//! N-role simultaneous ballot.
//!
//! Every voter marks option `a` or `b` in the same ply, then the ballot
//! closes. A voter scores 100 for `a`, 50 for `b` and 0 if no mark of theirs
//! was recorded (which only happens when a reserved non-move was substituted
//! for them).

use super::{c, f, fact, holds, neg, pos, rule, v};
use crate::core::{Role, Rule, Term};

/// Options on the ballot.
pub const OPTIONS: [&str; 2] = ["a", "b"];

/// Name of the `index`-th voter (1-based).
#[must_use]
pub fn voter(index: usize) -> Role {
    Role::new(format!("voter{index}"))
}

/// The ballot game for `voters` roles.
#[must_use]
pub fn rules(voters: usize) -> Vec<Rule> {
    assert!((1..=255).contains(&voters), "Voter count must be 1-255");

    let mut rules: Vec<Rule> = (1..=voters)
        .map(|i| fact("role", vec![voter(i).term().clone()]))
        .collect();
    rules.push(fact("init", vec![f("round", vec![c("open")])]));
    rules.extend(OPTIONS.iter().map(|option| fact("option", vec![c(option)])));

    rules.extend([
        rule(
            "legal",
            vec![v("R"), f("mark", vec![v("O")])],
            vec![
                pos("role", vec![v("R")]),
                holds(f("round", vec![c("open")])),
                pos("option", vec![v("O")]),
            ],
        ),
        rule(
            "next",
            vec![f("marked", vec![v("R"), v("O")])],
            vec![pos("does", vec![v("R"), f("mark", vec![v("O")])])],
        ),
        rule(
            "next",
            vec![f("marked", vec![v("R"), v("O")])],
            vec![holds(f("marked", vec![v("R"), v("O")]))],
        ),
        rule(
            "next",
            vec![f("round", vec![c("closed")])],
            vec![holds(f("round", vec![c("open")]))],
        ),
        rule("terminal", vec![], vec![holds(f("round", vec![c("closed")]))]),
        rule(
            "voted",
            vec![v("R")],
            vec![holds(f("marked", vec![v("R"), v("O")]))],
        ),
        rule(
            "goal",
            vec![v("R"), Term::int(100)],
            vec![holds(f("marked", vec![v("R"), c("a")]))],
        ),
        rule(
            "goal",
            vec![v("R"), Term::int(50)],
            vec![holds(f("marked", vec![v("R"), c("b")]))],
        ),
        rule(
            "goal",
            vec![v("R"), Term::int(0)],
            vec![pos("role", vec![v("R")]), neg("voted", vec![v("R")])],
        ),
    ]);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JointMove, Move, RoleId};
    use crate::rules::{Interpreter, RulesEngine};

    fn mark(option: &str) -> Move {
        Move::new(f("mark", vec![c(option)]))
    }

    #[test]
    fn test_every_voter_moves() {
        let interp = Interpreter::from_rules(rules(3)).unwrap();
        let state = interp.init_state();
        let position = interp.analyze(&state);

        assert_eq!(position.roles_to_move().count(), 3);
        assert_eq!(position.legal[RoleId::new(2)], vec![mark("a"), mark("b")]);
    }

    #[test]
    fn test_goals_follow_marks() {
        let interp = Interpreter::from_rules(rules(3)).unwrap();
        let joint = JointMove::new()
            .with(voter(1), mark("a"))
            .with(voter(2), mark("b"))
            .with(voter(3), Move::constant("noop"));
        let state = interp.next_state(&interp.init_state(), &joint);

        assert!(interp.is_terminal(&state));
        let goals = interp.goals(&state).unwrap();
        assert_eq!(goals[RoleId::new(0)], 100);
        assert_eq!(goals[RoleId::new(1)], 50);
        assert_eq!(goals[RoleId::new(2)], 0);
    }

    #[test]
    #[should_panic(expected = "Voter count must be 1-255")]
    fn test_zero_voters() {
        let _ = rules(0);
    }
}
