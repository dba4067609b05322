//! Two-role counter game.
//!
//! The counter starts at `start`. The role in control takes 1 or 2 (never
//! more than what is left) and control passes to the other role. When the
//! counter reaches 0 the role now in control, who did not take the last
//! unit, scores 100 and the other 0.
//!
//! Subtraction is a `minus/3` fact table; the engine has no arithmetic.

use super::{c, f, fact, holds, neg, pos, rule, v};
use crate::core::{Rule, Term};

/// The counter game starting at `start`.
#[must_use]
pub fn rules(start: u32) -> Vec<Rule> {
    let start = i64::from(start);
    let mut rules = vec![
        fact("role", vec![c("first")]),
        fact("role", vec![c("second")]),
        fact("init", vec![f("count", vec![Term::int(start)])]),
        fact("init", vec![f("control", vec![c("first")])]),
        fact("opponent", vec![c("first"), c("second")]),
        fact("opponent", vec![c("second"), c("first")]),
    ];

    for count in 1..=start {
        for take in 1..=2 {
            if take <= count {
                rules.push(fact(
                    "minus",
                    vec![Term::int(count), Term::int(take), Term::int(count - take)],
                ));
            }
        }
    }

    rules.extend([
        // legal(R, take(N)) :- true(control(R)), true(count(C)), minus(C, N, D).
        rule(
            "legal",
            vec![v("R"), f("take", vec![v("N")])],
            vec![
                holds(f("control", vec![v("R")])),
                holds(f("count", vec![v("C")])),
                pos("minus", vec![v("C"), v("N"), v("D")]),
            ],
        ),
        // next(count(D)) :- does(R, take(N)), true(count(C)), minus(C, N, D).
        rule(
            "next",
            vec![f("count", vec![v("D")])],
            vec![
                pos("does", vec![v("R"), f("take", vec![v("N")])]),
                holds(f("count", vec![v("C")])),
                pos("minus", vec![v("C"), v("N"), v("D")]),
            ],
        ),
        // next(control(O)) :- true(control(R)), opponent(R, O).
        rule(
            "next",
            vec![f("control", vec![v("O")])],
            vec![holds(f("control", vec![v("R")])), pos("opponent", vec![v("R"), v("O")])],
        ),
        rule("terminal", vec![], vec![holds(f("count", vec![Term::int(0)]))]),
        rule(
            "winner",
            vec![v("R")],
            vec![holds(f("control", vec![v("R")])), holds(f("count", vec![Term::int(0)]))],
        ),
        rule("goal", vec![v("R"), Term::int(100)], vec![pos("winner", vec![v("R")])]),
        rule(
            "goal",
            vec![v("R"), Term::int(0)],
            vec![pos("role", vec![v("R")]), neg("winner", vec![v("R")])],
        ),
    ]);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JointMove, Move, Role, RoleId, State};
    use crate::rules::{Interpreter, RulesEngine};

    fn count(n: i64) -> Term {
        f("count", vec![Term::int(n)])
    }

    fn control(role: &str) -> Term {
        f("control", vec![c(role)])
    }

    fn take(n: i64) -> Move {
        Move::new(f("take", vec![Term::int(n)]))
    }

    #[test]
    fn test_take_one_from_three() {
        let interp = Interpreter::from_rules(rules(3)).unwrap();
        let state: State = vec![count(3), control("first")].into_iter().collect();
        let joint = JointMove::new().with(Role::new("first"), take(1));

        let next = interp.next_state(&state, &joint);

        let expected: State = vec![count(2), control("second")].into_iter().collect();
        assert_eq!(next, expected);
        assert_eq!(interp.legal_moves_by_role(&next, RoleId::new(1)), vec![take(1), take(2)]);
        assert!(interp.legal_moves_by_role(&next, RoleId::new(0)).is_empty());
    }

    #[test]
    fn test_cannot_take_more_than_left() {
        let interp = Interpreter::from_rules(rules(3)).unwrap();
        let state: State = vec![count(1), control("second")].into_iter().collect();
        assert_eq!(interp.legal_moves_by_role(&state, RoleId::new(1)), vec![take(1)]);
    }

    #[test]
    fn test_start_zero_is_terminal() {
        let interp = Interpreter::from_rules(rules(0)).unwrap();
        let state = interp.init_state();
        assert!(interp.is_terminal(&state));
        assert_eq!(interp.goal_by_role(&state, RoleId::new(0)), Ok(100));
    }
}
