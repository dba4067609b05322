//! Hidden-choice game with imperfect information.
//!
//! `chooser` secretly picks a colour, then `guesser` names one. Only the
//! chooser perceives the secret; both perceive the phase and the guess.
//! The guesser scores 100 for a correct guess, the chooser otherwise.

use super::{c, f, fact, holds, neg, pos, rule, v};
use crate::core::{Rule, Term};

/// Colours the chooser may pick.
pub const COLOURS: [&str; 2] = ["red", "blue"];

/// The hidden-choice game.
#[must_use]
pub fn rules() -> Vec<Rule> {
    let mut rules = vec![
        fact("role", vec![c("chooser")]),
        fact("role", vec![c("guesser")]),
        fact("init", vec![f("phase", vec![c("choose")])]),
    ];
    rules.extend(COLOURS.iter().map(|colour| fact("colour", vec![c(colour)])));

    rules.extend([
        rule(
            "legal",
            vec![c("chooser"), f("pick", vec![v("X")])],
            vec![holds(f("phase", vec![c("choose")])), pos("colour", vec![v("X")])],
        ),
        rule(
            "legal",
            vec![c("guesser"), f("guess", vec![v("X")])],
            vec![holds(f("phase", vec![c("guess")])), pos("colour", vec![v("X")])],
        ),
        rule(
            "next",
            vec![f("secret", vec![v("X")])],
            vec![pos("does", vec![c("chooser"), f("pick", vec![v("X")])])],
        ),
        rule("next", vec![f("secret", vec![v("X")])], vec![holds(f("secret", vec![v("X")]))]),
        rule(
            "next",
            vec![f("guessed", vec![v("X")])],
            vec![pos("does", vec![c("guesser"), f("guess", vec![v("X")])])],
        ),
        rule(
            "next",
            vec![f("phase", vec![c("guess")])],
            vec![holds(f("phase", vec![c("choose")]))],
        ),
        rule(
            "next",
            vec![f("phase", vec![c("done")])],
            vec![holds(f("phase", vec![c("guess")]))],
        ),
        rule("terminal", vec![], vec![holds(f("phase", vec![c("done")]))]),
        // Percepts.
        rule(
            "sees",
            vec![v("R"), f("phase", vec![v("P")])],
            vec![pos("role", vec![v("R")]), holds(f("phase", vec![v("P")]))],
        ),
        rule(
            "sees",
            vec![c("chooser"), f("secret", vec![v("X")])],
            vec![holds(f("secret", vec![v("X")]))],
        ),
        rule(
            "sees",
            vec![v("R"), f("guessed", vec![v("X")])],
            vec![pos("role", vec![v("R")]), holds(f("guessed", vec![v("X")]))],
        ),
        // Outcome.
        rule(
            "correct",
            vec![],
            vec![holds(f("secret", vec![v("X")])), holds(f("guessed", vec![v("X")]))],
        ),
        rule("goal", vec![c("guesser"), Term::int(100)], vec![pos("correct", vec![])]),
        rule("goal", vec![c("guesser"), Term::int(0)], vec![neg("correct", vec![])]),
        rule("goal", vec![c("chooser"), Term::int(0)], vec![pos("correct", vec![])]),
        rule("goal", vec![c("chooser"), Term::int(100)], vec![neg("correct", vec![])]),
    ]);
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JointMove, Move, Role, RoleId};
    use crate::rules::{Interpreter, RulesEngine};

    fn pick(colour: &str) -> Move {
        Move::new(f("pick", vec![c(colour)]))
    }

    fn guess(colour: &str) -> Move {
        Move::new(f("guess", vec![c(colour)]))
    }

    #[test]
    fn test_secret_only_seen_by_chooser() {
        let interp = Interpreter::from_rules(rules()).unwrap();
        let state = interp.init_state();
        let joint = JointMove::new().with(Role::new("chooser"), pick("red"));
        let state = interp.next_state(&state, &joint);

        let secret = f("secret", vec![c("red")]);
        let views = interp.sees(&state);
        assert!(interp.has_percepts());
        assert!(views[RoleId::new(0)].contains(&secret));
        assert!(!views[RoleId::new(1)].contains(&secret));
        assert!(views[RoleId::new(1)].contains(&f("phase", vec![c("guess")])));
    }

    #[test]
    fn test_correct_guess_wins() {
        let interp = Interpreter::from_rules(rules()).unwrap();
        let mut state = interp.init_state();
        state = interp.next_state(&state, &JointMove::new().with(Role::new("chooser"), pick("blue")));
        assert_eq!(
            interp.legal_moves_by_role(&state, RoleId::new(1)),
            vec![guess("blue"), guess("red")]
        );
        state = interp.next_state(&state, &JointMove::new().with(Role::new("guesser"), guess("blue")));

        assert!(interp.is_terminal(&state));
        let goals = interp.goals(&state).unwrap();
        assert_eq!(goals[RoleId::new(0)], 0);
        assert_eq!(goals[RoleId::new(1)], 100);
    }
}
