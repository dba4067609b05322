//! `RulesEngine` over a declarative rule set.
//!
//! Every query is one evaluator call with the state's `true/1` facts (and,
//! for `next`, the joint move's `does/2` facts) as input and the reserved
//! predicate of interest as target.

use std::sync::Arc;

use log::debug;

use super::engine::{Position, RulesEngine};
use super::ruleset::Ruleset;
use crate::core::{reserved, Atom, MAX_ROLES, JointMove, Move, Role, RoleId, RoleMap, Rule, State, Term, View};
use crate::error::{ConsistencyError, MatchError};

/// Interprets a loaded [`Ruleset`] as game semantics.
#[derive(Clone, Debug)]
pub struct Interpreter {
    ruleset: Arc<Ruleset>,
    roles: Vec<Role>,
    perceives: bool,
}

impl Interpreter {
    /// Resolve roles and wrap a loaded rule set.
    ///
    /// Roles are ordered as their `role/1` facts appear, followed by any
    /// derived roles in term order.
    pub fn new(ruleset: Arc<Ruleset>) -> Result<Self, ConsistencyError> {
        let derived = ruleset.evaluate(std::iter::empty(), &[reserved::ROLE]);
        let mut roles: Vec<Role> = ruleset
            .store()
            .rules_for(reserved::ROLE)
            .filter(|rule| rule.is_fact())
            .filter_map(|rule| rule.head.atom.arg(0).cloned())
            .map(Role::from)
            .collect();
        let mut seen = Vec::with_capacity(roles.len());
        roles.retain(|role| {
            let first = !seen.contains(role);
            seen.push(role.clone());
            first
        });
        for fact in derived {
            if let Some(role) = fact.arg(0).cloned().map(Role::from) {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
        }

        if roles.is_empty() {
            return Err(ConsistencyError::NoRoles);
        }
        if roles.len() > MAX_ROLES {
            return Err(ConsistencyError::TooManyRoles {
                count: roles.len(),
                max: MAX_ROLES,
            });
        }
        let perceives = ruleset.store().defines(reserved::SEES);
        debug!("Interpreter roles: {:?} (percepts: {})", roles, perceives);

        Ok(Self {
            ruleset,
            roles,
            perceives,
        })
    }

    /// Load a rule set and wrap it in one step.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self, MatchError> {
        let ruleset = Ruleset::load(rules)?;
        Ok(Self::new(Arc::new(ruleset))?)
    }

    /// The underlying rule set.
    #[must_use]
    pub fn ruleset(&self) -> &Arc<Ruleset> {
        &self.ruleset
    }

    /// True if the rule set defines `sees/2`. Otherwise every role sees the
    /// full state.
    #[must_use]
    pub fn has_percepts(&self) -> bool {
        self.perceives
    }

    fn role_of(&self, term: &Term) -> Option<RoleId> {
        self.roles
            .iter()
            .position(|role| role.term() == term)
            .and_then(RoleId::from_index)
    }

    fn collect_legal<'a>(&self, facts: impl Iterator<Item = &'a Atom>) -> RoleMap<Vec<Move>> {
        let mut legal: RoleMap<Vec<Move>> = RoleMap::with_default(self.roles.len());
        for fact in facts.filter(|f| f.predicate.as_str() == reserved::LEGAL) {
            if let (Some(role), Some(action)) = (fact.arg(0), fact.arg(1)) {
                match self.role_of(role) {
                    Some(id) => legal[id].push(Move::new(action.clone())),
                    None => debug!("Ignoring {} for undeclared role", fact),
                }
            }
        }
        for (_, moves) in legal.iter_mut() {
            moves.sort();
            moves.dedup();
        }
        legal
    }

    fn collect_views<'a>(&self, state: &State, facts: impl Iterator<Item = &'a Atom>) -> RoleMap<View> {
        if !self.perceives {
            return RoleMap::with_value(self.roles.len(), state.clone());
        }
        let mut percepts: RoleMap<Vec<Term>> = RoleMap::with_default(self.roles.len());
        for fact in facts.filter(|f| f.predicate.as_str() == reserved::SEES) {
            if let (Some(role), Some(percept)) = (fact.arg(0), fact.arg(1)) {
                if let Some(id) = self.role_of(role) {
                    percepts[id].push(percept.clone());
                }
            }
        }
        percepts.map(|_, terms| terms.iter().cloned().collect())
    }

    fn goal_values(&self, state: &State) -> Result<RoleMap<Vec<Term>>, ConsistencyError> {
        let facts = self.ruleset.evaluate(state.as_facts(), &[reserved::GOAL]);
        let mut values: RoleMap<Vec<Term>> = RoleMap::with_default(self.roles.len());
        for fact in &facts {
            if let (Some(role), Some(value)) = (fact.arg(0), fact.arg(1)) {
                let id = self.role_of(role).ok_or_else(|| ConsistencyError::UnexpectedRole {
                    role: Role::from(role.clone()),
                })?;
                values[id].push(value.clone());
            }
        }
        Ok(values)
    }

    fn single_goal(&self, role: RoleId, values: &[Term]) -> Result<i64, ConsistencyError> {
        let role = self.roles[role.index()].clone();
        match values {
            [] => Err(ConsistencyError::MissingGoal { role }),
            [value] => value
                .as_integer()
                .ok_or_else(|| ConsistencyError::GoalNotInteger {
                    role,
                    value: value.clone(),
                }),
            _ => Err(ConsistencyError::MultipleGoals {
                role,
                values: values.to_vec(),
            }),
        }
    }
}

impl RulesEngine for Interpreter {
    fn roles(&self) -> &[Role] {
        &self.roles
    }

    fn init_state(&self) -> State {
        self.ruleset
            .evaluate(std::iter::empty(), &[reserved::INIT])
            .into_iter()
            .filter_map(|fact| fact.args.into_iter().next())
            .collect()
    }

    fn next_state(&self, state: &State, joint: &JointMove) -> State {
        let input = state.as_facts().chain(joint.as_facts());
        self.ruleset
            .evaluate(input, &[reserved::NEXT])
            .into_iter()
            .filter_map(|fact| fact.args.into_iter().next())
            .collect()
    }

    fn legal_moves(&self, state: &State) -> RoleMap<Vec<Move>> {
        let facts = self.ruleset.evaluate(state.as_facts(), &[reserved::LEGAL]);
        self.collect_legal(facts.iter())
    }

    fn sees(&self, state: &State) -> RoleMap<View> {
        if !self.perceives {
            return RoleMap::with_value(self.roles.len(), state.clone());
        }
        let facts = self.ruleset.evaluate(state.as_facts(), &[reserved::SEES]);
        self.collect_views(state, facts.iter())
    }

    fn goals(&self, state: &State) -> Result<RoleMap<i64>, ConsistencyError> {
        let values = self.goal_values(state)?;
        let mut goals = RoleMap::with_value(self.roles.len(), 0);
        for (id, candidates) in values.iter() {
            goals[id] = self.single_goal(id, candidates)?;
        }
        Ok(goals)
    }

    fn is_terminal(&self, state: &State) -> bool {
        !self
            .ruleset
            .evaluate(state.as_facts(), &[reserved::TERMINAL])
            .is_empty()
    }

    fn goal_by_role(&self, state: &State, role: RoleId) -> Result<i64, ConsistencyError> {
        let values = self.goal_values(state)?;
        self.single_goal(role, values.get(role))
    }

    fn analyze(&self, state: &State) -> Position {
        let targets: &[&str] = if self.perceives {
            &[reserved::TERMINAL, reserved::LEGAL, reserved::SEES]
        } else {
            &[reserved::TERMINAL, reserved::LEGAL]
        };
        let facts = self.ruleset.evaluate(state.as_facts(), targets);
        Position {
            terminal: facts.iter().any(|f| f.predicate.as_str() == reserved::TERMINAL),
            legal: self.collect_legal(facts.iter()),
            views: self.collect_views(state, facts.iter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Literal;
    use crate::games::counter;

    fn c(name: &str) -> Term {
        Term::constant(name)
    }

    fn count(n: i64) -> Term {
        Term::compound("count", vec![Term::int(n)])
    }

    fn control(role: &str) -> Term {
        Term::compound("control", vec![c(role)])
    }

    fn take(n: i64) -> Move {
        Move::new(Term::compound("take", vec![Term::int(n)]))
    }

    #[test]
    fn test_roles_in_declaration_order() {
        let interp = Interpreter::from_rules(counter::rules(3)).unwrap();
        assert_eq!(interp.roles(), &[Role::new("first"), Role::new("second")]);
        assert_eq!(interp.role_id(&Role::new("second")), Some(RoleId::new(1)));
    }

    #[test]
    fn test_no_roles() {
        let err = Interpreter::from_rules(vec![Rule::fact(Atom::new("init", vec![c("x")]))]).unwrap_err();
        assert_eq!(err, MatchError::Consistency(ConsistencyError::NoRoles));
    }

    #[test]
    fn test_too_many_roles() {
        let mut rules: Vec<Rule> = (0..300)
            .map(|i| Rule::fact(Atom::new("role", vec![c(&format!("r{i}"))])))
            .collect();
        rules.push(Rule::fact(Atom::new("init", vec![c("s")])));

        let err = Interpreter::from_rules(rules).unwrap_err();
        assert_eq!(
            err,
            MatchError::Consistency(ConsistencyError::TooManyRoles { count: 300, max: 255 })
        );
    }

    #[test]
    fn test_max_roles_accepted() {
        let mut rules: Vec<Rule> = (0..MAX_ROLES)
            .map(|i| Rule::fact(Atom::new("role", vec![c(&format!("r{i}"))])))
            .collect();
        rules.push(Rule::fact(Atom::new("init", vec![c("s")])));

        let interp = Interpreter::from_rules(rules).unwrap();
        let last = interp.role_id(&Role::new("r254")).unwrap();
        assert_eq!(last.index(), 254);
        assert!(interp.legal_moves(&interp.init_state()).get(last).is_empty());
    }

    #[test]
    fn test_init_state() {
        let interp = Interpreter::from_rules(counter::rules(3)).unwrap();
        let state = interp.init_state();
        let expected: State = vec![count(3), control("first")].into_iter().collect();
        assert_eq!(state, expected);
    }

    #[test]
    fn test_legal_moves_by_role() {
        let interp = Interpreter::from_rules(counter::rules(3)).unwrap();
        let state = interp.init_state();

        let legal = interp.legal_moves(&state);
        assert_eq!(legal[RoleId::new(0)], vec![take(1), take(2)]);
        assert!(legal[RoleId::new(1)].is_empty());

        assert!(interp.is_legal(&state, RoleId::new(0), &take(2)));
        assert!(!interp.is_legal(&state, RoleId::new(0), &take(3)));
        assert!(!interp.is_legal(&state, RoleId::new(1), &take(1)));
    }

    #[test]
    fn test_full_state_view_without_sees() {
        let interp = Interpreter::from_rules(counter::rules(3)).unwrap();
        let state = interp.init_state();
        assert!(!interp.has_percepts());
        assert_eq!(interp.sees_by_role(&state, RoleId::new(1)), state);
    }

    #[test]
    fn test_goals_at_terminal() {
        let interp = Interpreter::from_rules(counter::rules(3)).unwrap();
        let state: State = vec![count(0), control("second")].into_iter().collect();

        assert!(interp.is_terminal(&state));
        let goals = interp.goals(&state).unwrap();
        assert_eq!(goals[RoleId::new(0)], 0);
        assert_eq!(goals[RoleId::new(1)], 100);
        assert_eq!(interp.goal_by_role(&state, RoleId::new(1)), Ok(100));
    }

    #[test]
    fn test_goal_consistency_errors() {
        let mut rules = vec![
            Rule::fact(Atom::new("role", vec![c("a")])),
            Rule::fact(Atom::new("role", vec![c("b")])),
            Rule::fact(Atom::new("goal", vec![c("a"), c("win")])),
        ];
        let interp = Interpreter::from_rules(rules.clone()).unwrap();
        let state = State::new();
        assert_eq!(
            interp.goal_by_role(&state, RoleId::new(0)),
            Err(ConsistencyError::GoalNotInteger {
                role: Role::new("a"),
                value: c("win")
            })
        );
        assert_eq!(
            interp.goal_by_role(&state, RoleId::new(1)),
            Err(ConsistencyError::MissingGoal { role: Role::new("b") })
        );

        rules.push(Rule::fact(Atom::new("goal", vec![c("b"), Term::int(0)])));
        rules.push(Rule::fact(Atom::new("goal", vec![c("b"), Term::int(100)])));
        let interp = Interpreter::from_rules(rules).unwrap();
        assert!(matches!(
            interp.goal_by_role(&state, RoleId::new(1)),
            Err(ConsistencyError::MultipleGoals { .. })
        ));
    }

    #[test]
    fn test_goal_with_plus_sign_rejected() {
        let interp = Interpreter::from_rules(vec![
            Rule::fact(Atom::new("role", vec![c("a")])),
            Rule::fact(Atom::new("goal", vec![c("a"), c("+5")])),
        ])
        .unwrap();
        assert_eq!(
            interp.goal_by_role(&State::new(), RoleId::new(0)),
            Err(ConsistencyError::GoalNotInteger {
                role: Role::new("a"),
                value: c("+5")
            })
        );
    }

    #[test]
    fn test_goal_for_undeclared_role() {
        let rules = vec![
            Rule::fact(Atom::new("role", vec![c("a")])),
            Rule::fact(Atom::new("goal", vec![c("a"), Term::int(50)])),
            Rule::fact(Atom::new("goal", vec![c("ghost"), Term::int(50)])),
        ];
        let interp = Interpreter::from_rules(rules).unwrap();
        assert_eq!(
            interp.goals(&State::new()),
            Err(ConsistencyError::UnexpectedRole { role: Role::new("ghost") })
        );
    }

    #[test]
    fn test_derived_roles_follow_declared() {
        let rules = vec![
            Rule::fact(Atom::new("role", vec![c("z")])),
            Rule::fact(Atom::new("seat", vec![c("a")])),
            Rule::new(
                Atom::new("role", vec![Term::var("X")]),
                vec![Literal::pos("seat", vec![Term::var("X")])],
            ),
        ];
        let interp = Interpreter::from_rules(rules).unwrap();
        assert_eq!(interp.roles(), &[Role::new("z"), Role::new("a")]);
    }

    #[test]
    fn test_analyze_matches_individual_queries() {
        let interp = Interpreter::from_rules(counter::rules(3)).unwrap();
        let state = interp.init_state();

        let position = interp.analyze(&state);

        assert_eq!(position.terminal, interp.is_terminal(&state));
        assert_eq!(position.legal, interp.legal_moves(&state));
        assert_eq!(position.views, interp.sees(&state));
        assert_eq!(position.roles_to_move().collect::<Vec<_>>(), vec![RoleId::new(0)]);
    }
}
