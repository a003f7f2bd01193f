//! Nondeterministic finite automata compiled from right-linear grammars.
//!
//! Membership is decided by tracking the set of active states while the
//! input is consumed, so nondeterministic fan-out never needs backtracking.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::definition::{GrammarDefinition, RawRule};
use crate::grammar::Grammar;
use crate::utils::{GrammarError, Result};

static NO_STATES: BTreeSet<State> = BTreeSet::new();

/// A state of the automaton: one per non-terminal plus the synthetic accept state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    NonTerminal(char),
    End,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::NonTerminal(c) => write!(f, "{}", c),
            State::End => write!(f, "end"),
        }
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One entry of the transition relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: State,
    pub symbol: char,
    pub to: BTreeSet<State>,
}

/// A nondeterministic finite automaton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: BTreeSet<State>,
    alphabet: BTreeSet<char>,
    transitions: HashMap<(State, char), BTreeSet<State>>,
    start_state: State,
    accept_states: BTreeSet<State>,
}

impl Automaton {
    pub(crate) fn new(
        states: BTreeSet<State>,
        alphabet: BTreeSet<char>,
        transitions: HashMap<(State, char), BTreeSet<State>>,
        start_state: State,
        accept_states: BTreeSet<State>,
    ) -> Self {
        debug_assert!(states.contains(&start_state));
        debug_assert!(accept_states.is_subset(&states));
        debug_assert!(transitions.values().all(|to| to.is_subset(&states)));

        Automaton {
            states,
            alphabet,
            transitions,
            start_state,
            accept_states,
        }
    }

    /// Decide whether `input` belongs to the language.
    ///
    /// Symbols outside the alphabet have no transitions and reject the input.
    pub fn accepts(&self, input: &str) -> bool {
        self.accepts_symbols(input.chars())
    }

    /// Decide membership for any sequence of symbols, see [`Self::accepts`]
    pub fn accepts_symbols<I>(&self, input: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        let mut current = BTreeSet::from([self.start_state]);

        for (position, symbol) in input.into_iter().enumerate() {
            let next: BTreeSet<State> = current
                .iter()
                .flat_map(|&state| self.destinations(state, symbol))
                .copied()
                .collect();
            trace!("step {} on '{}': {:?} -> {:?}", position, symbol, current, next);

            if next.is_empty() {
                return false;
            }
            current = next;
        }

        !current.is_disjoint(&self.accept_states)
    }

    /// Like [`Self::accepts`], but symbols outside the alphabet are an error
    pub fn accepts_strict(&self, input: &str) -> Result<bool> {
        self.check_alphabet(input)?;
        Ok(self.accepts(input))
    }

    /// Fail on the first symbol that is not part of the alphabet
    pub fn check_alphabet(&self, input: &str) -> Result<()> {
        match input
            .chars()
            .enumerate()
            .find(|(_, symbol)| !self.alphabet.contains(symbol))
        {
            Some((position, symbol)) => Err(GrammarError::UnknownSymbol { symbol, position }),
            None => Ok(()),
        }
    }

    /// Destination states for one (state, symbol) pair; empty when there are none
    pub fn destinations(&self, state: State, symbol: char) -> &BTreeSet<State> {
        self.transitions.get(&(state, symbol)).unwrap_or(&NO_STATES)
    }

    /// The transition relation, sorted by source state and symbol
    pub fn transitions(&self) -> Vec<Transition> {
        let mut transitions: Vec<Transition> = self
            .transitions
            .iter()
            .map(|(&(from, symbol), to)| Transition {
                from,
                symbol,
                to: to.clone(),
            })
            .collect();
        transitions.sort_by_key(|t| (t.from, t.symbol));
        transitions
    }

    /// Number of (state, symbol, destination) edges
    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(BTreeSet::len).sum()
    }

    /// True when no (state, symbol) pair has more than one destination
    pub fn is_deterministic(&self) -> bool {
        self.transitions.values().all(|to| to.len() <= 1)
    }

    /// Convert back into a right-linear grammar.
    ///
    /// `(q, a) -> p` becomes `q -> ap`, and `(q, a) -> end` becomes `q -> a`.
    /// Edges into dead states are dropped, which leaves the language unchanged.
    pub fn to_grammar(&self) -> Result<Grammar> {
        let start = match self.start_state {
            State::NonTerminal(start) => start,
            State::End => {
                return Err(GrammarError::InvalidGrammar(
                    "start state is the accept state".to_string(),
                ));
            }
        };

        let dead = self.dead_states();
        if dead.contains(&self.start_state) {
            return Err(GrammarError::InvalidGrammar(format!(
                "start state {} has no path to an accept state",
                start
            )));
        }

        let mut rules = Vec::new();
        for transition in self.transitions() {
            let State::NonTerminal(lhs) = transition.from else {
                return Err(GrammarError::InvalidGrammar(format!(
                    "accept state has outgoing transition on '{}'",
                    transition.symbol
                )));
            };
            for dest in transition.to.difference(&dead) {
                let rhs = match *dest {
                    State::NonTerminal(next) => vec![transition.symbol, next],
                    State::End => vec![transition.symbol],
                };
                rules.push(RawRule { lhs: vec![lhs], rhs });
            }
        }

        Grammar::from_definition(&GrammarDefinition {
            terminals: self.alphabet.iter().copied().collect(),
            non_terminals: self
                .states
                .iter()
                .filter_map(|state| match state {
                    State::NonTerminal(c) => Some(*c),
                    State::End => None,
                })
                .collect(),
            start: Some(start),
            rules,
        })
    }

    /// Non-accepting states left without outgoing edges once edges into
    /// other dead states are removed
    fn dead_states(&self) -> BTreeSet<State> {
        let mut dead = BTreeSet::new();
        loop {
            let newly_dead: Vec<State> = self
                .states
                .iter()
                .copied()
                .filter(|state| !self.accept_states.contains(state) && !dead.contains(state))
                .filter(|state| {
                    self.transitions
                        .iter()
                        .filter(|((from, _), _)| from == state)
                        .all(|(_, to)| to.is_subset(&dead))
                })
                .collect();
            if newly_dead.is_empty() {
                return dead;
            }
            trace!("dead states: {:?}", newly_dead);
            dead.extend(newly_dead);
        }
    }

    pub fn states(&self) -> &BTreeSet<State> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn start_state(&self) -> State {
        self.start_state
    }

    pub fn accept_states(&self) -> &BTreeSet<State> {
        &self.accept_states
    }
}

impl Serialize for Automaton {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Automaton", 5)?;
        state.serialize_field("states", &self.states)?;
        state.serialize_field("alphabet", &self.alphabet)?;
        state.serialize_field("transitions", &self.transitions())?;
        state.serialize_field("start_state", &self.start_state)?;
        state.serialize_field("accept_states", &self.accept_states)?;
        state.end()
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join(", ");

        writeln!(
            f,
            "states: {{{}}}",
            join(self.states.iter().map(State::to_string).collect())
        )?;
        writeln!(
            f,
            "alphabet: {{{}}}",
            join(self.alphabet.iter().map(char::to_string).collect())
        )?;
        writeln!(f, "start: {}", self.start_state)?;
        writeln!(
            f,
            "accept: {{{}}}",
            join(self.accept_states.iter().map(State::to_string).collect())
        )?;
        writeln!(f, "transitions:")?;
        for transition in self.transitions() {
            writeln!(
                f,
                "  ({}, {}) -> {{{}}}",
                transition.from,
                transition.symbol,
                join(transition.to.iter().map(State::to_string).collect())
            )?;
        }
        Ok(())
    }
}
