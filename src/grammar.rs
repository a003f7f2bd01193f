use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, trace, warn};

use crate::automaton::{Automaton, State};
use crate::definition::{GrammarDefinition, RawRule};
use crate::utils::{GrammarError, OptionExt, Result, render_symbols};

/// Represents a symbol in the grammar, either a terminal or a non-terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// A terminal symbol (consumed from the input)
    Terminal(char),
    /// A non-terminal symbol (reference to another rule)
    NonTerminal(char),
}

impl Symbol {
    /// The character naming this symbol
    pub fn as_char(&self) -> char {
        match *self {
            Symbol::Terminal(c) | Symbol::NonTerminal(c) => c,
        }
    }
}

/// Represents the right side of a right-linear production rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    /// `A -> a`: consuming the terminal completes a derivation
    Terminal(char),
    /// `A -> aB`: consume the terminal, continue with the non-terminal
    Step { terminal: char, next: char },
    /// `A -> B`: derive whatever `B` derives without consuming input
    Unit(char),
}

impl Production {
    /// The sequence of symbols on the right side
    pub fn elements(&self) -> Vec<Symbol> {
        match *self {
            Production::Terminal(t) => vec![Symbol::Terminal(t)],
            Production::Step { terminal, next } => {
                vec![Symbol::Terminal(terminal), Symbol::NonTerminal(next)]
            }
            Production::Unit(n) => vec![Symbol::NonTerminal(n)],
        }
    }

    /// The non-terminal this production continues with, if any
    pub fn next_non_terminal(&self) -> Option<char> {
        match *self {
            Production::Terminal(_) => None,
            Production::Step { next, .. } => Some(next),
            Production::Unit(n) => Some(n),
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in self.elements() {
            write!(f, "{}", symbol.as_char())?;
        }
        Ok(())
    }
}

/// Configuration options for grammar behavior
#[derive(Debug, Clone)]
pub struct GrammarConfig {
    /// Maximum number of non-terminal expansions while generating a string
    pub max_recursion_depth: usize,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            max_recursion_depth: 100,
        }
    }
}

/// A validated right-linear grammar
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Non-terminals (V_n)
    non_terminals: BTreeSet<char>,
    /// Terminals (V_t)
    terminals: BTreeSet<char>,
    /// The rules mapping non-terminals to productions, in declaration order
    rules: BTreeMap<char, Vec<Production>>,
    /// The starting symbol
    start_symbol: char,
    /// Configuration options
    config: GrammarConfig,
}

impl Grammar {
    /// Validate a raw definition into a grammar.
    ///
    /// Every production must be `A -> a`, `A -> aB` or `A -> B` over the
    /// declared vocabulary, every non-terminal used on a right side needs at
    /// least one production, and so does the start symbol.
    pub fn from_definition(definition: &GrammarDefinition) -> Result<Self> {
        let non_terminals: BTreeSet<char> =
            definition.resolved_non_terminals().into_iter().collect();
        let terminals: BTreeSet<char> = definition.resolved_terminals().into_iter().collect();

        if let Some(shared) = non_terminals.intersection(&terminals).next() {
            return Err(GrammarError::InvalidGrammar(format!(
                "'{}' is declared both terminal and non-terminal",
                shared
            )));
        }

        let start_symbol = definition
            .start_symbol()
            .ok_or_grammar_err(|| "no start symbol".to_string())?;
        if !non_terminals.contains(&start_symbol) {
            return Err(GrammarError::UnknownNonTerminal(start_symbol));
        }

        let mut rules: BTreeMap<char, Vec<Production>> = BTreeMap::new();
        for rule in &definition.rules {
            let (lhs, production) = Self::parse_production(rule, &terminals, &non_terminals)?;
            rules.entry(lhs).or_default().push(production);
        }

        if !rules.contains_key(&start_symbol) {
            return Err(GrammarError::UnknownNonTerminal(start_symbol));
        }
        for production in rules.values().flatten() {
            if let Some(next) = production.next_non_terminal() {
                if !rules.contains_key(&next) {
                    return Err(GrammarError::UnknownNonTerminal(next));
                }
            }
        }

        Ok(Grammar {
            non_terminals,
            terminals,
            rules,
            start_symbol,
            config: GrammarConfig::default(),
        })
    }

    /// Parse a grammar from a text or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_definition(&GrammarDefinition::from_file(path)?)
    }

    /// The sample grammar used by the demo driver
    pub fn sample() -> Result<Self> {
        Self::from_definition(&GrammarDefinition::sample())
    }

    /// Classify a raw rule into one of the right-linear production shapes
    pub fn parse_production(
        rule: &RawRule,
        terminals: &BTreeSet<char>,
        non_terminals: &BTreeSet<char>,
    ) -> Result<(char, Production)> {
        let malformed = |reason: &str| GrammarError::MalformedProduction {
            lhs: render_symbols(&rule.lhs),
            rhs: render_symbols(&rule.rhs),
            reason: reason.to_string(),
        };

        let lhs = match rule.single_lhs() {
            Some(lhs) if non_terminals.contains(&lhs) => lhs,
            _ => return Err(malformed("left side must be a single declared non-terminal")),
        };

        let classify = |symbol: char| {
            if terminals.contains(&symbol) {
                Ok(Symbol::Terminal(symbol))
            } else if non_terminals.contains(&symbol) {
                Ok(Symbol::NonTerminal(symbol))
            } else {
                Err(malformed(&format!("'{}' is not declared", symbol)))
            }
        };

        let production = match rule.rhs.as_slice() {
            [] => return Err(malformed("right side is empty")),
            [only] => match classify(*only)? {
                Symbol::Terminal(t) => Production::Terminal(t),
                Symbol::NonTerminal(n) => Production::Unit(n),
            },
            [first, second] => match (classify(*first)?, classify(*second)?) {
                (Symbol::Terminal(terminal), Symbol::NonTerminal(next)) => {
                    Production::Step { terminal, next }
                }
                _ => return Err(malformed("expected a terminal followed by a non-terminal")),
            },
            _ => return Err(malformed("right side longer than two symbols")),
        };

        Ok((lhs, production))
    }

    /// Compile the grammar into an equivalent nondeterministic automaton.
    ///
    /// `A -> aB` becomes `(A, a) -> B` and `A -> a` becomes `(A, a) -> end`.
    /// Unit productions are resolved by closure: `A` receives the direct
    /// transitions of every non-terminal reachable from it through unit
    /// productions.
    pub fn compile(&self) -> Automaton {
        let mut direct: HashMap<char, Vec<(char, State)>> = HashMap::new();
        for (&lhs, productions) in &self.rules {
            for production in productions {
                let edge = match *production {
                    Production::Terminal(t) => (t, State::End),
                    Production::Step { terminal, next } => (terminal, State::NonTerminal(next)),
                    Production::Unit(_) => continue,
                };
                direct.entry(lhs).or_default().push(edge);
            }
        }

        let mut transitions: HashMap<(State, char), BTreeSet<State>> = HashMap::new();
        for &source in &self.non_terminals {
            for reachable in self.unit_closure(source) {
                if reachable != source {
                    trace!("epsilon: {} inherits transitions of {}", source, reachable);
                }
                for &(symbol, dest) in direct.get(&reachable).into_iter().flatten() {
                    transitions
                        .entry((State::NonTerminal(source), symbol))
                        .or_default()
                        .insert(dest);
                }
            }
        }

        let states = self
            .non_terminals
            .iter()
            .map(|&n| State::NonTerminal(n))
            .chain(std::iter::once(State::End))
            .collect();

        let automaton = Automaton::new(
            states,
            self.terminals.clone(),
            transitions,
            State::NonTerminal(self.start_symbol),
            BTreeSet::from([State::End]),
        );
        debug!(
            "compiled grammar with {} rules into automaton with {} transitions",
            self.rule_count(),
            automaton.transition_count()
        );
        automaton
    }

    /// Every non-terminal reachable from `source` through zero or more unit productions
    pub fn unit_closure(&self, source: char) -> BTreeSet<char> {
        let mut closure = BTreeSet::from([source]);
        let mut queue = VecDeque::from([source]);

        while let Some(current) = queue.pop_front() {
            for production in self.rules.get(&current).into_iter().flatten() {
                if let Production::Unit(next) = *production {
                    if closure.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        closure
    }

    /// Generate a random string using the configured depth and a thread-local RNG
    pub fn generate(&self) -> Result<String> {
        let mut rng = rand::thread_rng();
        self.generate_with(&mut rng, self.config.max_recursion_depth)
    }

    /// Generate a random string from the start symbol.
    ///
    /// Each non-terminal expansion picks one of its productions uniformly at
    /// random. Expanding more than `max_depth` non-terminals fails with
    /// [`GrammarError::GenerationDepthExceeded`].
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R, max_depth: usize) -> Result<String> {
        let mut result = String::new();
        let mut current = Some(self.start_symbol);
        let mut depth = 0;

        while let Some(symbol) = current {
            if depth >= max_depth {
                debug!("generation hit depth limit {} at {}", max_depth, symbol);
                return Err(GrammarError::GenerationDepthExceeded { limit: max_depth });
            }
            depth += 1;

            let production = self
                .rules
                .get(&symbol)
                .and_then(|productions| productions.choose(rng))
                .ok_or(GrammarError::UnknownNonTerminal(symbol))?;
            trace!("expand {} -> {}", symbol, production);

            current = match *production {
                Production::Terminal(t) => {
                    result.push(t);
                    None
                }
                Production::Step { terminal, next } => {
                    result.push(terminal);
                    Some(next)
                }
                Production::Unit(next) => Some(next),
            };
        }

        Ok(result)
    }

    /// Generate with a fresh draw after every depth failure, up to `attempts` draws (at least one)
    pub fn generate_with_retries<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_depth: usize,
        attempts: usize,
    ) -> Result<String> {
        for attempt in 1..attempts {
            match self.generate_with(rng, max_depth) {
                Err(GrammarError::GenerationDepthExceeded { limit }) => {
                    warn!(
                        "attempt {} of {} exceeded depth {}, drawing again",
                        attempt, attempts, limit
                    );
                }
                other => return other,
            }
        }
        self.generate_with(rng, max_depth)
    }

    /// Check if the grammar declares a specific non-terminal
    pub fn has_non_terminal(&self, symbol: char) -> bool {
        self.non_terminals.contains(&symbol)
    }

    /// Get a reference to the grammar's rules
    pub fn rules(&self) -> &BTreeMap<char, Vec<Production>> {
        &self.rules
    }

    /// Total number of productions
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn terminals(&self) -> &BTreeSet<char> {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &BTreeSet<char> {
        &self.non_terminals
    }

    /// Get the start symbol
    pub fn start_symbol(&self) -> char {
        self.start_symbol
    }

    /// Get a reference to the grammar's configuration
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// Set a new configuration
    pub fn set_config(&mut self, config: GrammarConfig) {
        self.config = config;
    }

    /// Replace the configuration, builder style
    pub fn with_config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Convert back into a raw definition
    pub fn to_definition(&self) -> GrammarDefinition {
        let rules = self
            .rules
            .iter()
            .flat_map(|(lhs, productions)| {
                productions.iter().map(move |production| RawRule {
                    lhs: vec![*lhs],
                    rhs: production.elements().iter().map(Symbol::as_char).collect(),
                })
            })
            .collect();

        GrammarDefinition {
            terminals: self.terminals.iter().copied().collect(),
            non_terminals: self.non_terminals.iter().copied().collect(),
            start: Some(self.start_symbol),
            rules,
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_definition().to_text())
    }
}

/// Builder for constructing Grammar instances
pub struct GrammarBuilder {
    definition: GrammarDefinition,
    config: GrammarConfig,
}

impl GrammarBuilder {
    /// Create a new grammar builder with default config
    pub fn new(start_symbol: char) -> Self {
        GrammarBuilder {
            definition: GrammarDefinition {
                start: Some(start_symbol),
                ..GrammarDefinition::default()
            },
            config: GrammarConfig::default(),
        }
    }

    /// Declare terminals, one per character
    pub fn terminals(mut self, symbols: &str) -> Self {
        self.definition
            .terminals
            .extend(symbols.chars().filter(|c| !c.is_whitespace()));
        self
    }

    /// Declare non-terminals, one per character
    pub fn non_terminals(mut self, symbols: &str) -> Self {
        self.definition
            .non_terminals
            .extend(symbols.chars().filter(|c| !c.is_whitespace()));
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a rule to the grammar; problems are reported by [`Self::build`]
    pub fn add_rule(mut self, non_terminal: char, rhs: &str) -> Self {
        self.definition
            .rules
            .push(RawRule::new(&non_terminal.to_string(), rhs));
        self
    }

    /// Add several alternatives for the same non-terminal
    pub fn add_rules(self, non_terminal: char, alternatives: &[&str]) -> Self {
        alternatives
            .iter()
            .fold(self, |builder, rhs| builder.add_rule(non_terminal, rhs))
    }

    /// Build and validate the grammar
    pub fn build(self) -> Result<Grammar> {
        Ok(Grammar::from_definition(&self.definition)?.with_config(self.config))
    }
}
