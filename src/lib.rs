//! Regular-Grammar compiles right-linear grammars into nondeterministic finite automata.
//!
//! A [`Grammar`] holds terminals, non-terminals, productions of the form
//! `A -> aB`, `A -> a` or `A -> B`, and a start symbol. It can generate random
//! sentences of its language and compile itself into an [`Automaton`] that
//! decides membership of arbitrary strings.
//!
//! # Example
//!
//! ```rust
//! use regular_grammar::GrammarBuilder;
//!
//! let grammar = GrammarBuilder::new('S')
//!     .terminals("dfj")
//!     .non_terminals("SLD")
//!     .add_rule('S', "dL")
//!     .add_rules('L', &["fL", "jD"])
//!     .add_rule('D', "d")
//!     .build()
//!     .unwrap();
//!
//! let fa = grammar.compile();
//! assert!(fa.accepts("dfjd"));
//! assert!(!fa.accepts("dfj"));
//!
//! let text = grammar.generate().unwrap();
//! assert!(fa.accepts(&text));
//! ```

pub mod automaton;
pub mod classify;
pub mod definition;
pub mod grammar;
pub mod utils;

pub use automaton::{Automaton, State, Transition};
pub use classify::{ChomskyType, classify};
pub use definition::{GrammarDefinition, RawRule};
pub use grammar::{Grammar, GrammarBuilder, GrammarConfig};
pub use utils::{GrammarError, Result};

// Re-export common enums and structs
pub use grammar::{Production, Symbol};
