//! Chomsky hierarchy classification of raw rule sets.

use std::fmt;

use crate::definition::{GrammarDefinition, RawRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChomskyType {
    /// Type 0
    Unrestricted,
    /// Type 1
    ContextSensitive,
    /// Type 2
    ContextFree,
    /// Type 3
    Regular,
}

impl fmt::Display for ChomskyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChomskyType::Regular => "Regular Grammar (Type 3)",
            ChomskyType::ContextFree => "Context-Free Grammar (Type 2)",
            ChomskyType::ContextSensitive => "Context-Sensitive Grammar (Type 1)",
            ChomskyType::Unrestricted => "Recursively Enumerable Grammar (Type 0)",
        };
        write!(f, "{}", name)
    }
}

/// Classify a grammar into the most restrictive type every rule satisfies
pub fn classify(definition: &GrammarDefinition) -> ChomskyType {
    let non_terminals = definition.resolved_non_terminals();
    let terminals = definition.resolved_terminals();
    let start = definition.start_symbol();

    let is_non_terminal = |c: &char| non_terminals.contains(c);
    let is_terminal = |c: &char| terminals.contains(c);

    let single_non_terminal_lhs =
        |rule: &RawRule| rule.single_lhs().is_some_and(|c| is_non_terminal(&c));

    let regular = definition.rules.iter().all(|rule| {
        single_non_terminal_lhs(rule)
            && match rule.rhs.as_slice() {
                [] => true,
                [only] => is_terminal(only) || is_non_terminal(only),
                [terminal, next] => is_terminal(terminal) && is_non_terminal(next),
                _ => false,
            }
    });
    if regular {
        return ChomskyType::Regular;
    }

    if definition.rules.iter().all(single_non_terminal_lhs) {
        return ChomskyType::ContextFree;
    }

    // Only the start symbol may erase itself
    let non_contracting = definition.rules.iter().all(|rule| {
        if rule.rhs.is_empty() {
            rule.single_lhs().is_some() && rule.single_lhs() == start
        } else {
            rule.rhs.len() >= rule.lhs.len()
        }
    });
    if non_contracting {
        return ChomskyType::ContextSensitive;
    }

    ChomskyType::Unrestricted
}
