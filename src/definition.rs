//! Raw grammar descriptions as they are read from text or JSON files.
//!
//! A [`GrammarDefinition`] is not validated: rules may have any shape, which is
//! what [`crate::classify`] needs. [`crate::Grammar`] validates a definition
//! into the right-linear form it can compile.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::{GrammarError, Result, render_symbols};

/// A single rewrite rule `lhs -> rhs`, with an empty `rhs` standing for epsilon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RawRule {
    pub lhs: Vec<char>,
    pub rhs: Vec<char>,
}

impl RawRule {
    pub fn new(lhs: &str, rhs: &str) -> Self {
        RawRule {
            lhs: lhs.chars().filter(|c| !c.is_whitespace()).collect(),
            rhs: parse_side(rhs),
        }
    }

    /// Parse a single alternative such as `S-aS`, `S -> aS` or `A → $`
    pub fn parse(text: &str) -> Result<Self> {
        let rule_regex = rule_regex()?;
        let captures = rule_regex.captures(text.trim()).ok_or_else(|| GrammarError::Parse {
            line: 1,
            message: format!("expected a rule of the form `A -> aB`, found `{}`", text),
        })?;
        let rhs = captures.get(2).map_or("", |m| m.as_str());
        if rhs.contains('|') {
            return Err(GrammarError::Parse {
                line: 1,
                message: format!("`{}` holds several alternatives", text),
            });
        }
        Ok(RawRule::new(&captures[1], rhs))
    }

    /// True when the left side is exactly one symbol
    pub fn single_lhs(&self) -> Option<char> {
        match self.lhs.as_slice() {
            [symbol] => Some(*symbol),
            _ => None,
        }
    }
}

impl fmt::Display for RawRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", render_symbols(&self.lhs), render_symbols(&self.rhs))
    }
}

impl TryFrom<String> for RawRule {
    type Error = GrammarError;

    fn try_from(value: String) -> Result<Self> {
        RawRule::parse(&value)
    }
}

impl From<RawRule> for String {
    fn from(rule: RawRule) -> Self {
        rule.to_string()
    }
}

/// An unvalidated grammar: vocabulary, start symbol and rule list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDefinition {
    #[serde(default)]
    pub terminals: Vec<char>,
    #[serde(default)]
    pub non_terminals: Vec<char>,
    #[serde(default)]
    pub start: Option<char>,
    pub rules: Vec<RawRule>,
}

impl GrammarDefinition {
    /// The grammar used by the demo driver
    pub fn sample() -> Self {
        let rules = [
            "S-aS", "S-bS", "S-cD", "S-dL", "S-e", "L-eL", "L-fL", "L-jD", "L-e", "D-eD", "D-d",
        ];
        GrammarDefinition {
            terminals: "abcdefj".chars().collect(),
            non_terminals: "SLD".chars().collect(),
            start: Some('S'),
            rules: rules
                .iter()
                .map(|rule| {
                    let (lhs, rhs) = rule.split_once('-').unwrap_or((*rule, ""));
                    RawRule::new(lhs, rhs)
                })
                .collect(),
        }
    }

    /// Parse a grammar from a file, picking the format from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_text(&content),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let definition: GrammarDefinition = serde_json::from_str(json)?;
        Ok(definition)
    }

    /// Parse the line-oriented text format
    pub fn from_text(text: &str) -> Result<Self> {
        let directive_regex =
            Regex::new(r"^(terminals|non_terminals|nonterminals|start)\s*:\s*(.*)$")?;
        let rule_regex = rule_regex()?;

        let mut definition = GrammarDefinition::default();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(captures) = directive_regex.captures(trimmed) {
                let symbols: Vec<char> = captures[2]
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != ',')
                    .collect();
                match &captures[1] {
                    "terminals" => definition.terminals.extend(symbols),
                    "start" => match symbols.as_slice() {
                        [symbol] => definition.start = Some(*symbol),
                        _ => {
                            return Err(GrammarError::Parse {
                                line: line_no,
                                message: format!(
                                    "start must be a single symbol, found `{}`",
                                    &captures[2]
                                ),
                            });
                        }
                    },
                    _ => definition.non_terminals.extend(symbols),
                }
                continue;
            }

            let captures = rule_regex.captures(trimmed).ok_or_else(|| GrammarError::Parse {
                line: line_no,
                message: format!("expected a rule or directive, found `{}`", trimmed),
            })?;
            let lhs = &captures[1];
            let alternatives = captures.get(2).map_or("", |m| m.as_str());
            for alternative in alternatives.split('|') {
                definition.rules.push(RawRule::new(lhs, alternative));
            }
        }

        if definition.rules.is_empty() {
            return Err(GrammarError::InvalidGrammar(
                "grammar defines no rules".to_string(),
            ));
        }

        Ok(definition)
    }

    /// The declared start symbol, or the left side of the first rule
    pub fn start_symbol(&self) -> Option<char> {
        self.start
            .or_else(|| self.rules.first().and_then(RawRule::single_lhs))
    }

    /// Declared non-terminals, or when none are declared every single-symbol
    /// left side followed by upper-case right-side symbols
    pub fn resolved_non_terminals(&self) -> Vec<char> {
        if !self.non_terminals.is_empty() {
            return self.non_terminals.clone();
        }
        let lhs_symbols = self.rules.iter().filter_map(RawRule::single_lhs);
        let rhs_symbols = self
            .rules
            .iter()
            .flat_map(|rule| rule.rhs.iter().copied())
            .filter(|c| c.is_uppercase());

        let mut symbols = Vec::new();
        for symbol in lhs_symbols.chain(rhs_symbols) {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        symbols
    }

    /// Declared terminals, or every rule symbol that is not a non-terminal
    pub fn resolved_terminals(&self) -> Vec<char> {
        if !self.terminals.is_empty() {
            return self.terminals.clone();
        }
        let non_terminals = self.resolved_non_terminals();
        let mut symbols = Vec::new();
        for rule in &self.rules {
            for &symbol in rule.lhs.iter().chain(rule.rhs.iter()) {
                if !non_terminals.contains(&symbol) && !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }
        symbols
    }

    /// Render the definition in the text format understood by [`Self::from_text`]
    pub fn to_text(&self) -> String {
        let join = |symbols: &[char]| {
            symbols
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut out = String::new();
        out.push_str(&format!("terminals: {}\n", join(&self.resolved_terminals())));
        out.push_str(&format!(
            "non_terminals: {}\n",
            join(&self.resolved_non_terminals())
        ));
        if let Some(start) = self.start_symbol() {
            out.push_str(&format!("start: {}\n", start));
        }

        // Group consecutive alternatives of the same left side onto one line
        let mut idx = 0;
        while idx < self.rules.len() {
            let lhs = &self.rules[idx].lhs;
            let mut alternatives = Vec::new();
            while idx < self.rules.len() && &self.rules[idx].lhs == lhs {
                alternatives.push(render_symbols(&self.rules[idx].rhs));
                idx += 1;
            }
            out.push_str(&format!(
                "{} -> {}\n",
                render_symbols(lhs),
                alternatives.join(" | ")
            ));
        }
        out
    }
}

impl FromStr for GrammarDefinition {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

fn rule_regex() -> Result<Regex> {
    Ok(Regex::new(r"^(\S+?)\s*(?:->|→|-)\s*(.*)$")?)
}

/// Right sides drop whitespace; `$` and `ε` on their own mean the empty side
fn parse_side(text: &str) -> Vec<char> {
    let symbols: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    match symbols.as_slice() {
        ['$'] | ['ε'] => Vec::new(),
        _ => symbols,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rule_forms() {
        assert_eq!(RawRule::parse("S-aS").unwrap(), RawRule::new("S", "aS"));
        assert_eq!(RawRule::parse("S -> aS").unwrap(), RawRule::new("S", "aS"));
        assert_eq!(RawRule::parse("S→e").unwrap(), RawRule::new("S", "e"));
        assert_eq!(RawRule::parse("aXb-Y").unwrap().lhs, vec!['a', 'X', 'b']);
        assert!(RawRule::parse("B-$").unwrap().rhs.is_empty());
        assert!(RawRule::parse("no arrow here").is_err());
        assert!(RawRule::parse("S -> a | b").is_err());
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(RawRule::new("S", "aS").to_string(), "S-aS");
        assert_eq!(RawRule::new("A", "$").to_string(), "A-$");
    }

    #[test]
    fn test_from_text() {
        let text = r#"
            # Sample grammar
            terminals: a, b
            non_terminals: S A
            start: S
            S -> aA | b
            A-bS
        "#;
        let definition = GrammarDefinition::from_text(text).unwrap();

        assert_eq!(definition.terminals, vec!['a', 'b']);
        assert_eq!(definition.non_terminals, vec!['S', 'A']);
        assert_eq!(definition.start, Some('S'));
        assert_eq!(
            definition.rules,
            vec![
                RawRule::new("S", "aA"),
                RawRule::new("S", "b"),
                RawRule::new("A", "bS"),
            ]
        );
    }

    #[test]
    fn test_from_text_errors() {
        let err = GrammarDefinition::from_text("start: SA\nS-a").unwrap_err();
        assert!(matches!(err, GrammarError::Parse { line: 1, .. }));

        let err = GrammarDefinition::from_text("S-a\n???").unwrap_err();
        assert!(matches!(err, GrammarError::Parse { line: 2, .. }));

        let err = GrammarDefinition::from_text("# only a comment").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidGrammar(_)));
    }

    #[test]
    fn test_inferred_vocabulary() {
        let definition = GrammarDefinition::from_text("S-aS\nS-bA\nA-c").unwrap();

        assert_eq!(definition.start_symbol(), Some('S'));
        assert_eq!(definition.resolved_non_terminals(), vec!['S', 'A']);
        assert_eq!(definition.resolved_terminals(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_inferred_non_terminal_without_rules() {
        let definition = GrammarDefinition::from_text("S -> aA | b").unwrap();

        assert_eq!(definition.resolved_non_terminals(), vec!['S', 'A']);
        assert_eq!(definition.resolved_terminals(), vec!['a', 'b']);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "terminals": ["a", "b"],
            "non_terminals": ["S"],
            "start": "S",
            "rules": ["S-aS", "S -> b"]
        }"#;
        let definition = GrammarDefinition::from_json_str(json).unwrap();
        assert_eq!(
            definition.rules,
            vec![RawRule::new("S", "aS"), RawRule::new("S", "b")]
        );

        let encoded = serde_json::to_string(&definition).unwrap();
        assert!(encoded.contains(r#""S-aS""#));

        assert!(GrammarDefinition::from_json_str(r#"{"rules": ["nope"]}"#).is_err());
    }

    #[test]
    fn test_to_text_reparses() {
        let sample = GrammarDefinition::sample();
        let text = sample.to_text();

        assert!(text.contains("S -> aS | bS | cD | dL | e"));
        assert_eq!(GrammarDefinition::from_text(&text).unwrap(), sample);
    }
}
