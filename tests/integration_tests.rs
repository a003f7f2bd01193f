use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regular_grammar::{
    ChomskyType, Grammar, GrammarBuilder, GrammarConfig, GrammarDefinition, GrammarError, State,
    classify,
};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;

fn write_grammar(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_text_file() {
    // Test for comments to be ignored too.
    let file = write_grammar(
        ".txt",
        r#"
        # Test comment
        terminals: a b c d e f j
        non_terminals: S L D
        start: S
        S -> aS | bS | cD | dL | e
        L -> eL | fL | jD | e
        D -> eD | d
        "#,
    );

    let grammar = Grammar::from_file(file.path()).unwrap();
    assert!(grammar.has_non_terminal('L'));
    assert_eq!(grammar.rule_count(), 11);

    let fa = grammar.compile();
    assert!(fa.accepts("dfjd"));
    assert!(!fa.accepts("dfj"));
}

#[test]
fn test_load_from_json_file() {
    let file = write_grammar(
        ".json",
        r#"{
            "terminals": ["a", "b", "c", "d", "e", "f", "j"],
            "non_terminals": ["S", "L", "D"],
            "start": "S",
            "rules": ["S-aS", "S-bS", "S-cD", "S-dL", "S-e", "L-eL", "L-fL", "L-jD", "L-e", "D-eD", "D-d"]
        }"#,
    );

    let from_json = Grammar::from_file(file.path()).unwrap();
    let sample = Grammar::sample().unwrap();
    assert_eq!(from_json.compile(), sample.compile());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Grammar::from_file(dir.path().join("missing.txt"));
    assert!(matches!(result, Err(GrammarError::Io(_))));
}

#[test]
fn test_generated_strings_are_accepted() {
    let grammar = Grammar::sample().unwrap();
    let fa = grammar.compile();
    let mut rng = StdRng::seed_from_u64(2024);

    let mut generated = 0;
    while generated < 500 {
        match grammar.generate_with(&mut rng, 200) {
            Ok(text) => {
                assert!(fa.accepts(&text), "generated string {text:?} was rejected");
                generated += 1;
            }
            // Long `S -> aS` runs may hit the bound; draw again
            Err(GrammarError::GenerationDepthExceeded { .. }) => {}
            Err(err) => panic!("Unexpected error: {err}"),
        }
    }
}

#[test]
fn test_generated_strings_with_unit_productions() {
    // S -> A | aS, A -> B | bA, B -> c
    let grammar = GrammarBuilder::new('S')
        .terminals("abc")
        .non_terminals("SAB")
        .add_rules('S', &["A", "aS"])
        .add_rules('A', &["B", "bA"])
        .add_rule('B', "c")
        .build()
        .unwrap();
    let fa = grammar.compile();
    let mut rng = StdRng::seed_from_u64(9);

    for _ in 0..200 {
        if let Ok(text) = grammar.generate_with(&mut rng, 500) {
            assert!(fa.accepts(&text), "generated string {text:?} was rejected");
            assert!(text.ends_with('c'));
        }
    }
}

#[test]
fn test_non_derivable_strings_rejected() {
    let fa = Grammar::sample().unwrap().compile();

    for s in ["", "xz", "jaeed", "afje", "dfj", "d", "c", "cd d", "ee"] {
        assert!(!fa.accepts(s), "{s:?} should be rejected");
    }
}

#[test]
fn test_compile_twice_identical() {
    let grammar = Grammar::sample().unwrap();
    let first = grammar.compile();
    let second = grammar.compile();

    assert_eq!(first.transitions(), second.transitions());
    assert_eq!(first, second);
}

#[test]
fn test_rule_order_does_not_matter() {
    let forward = GrammarBuilder::new('S')
        .terminals("ab")
        .non_terminals("SA")
        .add_rules('S', &["aA", "b"])
        .add_rules('A', &["aS", "b"])
        .build()
        .unwrap();
    let backward = GrammarBuilder::new('S')
        .terminals("ab")
        .non_terminals("SA")
        .add_rules('A', &["b", "aS"])
        .add_rules('S', &["b", "aA"])
        .build()
        .unwrap();

    assert_eq!(forward.compile(), backward.compile());
}

#[test]
fn test_automaton_shape() {
    let fa = Grammar::sample().unwrap().compile();

    let expected_states: BTreeSet<State> = [
        State::NonTerminal('D'),
        State::NonTerminal('L'),
        State::NonTerminal('S'),
        State::End,
    ]
    .into_iter()
    .collect();
    assert_eq!(fa.states(), &expected_states);
    assert_eq!(
        fa.alphabet().iter().collect::<String>(),
        "abcdefj".to_string()
    );
    assert!(fa.accept_states().is_subset(fa.states()));
    assert!(fa.states().contains(&fa.start_state()));
    for transition in fa.transitions() {
        assert!(transition.to.is_subset(fa.states()));
    }
}

#[test]
fn test_malformed_productions() {
    let cases = [
        ("S", "abS"),
        ("S", "$"),
        ("S", "Sa"),
        ("S", "z"),
    ];
    for (lhs, rhs) in cases {
        let definition = GrammarDefinition::from_text(&format!(
            "terminals: a b\nnon_terminals: S\nstart: S\nS -> a\n{lhs} -> {rhs}"
        ))
        .unwrap();
        match Grammar::from_definition(&definition) {
            Err(GrammarError::MalformedProduction { reason, .. }) => assert!(!reason.is_empty()),
            other => panic!("Expected MalformedProduction for {lhs} -> {rhs}, got {other:?}"),
        }
    }
}

#[test]
fn test_inferred_vocabulary_reports_missing_rule() {
    let definition = GrammarDefinition::from_text("S -> aA | b").unwrap();

    assert!(matches!(
        Grammar::from_definition(&definition),
        Err(GrammarError::UnknownNonTerminal('A'))
    ));
}

#[test]
fn test_context_free_rules_are_rejected_but_classified() {
    let definition = GrammarDefinition::from_text(
        "terminals: a b c\nnon_terminals: S X Y Z\nS -> XYZ\nX -> aX | a\nY -> bY | b\nZ -> cZ | c",
    )
    .unwrap();

    assert_eq!(classify(&definition), ChomskyType::ContextFree);
    assert!(matches!(
        Grammar::from_definition(&definition),
        Err(GrammarError::MalformedProduction { .. })
    ));
}

#[test]
fn test_grammar_config() {
    let mut config = GrammarConfig::default();
    assert_eq!(config.max_recursion_depth, 100);
    config.max_recursion_depth = 3;

    let grammar = GrammarBuilder::new('S')
        .terminals("a")
        .non_terminals("S")
        .add_rule('S', "aS")
        .config(config)
        .build()
        .unwrap();

    assert_eq!(grammar.config().max_recursion_depth, 3);
    assert!(matches!(
        grammar.generate(),
        Err(GrammarError::GenerationDepthExceeded { limit: 3 })
    ));
}

#[test]
fn test_example_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("example_grammar.txt");
    {
        let mut file = File::create(&path).unwrap();
        file.write_all(GrammarDefinition::sample().to_text().as_bytes())
            .unwrap();
    }

    let grammar = Grammar::from_file(&path).unwrap();
    assert_eq!(grammar.compile(), Grammar::sample().unwrap().compile());
}
