use regular_grammar::{GrammarBuilder, GrammarConfig, GrammarDefinition, classify};
use std::error::Error;

/// Example of creating grammars programmatically and from text
fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: binary numbers without leading zeros, built programmatically
    let binary = GrammarBuilder::new('N')
        .terminals("01")
        .non_terminals("NR")
        .add_rules('N', &["0", "1", "1R"])
        .add_rules('R', &["0R", "1R", "0", "1"])
        .build()?;
    let fa = binary.compile();

    println!("Binary numbers:");
    for input in ["0", "101", "0101", "1102"] {
        println!("  {:>6} accepted: {}", input, fa.accepts(input));
    }
    for i in 1..=3 {
        println!("  {}. {}", i, binary.generate()?);
    }

    // Example 2: unit productions resolved during compilation
    let mut config = GrammarConfig::default();
    config.max_recursion_depth = 30;

    let identifiers = GrammarBuilder::new('I')
        .terminals("xyz0")
        .non_terminals("ILT")
        .config(config)
        .add_rules('I', &["xT", "yT", "x", "y"])
        .add_rule('T', "L")
        .add_rules('L', &["zT", "0T", "z", "0"])
        .build()?;
    let fa = identifiers.compile();

    println!("\nIdentifiers:");
    println!("  deterministic: {}", fa.is_deterministic());
    for input in ["x", "xz0", "0x", "yzz"] {
        println!("  {:>4} accepted: {}", input, fa.accepts(input));
    }

    // Example 3: classifying a grammar that cannot be compiled
    let context_free = GrammarDefinition::from_text("S -> aSb\nS -> ab")?;
    println!("\n{}", classify(&context_free));

    Ok(())
}
