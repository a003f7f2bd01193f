use rand::SeedableRng;
use rand::rngs::StdRng;
use regular_grammar::Grammar;
use std::error::Error;

/// Compile the sample grammar, then check literal and generated strings against it
fn main() -> Result<(), Box<dyn Error>> {
    let grammar = Grammar::sample()?;
    let fa = grammar.compile();
    println!("{}", fa);

    let mut test_strings = vec!["jaeed".to_string(), "afje".to_string()];
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..5 {
        test_strings.push(grammar.generate_with(&mut rng, 100)?);
    }

    println!("Generated strings: {:?}", test_strings);
    for s in &test_strings {
        println!("String '{}' is accepted: {}", s, fa.accepts(s));
    }

    Ok(())
}
