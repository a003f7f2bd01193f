use clap::{ArgAction, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use regular_grammar::{Grammar, GrammarDefinition, classify};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};

/// Fresh draws per sample before a depth failure is reported
const GENERATION_ATTEMPTS: usize = 10;

/// Right-linear grammar compiler and sentence generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a grammar, generate samples and check them together with literal strings
    Demo {
        /// Grammar file (text or .json); the built-in sample grammar when omitted
        #[arg(short, long)]
        grammar: Option<PathBuf>,

        /// Number of strings to generate
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,

        /// Seed for the random generator
        #[arg(long)]
        seed: Option<u64>,

        /// Literal strings to check in addition to the generated ones
        strings: Vec<String>,
    },

    /// Generate random strings from a grammar
    Generate {
        /// Path to the grammar file
        grammar_file: PathBuf,

        /// Number of strings to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Seed for the random generator
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum number of non-terminal expansions per string
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Check strings for membership in the grammar's language
    Check {
        /// Path to the grammar file
        grammar_file: PathBuf,

        /// Reject symbols outside the alphabet with an error
        #[arg(long)]
        strict: bool,

        /// Strings to check
        #[arg(required = true)]
        strings: Vec<String>,
    },

    /// Print the automaton compiled from a grammar
    Compile {
        /// Path to the grammar file
        grammar_file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Report the Chomsky type of a grammar
    Classify {
        /// Path to the grammar file
        grammar_file: PathBuf,
    },

    /// Write the sample grammar to a file
    Example {
        /// Output file path
        #[arg(help = "Output file path")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Demo {
            grammar,
            count,
            seed,
            strings,
        } => {
            let grammar = match grammar {
                Some(path) => load_grammar(&path)?,
                None => Grammar::sample()?,
            };
            let fa = grammar.compile();
            println!("{}", fa);

            let mut test_strings = if strings.is_empty() {
                vec!["jaeed".to_string(), "afje".to_string()]
            } else {
                strings
            };
            let mut rng = make_rng(seed);
            let max_depth = grammar.config().max_recursion_depth;
            for _ in 0..count {
                match grammar.generate_with_retries(&mut rng, max_depth, GENERATION_ATTEMPTS) {
                    Ok(generated) => test_strings.push(generated),
                    Err(err) => warn!("skipping sample: {}", err),
                }
            }

            println!("Generated strings: {:?}", test_strings);
            for s in &test_strings {
                println!("String '{}' is accepted: {}", s, fa.accepts(s));
            }
        }
        Commands::Generate {
            grammar_file,
            count,
            seed,
            max_depth,
        } => {
            let grammar = load_grammar(&grammar_file)?;
            let max_depth = max_depth.unwrap_or(grammar.config().max_recursion_depth);
            let mut rng = make_rng(seed);

            for i in 0..count {
                match grammar.generate_with_retries(&mut rng, max_depth, GENERATION_ATTEMPTS) {
                    Ok(generated) => println!("{}. {}", i + 1, generated),
                    Err(err) => warn!("skipping sample {}: {}", i + 1, err),
                }
            }
        }
        Commands::Check {
            grammar_file,
            strict,
            strings,
        } => {
            let fa = load_grammar(&grammar_file)?.compile();
            for s in &strings {
                let accepted = if strict {
                    fa.accepts_strict(s)?
                } else {
                    fa.accepts(s)
                };
                println!("String '{}' is accepted: {}", s, accepted);
            }
        }
        Commands::Compile { grammar_file, json } => {
            let fa = load_grammar(&grammar_file)?.compile();
            if json {
                println!("{}", serde_json::to_string_pretty(&fa)?);
            } else {
                print!("{}", fa);
                println!("deterministic: {}", fa.is_deterministic());
            }
        }
        Commands::Classify { grammar_file } => {
            let definition = GrammarDefinition::from_file(&grammar_file)?;
            println!("Classification: {}", classify(&definition));
        }
        Commands::Example { output } => {
            let output_path = output.unwrap_or_else(|| PathBuf::from("example_grammar.txt"));
            fs::write(&output_path, GrammarDefinition::sample().to_text())?;
            println!("Created example grammar at: {}", output_path.display());
        }
    }

    Ok(())
}

fn load_grammar(path: &Path) -> Result<Grammar, Box<dyn std::error::Error>> {
    info!("loading grammar from {}", path.display());
    let grammar = Grammar::from_file(path)?;
    info!(
        "loaded {} rules over {} non-terminals",
        grammar.rule_count(),
        grammar.non_terminals().len()
    );
    Ok(grammar)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
