//! Wordle Sieve CLI
//!
//! Command-line front end for translating clues, retrieving candidates and
//! filtering them.

use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use wordle_sieve::logging;
use wordle_sieve::{
    filter_candidates, load_word_list, Error, HttpTransport, RuleSet, Settings, Sieve, SieveReport,
    ThreadPause,
};

#[derive(Debug, Parser)]
#[command(
    name = "wordle-sieve",
    version,
    about = "Find Wordle candidates from plain-language clues"
)]
struct Cli {
    /// Settings file (TOML). Defaults to ./wordle-sieve.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Translate clues, retrieve candidates and filter them
    Run {
        /// Clue text; read from stdin when omitted
        text: Vec<String>,
        /// Cross-check matches against the dictionary service
        #[arg(long)]
        validate: bool,
    },
    /// Like `run`, but from rule-language text instead of free text
    Rules {
        /// Rule file, or `-` for stdin
        file: PathBuf,
        #[arg(long)]
        validate: bool,
    },
    /// Compile rule-language text and print the canonical form
    Compile {
        /// Rule file, or `-` for stdin
        file: PathBuf,
    },
    /// Filter a local word list with rule-language text (no network)
    Filter {
        #[arg(long)]
        rules: PathBuf,
        /// One word per line
        #[arg(long)]
        words: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(logging::level_for(cli.verbose), cli.json_logs) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Run { text, validate } => {
            let settings = Settings::load(cli.config.as_deref())?;
            settings.api_key()?;

            let text = if text.is_empty() {
                read_input(Path::new("-"))?
            } else {
                text.join(" ")
            };
            if text.trim().is_empty() {
                return Err(Error::Configuration("no clue text provided".to_string()));
            }

            let mut sieve = build_sieve(&settings, validate)?;
            let report = sieve.run(&text)?;
            print_report(&report);
        }
        Command::Rules { file, validate } => {
            let settings = Settings::load(cli.config.as_deref())?;
            let rule_text = read_input(&file)?;

            let mut sieve = build_sieve(&settings, validate)?;
            let report = sieve.run_rules(&rule_text)?;
            print_report(&report);
        }
        Command::Compile { file } => {
            let rules = RuleSet::compile(&read_input(&file)?);
            println!("{}", rules);
            match rules.seed() {
                Some(seed) => println!("# seed: {}", seed),
                None => println!("# seed: none (add an '<LETTER> AT <N>' rule)"),
            }
        }
        Command::Filter { rules, words } => {
            let rules = RuleSet::compile(&read_input(&rules)?);
            let words = load_word_list(&read_input(&words)?);
            let outcome = filter_candidates(&words, &rules);

            for word in &outcome.accepted {
                println!("{}", word);
            }
            println!();
            println!(
                "{} of {} words match ({} rejected)",
                outcome.accepted.len(),
                words.len(),
                outcome.rejected_total()
            );
        }
    }
    Ok(())
}

fn build_sieve(settings: &Settings, validate: bool) -> Result<Sieve, Error> {
    let transport = HttpTransport::new().map_err(|e| Error::Configuration(e.to_string()))?;
    Ok(Sieve::from_settings(
        settings,
        Arc::new(transport),
        Arc::new(ThreadPause),
        validate,
    ))
}

fn read_input(path: &Path) -> Result<String, Error> {
    let result = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map(|_| buffer)
    } else {
        std::fs::read_to_string(path)
    };
    result.map_err(|e| Error::Configuration(format!("failed to read {}: {}", path.display(), e)))
}

fn print_report(report: &SieveReport) {
    println!("Rules:");
    for line in report.rules.to_rule_text().lines() {
        println!("  {}", line);
    }
    println!();

    if let Some(diagnostic) = &report.diagnostic {
        println!("No candidates retrieved: {}", diagnostic);
        return;
    }

    if let Some(seed) = report.seed {
        println!(
            "Seed: {} ({} page(s), {} distinct words)",
            seed, report.pages, report.collected
        );
    }

    if report.matches.is_empty() {
        println!("No words match these rules.");
    } else {
        println!("Matches ({}):", report.matches.len());
        for (i, word) in report.matches.iter().enumerate() {
            if i > 0 && i % 10 == 0 {
                println!();
            }
            print!("{:>8}", word);
        }
        println!();
    }

    println!();
    println!("Rejected by rules: {}", report.rejected);
    for (kind, count) in &report.rejections {
        println!("  {:<8} {}", kind, count);
    }
    if report.invalid > 0 {
        println!("Rejected by dictionary: {}", report.invalid);
    }
}
