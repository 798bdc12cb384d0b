//! akh-chain CLI: forward-chaining rule engine with truth maintenance.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use akh_chain::config::ChainConfig;
use akh_chain::error::{ChainError, ChainResult};
use akh_chain::kb::KnowledgeBase;
use akh_chain::matcher::Unifier;
use akh_chain::parse::{self, Directive};
use akh_chain::script::{self, Outcome, RunOptions};

#[derive(Parser)]
#[command(name = "akh-chain", version, about = "Forward-chaining rule engine")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script of facts, rules, retractions and queries.
    Run {
        /// Path to the script file.
        script: PathBuf,
    },

    /// Load a knowledge base, apply retractions, then answer queries.
    Load {
        /// Path to a file of `fact:` and `rule:` lines.
        file: PathBuf,

        /// Query statement, e.g. "(isa ?x block)". Repeatable.
        #[arg(long)]
        ask: Vec<String>,

        /// Fact to retract before querying. Repeatable.
        #[arg(long)]
        retract: Vec<String>,
    },

    /// Print the saturated knowledge base as JSON.
    Export {
        /// Path to a file of `fact:` and `rule:` lines.
        file: PathBuf,
    },

    /// Show why a fact is in the knowledge base.
    Explain {
        /// Path to a file of `fact:` and `rule:` lines.
        file: PathBuf,

        /// Fact statement, e.g. "(movable cube)".
        statement: String,

        /// Maximum support depth to expand.
        #[arg(long)]
        depth: Option<usize>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let mut config = ChainConfig::load_or_default(cli.config.as_deref()).map_err(ChainError::from)?;
    if cli.json {
        config.json = true;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Commands::Run { script } => {
            let directives = parse::load_script_file(&script).map_err(ChainError::from)?;
            let mut kb = KnowledgeBase::new();
            let options = RunOptions {
                explain_depth: config.explain_depth,
            };
            let outcomes = script::run(&mut kb, directives, options);
            print_outcomes(&outcomes, config.json)?;
        }

        Commands::Load { file, ask, retract } => {
            let mut directives = Vec::with_capacity(ask.len() + retract.len());
            for text in &retract {
                let statement = parse::parse_statement(text).map_err(ChainError::from)?;
                directives.push(Directive::Retract(statement));
            }
            for text in &ask {
                let statement = parse::parse_statement(text).map_err(ChainError::from)?;
                directives.push(Directive::Ask(statement));
            }

            let mut kb = load_kb(&file)?;
            let options = RunOptions {
                explain_depth: config.explain_depth,
            };
            let outcomes = script::run(&mut kb, directives, options);
            if outcomes.is_empty() && !config.json {
                print!("{kb}");
            } else {
                print_outcomes(&outcomes, config.json)?;
            }
        }

        Commands::Export { file } => {
            let kb = load_kb(&file)?;
            let json = serde_json::to_string_pretty(&kb.snapshot()).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Explain {
            file,
            statement,
            depth,
        } => {
            let statement = parse::parse_statement(&statement).map_err(ChainError::from)?;
            let kb = load_kb(&file)?;
            let explanation = kb.explain_limited(&statement, depth.or(config.explain_depth));
            let outcome = Outcome::Explained {
                statement,
                explanation,
            };
            print_outcomes(std::slice::from_ref(&outcome), config.json)?;
        }
    }

    Ok(())
}

fn load_kb(path: &Path) -> ChainResult<KnowledgeBase> {
    let entities = parse::load_kb_file(path)?;
    let kb = KnowledgeBase::from_entities(Unifier, entities);
    tracing::debug!(
        path = %path.display(),
        facts = kb.fact_count(),
        rules = kb.rule_count(),
        "loaded knowledge base"
    );
    Ok(kb)
}

fn print_outcomes(outcomes: &[Outcome], json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(outcomes).into_diagnostic()?;
        println!("{json}");
    } else {
        for outcome in outcomes {
            print!("{outcome}");
        }
    }
    Ok(())
}
