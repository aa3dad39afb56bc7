use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tunable_qf::config::{self, Config};
use tunable_qf::dataset::{self, AmountColumn, BoostRecord, Contribution};
use tunable_qf::funding::{self, Mechanism};
use tunable_qf::outcome;
use tunable_qf::output;
use tunable_qf::{run_round, RoundOutcome};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_COMPUTATION: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    /// Aligned columns with compact amounts
    Table,
    /// Tab-separated, no header
    Tsv,
    /// Comma-delimited with header
    Csv,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare unboosted and boosted funding per project (default if no subcommand)
    Results {
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Write results and boosted contributions to files
    Export {
        /// Destination for the results table
        #[arg(long)]
        results: PathBuf,
        /// Destination for the boosted contributions table
        #[arg(long)]
        boosted: PathBuf,
        /// Destination for per-project statistics
        #[arg(long)]
        projects: Option<PathBuf>,
    },
    /// Show per-project contribution statistics
    Projects {
        /// Use boosted amounts instead of raw amounts
        #[arg(long)]
        boosted: bool,
    },
    /// Show per-contributor statistics
    Contributors {
        /// Use boosted amounts instead of raw amounts
        #[arg(long)]
        boosted: bool,
    },
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "tunable-qf")]
#[command(about = "Boosted quadratic funding matching calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/tunable-qf/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Contribution table, overrides inputs.contributions
    #[arg(long, global = true)]
    contributions: Option<PathBuf>,

    /// Boost table, overrides inputs.boosts
    #[arg(long, global = true)]
    boosts: Option<PathBuf>,

    /// Funding mechanism (Direct Donations, Quadratic Funding, Cluster Mapping)
    #[arg(long, global = true)]
    mechanism: Option<String>,

    /// Matching pool
    #[arg(long, global = true)]
    pool: Option<f64>,

    /// Matching percentage cap in (0, 1]
    #[arg(long, global = true)]
    cap: Option<f64>,

    /// Boost coefficient
    #[arg(long, global = true)]
    boost_coefficient: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let mut cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.take().unwrap_or(Commands::Results {
        format: Format::Table,
    });
    let start_time = Instant::now();

    if let Commands::Init = command {
        if let Err(e) = config::run_init_wizard(cli.config.clone()) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let mut config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = apply_overrides(&mut config, &cli) {
        eprintln!("Config error: {:#}", e);
        std::process::exit(EXIT_CONFIG);
    }

    // Validate round config at startup
    if let Err(errors) = funding::validate_round(&config.round) {
        eprintln!("Round config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    debug!(
        mechanism = %config.round.mechanism,
        pool = config.round.matching_pool,
        cap = config.round.matching_percentage_cap,
        boost_coefficient = config.round.boost_coefficient,
        "effective round config"
    );

    let Some(contributions_path) = config.inputs.contributions.clone() else {
        eprintln!("No contributions table configured.");
        eprintln!("Pass --contributions PATH or add it to ~/.config/tunable-qf/config.yaml:");
        eprintln!("  inputs:");
        eprintln!("    contributions: contributions.csv");
        std::process::exit(EXIT_CONFIG);
    };

    let (contributions, boosts) = match load_inputs(&contributions_path, &config) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    let outcome = match run_round(&contributions, &boosts, &config.round) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Computation error: {}", e);
            std::process::exit(EXIT_COMPUTATION);
        }
    };

    debug!(warnings = outcome.warnings.len(), "round computed");

    let exit_code = match run_command(command, &outcome, &config) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_INPUT
        }
    };

    debug!("Total time: {:?}", start_time.elapsed());
    std::process::exit(exit_code);
}

/// RUST_LOG wins; otherwise info, or debug with --verbose. Logs go to stderr.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(path) = &cli.contributions {
        config.inputs.contributions = Some(path.clone());
    }
    if let Some(path) = &cli.boosts {
        config.inputs.boosts = Some(path.clone());
    }
    if let Some(mechanism) = &cli.mechanism {
        config.round.mechanism = Mechanism::parse(mechanism)?;
    }
    if let Some(pool) = cli.pool {
        config.round.matching_pool = pool;
    }
    if let Some(cap) = cli.cap {
        config.round.matching_percentage_cap = cap;
    }
    if let Some(boost_coefficient) = cli.boost_coefficient {
        config.round.boost_coefficient = boost_coefficient;
    }
    Ok(())
}

fn load_inputs(
    contributions_path: &std::path::Path,
    config: &Config,
) -> anyhow::Result<(Vec<Contribution>, Vec<BoostRecord>)> {
    let contributions =
        dataset::load_contributions(contributions_path, &config.inputs.contribution_columns)?;
    info!(
        rows = contributions.len(),
        path = %contributions_path.display(),
        "loaded contributions"
    );

    let boosts = match &config.inputs.boosts {
        Some(path) => {
            let boosts = dataset::load_boosts(path, &config.inputs.boost_columns)?;
            info!(rows = boosts.len(), path = %path.display(), "loaded boosts");
            boosts
        }
        None => {
            debug!("no boost table configured, nobody is boosted");
            Vec::new()
        }
    };

    Ok((contributions, boosts))
}

fn run_command(command: Commands, outcome: &RoundOutcome, config: &Config) -> anyhow::Result<()> {
    let use_colors = output::should_use_colors();

    match command {
        Commands::Results { format } => {
            let rows = &outcome.comparison.rows;
            match format {
                Format::Table => {
                    println!("{}", output::format_results_table(rows, use_colors));
                    if !outcome.comparison.unmatched.is_empty() {
                        println!();
                        println!("{}", output::format_unmatched(&outcome.comparison.unmatched));
                    }
                }
                Format::Tsv => println!("{}", output::format_results_tsv(rows)),
                Format::Csv => print!("{}", output::results_to_delimited(rows)),
                Format::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcome.comparison)?)
                }
            }
        }
        Commands::Export {
            results,
            boosted,
            projects,
        } => {
            let results_text = output::results_to_delimited(&outcome.comparison.rows);
            output::write_export(&results, &results_text)?;
            info!(path = %results.display(), "wrote results");

            let boosted_text = output::boosted_contributions_to_delimited(
                &outcome.boosted_contributions,
                &config.inputs.contribution_columns,
            );
            output::write_export(&boosted, &boosted_text)?;
            info!(path = %boosted.display(), "wrote boosted contributions");

            if let Some(path) = projects {
                let stats =
                    outcome::project_stats(&outcome.boosted_contributions, AmountColumn::Raw);
                output::write_export(&path, &output::project_stats_to_delimited(&stats))?;
                info!(path = %path.display(), "wrote project statistics");
            }
        }
        Commands::Projects { boosted } => {
            let stats =
                outcome::project_stats(&outcome.boosted_contributions, amount_column(boosted));
            println!("{}", output::format_project_stats(&stats, use_colors));
        }
        Commands::Contributors { boosted } => {
            let stats =
                outcome::contributor_stats(&outcome.boosted_contributions, amount_column(boosted));
            println!("{}", output::format_contributor_stats(&stats, use_colors));
        }
        // Handled before the round is computed
        Commands::Init => {}
    }

    Ok(())
}

fn amount_column(boosted: bool) -> AmountColumn {
    if boosted {
        AmountColumn::Boosted
    } else {
        AmountColumn::Raw
    }
}
