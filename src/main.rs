use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

use dose_rank::cache::{self, CacheConfig};
use dose_rank::compare::{split_groups, validate_filter_attributes, Filter};
use dose_rank::config::{self, RuleBook};
use dose_rank::discovery::scan_for_rules;
use dose_rank::model::RawTable;
use dose_rank::scoring::{self, Ranking};
use dose_rank::{input, output, telemetry};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    /// Ranked table for the terminal
    #[default]
    Table,
    /// Tab-separated values with a header row, for scripting
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank the entities in a CSV file
    Rank {
        /// Input CSV (UTF-8, with a header row)
        csv: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Show only the top N entities
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Discover component and tag names in a CSV file and print a rule book
    Scan {
        csv: PathBuf,

        /// Save the rule book instead of printing it (merges into an existing one)
        #[arg(short, long)]
        write: bool,
    },
    /// Compare two filtered groups of entities by Market Score
    Compare {
        csv: PathBuf,

        /// Group A filters: dose:NAME, no-dose:NAME, dose:NAME=LO..HI,
        /// tag:NAME, no-tag:NAME, cat:ATTR=V1,V2
        #[arg(long = "a", num_args = 1.., required = true)]
        a: Vec<String>,

        /// Group B filters (defaults to every entity not in group A)
        #[arg(long = "b", num_args = 1..)]
        b: Vec<String>,
    },
    /// Remove cached rankings
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "dose-rank")]
#[command(about = "Rank products by dose-response, price and tag scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to rule book (defaults to ~/.config/dose-rank/rulebook.yaml)
    #[arg(short, long, global = true)]
    rules: Option<PathBuf>,

    /// Treat rule book warnings as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Bypass the result cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    if let Err(e) = telemetry::init(cli.verbose) {
        eprintln!("Logging disabled: {}", e);
    }

    match &cli.command {
        Commands::ClearCache => {
            if let Err(e) = cache::clear_cache() {
                eprintln!("Failed to clear cache: {}", e);
                std::process::exit(EXIT_INPUT);
            }
            println!("Cache cleared ({})", cache::get_cache_path().display());
        }
        Commands::Scan { csv, write } => {
            let table = load_table_or_exit(csv);
            let base = load_rule_book_or_exit(&cli).unwrap_or_default();
            let discovered = scan_for_rules(&table, &base);

            if cli.verbose {
                eprintln!(
                    "Discovered {} primary, {} secondary components, {} tags, {} categorical columns",
                    discovered.primary.len(),
                    discovered.secondary.len(),
                    discovered.tags.len(),
                    discovered.text_columns.len()
                );
            }

            let rules = discovered.into_rule_book(base);

            if *write {
                let path = cli.rules.clone().unwrap_or_else(config::get_rule_book_path);
                if let Err(e) = config::save_rule_book(&path, &rules) {
                    eprintln!("Failed to save rule book: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
                println!("Rule book written to {}", path.display());
            } else {
                match config::rule_book_to_yaml(&rules) {
                    Ok(yaml) => print!("{}", yaml),
                    Err(e) => {
                        eprintln!("{:#}", e);
                        std::process::exit(EXIT_CONFIG);
                    }
                }
            }
        }
        Commands::Rank { csv, format, limit } => {
            let table = load_table_or_exit(csv);
            let rules = effective_rules(&cli, &table);

            let cache_config = CacheConfig {
                enabled: !cli.no_cache,
            };
            let mut ranking = rank_with_cache(&table, &rules, &cache_config);

            if cli.verbose {
                eprintln!("Ranked {} entities in {:?}", ranking.len(), start_time.elapsed());
            }

            if let Some(n) = limit {
                ranking.rows.truncate(*n);
            }

            let use_colors = output::should_use_colors();
            match format {
                OutputFormat::Table => {
                    println!("{}", output::format_ranking_table(&ranking.rows, use_colors))
                }
                OutputFormat::Tsv => println!("{}", output::format_tsv(&ranking)),
                OutputFormat::Json => match output::format_json(&ranking) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Failed to serialize ranking: {}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                },
            }
        }
        Commands::Compare { csv, a, b } => {
            let filters_a = parse_filters_or_exit(a);
            let filters_b = parse_filters_or_exit(b);

            let table = load_table_or_exit(csv);
            let rules = effective_rules(&cli, &table);

            for filters in [&filters_a, &filters_b] {
                if let Err(errors) = validate_filter_attributes(filters, &rules.columns) {
                    for error in errors {
                        eprintln!("Invalid filter {}", error);
                    }
                    std::process::exit(EXIT_INPUT);
                }
            }

            let rows = match scoring::prepare_comparison(&table, &rules) {
                Ok(rows) => rows,
                Err(e) => exit_engine_error(e),
            };

            let group_b = (!filters_b.is_empty()).then_some(filters_b.as_slice());
            let comparison = split_groups(rows, &filters_a, group_b, &rules.markers);
            println!(
                "{}",
                output::format_comparison(
                    &comparison,
                    &filters_a,
                    group_b,
                    output::should_use_colors()
                )
            );
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

fn load_table_or_exit(path: &Path) -> RawTable {
    match input::load_table(path) {
        Ok(table) => {
            debug!(rows = table.rows.len(), columns = table.headers.len(), "loaded input");
            table
        }
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}

fn load_rule_book_or_exit(cli: &Cli) -> Option<RuleBook> {
    match config::load_rule_book(cli.rules.clone()) {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

/// Load the rule book, falling back to rules discovered from `table`, then
/// validate it.
fn effective_rules(cli: &Cli, table: &RawTable) -> RuleBook {
    let rules = match load_rule_book_or_exit(cli) {
        Some(rules) => rules,
        None => {
            eprintln!(
                "No rule book at {}; using rules discovered from the input \
                 (run `dose-rank scan --write` to save and edit them)",
                config::get_rule_book_path().display()
            );
            scan_for_rules(table, &RuleBook::default()).into_rule_book(RuleBook::default())
        }
    };

    if let Err(errors) = scoring::validate_rule_book(&rules) {
        eprintln!("Rule book warnings:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        if cli.strict {
            std::process::exit(EXIT_CONFIG);
        }
    }

    rules
}

fn rank_with_cache(table: &RawTable, rules: &RuleBook, cache_config: &CacheConfig) -> Ranking {
    let cache_path = cache::get_cache_path();
    let key = if cache_config.enabled {
        match cache::cache_key(table, rules) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("result cache disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    if let Some(cached) = key
        .as_deref()
        .and_then(|k| cache::read_cached_ranking(&cache_path, k))
    {
        return cached;
    }

    let ranking = match scoring::run_pipeline(table, rules) {
        Ok(ranking) => ranking,
        Err(e) => exit_engine_error(e),
    };

    if let Some(key) = key {
        if let Err(e) = cache::write_cached_ranking(&cache_path, &key, &ranking) {
            warn!("failed to write result cache: {:#}", e);
        }
    }

    ranking
}

fn parse_filters_or_exit(raw: &[String]) -> Vec<Filter> {
    raw.iter()
        .map(|s| match Filter::parse(s) {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("Invalid filter '{}': {:#}", s, e);
                std::process::exit(EXIT_INPUT);
            }
        })
        .collect()
}

fn exit_engine_error(e: dose_rank::EngineError) -> ! {
    eprintln!("Error: {}", e);
    let code = if e.is_configuration() {
        EXIT_CONFIG
    } else {
        EXIT_INPUT
    };
    std::process::exit(code);
}
