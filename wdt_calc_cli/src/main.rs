mod config;
mod report;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, error, info, warn};
use wdt_calc_common::search::DEFAULT_MAX_CANDIDATES;
use wdt_calc_common::{search, to_canonical, SearchOptions, TimeUnit, Variant};

use crate::report::{CatalogListing, Report, Request, SortOrder};

/// Pick MSP430 watchdog clock settings for a desired timeout.
#[derive(Parser, Debug)]
#[command(name = "wdt-calc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the clock source, prescaler and WDT divider closest to a timeout
    Search(SearchArgs),
    /// Show the clock sources and dividers a catalog enumerates
    Catalog(CatalogArgs),
}

#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Desired timeout
    #[arg(allow_negative_numbers = true)]
    value: f64,
    /// Unit of VALUE: ns, us, ms or s
    unit: TimeUnit,
    /// Clock catalog to search: full, tiered or restricted
    #[arg(long, env = config::VARIANT_ENV, default_value = config::DEFAULT_VARIANT)]
    variant: Variant,
    /// Stop after the primary source if it gets this close (tiered catalogs only)
    #[arg(long, env = config::TOLERANCE_ENV, default_value_t = config::DEFAULT_TOLERANCE_US)]
    tolerance_us: f64,
    /// Refuse catalogs with more candidates than this
    #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATES)]
    max_candidates: usize,
    #[arg(long, value_enum, env = config::FORMAT_ENV, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Order of the candidate listing
    #[arg(long, value_enum, default_value_t = SortOrder::Enumeration)]
    sort: SortOrder,
    /// Only list this many candidates
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    #[arg(long, env = config::VARIANT_ENV, default_value = config::DEFAULT_VARIANT)]
    variant: Variant,
    #[arg(long, value_enum, env = config::FORMAT_ENV, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{}", .0)]
    Calc(#[from] wdt_calc_common::Error),
    #[error("Failed to write output: {}", .0)]
    Io(#[from] io::Error),
    #[error("Failed to encode JSON: {}", .0)]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    let stdout = io::stdout();
    match run(cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), CliError> {
    match cli.command {
        Command::Search(args) => run_search(&args, out),
        Command::Catalog(args) => run_catalog(&args, out),
    }
}

fn run_search<W: Write>(args: &SearchArgs, out: &mut W) -> Result<(), CliError> {
    let desired_us = to_canonical(args.value, args.unit);
    let catalog = args.variant.catalog();
    debug!("Searching {} us in catalog {} ({} candidates)",
        desired_us, catalog.name, catalog.cardinality());

    let options = SearchOptions {
        tolerance_us: args.tolerance_us,
        max_candidates: args.max_candidates,
    };
    let outcome = search(desired_us, catalog, &options)?;

    if outcome.short_circuited {
        warn!("Primary source within {} us, skipped {} broad candidates",
            options.tolerance_us, catalog.broad_cardinality());
    }
    if desired_us > 0.0 && outcome.best.error_us / desired_us > config::LARGE_ERROR_RATIO {
        warn!("Closest interval is {} us off a {} us target", outcome.best.error_us, desired_us);
    }
    info!("Best: {} {} Hz {} {}", outcome.best.source, outcome.best.base_frequency,
        outcome.best.prescaler, outcome.best.divider);

    let request = Request {
        value: args.value,
        unit: args.unit,
        desired_us,
        variant: args.variant,
        tolerance_us: args.tolerance_us,
    };
    let report = Report::new(request, &outcome, args.sort, args.top);

    match args.format {
        OutputFormat::Table => report::write_table(out, &report)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn run_catalog<W: Write>(args: &CatalogArgs, out: &mut W) -> Result<(), CliError> {
    let catalog = args.variant.catalog();
    match args.format {
        OutputFormat::Table => report::write_catalog(out, catalog)?,
        OutputFormat::Json => {
            let listing = CatalogListing { cardinality: catalog.cardinality(), catalog };
            serde_json::to_writer_pretty(&mut *out, &listing)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
