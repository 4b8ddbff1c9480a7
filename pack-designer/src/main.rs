use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, debug, warn};

use battery_model::requirements::{Requirements, RequirementsConfig};
use pack_designer::catalog::CellCatalog;
use pack_designer::designer::SystemDesigns;
use pack_designer::report::write_report;

/// Battery pack design tool: enumerates, filters and ranks battery system
/// layouts for a set of requirements and a cell catalog.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Verbose information (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the system design task and write the report
    Design(DesignArgs),
    /// Inspect a cell catalog
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Args)]
struct DesignArgs {
    /// Read the battery system requirements from this TOML file.
    #[arg(short, long)]
    requirements: PathBuf,
    /// Read a cell catalog from a file or directory path.
    #[arg(short, long)]
    database: PathBuf,
    /// Write the report to <REPORT>.csv and <REPORT>.json.
    #[arg(long, default_value = "report")]
    report: PathBuf,
    /// Max. number of solutions that should be printed in the report.
    #[arg(long, default_value_t = 100)]
    max_number_of_solutions: usize,
    /// Use only the cell MANUFACTURER:MODEL, overriding the cell filters in
    /// the requirements file.
    #[arg(short, long)]
    cell: Option<String>,
    /// Use a custom overhead implementation registered under this name.
    #[arg(long)]
    overhead_plugin: Option<String>,
    /// Number of cpu cores used for the calculations.
    #[arg(long)]
    cores: Option<usize>,
}

#[derive(Subcommand)]
enum DbCommand {
    /// List all cells in the catalog
    List {
        /// Read a cell catalog from a file or directory path.
        #[arg(short, long)]
        database: PathBuf,
    },
    /// Show the data of specified cells
    Show {
        /// Read a cell catalog from a file or directory path.
        #[arg(short, long)]
        database: PathBuf,
        /// Cells as MANUFACTURER:MODEL identifiers.
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn default_cores() -> usize {
    let available = thread::available_parallelism().map_or(1, |cores| cores.get());
    available.saturating_sub(1).max(1)
}

fn load_requirements(args: &DesignArgs) -> anyhow::Result<Requirements> {
    let text = fs::read_to_string(&args.requirements)
        .with_context(|| format!("failed to read {}", args.requirements.display()))?;
    let config: RequirementsConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse {}", args.requirements.display()))?;
    if config.system.optimized_by.is_none() {
        warn!("Optimization variable not specified. The system will be optimized by volume");
    }
    let mut requirements = Requirements::from(config);
    requirements
        .validate()
        .map_err(pack_designer::DesignError::Requirements)?;

    if let Some(cell) = &args.cell {
        let Some((manufacturer, model)) = cell.split_once(':') else {
            bail!("--cell expects MANUFACTURER:MODEL, got '{cell}'");
        };
        if requirements.manufacturer.is_some() || requirements.model.is_some() {
            warn!("Requirement settings for manufacturer, cell model and cell format were overwritten");
        }
        requirements.manufacturer = Some(manufacturer.to_string());
        requirements.model = Some(model.to_string());
        requirements.format = None;
    }
    Ok(requirements)
}

fn design(args: DesignArgs) -> anyhow::Result<()> {
    let catalog = CellCatalog::load(&args.database)?;
    let requirements = load_requirements(&args)?;
    debug!("{}", requirements);

    let cores = args.cores.unwrap_or_else(default_cores);
    let designs = SystemDesigns::determine(
        &requirements,
        &catalog,
        args.max_number_of_solutions,
        args.overhead_plugin.as_deref(),
        cores,
    )?;
    write_report(&designs.designs, &args.report)?;
    Ok(())
}

fn db(command: DbCommand) -> anyhow::Result<()> {
    match command {
        DbCommand::List { database } => {
            let catalog = CellCatalog::load(&database)?;
            if catalog.is_empty() {
                bail!("Cell catalog is empty");
            }
            for identifier in catalog.identifiers() {
                println!("{}", identifier);
            }
        }
        DbCommand::Show {
            database,
            identifiers,
        } => {
            let catalog = CellCatalog::load(&database)?;
            let mut missing = 0;
            for identifier in &identifiers {
                match catalog.get(identifier) {
                    Some(cell) => {
                        println!("Cell: {}", identifier);
                        println!("{:#?}", cell);
                    }
                    None => {
                        eprintln!("cell '{}' not found", identifier);
                        missing += 1;
                    }
                }
            }
            if missing > 0 {
                bail!("{missing} cell(s) not found in the catalog");
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Design(args) => design(args),
        Command::Db(command) => db(command),
    }
}
