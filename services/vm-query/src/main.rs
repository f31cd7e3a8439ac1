//! Velocity model query tool.
//!
//! Queries the LSU Imperial Valley model for points read from a file or
//! stdin, and converts or checks the model's binary lattice.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use velocity_model::{
    write_lattice, GridConfig, GridStore, LoadOptions, VelocityModel, GRID_FILE_NAME,
};
use vm_query::{build_grid, format_info, read_points, records, render, verify_grid, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "vm-query")]
#[command(about = "Query the LSU Imperial Valley velocity model", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ModelArgs {
    /// Directory the model is installed under
    #[arg(long, env = "UCVM_INSTALL_PATH")]
    install_dir: PathBuf,

    /// Model label
    #[arg(long, default_value = "ivlsu")]
    label: String,

    /// Largest lattice, in megabytes, to hold in memory
    #[arg(long, env = "VM_MAX_MEMORY_MB")]
    max_memory_mb: Option<usize>,

    /// Always read the lattice from disk
    #[arg(long)]
    file_backed: bool,
}

impl ModelArgs {
    fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::from_env();
        if self.max_memory_mb.is_some() {
            options.max_memory_mb = self.max_memory_mb;
        }
        options.force_file_backed |= self.file_backed;
        options
    }

    fn open(&self) -> Result<VelocityModel> {
        let model =
            VelocityModel::initialize_with(&self.install_dir, &self.label, &self.load_options())
                .with_context(|| {
                    format!(
                        "failed to load model '{}' from {}",
                        self.label,
                        self.install_dir.display()
                    )
                })?;
        Ok(model)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query points given as `lon lat depth` lines
    Query {
        #[command(flatten)]
        model: ModelArgs,

        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format: table (default), json, csv
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,

        /// Spread the batch across all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Show the model version and configuration
    Info {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Convert a text table (`easting_km northing_km depth_km vp_km_s`) into a lattice file
    BuildGrid {
        /// Model configuration file giving the lattice dimensions
        #[arg(short, long)]
        config: PathBuf,

        /// Text table to convert
        #[arg(short, long)]
        table: PathBuf,

        /// Output lattice (default: vp.dat next to the configuration, under model_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a lattice file against its source text table
    VerifyGrid {
        /// Model configuration file giving the lattice dimensions and corners
        #[arg(short, long)]
        config: PathBuf,

        /// Source text table
        #[arg(short, long)]
        table: PathBuf,

        /// Lattice to check (default: vp.dat next to the configuration, under model_dir)
        #[arg(short, long)]
        grid: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Query {
            model,
            input,
            output,
            parallel,
        } => {
            let model = model.open()?;
            let points = match &input {
                Some(path) => read_points(BufReader::new(open(path)?))?,
                None => read_points(io::stdin().lock())?,
            };

            let results = if parallel {
                model.query_parallel(&points)?
            } else {
                model.query(&points)?
            };
            info!(points = points.len(), "Query complete");

            print!("{}", ensure_newline(render(&records(&points, &results), output)?));
            model.finalize()?;
            Ok(())
        }
        Commands::Info { model } => {
            let model = model.open()?;
            println!("{}", format_info(&model));
            model.finalize()?;
            Ok(())
        }
        Commands::BuildGrid {
            config,
            table,
            output,
        } => {
            let grid_config = GridConfig::from_file(&config)?;
            let output = output.unwrap_or_else(|| default_grid_path(&config, &grid_config));

            let built = build_grid(BufReader::new(open(&table)?), &grid_config)?;
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            write_lattice(&output, &built.lattice)
                .with_context(|| format!("failed to write {}", output.display()))?;

            println!(
                "Wrote {} of {} nodes to {}",
                built.rows,
                built.lattice.len(),
                output.display()
            );
            Ok(())
        }
        Commands::VerifyGrid {
            config,
            table,
            grid,
        } => {
            let grid_config = GridConfig::from_file(&config)?;
            let grid = grid.unwrap_or_else(|| default_grid_path(&config, &grid_config));
            let store = GridStore::open(&grid, grid_config.dimensions(), &LoadOptions::default())?;

            let verification = verify_grid(BufReader::new(open(&table)?), &grid_config, &store)?;
            for m in &verification.mismatches {
                match m.found {
                    Some(found) => println!("line {}: BAD {:.1} found {:.1}", m.line, m.expected, found),
                    None => println!("line {}: BAD {:.1} outside lattice", m.line, m.expected),
                }
            }
            println!(
                "Checked {} rows, {} mismatches",
                verification.checked,
                verification.mismatches.len()
            );
            if !verification.is_ok() {
                bail!("lattice does not match {}", table.display());
            }
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

/// `<config dir>/<model_dir>/vp.dat`, the layout under an installation's
/// `model/<label>/data` directory.
fn default_grid_path(config_path: &Path, config: &GridConfig) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&config.model_dir)
        .join(GRID_FILE_NAME)
}

fn ensure_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
