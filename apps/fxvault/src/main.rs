mod commands;
mod infra;
mod obs;

use clap::{Parser, Subcommand};
use commands::Command;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fxvault")]
#[command(about = "fxvault CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  fxvault migrate --config configs/sample.toml\n  fxvault ingest --config configs/sample.toml\n  fxvault resample --config configs/sample.toml\n  fxvault show --config configs/sample.toml --instrument EURUSD --begin 2005-01 --end 2005-02\n  fxvault export --config configs/sample.toml --instrument EURUSD --kind resampled --freq D --out eurusd_d.csv\n"
)]
struct Cli {
    /// Default log filter; `FXVAULT_LOG` overrides it.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// `pretty` or `json`.
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,
    /// Serve Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Create the chunk table and its indexes.
    Migrate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Store full-year archive files as raw minute chunks.
    Ingest {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        archive_dir: Option<PathBuf>,
        /// Overrides `[ingest] currencies`.
        #[arg(long, value_delimiter = ',')]
        currencies: Vec<String>,
        /// Overrides `[ingest] years`.
        #[arg(long, value_delimiter = ',')]
        years: Vec<i32>,
    },
    /// Aggregate stored series to coarser frequencies.
    Resample {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, value_delimiter = ',')]
        currencies: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,
    },
    /// Print one field of a stored series.
    Show {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        #[arg(long, default_value = "raw")]
        kind: String,
        #[arg(long, default_value = "min")]
        freq: String,
        #[arg(long, default_value = "close")]
        field: String,
        /// First month, `YYYY-MM`.
        #[arg(long)]
        begin: Option<String>,
        /// Last month, `YYYY-MM`.
        #[arg(long)]
        end: Option<String>,
        /// Number of points printed from each end.
        #[arg(long, default_value_t = 5)]
        head: usize,
    },
    /// Write the joined OHLC table of a stored series as CSV.
    Export {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        instrument: String,
        #[arg(long, default_value = "resampled")]
        kind: String,
        #[arg(long)]
        freq: String,
        #[arg(long)]
        begin: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = obs::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Migrate { config } => Command::Migrate { config },
        CliCommand::Ingest {
            config,
            archive_dir,
            currencies,
            years,
        } => Command::Ingest {
            config,
            archive_dir,
            currencies,
            years,
        },
        CliCommand::Resample {
            config,
            currencies,
            targets,
        } => Command::Resample {
            config,
            currencies,
            targets,
        },
        CliCommand::Show {
            config,
            instrument,
            kind,
            freq,
            field,
            begin,
            end,
            head,
        } => Command::Show {
            config,
            instrument,
            kind,
            freq,
            field,
            begin,
            end,
            head,
        },
        CliCommand::Export {
            config,
            instrument,
            kind,
            freq,
            begin,
            end,
            out,
        } => Command::Export {
            config,
            instrument,
            kind,
            freq,
            begin,
            end,
            out,
        },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
