mod export;

use crate::infra::{build_archive, build_store};
use fxvault_application::config::{announce_profile, load_config, Config};
use fxvault_application::ingest::ingest_archive;
use fxvault_application::resampling::resample_all;
use fxvault_application::storage::{get_all, get_ohlc, get_range};
use fxvault_domain::value_objects::frequency::Frequency;
use fxvault_domain::value_objects::month_range::MonthRange;
use fxvault_domain::value_objects::price_field::PriceField;
use fxvault_domain::value_objects::series::FieldSeries;
use fxvault_domain::value_objects::series_kind::SeriesKind;
use std::path::{Path, PathBuf};

pub enum Command {
    Migrate {
        config: PathBuf,
    },
    Ingest {
        config: PathBuf,
        archive_dir: Option<PathBuf>,
        currencies: Vec<String>,
        years: Vec<i32>,
    },
    Resample {
        config: PathBuf,
        currencies: Vec<String>,
        targets: Vec<String>,
    },
    Show {
        config: PathBuf,
        instrument: String,
        kind: String,
        freq: String,
        field: String,
        begin: Option<String>,
        end: Option<String>,
        head: usize,
    },
    Export {
        config: PathBuf,
        instrument: String,
        kind: String,
        freq: String,
        begin: Option<String>,
        end: Option<String>,
        out: PathBuf,
    },
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Migrate { config } => run_migrate(config),
        Command::Ingest {
            config,
            archive_dir,
            currencies,
            years,
        } => run_ingest(config, archive_dir, currencies, years),
        Command::Resample {
            config,
            currencies,
            targets,
        } => run_resample(config, currencies, targets),
        Command::Show {
            config,
            instrument,
            kind,
            freq,
            field,
            begin,
            end,
            head,
        } => run_show(config, instrument, kind, freq, field, begin, end, head),
        Command::Export {
            config,
            instrument,
            kind,
            freq,
            begin,
            end,
            out,
        } => run_export(config, instrument, kind, freq, begin, end, out),
    }
}

fn load(config_path: &Path) -> Result<Config, String> {
    let config = load_config(config_path)?;
    announce_profile(&config);
    Ok(config)
}

fn run_migrate(config_path: PathBuf) -> Result<(), String> {
    let config = load(&config_path)?;
    let store = build_store(&config)?;
    store.migrate().map_err(|err| err.to_string())?;
    println!("fxvault: table {} ready", store.table);
    Ok(())
}

fn run_ingest(
    config_path: PathBuf,
    archive_dir: Option<PathBuf>,
    currencies: Vec<String>,
    years: Vec<i32>,
) -> Result<(), String> {
    let config = load(&config_path)?;
    let currencies = if currencies.is_empty() {
        config
            .ingest
            .as_ref()
            .map(|ingest| ingest.currencies.clone())
            .unwrap_or_default()
    } else {
        currencies
    };
    let years = if years.is_empty() {
        config
            .ingest
            .as_ref()
            .map(|ingest| ingest.years.clone())
            .unwrap_or_default()
    } else {
        years
    };
    if currencies.is_empty() || years.is_empty() {
        return Err("ingest needs at least one currency and one year".to_string());
    }

    let archive = build_archive(&config, archive_dir)?;
    let store = build_store(&config)?;
    let reports =
        ingest_archive(&store, &archive, &currencies, &years).map_err(|err| err.to_string())?;

    for report in &reports {
        println!(
            "ingested {} {}: rows={}, chunks={}, out_of_period={}",
            report.instrument,
            report.period,
            report.rows,
            report.chunks_written,
            report.out_of_period
        );
    }
    println!(
        "fxvault: {} of {} files stored",
        reports.len(),
        currencies.len() * years.len()
    );
    Ok(())
}

fn run_resample(
    config_path: PathBuf,
    currencies: Vec<String>,
    targets: Vec<String>,
) -> Result<(), String> {
    let config = load(&config_path)?;
    let section = config
        .resample
        .clone()
        .ok_or_else(|| "missing [resample] section in config".to_string())?;
    let source = section.source()?;
    let currencies = if currencies.is_empty() {
        section.currencies.clone()
    } else {
        currencies
    };
    let targets = if targets.is_empty() {
        section.target_frequencies()?
    } else {
        targets
            .iter()
            .map(|target| Frequency::parse(target))
            .collect::<Result<Vec<_>, _>>()?
    };

    let store = build_store(&config)?;
    let summaries =
        resample_all(&store, &currencies, source, &targets).map_err(|err| err.to_string())?;
    for summary in &summaries {
        println!(
            "resampled {} {}/{} -> {}: source_rows={}, dropped={}, bars={}, chunks={}",
            summary.instrument,
            summary.source.kind,
            summary.source.frequency,
            summary.target,
            summary.source_rows,
            summary.dropped_incomplete,
            summary.bars,
            summary.chunks_written
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_show(
    config_path: PathBuf,
    instrument: String,
    kind: String,
    freq: String,
    field: String,
    begin: Option<String>,
    end: Option<String>,
    head: usize,
) -> Result<(), String> {
    let config = load(&config_path)?;
    let kind = SeriesKind::parse(&kind)?;
    let frequency = Frequency::parse(&freq)?;
    let field = PriceField::parse(&field)?;
    let store = build_store(&config)?;

    let series = match (kind, begin, end) {
        (SeriesKind::Raw, Some(begin), Some(end)) => {
            get_range(&store, &instrument, frequency, &begin, &end, field)
        }
        (_, None, None) => get_all(&store, &instrument, kind, frequency, field),
        (SeriesKind::Resampled, Some(_), Some(_)) => {
            return Err(
                "--begin/--end select raw months; omit them for resampled series".to_string(),
            )
        }
        _ => return Err("--begin and --end must be given together".to_string()),
    }
    .map_err(|err| err.to_string())?;

    print_series(&instrument, frequency, &series, head);
    Ok(())
}

fn print_series(instrument: &str, frequency: Frequency, series: &FieldSeries, head: usize) {
    println!(
        "{} {} {}: {} points",
        instrument,
        frequency,
        series.field,
        series.len()
    );
    let total = series.points.len();
    for (idx, point) in series.points.iter().enumerate() {
        if idx < head || idx + head >= total {
            println!("  {}  {}", point.timestamp.to_rfc3339(), point.value);
        } else if idx == head {
            println!("  ...");
        }
    }
}

fn run_export(
    config_path: PathBuf,
    instrument: String,
    kind: String,
    freq: String,
    begin: Option<String>,
    end: Option<String>,
    out: PathBuf,
) -> Result<(), String> {
    let config = load(&config_path)?;
    let kind = SeriesKind::parse(&kind)?;
    let frequency = Frequency::parse(&freq)?;
    let months = match (begin, end) {
        (Some(begin), Some(end)) => Some(MonthRange::parse(&begin, &end)?),
        (None, None) => None,
        _ => return Err("--begin and --end must be given together".to_string()),
    };
    let store = build_store(&config)?;

    let table = get_ohlc(&store, &instrument, kind, frequency, months)
        .map_err(|err| err.to_string())?;
    let rows = export::write_ohlc_csv(&out, &table)?;
    println!("fxvault: wrote {} rows to {}", rows, out.display());
    Ok(())
}
