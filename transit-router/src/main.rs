use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use transit_router::domain::TransitTime;
use transit_router::format::{format_itinerary, itinerary_json};
use transit_router::planner::{
    Criterion, Planner, SearchConfig, SearchRequest, SequencerVariant,
};
use transit_router::timetable::load_connections_from_path;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CriterionArg {
    /// Earliest arrival
    Time,
    /// Fewest line changes
    Transfers,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SequencerArg {
    Aspiration,
    Knox,
}

/// Plan a route through a public transport timetable
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// CSV file of connections
    #[arg(long)]
    connections: PathBuf,

    /// Stop to start from
    #[arg(long)]
    from: String,

    /// Stop to reach
    #[arg(long)]
    to: String,

    /// Stop the route must pass through (repeatable)
    #[arg(long)]
    via: Vec<String>,

    /// Start time, HH:MM:SS. Defaults to now minus the configured look-back
    #[arg(long)]
    at: Option<String>,

    /// Service date the timetable applies to. Defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = CriterionArg::Time)]
    criterion: CriterionArg,

    /// Use the distance-guided earliest-arrival search
    #[arg(long)]
    guided: bool,

    /// Tabu Search variant for --via requests
    #[arg(long, value_enum)]
    sequencer: Option<SequencerArg>,

    /// JSON file of search settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(found) => {
            if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether a route was found.
fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_json_file(path)?,
        None => SearchConfig::default(),
    };
    if args.guided {
        config.guided = true;
    }
    if let Some(sequencer) = args.sequencer {
        config.sequencer = match sequencer {
            SequencerArg::Aspiration => SequencerVariant::Aspiration,
            SequencerArg::Knox => SequencerVariant::Knox,
        };
    }

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let connections = load_connections_from_path(&args.connections, date)?;
    let depart_at = start_time(args.at.as_deref(), date, &config);

    let criterion = match args.criterion {
        CriterionArg::Time => Criterion::EarliestArrival,
        CriterionArg::Transfers => Criterion::FewestTransfers,
    };
    let request = SearchRequest::new(&args.from, &args.to, depart_at, criterion)
        .with_via(args.via.iter().cloned());

    let planner = Planner::new(&connections, &config);
    let itinerary = planner.plan(&request)?;

    if args.json {
        println!("{}", itinerary_json(&itinerary)?);
    } else {
        println!("{}", format_itinerary(&itinerary));
    }

    Ok(itinerary.is_found())
}

/// Parse `--at`, falling back to the current time of day on `date` minus the look-back.
fn start_time(at: Option<&str>, date: NaiveDate, config: &SearchConfig) -> TransitTime {
    if let Some(raw) = at {
        match TransitTime::parse_hms(raw, date) {
            Ok(time) => return time,
            Err(e) => warn!(at = raw, error = %e, "Ignoring malformed start time"),
        }
    }

    let now = TransitTime::from(date.and_time(Local::now().time()));
    now.checked_sub(config.lookback()).unwrap_or(now)
}
