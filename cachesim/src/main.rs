use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::info;
use cachelib::config::SimulationConfig;
use cachelib::simulator::{AccessObserver, AccessResult, SimulationReport, Simulator};
use cachelib::trace::{parse_trace, read_trace_file};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Replays a block address trace through a simulated cache"))]
struct Args {
    /// Addresses separated by commas or whitespace, e.g. 1,2,3,1. Read from stdin if neither
    /// this nor --trace-file is given
    #[arg(short, long, conflicts_with = "trace_file")]
    trace: Option<String>,

    #[arg(short = 'f', long)]
    trace_file: Option<String>,

    /// JSON configuration, individual options below override its fields
    #[arg(short, long)]
    config: Option<String>,

    /// LIFO, ARC, or CLOCK
    #[arg(long)]
    policy: Option<String>,

    /// direct-mapped or set-associative
    #[arg(short, long)]
    mapping: Option<String>,

    #[arg(short, long, allow_negative_numbers = true)]
    size: Option<i64>,

    #[arg(short, long, allow_negative_numbers = true)]
    associativity: Option<i64>,

    /// Pause after printing each access
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Print the final report as JSON instead of the access log
    #[arg(short, long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    /// Print diagnostics to stderr, takes true or false
    #[arg(short, long, action = ArgAction::Set, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

/// Prints the access log, optionally pacing it for a human to follow
struct AccessLog {
    enabled: bool,
    delay: Duration,
}

impl AccessObserver for AccessLog {
    fn on_access(&mut self, result: &AccessResult) {
        if !self.enabled {
            return;
        }
        println!("{result}");
        println!("{}", "-".repeat(30));
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

fn load_config(args: &Args) -> Result<SimulationConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            SimulationConfig::from_json(BufReader::new(config_file)).map_err(|e| e.to_string())?
        }
        None => SimulationConfig::default(),
    };
    if let Some(policy) = &args.policy {
        config.policy = policy.clone();
    }
    if let Some(mapping) = &args.mapping {
        config.mapping = mapping.clone();
    }
    if let Some(size) = args.size {
        config.size = size;
    }
    if let Some(associativity) = args.associativity {
        config.associativity = associativity;
    }
    Ok(config)
}

fn load_trace(args: &Args) -> Result<Vec<u64>, String> {
    match (&args.trace, &args.trace_file) {
        (Some(trace), _) => parse_trace(trace).map_err(|e| e.to_string()),
        (None, Some(path)) => {
            read_trace_file(path).map_err(|e| format!("Couldn't load the trace file at path {path}: {e}"))
        }
        (None, None) => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("Couldn't read the trace from stdin: {e}"))?;
            parse_trace(&input).map_err(|e| e.to_string())
        }
    }
}

/// Writes the final report, either as the completion summary or as pretty JSON and nothing else
fn write_report<W: Write>(out: &mut W, report: &SimulationReport, json: bool) -> Result<(), String> {
    let written = if json {
        let serialised = serde_json::to_string_pretty(report).map_err(|e| format!("Couldn't serialise the output {e}"))?;
        writeln!(out, "{serialised}")
    } else {
        writeln!(out, "\n--- Simulation Complete ---").and_then(|_| writeln!(out, "{report}"))
    };
    written.map_err(|e| format!("Couldn't write the report: {e}"))
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if args.debug { "info" } else { "warn" })).init();
    let config = load_config(&args)?;
    // Validate everything before the first access
    let validated = config.validate().map_err(|e| e.to_string())?;
    let trace = load_trace(&args)?;
    info!("Loaded {} addresses, simulating {validated:?}", trace.len());
    let observer = AccessLog {
        enabled: !args.json,
        delay: Duration::from_millis(args.delay_ms),
    };
    let mut simulator = Simulator::from_validated(validated, observer);
    let report = simulator.run(trace.iter().copied());
    write_report(&mut std::io::stdout().lock(), &report, args.json)?;
    // Timings and diagnostics go to stderr so --json output stays parseable
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        eprintln!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        eprintln!("Total execution time (includes parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        eprintln!("Running the debug binary, debug mode is enabled by default. Pass --debug false or build with --release to disable it");
        eprintln!("Parsed input configuration: {config:?}");
        eprintln!("Uninitialised cache lines: {}", simulator.get_uninitialised_line_count());
    }
    Ok(())
}
