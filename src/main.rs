//! confpatch CLI
//!
//! Reference host for the patch engine: loads `.cfg` documents from a
//! directory, runs every patch on a background worker, writes the result.

use clap::{Parser, Subcommand};
use confpatch::config::CONFIG_FILE_NAME;
use confpatch::{
    spawn_run, Catalog, EffectiveConfig, Engine, EngineConfig, ExitCode, KnownIdentifiers,
    Progress,
};
use confpatch_pattern::NeedsExpr;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "confpatch")]
#[command(about = "Apply declarative patches to configuration documents", version)]
struct Cli {
    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch every document under DIR
    Apply {
        /// Document root
        dir: PathBuf,

        /// Extra known identifiers (comma-separated)
        #[arg(long, short = 'k', value_delimiter = ',')]
        known: Vec<String>,

        /// Config file (default: DIR/confpatch.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output directory (default: patch DIR in place)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Override max_patch_loop_iterations
        #[arg(long)]
        max_loops: Option<usize>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List passes and their patches without applying anything
    Passes {
        /// Document root
        dir: PathBuf,

        /// Extra known identifiers (comma-separated)
        #[arg(long, short = 'k', value_delimiter = ',')]
        known: Vec<String>,

        /// Config file (default: DIR/confpatch.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a :NEEDS expression against a set of identifiers
    CheckNeeds {
        /// Expression, e.g. "ModA&!ModB|ModC"
        expr: String,

        /// Known identifiers (comma-separated)
        #[arg(long, short = 'k', value_delimiter = ',')]
        known: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            dir,
            known,
            config,
            out,
            max_loops,
            json,
        } => run_apply(&dir, known, config, out, max_loops, json),
        Commands::Passes {
            dir,
            known,
            config,
            json,
        } => run_passes(&dir, known, config, json),
        Commands::CheckNeeds { expr, known } => run_check_needs(&expr, known),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, error: impl std::fmt::Display, code: ExitCode) -> ! {
    eprintln!("{}: {}", context, error);
    process::exit(code.as_i32());
}

fn load_config(dir: &Path, config_path: Option<PathBuf>, max_loops: Option<usize>) -> EngineConfig {
    let path = config_path.unwrap_or_else(|| dir.join(CONFIG_FILE_NAME));
    let overrides = max_loops.map(|n| serde_json::json!({ "max_patch_loop_iterations": n }));
    match EffectiveConfig::build(Some(&path), overrides) {
        Ok(effective) => effective.config,
        Err(e) => fail("Configuration error", e, ExitCode::Config),
    }
}

fn load(dir: &Path, config: &EngineConfig, extra: Vec<String>) -> (Catalog, KnownIdentifiers) {
    let catalog = match Catalog::load_dir(dir, config) {
        Ok(catalog) => catalog,
        Err(e) => fail("Error loading documents", e, ExitCode::Config),
    };
    let mut known = KnownIdentifiers::discover(&catalog, config);
    known.extend(extra);
    (catalog, known)
}

fn run_apply(
    dir: &Path,
    extra: Vec<String>,
    config_path: Option<PathBuf>,
    out: Option<PathBuf>,
    max_loops: Option<usize>,
    json: bool,
) {
    let config = load_config(dir, config_path, max_loops);
    let (catalog, known) = load(dir, &config, extra);

    let handle = match spawn_run(Engine::new(config), catalog, known) {
        Ok(handle) => handle,
        Err(e) => fail("Error starting run", e, ExitCode::Fatal),
    };
    let mut last_report = Instant::now();
    while !handle.is_finished() {
        thread::sleep(Duration::from_millis(50));
        if last_report.elapsed() >= Duration::from_secs(1) {
            info!("{}", handle.status_line());
            last_report = Instant::now();
        }
    }
    let outcome = match handle.wait() {
        Ok(outcome) => outcome,
        Err(e) => fail("Fatal", e, ExitCode::Fatal),
    };

    let target = out.unwrap_or_else(|| dir.to_path_buf());
    if let Err(e) = outcome.catalog.write_dir(&target) {
        fail("Error writing documents", e, ExitCode::Config);
    }

    if json {
        match outcome.summary.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => fail("Error serializing output", e, ExitCode::Config),
        }
    } else {
        println!("{}", outcome.summary.human_summary);
        for (file, count) in &outcome.summary.errors_by_file {
            println!("  {}: {} error(s)", file, count);
        }
    }
    process::exit(outcome.summary.exit_code);
}

fn run_passes(dir: &Path, extra: Vec<String>, config_path: Option<PathBuf>, json: bool) {
    let config = load_config(dir, config_path, None);
    let (mut catalog, known) = load(dir, &config, extra);

    let progress = Progress::logging();
    let list = Engine::new(config).plan(&mut catalog, &known, &progress);
    let report = list.report();

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => fail("Error serializing output", e, ExitCode::Config),
        }
    } else {
        for pass in &report {
            println!("{} ({} patches)", pass.name, pass.patches.len());
            for patch in &pass.patches {
                println!("  {}", patch);
            }
        }
        println!("{}", progress.status_line());
    }
}

fn run_check_needs(expr: &str, known: Vec<String>) {
    let known: KnownIdentifiers = known.into_iter().collect();
    let needs = NeedsExpr::parse(expr);
    if needs.is_satisfied(|id| known.contains(id)) {
        println!("satisfied: {}", needs);
        process::exit(ExitCode::Success.as_i32());
    } else {
        println!("unsatisfied: {}", needs);
        process::exit(ExitCode::CompletedWithErrors.as_i32());
    }
}
