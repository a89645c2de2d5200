//! ETW Export CLI Application
//!
//! Drives the etw-export library end to end without an OS tracing runtime:
//! - Acts as the tracing controller (starts a session with a keyword)
//! - Acts as the trace system (replays a scripted workload on worker threads)
//! - Writes every exported event as JSON lines or text
//! - Prints a session report

use anyhow::{Context, Result};
use clap::Parser;
use etw_export::categories::{DISABLED_OTHER_EVENTS_CATEGORY, OTHER_EVENTS_CATEGORY};
use etw_export::{format_keyword, CategoryObserver, CategoryRegistry, ExportConfig, TraceExporter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod report;
mod session;
mod workload;

use config::{AppConfig, OutputFormat};
use report::SessionReport;
use session::SessionSink;

/// ETW Export - replay trace events through the keyword-gated exporter
#[derive(Parser, Debug)]
#[command(name = "etw-export-cli")]
#[command(about = "Replay trace events through a keyword-gated ETW exporter", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Session keyword, e.g. 0x8000000000000009 (overrides config)
    #[arg(short, long, value_name = "KEYWORD")]
    keyword: Option<String>,

    /// Comma-separated categories to enable (overrides config)
    #[arg(short, long, value_name = "CATEGORIES", value_delimiter = ',')]
    enable: Vec<String>,

    /// Run without an attached consumer
    #[arg(long)]
    no_listener: bool,

    /// Output file for exported events (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format for exported events
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Render every argument kind, including convertable values
    #[arg(long)]
    render_all_args: bool,

    /// Print the category keyword bits and exit
    #[arg(long)]
    list_categories: bool,

    /// Number of worker threads emitting events
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("ETW Export CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using export library v{}", etw_export::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);

    if args.list_categories {
        print!("{}", category_table(&config.export)?);
        return Ok(());
    }

    let report = run_session(&config, args.threads)?;
    if !args.quiet {
        print!("{}", report);
    }

    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(keyword) = &args.keyword {
        config.session.keyword = Some(keyword.clone());
    }
    if !args.enable.is_empty() {
        config.session.keyword = None;
        config.session.categories = args.enable.clone();
    }
    if args.no_listener {
        config.session.listener_active = false;
    }
    if let Some(path) = &args.output {
        config.output.path = Some(path.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.render_all_args {
        config.export = config.export.clone().render_all_arg_kinds();
    }
}

/// Keyword bit for every category, as a controller would combine them
fn category_table(export: &ExportConfig) -> Result<String> {
    export.validate().context("Invalid export configuration")?;
    let registry = CategoryRegistry::seed(&export.filtered_categories);

    let mut table = String::new();
    let catch_alls = [OTHER_EVENTS_CATEGORY, DISABLED_OTHER_EVENTS_CATEGORY];
    for name in registry.filtered_categories().chain(catch_alls) {
        let keyword = registry.keyword_for([name])?;
        table.push_str(&format!("{}  {}\n", format_keyword(keyword), name));
    }
    Ok(table)
}

/// Register, start the session, replay the workload, tear down
fn run_session(config: &AppConfig, threads: usize) -> Result<SessionReport> {
    let out: Box<dyn Write + Send> = match &config.output.path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    let sink = Arc::new(SessionSink::new(out, config.output.format));

    let observer: CategoryObserver = Box::new(|registry: &CategoryRegistry| {
        log::debug!("Enabled categories now: {:?}", registry.enabled_categories());
    });
    let exporter = TraceExporter::register_with_observer(
        sink.clone(),
        config.export.clone(),
        Some(observer),
    )
    .context("Failed to register exporter")?;

    let keyword = config.session.resolve_keyword(exporter.registry())?;
    if config.session.listener_active {
        sink.start(keyword.unwrap_or_default());
    } else {
        log::info!("No consumer attached; events will not be exported");
    }
    exporter.enable_export()?;

    let events = if config.events.is_empty() {
        log::info!("No events configured, using the built-in workload");
        workload::default_workload()
    } else {
        workload::from_config(&config.events)?
    };

    let mut report = SessionReport::capture(&exporter, keyword.filter(|_| config.session.listener_active));
    report.stats = workload::run(&exporter, &events, threads)?;

    if config.session.listener_active {
        sink.stop();
    }
    exporter.unregister()?;
    sink.flush().context("Failed to flush exported events")?;

    report.written = sink.written();
    report.write_errors = sink.write_errors();
    log::info!(
        "Session done: {} exported of {} offered (keyword {})",
        report.stats.exported,
        report.stats.offered,
        keyword.map(format_keyword).unwrap_or_else(|| "none".to_string())
    );
    Ok(report)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
