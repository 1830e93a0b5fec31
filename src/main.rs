use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mohua::config::Config;
use mohua::sagemaker::{
    ClassifiedError, Client, ClientOptions, ErrorTracker, ResourceKind, ResourceRecord,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Inventory of active SageMaker compute
#[derive(Parser, Debug)]
#[command(name = "mohua", version = mohua::VERSION, about, long_about = None)]
struct Args {
    /// AWS region to query
    #[arg(short, long)]
    region: Option<String>,

    /// AWS profile to use
    #[arg(short, long)]
    profile: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Refresh every N seconds until interrupted
    #[arg(short, long)]
    watch: Option<u64>,

    /// Remember --region and --profile for later runs
    #[arg(long)]
    save: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();
    let file = open_log_file(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("mohua started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

/// Open the log file for appending, creating its directory first
fn open_log_file(log_path: &Path) -> Result<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("mohua").join("mohua.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".mohua").join("mohua.log");
    }
    PathBuf::from("mohua.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    if args.save {
        if let Some(region) = args.region.as_deref() {
            config.set_region(region)?;
        }
        if let Some(profile) = args.profile.as_deref() {
            config.set_profile(profile)?;
        }
    }

    let client = Client::new(ClientOptions {
        region: config.effective_region(args.region.as_deref()),
        profile: config.effective_profile(args.profile.as_deref()),
        endpoint_url: config.endpoint_url.clone(),
        retry: config.retry_config()?,
    })
    .await?;

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            cancel_on_signal.cancel();
        }
    });

    let tracker = ErrorTracker::new();

    loop {
        if !run_cycle(&client, &tracker, &cancel, args.format).await? {
            break;
        }

        let Some(interval) = args.watch else {
            break;
        };
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(interval.max(1))) => {}
        }
    }

    Ok(())
}

/// One validate + list pass. Returns false when there is nothing more to do.
async fn run_cycle(
    client: &Client,
    tracker: &ErrorTracker,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> Result<bool> {
    match client.validate_configuration(cancel).await {
        Ok(true) => {}
        Ok(false) => {
            println!(
                "No usable AWS configuration for region '{}', skipping SageMaker queries.",
                client.region()
            );
            return Ok(false);
        }
        Err(ClassifiedError::Cancelled) => return Ok(false),
        Err(err) => {
            report(tracker, &err);
            return Ok(true);
        }
    }

    let (endpoints, notebooks, apps) = futures::future::join3(
        client.list_endpoints(cancel),
        client.list_notebooks(cancel),
        client.list_studio_apps(cancel),
    )
    .await;

    let mut inventory: BTreeMap<&'static str, Vec<ResourceRecord>> = BTreeMap::new();
    let mut failures = 0;
    for (kind, result) in ResourceKind::ALL.into_iter().zip([endpoints, notebooks, apps]) {
        match result {
            Ok(records) => {
                inventory.insert(kind.display_name(), records);
            }
            Err(ClassifiedError::Cancelled) => return Ok(false),
            Err(err) => {
                failures += 1;
                report(tracker, &err);
            }
        }
    }
    if failures == 0 {
        tracker.reset();
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inventory)?),
        OutputFormat::Table => print_table(client.region(), &inventory),
    }

    Ok(true)
}

/// Print a failure unless it repeats the last one
fn report(tracker: &ErrorTracker, err: &ClassifiedError) {
    tracing::error!("{}", err);
    if let Some(tracked) = tracker.track(err) {
        eprintln!("Error: {}", tracked);
    }
}

fn print_table(region: &str, inventory: &BTreeMap<&'static str, Vec<ResourceRecord>>) {
    println!("Active SageMaker resources in {}", region);
    for (kind, records) in inventory {
        println!();
        println!("{} ({})", kind, records.len());
        if records.is_empty() {
            continue;
        }
        println!(
            "  {:<40} {:<16} {:<6} {:<20} {}",
            "NAME", "INSTANCE TYPE", "COUNT", "CREATED", "DETAILS"
        );
        for record in records {
            let details = [
                record.studio_type.as_str(),
                record.user_profile.as_str(),
                record.space_name.as_str(),
            ]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
            println!(
                "  {:<40} {:<16} {:<6} {:<20} {}",
                record.name,
                record.instance_type,
                record.instance_count,
                record.creation_time.format("%Y-%m-%d %H:%M"),
                details
            );
        }
    }
}
