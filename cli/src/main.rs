mod render;
mod scenario;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aegis_core::{
    DefinitionOrigin, DefinitionSource, DefinitionStore, EngineContext, FetchError, FileSource,
    HttpSource, MitigationConfigExt, MitigationEngine, run_tick_loop, spawn_definition_refresh,
};
use aegis_types::MitigationConfig;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(version, about = "Damage mitigation aggregation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick once per scenario frame and print the final snapshot.
    Run {
        scenario: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
        /// Number of ticks (the last frame repeats past the end of the scenario).
        #[arg(short, long)]
        ticks: Option<usize>,
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Tick the first scenario frame on the configured interval until Ctrl-C,
    /// refreshing definitions in the background.
    Watch {
        scenario: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show the stored configuration.
    Config {
        /// Write the current (or default) configuration back to disk.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Load definitions from a local JSON file.
    #[arg(short, long, conflicts_with = "url")]
    definitions: Option<PathBuf>,
    /// Fetch definitions from this URL instead of the configured one.
    #[arg(long)]
    url: Option<String>,
}

/// Definition source picked on the command line or from config.
enum CliSource {
    File(FileSource),
    Http(HttpSource),
}

impl DefinitionSource for CliSource {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        match self {
            Self::File(source) => source.fetch().await,
            Self::Http(source) => source.fetch().await,
        }
    }

    fn origin(&self) -> DefinitionOrigin {
        match self {
            Self::File(source) => source.origin(),
            Self::Http(source) => source.origin(),
        }
    }
}

impl SourceArgs {
    fn resolve(&self, config: &MitigationConfig) -> Option<CliSource> {
        if let Some(path) = &self.definitions {
            return Some(CliSource::File(FileSource::new(path)));
        }
        let timeout = Duration::from_secs(config.request_timeout_secs);
        self.url
            .clone()
            .or_else(|| config.definitions_url())
            .map(|url| CliSource::Http(HttpSource::new(url, timeout)))
    }
}

/// Log to `AEGIS_LOG_PATH` when it names a writable file, else to stderr.
///
/// `RUST_LOG` overrides the INFO default. Stdout is left to snapshot output.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let log_file = std::env::var_os("AEGIS_LOG_PATH").and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    match log_file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => builder.with_target(false).with_writer(std::io::stderr).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();
    let config = MitigationConfig::load();

    match cli.command {
        Commands::Run {
            scenario,
            source,
            ticks,
            json,
        } => run(&scenario, &source, ticks, json, config).await,
        Commands::Watch { scenario, source } => watch(&scenario, &source, config).await,
        Commands::Config { save } => show_config(&config, save),
    }
}

fn new_engine(config: &MitigationConfig) -> (Arc<DefinitionStore>, MitigationEngine) {
    let store = Arc::new(DefinitionStore::new());
    let engine = MitigationEngine::new(EngineContext::new(Arc::clone(&store), config.clone()));
    (store, engine)
}

async fn run(
    scenario: &Path,
    source: &SourceArgs,
    ticks: Option<usize>,
    json: bool,
    config: MitigationConfig,
) -> Result<(), String> {
    let worlds = Scenario::load(scenario)?.worlds();
    let Some(last) = worlds.last() else {
        return Err(format!("{}: scenario has no frames", scenario.display()));
    };
    let (store, mut engine) = new_engine(&config);

    match source.resolve(&config) {
        Some(source) => {
            store
                .refresh(&source, &engine.cancellation())
                .await
                .map_err(|e| format!("failed to load definitions from {}: {}", source.origin(), e))?;
        }
        None => tracing::warn!("No definition source configured; only conditional rules apply"),
    }

    engine.enter_combat();
    let ticks = ticks.unwrap_or(worlds.len());
    for world in worlds.iter().chain(std::iter::repeat(last)).take(ticks) {
        engine.tick(world);
    }

    let snapshot = engine.current();
    if json {
        let text = serde_json::to_string_pretty(&*snapshot).map_err(|e| e.to_string())?;
        println!("{}", text);
    } else {
        print!("{}", render::render(&snapshot, config.european_number_format));
    }
    Ok(())
}

async fn watch(scenario: &Path, source: &SourceArgs, config: MitigationConfig) -> Result<(), String> {
    let Some(world) = Scenario::load(scenario)?.worlds().into_iter().next() else {
        return Err(format!("{}: scenario has no frames", scenario.display()));
    };
    let (store, mut engine) = new_engine(&config);
    let cancel = engine.cancellation();

    let refresh = match source.resolve(&config) {
        Some(source) => Some(spawn_definition_refresh(
            Arc::clone(&store),
            source,
            Duration::from_secs(config.refresh_interval_secs),
            cancel.clone(),
        )),
        None => {
            tracing::warn!("No definition source configured; only conditional rules apply");
            None
        }
    };

    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.cancel();
        }
    });

    // Render side: reads the published snapshot on its own schedule.
    let reader = engine.reader();
    let printer_cancel = cancel.clone();
    let european = engine.config().european_number_format;
    let printer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = printer_cancel.cancelled() => break,
                _ = interval.tick() => {
                    println!("{}", render::render_compact(&reader.current(), european));
                }
            }
        }
    });

    engine.enter_combat();
    let interval = Duration::from_millis(engine.config().tick_interval_ms());
    let published = run_tick_loop(&mut engine, &world, interval, cancel).await;

    let _ = printer.await;
    if let Some(handle) = refresh {
        let _ = handle.await;
    }

    print!("{}", render::render(&engine.current(), european));
    tracing::info!(published, "Watch stopped");
    Ok(())
}

fn show_config(config: &MitigationConfig, save: bool) -> Result<(), String> {
    let text = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
    println!("{}", text);
    if save {
        config.save();
    }
    Ok(())
}
