mod acquire;
mod cli;
mod commands;
mod error_fmt;

use clap::Parser;
use cli::{Cli, DEFAULT_CONFIG, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use pcr_config::Config;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

fn main() {
    let _ = color_eyre::install();

    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            // tracing is not up yet; report straight to stderr
            report(&e);
            std::process::exit(exit_code_for_error(&e));
        }
    };

    let guard = init_tracing(&cli, &cfg);
    let code = match commands::dispatch(&cli, &cfg) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            report(&e);
            exit_code_for_error(&e)
        }
    };
    // flush the file writer before exiting
    drop(guard);
    std::process::exit(code);
}

fn report(e: &eyre::Report) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        eprintln!("{}", format_error_json(e));
    } else {
        eprintln!("{}", humanize(e));
    }
}

fn load_config(cli: &Cli) -> eyre::Result<Config> {
    let path = match &cli.config {
        Some(p) => {
            if !p.exists() {
                eyre::bail!("config file {} does not exist", p.display());
            }
            Some(p.as_path())
        }
        None => Some(Path::new(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };

    let mut cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            toml::from_str::<Config>(&text)
                .wrap_err_with(|| format!("parse config {}", p.display()))?
        }
        None => Config::default(),
    };
    if let Some(dir) = &cli.resources {
        cfg.storage.resource_dir = dir.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console layer on stderr (pretty or JSON) plus an optional JSON file layer.
fn init_tracing(cli: &Cli, cfg: &Config) -> Option<WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console: BoxedLayer = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };
    layers.push(console);

    let mut guard = None;
    if let Some(file) = cfg.logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "pcr.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match cfg.logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        let level = cfg.logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(level))
                .boxed(),
        );
        guard = Some(g);
    }

    if let Err(e) = tracing_subscriber::registry().with(layers).try_init() {
        eprintln!("logging not initialized: {e}");
    }
    guard
}
