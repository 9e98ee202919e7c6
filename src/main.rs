mod collectors;
mod config;
mod http;
mod snapshot;

use axum::serve;
use clap::Parser;
use collectors::Collector;
use config::Config;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linux-watch")]
#[command(version, about = "Serves a snapshot of host health metrics at GET /stats")]
struct Cli {
    /// YAML config file. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<String>,
    /// Overrides `listen` from the config file.
    #[arg(long)]
    listen: Option<String>,
    #[arg(long)]
    print_default_config: bool,
    /// Collect one snapshot, print it as JSON and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return ExitCode::SUCCESS;
    }

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let collector = Arc::new(Collector::from_config(&cfg));

    if cli.once {
        return print_once(&collector).await;
    }

    info!(
        listen = %cfg.listen,
        backend = ?cfg.backend,
        proc_root = %cfg.proc_root.display(),
        "starting linux-watch"
    );

    let addr: SocketAddr = match cfg.listen.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, listen = %cfg.listen, "invalid listen address");
            return ExitCode::FAILURE;
        }
    };
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind HTTP listener");
            return ExitCode::FAILURE;
        }
    };

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let http_task = tokio::spawn(async move {
        let app = http::build_router(collector);
        let server = serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        });

        if let Err(err) = server.await {
            error!(error = %err, "HTTP server error");
        }
    });

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for Ctrl+C");
    }
    info!("received Ctrl+C, shutting down");

    let _ = shutdown_tx.send(true);
    let _ = http_task.await;
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, config::ConfigError> {
    let mut cfg = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(listen) = &cli.listen {
        cfg.listen = listen.clone();
        cfg.validate()?;
    }
    Ok(cfg)
}

async fn print_once(collector: &Collector) -> ExitCode {
    let snapshot = match collector.collect().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!(error = %err, "collection failed");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&snapshot) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "failed to encode snapshot");
            ExitCode::FAILURE
        }
    }
}
