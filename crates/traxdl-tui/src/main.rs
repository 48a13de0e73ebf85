mod app;
mod command;
mod event;
mod model;
mod preview;
mod theme;
mod view;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use traxdl_provider::config::Config;
use traxdl_provider::platform;
use traxdl_provider::provider::Provider;

use crate::model::Model;

/// Search, preview and download music from the terminal.
#[derive(Parser)]
#[command(name = "traxdl", version, about)]
struct Args {
    /// Search terms; when present the app starts searching immediately.
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Tool discovery runs before any terminal state changes so the message
    // lands on a clean stdout, matching the pre-flight contract.
    let tools = match platform::check_dependencies() {
        Ok(tools) => tools,
        Err(missing) => {
            println!("{}", missing);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging() {
        println!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    info!("traxdl starting");

    let config = Config::load().unwrap_or_default();
    let provider = Arc::new(Provider::new(
        tools.yt_dlp.clone(),
        config.downloads.dir.clone(),
    ));
    let player = config.player.program.clone().unwrap_or(tools.mpv);

    let query = if args.query.is_empty() {
        None
    } else {
        Some(args.query.join(" "))
    };
    let model = Model::new(query, config.search.page_size, player);

    match app::run(model, provider).await {
        Ok(final_model) => {
            if let Some(error) = &final_model.error {
                println!("Error: {}", error);
                return ExitCode::FAILURE;
            }
            if let Some(message) = &final_model.message {
                println!("{}", message);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let log_path = data_dir.join("traxdl.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();
    Ok(())
}
