use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use smartq_core::model::OrganizationId;
use smartq_core::{HttpQueueApi, QueueApi};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::board::BoardService;
use crate::config::KeyResolver;
use crate::kiosk::KioskService;
use crate::service::Service;

mod app;
mod board;
mod cli;
mod commands;
mod config;
mod kiosk;
mod search;
mod service;
mod theme;
mod tui;
mod ui;

pub use theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting smartq");

    let args = cli::Args::parse();
    let board_org = args.board_org()?;

    let config = config::load()?;
    let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
    let theme = theme::theme_from_name(&config.theme.name);

    let base_url = args.server.unwrap_or(config.server.base_url);
    info!(%base_url, "Using backend");
    let api: Arc<dyn QueueApi> = Arc::new(HttpQueueApi::new(base_url.clone()));

    let service: Box<dyn Service> = match board_org {
        Some(org) => Box::new(BoardService::new(
            api,
            OrganizationId(org),
            Duration::from_secs(config.server.poll_interval_secs.max(1)),
            resolver.clone(),
        )),
        None => Box::new(KioskService::new(
            api,
            args.org.map(OrganizationId),
            resolver.clone(),
        )),
    };

    App::new(service, &base_url, resolver, theme).run().await
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("smartq").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "smartq.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
