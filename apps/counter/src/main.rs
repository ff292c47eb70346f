use std::{net::SocketAddr, path::Path, path::PathBuf};

use axum::{routing::get, Router};
use clap::Parser;
use mvu::{AssetStore, DirSource, MemorySource, TemplateSet};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod pages;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Counter demo for the mvu page framework")]
struct Cli {
    #[arg(long, default_value = "counter.toml")]
    config: PathBuf,
    /// Overrides the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    let templates = load_templates(settings.template_dir.as_deref())?;
    let app = build_router(&templates, settings.max_memory);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "counter listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn embedded_templates() -> MemorySource {
    MemorySource::new("embedded templates")
        .with("layout.jinja", include_str!("../templates/layout.jinja"))
        .with("counter.jinja", include_str!("../templates/counter.jinja"))
        .with("upload.jinja", include_str!("../templates/upload.jinja"))
        .with("done.jinja", include_str!("../templates/done.jinja"))
        .with("about.jinja", include_str!("../templates/about.jinja"))
        .with(
            "parts/button.jinja",
            include_str!("../templates/parts/button.jinja"),
        )
}

fn load_templates(dir: Option<&Path>) -> anyhow::Result<TemplateSet> {
    let builder = match dir {
        Some(dir) => {
            info!(dir = %dir.display(), "loading templates from disk");
            TemplateSet::builder().source(DirSource::new(dir))
        }
        None => TemplateSet::builder().source(embedded_templates()),
    };
    Ok(builder.build()?)
}

fn build_router(templates: &TemplateSet, max_memory: u64) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/",
            pages::counter_page(templates, max_memory).into_route(),
        )
        .route(
            "/upload",
            pages::upload_page(templates, max_memory).into_route(),
        )
        .route("/done", pages::done_page(templates, max_memory).into_route())
        .route("/about", pages::about_route(templates))
        .nest("/assets", AssetStore::bundled().router())
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
