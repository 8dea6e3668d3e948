mod availability;
mod catalog;
mod config;
mod conflict;
mod data;
mod error;
mod server;
mod service;
mod settings;
mod solver;
mod store;
mod usage;

use anyhow::Context;
use catalog::Catalog;
use config::AppConfig;
use log::info;
use service::Scheduler;
use std::sync::Arc;
use store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;

    let catalog = match &config.catalog_file {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin().context("built-in catalog is malformed")?,
    };
    info!(
        "Catalog: {} departments, {} subjects, {} sections",
        catalog.departments().len(),
        catalog.subjects().len(),
        catalog.sections(None).len()
    );

    let store = Arc::new(match &config.state_file {
        Some(path) => MemoryStore::open(path, config.default_periods)?,
        None => MemoryStore::new(config.default_periods),
    });
    let scheduler = Scheduler::new(catalog, store.clone(), store.clone(), store);

    server::run_server(&config, scheduler).await?;
    Ok(())
}
