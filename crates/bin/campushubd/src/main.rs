//! # campushubd — campus equipment daemon
//!
//! Composition root that wires all adapters together and runs one command.
//!
//! ## Responsibilities
//! - Parse command-line arguments (clap) and configuration (config file, env vars)
//! - Initialize logging with `tracing-subscriber`
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Build the event bus and register the consistency and alert handlers
//! - Construct application services, injecting repositories via port traits
//! - Run the requested command and print its result as JSON
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod command;
mod config;
mod notifier;

use std::sync::Arc;

use campushub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteBuildingRepository, SqliteEquipmentRepository,
    SqliteFloorRepository, SqliteSpaceRepository,
};
use campushub_app::event_bus::InProcessEventBus;
use campushub_app::handlers::register_handlers;
use campushub_app::services::{EquipmentService, SpaceService, StatisticsService};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::command::{Cli, Command};
use crate::config::Config;
use crate::notifier::LogAlertNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let building_repo = SqliteBuildingRepository::new(pool.clone());
    let floor_repo = SqliteFloorRepository::new(pool.clone());
    let space_repo = SqliteSpaceRepository::new(pool.clone());
    let equipment_repo = SqliteEquipmentRepository::new(pool);

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(config.event_bus.capacity));
    register_handlers(
        &event_bus,
        equipment_repo.clone(),
        space_repo.clone(),
        LogAlertNotifier,
        config.recompute_policy(),
    );
    tracing::debug!(handlers = event_bus.handler_count(), "event bus ready");

    // Services
    let equipment_service = EquipmentService::new(
        equipment_repo.clone(),
        space_repo.clone(),
        Arc::clone(&event_bus),
    );
    let space_service = SpaceService::new(
        space_repo.clone(),
        floor_repo.clone(),
        equipment_repo.clone(),
        Arc::clone(&event_bus),
        config.recompute_policy(),
    );
    let statistics_service = StatisticsService::new(
        building_repo,
        floor_repo,
        space_repo,
        equipment_repo,
        config.statistics_options(),
    );

    let output = match cli.into_command() {
        Command::Snapshot { building } => {
            render(&statistics_service.build_global_snapshot(building).await?)
        }
        Command::Building { id } => render(&statistics_service.build_building_snapshot(id).await?),
        Command::TopDefective { limit, building } => render(
            &statistics_service
                .top_defective_spaces(limit, building)
                .await?,
        ),
        Command::Maintenance { limit, building } => render(
            &statistics_service
                .predict_maintenance(building, limit)
                .await?,
        ),
        Command::Resync { space } => render(&space_service.resync_defects(space).await?),
        Command::SetStatus {
            equipment,
            status,
            reason,
        } => {
            let reason = (!reason.is_empty()).then(|| reason.join(" "));
            render(
                &equipment_service
                    .change_status(equipment, status, reason)
                    .await?,
            )
        }
    }?;
    println!("{output}");

    Ok(())
}

fn render<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
