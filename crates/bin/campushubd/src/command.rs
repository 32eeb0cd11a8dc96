//! Command-line interface of the report runner.

use std::path::PathBuf;

use campushub_domain::equipment::EquipmentStatus;
use campushub_domain::id::{BuildingId, EquipmentId, SpaceId};
use clap::{Parser, Subcommand};

/// campushubd - campus equipment tracking
#[derive(Parser, Debug)]
#[command(name = "campushubd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "campushub.toml")]
    pub config: PathBuf,

    /// Defaults to a campus-wide `snapshot`
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The requested command, or the campus-wide snapshot when none is given.
    #[must_use]
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Snapshot { building: None })
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Campus-wide statistics, or one building's when filtered
    Snapshot {
        #[arg(long)]
        building: Option<BuildingId>,
    },
    /// Statistics of one building
    Building { id: BuildingId },
    /// Spaces with the most defective equipment
    TopDefective {
        /// Defaults to `statistics.top_defective_limit`
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        building: Option<BuildingId>,
    },
    /// In-service equipment ranked by failure risk
    Maintenance {
        #[arg(long, default_value_t = 20, value_parser = positive)]
        limit: usize,
        #[arg(long)]
        building: Option<BuildingId>,
    },
    /// Recount the defective equipment of a space
    Resync { space: SpaceId },
    /// Move an equipment to another status
    SetStatus {
        equipment: EquipmentId,
        #[arg(value_parser = status)]
        status: EquipmentStatus,
        /// Free text recorded on the status change
        #[arg(trailing_var_arg = true)]
        reason: Vec<String>,
    },
}

fn positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(limit) => Ok(limit),
        Err(err) => Err(err.to_string()),
    }
}

fn status(value: &str) -> Result<EquipmentStatus, String> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = EquipmentStatus::ALL.into_iter().map(EquipmentStatus::as_str).collect();
        format!("expected one of {}", known.join(", "))
    })
}
