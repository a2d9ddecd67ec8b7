//! Offline settings migration for stored device documents.
//!
//! Usage:
//!   cargo run --bin settings-migrate -- --model ZMNHAD --file device.json --dry-run
//!   cargo run --bin settings-migrate -- --model ZMNHKD --file device.json
//!
//! The file is either a device document (`{"settings": {...}, "store": {...}}`)
//! or a bare settings map. A dry run prints the migrated settings; otherwise
//! the migration is applied to the document once, guarded like on a device.

use clap::Parser;
use log::info;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use zwave_multichannel::error::{EngineError, Result};
use zwave_multichannel::migration::MigrationOutcome;
use zwave_multichannel::models;
use zwave_multichannel::store::{DeviceRecord, JsonFileStore, Settings};

#[derive(Parser)]
#[command(name = "settings-migrate")]
#[command(about = "Migrate legacy device settings into the current schema")]
struct Cli {
    /// Device model id, e.g. ZMNHAD
    #[arg(long, env = "MIGRATE_MODEL")]
    model: String,

    /// Settings document to migrate
    #[arg(long)]
    file: PathBuf,

    /// Print the result without writing
    #[arg(long)]
    dry_run: bool,
}

/// Read a device document or a bare settings map.
fn load_record(path: &Path) -> Result<(DeviceRecord, bool)> {
    let bytes = fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    let Value::Object(object) = value else {
        return Err(EngineError::InvalidSetting {
            key: path.display().to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };
    if object.contains_key("settings") || object.contains_key("store") {
        let record = serde_json::from_value(Value::Object(object))?;
        Ok((record, true))
    } else {
        let settings: Settings = object.into_iter().collect();
        Ok((
            DeviceRecord {
                settings,
                ..Default::default()
            },
            false,
        ))
    }
}

async fn run(cli: Cli) -> Result<()> {
    let model = models::by_id(&cli.model)?;
    let engine = model.migration_engine();
    let (record, is_document) = load_record(&cli.file)?;

    if cli.dry_run {
        let migrated = engine.migrate(&record.settings, &model.schema);
        println!("{}", serde_json::to_string_pretty(&migrated)?);
        return Ok(());
    }

    if !is_document {
        info!("Converting {:?} to a device document", cli.file);
        record.save(&cli.file)?;
    }
    let store = JsonFileStore::open(&cli.file);
    match engine.run_once(&store, &model.schema).await? {
        MigrationOutcome::Migrated { migrated } => {
            println!("Migrated {} setting(s): {}", migrated.len(), migrated.join(", "));
        }
        MigrationOutcome::AlreadyMigrated => {
            println!("{:?} is already migrated", cli.file);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
