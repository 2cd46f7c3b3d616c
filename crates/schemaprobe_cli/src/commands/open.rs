//! Open command implementation.

use super::load_schema;
use schemaprobe_core::{open_store_with_report, SchemaOperation, VersionOptions};
use schemaprobe_storage::{Connection, MemoryEngine};
use std::path::Path;
use tracing::info;

/// Runs the open command.
pub fn run(
    state_path: &Path,
    name: &str,
    schema_path: &Path,
    options: &VersionOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema(schema_path)?;
    let engine = MemoryEngine::load_or_default(state_path)?;

    let outcome = open_store_with_report(&engine, name, &schema, options)?;
    println!("Store '{}' open at version {}", name, outcome.version);
    println!("  Attempts: {}", outcome.attempts);

    if outcome.upgrades.is_empty() {
        println!("  No upgrade needed.");
    }
    for upgrade in &outcome.upgrades {
        println!(
            "\nUpgrade v{} -> v{} ({} operations)",
            upgrade.old_version,
            upgrade.new_version,
            upgrade.operations.len()
        );
        for operation in &upgrade.operations {
            println!("  {}", describe(operation));
        }
    }
    outcome.connection.close();

    engine.save(state_path)?;
    info!("Saved state to {:?}", state_path);
    Ok(())
}

fn describe(operation: &SchemaOperation) -> String {
    match operation {
        SchemaOperation::CreateCollection { name } => format!("+ collection {name}"),
        SchemaOperation::DeleteCollection { name } => format!("- collection {name}"),
        SchemaOperation::CreateIndex {
            collection,
            index,
            unique,
        } => {
            let kind = if *unique { "unique index" } else { "index" };
            format!("+ {kind} {collection}.{index}")
        }
        SchemaOperation::DeleteIndex { collection, index } => {
            format!("- index {collection}.{index}")
        }
    }
}
