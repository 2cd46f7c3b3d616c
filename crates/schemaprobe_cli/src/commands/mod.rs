//! CLI command implementations.

pub mod diff;
pub mod inspect;
pub mod open;

use schemaprobe_core::{ProbeConfig, SchemaModel, VersionOptions};
use std::path::Path;

/// Reads a schema file: a JSON object mapping collection names to
/// `{ "keyPath", "autoIncrement", "indexes", "uniqueIndexes" }`.
pub fn load_schema(path: &Path) -> Result<SchemaModel, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read schema {}: {e}", path.display()))?;
    let schema: SchemaModel = serde_json::from_str(&text)?;
    schema.validate()?;
    Ok(schema)
}

/// Builds open options from command-line flags.
pub fn version_options(version: Option<u64>, exclude: Vec<String>, max_attempts: u32) -> VersionOptions {
    match version {
        Some(version) => VersionOptions::explicit(version),
        None => ProbeConfig::new()
            .exclusions(exclude.into_iter().collect())
            .max_attempts(max_attempts)
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn schema_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"posts": {{"keyPath": "id", "indexes": ["id", "title"]}}, "users": {{"indexes": ["email"], "uniqueIndexes": ["email"]}}}}"#
        )
        .unwrap();

        let schema = load_schema(file.path()).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["posts", "users"]);
        assert!(schema.get("users").unwrap().is_unique("email"));
    }

    #[test]
    fn invalid_schema_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"users": {{"uniqueIndexes": ["email"]}}}}"#).unwrap();
        assert!(load_schema(file.path()).is_err());
    }

    #[test]
    fn explicit_version_wins_over_probe_flags() {
        let options = version_options(Some(3), vec!["x".into()], 4);
        assert_eq!(options, VersionOptions::explicit(3));

        let options = version_options(None, vec!["x".into()], 4);
        match options {
            VersionOptions::AutoProbe(config) => {
                assert!(config.exclude.contains("x"));
                assert_eq!(config.max_attempts, 4);
            }
            VersionOptions::Explicit(_) => panic!("expected auto-probe"),
        }
    }
}
