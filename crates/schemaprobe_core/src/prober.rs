//! Version prober.
//!
//! Drives repeated opens of one store until its catalog matches the declared
//! schema. Each attempt asks the engine for a version one higher than the
//! last, so the engine's upgrade transaction eventually gets a chance to
//! apply every pending edit. Engine errors end the probe immediately; only
//! drift causes a retry.

use crate::config::{Exclusions, VersionOptions};
use crate::diff::compute_drift;
use crate::error::{CoreError, CoreResult};
use crate::schema::SchemaModel;
use crate::upgrade::{UpgradeExecutor, UpgradeReport};
use schemaprobe_storage::{Connection, StorageEngine};
use tracing::{debug, info, warn};

/// Result of a successful probe.
#[derive(Debug)]
pub struct ProbeOutcome<C> {
    /// The converged connection. The caller owns it.
    pub connection: C,
    /// Version the connection was opened at.
    pub version: u64,
    /// Number of opens performed, including the successful one.
    pub attempts: u32,
    /// Upgrades committed along the way, oldest first.
    pub upgrades: Vec<UpgradeReport>,
}

impl<C> ProbeOutcome<C> {
    /// Returns true if no upgrade ran.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.upgrades.is_empty()
    }
}

/// Returns the persisted version of `name`, or 1 if the store does not exist.
///
/// The engine catalog is queried on every call; nothing is cached.
///
/// # Errors
///
/// Propagates catalog errors from the engine.
pub fn persisted_version<E: StorageEngine + ?Sized>(engine: &E, name: &str) -> CoreResult<u64> {
    let version = engine
        .databases()?
        .into_iter()
        .find(|db| db.name == name)
        .map_or(1, |db| db.version.max(1));
    Ok(version)
}

/// Opens a store, retrying at higher versions until it converges.
#[derive(Debug)]
pub struct VersionProber<'a, E> {
    engine: &'a E,
    name: &'a str,
    schema: &'a SchemaModel,
    options: &'a VersionOptions,
}

impl<'a, E: StorageEngine> VersionProber<'a, E> {
    /// Creates a prober for one open call.
    pub fn new(
        engine: &'a E,
        name: &'a str,
        schema: &'a SchemaModel,
        options: &'a VersionOptions,
    ) -> Self {
        Self {
            engine,
            name,
            schema,
            options,
        }
    }

    /// Picks the first version to try.
    ///
    /// # Errors
    ///
    /// Propagates catalog errors from the engine.
    pub fn start_version(&self) -> CoreResult<u64> {
        match self.options {
            VersionOptions::Explicit(version) => Ok(*version),
            VersionOptions::AutoProbe(_) => persisted_version(self.engine, self.name),
        }
    }

    /// Opens the store once at `version`, running the upgrade executor if the
    /// engine starts an upgrade.
    fn attempt(
        &self,
        version: u64,
        exclude: &Exclusions,
        upgrades: &mut Vec<UpgradeReport>,
    ) -> CoreResult<E::Connection> {
        let executor = UpgradeExecutor::new(self.schema, exclude);
        let mut report = None;
        let opened = self.engine.open(self.name, version, &mut |editor, change| {
            report = Some(executor.apply(editor, change)?);
            Ok(())
        });
        let connection = opened.map_err(|e| CoreError::from_open(self.name, version, e))?;

        if let Some(report) = report {
            info!(
                store = self.name,
                from = report.old_version,
                to = report.new_version,
                operations = report.operations.len(),
                "schema upgraded"
            );
            upgrades.push(report);
        }
        Ok(connection)
    }

    /// Runs the probe.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The schema is invalid (`InvalidSchema`, before any engine call)
    /// - The engine refuses an open (`Open`) or an upgrade fails (`Upgrade`)
    /// - Introspecting the opened catalog fails (`Storage`)
    /// - Drift survives `max_attempts` opens (`Convergence`)
    pub fn run(self) -> CoreResult<ProbeOutcome<E::Connection>> {
        self.schema.validate()?;
        let start = self.start_version()?;
        let mut upgrades = Vec::new();

        let config = match self.options {
            VersionOptions::Explicit(version) => {
                debug!(store = self.name, version, "opening at explicit version");
                let connection = self.attempt(*version, &Exclusions::new(), &mut upgrades)?;
                return Ok(ProbeOutcome {
                    connection,
                    version: *version,
                    attempts: 1,
                    upgrades,
                });
            }
            VersionOptions::AutoProbe(config) => config,
        };

        let mut version = start;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            debug!(store = self.name, version, attempt = attempts, "opening");
            let connection = self.attempt(version, &config.exclude, &mut upgrades)?;

            let drift = compute_drift(&connection, self.schema, &config.exclude)?;
            if drift.is_converged() {
                info!(store = self.name, version, attempts, "store converged");
                return Ok(ProbeOutcome {
                    connection,
                    version,
                    attempts,
                    upgrades,
                });
            }

            warn!(
                store = self.name,
                version,
                changes = drift.change_count(),
                "schema drift after open, retrying at next version"
            );
            debug!(store = self.name, ?drift, "drift detail");
            connection.close();

            let next = version.checked_add(1);
            match next {
                Some(next) if attempts < config.max_attempts => version = next,
                _ => {
                    return Err(CoreError::Convergence {
                        name: self.name.to_string(),
                        attempts,
                        last_version: version,
                        drift: Box::new(drift),
                    })
                }
            }
        }
    }
}
