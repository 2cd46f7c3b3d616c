//! Open options.

use std::collections::BTreeSet;

/// Default cap on open attempts in auto-probe mode.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 32;

/// Collections exempt from automatic management.
///
/// Excluded collections are never created, deleted or index-modified, and
/// the drift check ignores them. This lets a separately versioned owner
/// share the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(BTreeSet<String>);

impl Exclusions {
    /// Creates an empty exclusion list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `name` is excluded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns true if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops excluded names from a set of names.
    #[must_use]
    pub fn filter(&self, names: BTreeSet<String>) -> BTreeSet<String> {
        if self.0.is_empty() {
            return names;
        }
        names.into_iter().filter(|n| !self.contains(n)).collect()
    }

    /// Excluded names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Exclusions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Configuration for auto-probe mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Collections left alone by the drift check and the upgrade executor.
    pub exclude: Exclusions,

    /// Maximum number of open attempts before giving up with
    /// `CoreError::Convergence`.
    pub max_attempts: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            exclude: Exclusions::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ProbeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes one more collection.
    #[must_use]
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.0.insert(name.into());
        self
    }

    /// Replaces the exclusion list.
    #[must_use]
    pub fn exclusions(mut self, exclude: Exclusions) -> Self {
        self.exclude = exclude;
        self
    }

    /// Sets the attempt cap. Values below 1 are treated as 1.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }
}

/// How the store version is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOptions {
    /// Open at exactly this version. The caller asserts the schema is already
    /// correct there: no drift check, no retry. An upgrade still runs if the
    /// version is above the persisted one.
    Explicit(u64),
    /// Start at the persisted version and bump until the catalog matches.
    AutoProbe(ProbeConfig),
}

impl VersionOptions {
    /// Explicit version mode.
    #[must_use]
    pub const fn explicit(version: u64) -> Self {
        Self::Explicit(version)
    }

    /// Auto-probe mode with default configuration.
    #[must_use]
    pub fn auto() -> Self {
        Self::AutoProbe(ProbeConfig::default())
    }

    /// Exclusions in effect (always empty in explicit mode).
    #[must_use]
    pub fn exclusions(&self) -> Exclusions {
        match self {
            Self::Explicit(_) => Exclusions::new(),
            Self::AutoProbe(config) => config.exclude.clone(),
        }
    }
}

impl Default for VersionOptions {
    fn default() -> Self {
        Self::auto()
    }
}

impl From<ProbeConfig> for VersionOptions {
    fn from(config: ProbeConfig) -> Self {
        Self::AutoProbe(config)
    }
}
