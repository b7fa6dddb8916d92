//! Configuration surface for the dependency-check layer.
//!
//! `CheckOptions` carries the knobs a caller can hand to the dependency-check
//! layer; everything is optional, with sensible defaults applied through
//! `Default`, constructed via a builder-style fluent API.

use std::time::Duration;

use crate::errors::Error;

/// Which dependency-check strategy to use. A closed enum — `""`/unspecified
/// collapses to `Auto` at the YAML/CLI boundary (out of scope here), not
/// inside this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckStrategy {
    Local,
    Remote,
    #[default]
    Auto,
}

impl CheckStrategy {
    /// Parses the wire-level strategy string a manifest or CLI might carry.
    /// Empty is `Auto`; anything other than `local`/`remote`/`auto`
    /// (case-insensitive) is `Error::UnknownStrategy`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(CheckStrategy::Auto),
            "local" => Ok(CheckStrategy::Local),
            "remote" => Ok(CheckStrategy::Remote),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// Tunables for the dependency-check layer. Defaults: `cache_ttl` 5
/// minutes, `parallel_checks` 4, `timeout` 30 seconds.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    pub strategy: CheckStrategy,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub parallel_checks: usize,
    pub shallow_clone: bool,
    pub timeout: Duration,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            strategy: CheckStrategy::Auto,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(5 * 60),
            parallel_checks: 4,
            shallow_clone: true,
            timeout: Duration::from_secs(30),
        }
    }
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: CheckStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_parallel_checks(mut self, n: usize) -> Self {
        self.parallel_checks = n;
        self
    }

    pub fn with_shallow_clone(mut self, shallow: bool) -> Self {
        self.shallow_clone = shallow;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
