//! Provider configuration

use std::path::PathBuf;

/// Configuration for a `DynamicProvider`.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Reported provider version. A leading `v` is stripped when the provider is built.
    pub version: String,
    pub exec: ExecConfig,
}

/// Settings for handlers backed by external programs.
#[derive(Debug, Clone, Default)]
pub struct ExecConfig {
    /// Exec descriptors are rejected unless this is set.
    pub enabled: bool,
    /// Base directory for relative program paths.
    pub dir: Option<PathBuf>,
}

impl ProviderConfig {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), exec: ExecConfig::default() }
    }

    /// Allow exec handlers, resolving relative programs against `dir` if given.
    pub fn allow_exec(mut self, dir: Option<PathBuf>) -> Self {
        self.exec = ExecConfig { enabled: true, dir };
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

/// Strip a leading `v` so "v1.2.3" and "1.2.3" report the same version.
pub(crate) fn normalize_version(version: &str) -> String {
    version.strip_prefix('v').unwrap_or(version).to_string()
}
