use std::collections::HashSet;

/// Flag that enables the background probe agent
pub const PROBE_FLAG: &str = "enable_probe_agent";

/// Read-only view of an external feature-flag provider
pub trait FeatureFlags: Send + Sync {
    fn is_enabled(&self, name: &str) -> bool;
}

/// Fixed set of enabled flags, typically parsed from a comma list
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    enabled: HashSet<String>,
}

impl StaticFeatureFlags {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: flags.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `"a, b,c"`; blank entries are ignored
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        )
    }
}

impl FeatureFlags for StaticFeatureFlags {
    fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }
}
