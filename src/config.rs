use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::gate::{
    DEFAULT_DIMENSION, DEFAULT_DISALLOWED_MARKER, DEFAULT_JURISDICTION, DEFAULT_LEARNING_RATE,
    DEFAULT_THRESHOLD,
};
use crate::probe::{ProbeConfig, StaticFeatureFlags};
use crate::reputation::SlashPolicy;

/// Configuration for the admission engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identifier of this node in log output
    pub node_id: String,
    /// Gate and admissibility settings
    pub admission: AdmissionConfig,
    /// Ledger file settings
    pub ledger: LedgerConfig,
    /// Slashing settings
    pub reputation: ReputationConfig,
    /// Background probe settings
    pub probe: ProbeSettings,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Enabled feature flags
    pub features: Vec<String>,
    /// Number of reference submissions the binary runs
    pub demo_cycles: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Jurisdiction / zone tag attached to the admissibility filter
    pub jurisdiction: String,
    /// Minimum potential for admission
    pub threshold: f64,
    /// Signal vector dimension
    pub dimension: usize,
    /// Gate reinforcement step
    pub learning_rate: f64,
    /// Payload markers that make a submission inadmissible
    pub disallowed_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-lines ledger file
    pub path: PathBuf,
    /// fsync after every append
    pub sync_on_append: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Fraction of stake removed per slash
    pub base_penalty: f64,
    /// Penalty multiplier when the anchor was invalid
    pub invalid_anchor_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Delay between probe submissions
    pub interval_ms: u64,
    /// Fixed RNG seed (OS entropy if unset)
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        let policy = SlashPolicy::default();
        Self {
            base_penalty: policy.base_penalty,
            invalid_anchor_multiplier: policy.invalid_anchor_multiplier,
        }
    }
}

impl ReputationConfig {
    /// Convert to the policy used by `ReputationSequencer`
    pub fn to_policy(&self) -> SlashPolicy {
        SlashPolicy {
            base_penalty: self.base_penalty,
            invalid_anchor_multiplier: self.invalid_anchor_multiplier,
        }
    }
}

impl ProbeSettings {
    pub fn to_probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            interval: Duration::from_millis(self.interval_ms),
            seed: self.seed,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_id: format!("nexus-{}", uuid::Uuid::new_v4()),
            admission: AdmissionConfig {
                jurisdiction: DEFAULT_JURISDICTION.to_string(),
                threshold: DEFAULT_THRESHOLD,
                dimension: DEFAULT_DIMENSION,
                learning_rate: DEFAULT_LEARNING_RATE,
                disallowed_markers: vec![DEFAULT_DISALLOWED_MARKER.to_string()],
            },
            ledger: LedgerConfig {
                path: PathBuf::from("nexus_immutable_core.jsonl"),
                sync_on_append: true,
            },
            reputation: ReputationConfig::default(),
            probe: ProbeSettings {
                interval_ms: 2000,
                seed: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            features: Vec::new(),
            demo_cycles: 3,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(node_id) = lookup("NEXUS_NODE_ID") {
            config.node_id = node_id;
        }

        // Admission
        if let Some(zone) = lookup("NEXUS_ZONE") {
            config.admission.jurisdiction = zone;
        }

        if let Some(threshold) = lookup("NEXUS_THRESHOLD") {
            config.admission.threshold = threshold
                .trim()
                .parse()
                .context("Invalid NEXUS_THRESHOLD value")?;
        }

        if let Some(dimension) = lookup("NEXUS_SIGNAL_DIM") {
            config.admission.dimension = dimension
                .trim()
                .parse()
                .context("Invalid NEXUS_SIGNAL_DIM value")?;
        }

        if let Some(rate) = lookup("NEXUS_LEARNING_RATE") {
            config.admission.learning_rate = rate
                .trim()
                .parse()
                .context("Invalid NEXUS_LEARNING_RATE value")?;
        }

        if let Some(markers) = lookup("NEXUS_DISALLOWED_MARKERS") {
            config.admission.disallowed_markers = split_list(&markers);
        }

        // Ledger
        if let Some(path) = lookup("NEXUS_LEDGER_PATH") {
            config.ledger.path = PathBuf::from(path);
        }

        if let Some(sync) = lookup("NEXUS_LEDGER_SYNC") {
            config.ledger.sync_on_append = sync
                .trim()
                .parse()
                .context("Invalid NEXUS_LEDGER_SYNC value")?;
        }

        // Reputation
        if let Some(penalty) = lookup("NEXUS_SLASH_PENALTY") {
            config.reputation.base_penalty = penalty
                .trim()
                .parse()
                .context("Invalid NEXUS_SLASH_PENALTY value")?;
        }

        if let Some(multiplier) = lookup("NEXUS_INVALID_ANCHOR_MULTIPLIER") {
            config.reputation.invalid_anchor_multiplier = multiplier
                .trim()
                .parse()
                .context("Invalid NEXUS_INVALID_ANCHOR_MULTIPLIER value")?;
        }

        // Probe
        if let Some(interval) = lookup("NEXUS_PROBE_INTERVAL_MS") {
            config.probe.interval_ms = interval
                .trim()
                .parse()
                .context("Invalid NEXUS_PROBE_INTERVAL_MS value")?;
        }

        if let Some(seed) = lookup("NEXUS_PROBE_SEED") {
            config.probe.seed = Some(
                seed.trim()
                    .parse()
                    .context("Invalid NEXUS_PROBE_SEED value")?,
            );
        }

        if let Some(flags) = lookup("NEXUS_FEATURE_FLAGS") {
            config.features = split_list(&flags);
        }

        // Logging / binary
        if let Some(level) = lookup("NEXUS_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(cycles) = lookup("NEXUS_DEMO_CYCLES") {
            config.demo_cycles = cycles
                .trim()
                .parse()
                .context("Invalid NEXUS_DEMO_CYCLES value")?;
        }

        config.validate()?;

        info!(
            node_id = %config.node_id,
            zone = %config.admission.jurisdiction,
            threshold = config.admission.threshold,
            ledger = %config.ledger.path.display(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Node id cannot be empty"));
        }

        if self.admission.jurisdiction.trim().is_empty() {
            return Err(anyhow::anyhow!("Jurisdiction cannot be empty"));
        }

        if !self.admission.threshold.is_finite() {
            return Err(anyhow::anyhow!(
                "Admission threshold must be finite: {}",
                self.admission.threshold
            ));
        }

        if !self
            .admission
            .disallowed_markers
            .iter()
            .any(|m| !m.trim().is_empty())
        {
            return Err(anyhow::anyhow!(
                "At least one disallowed marker is required"
            ));
        }

        if self.admission.dimension == 0 {
            return Err(anyhow::anyhow!("Signal dimension must be non-zero"));
        }

        if !self.admission.learning_rate.is_finite() || self.admission.learning_rate <= 0.0 {
            return Err(anyhow::anyhow!(
                "Learning rate must be a positive number: {}",
                self.admission.learning_rate
            ));
        }

        let penalty = self.reputation.base_penalty;
        if !(penalty > 0.0 && penalty <= 1.0) {
            return Err(anyhow::anyhow!(
                "Slash penalty must be in (0, 1]: {}",
                penalty
            ));
        }

        let multiplier = self.reputation.invalid_anchor_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(anyhow::anyhow!(
                "Invalid-anchor multiplier must be at least 1: {}",
                multiplier
            ));
        }

        if penalty * multiplier > 1.0 {
            return Err(anyhow::anyhow!(
                "Invalid-anchor penalty exceeds the whole stake: {} x {}",
                penalty,
                multiplier
            ));
        }

        if self.probe.interval_ms == 0 {
            return Err(anyhow::anyhow!("Probe interval must be non-zero"));
        }

        if self.ledger.path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Ledger path cannot be empty"));
        }

        Ok(())
    }

    pub fn feature_flags(&self) -> StaticFeatureFlags {
        StaticFeatureFlags::new(self.features.iter().cloned())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
