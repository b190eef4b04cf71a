//! Configuration for the verification engine.

use serde::{Deserialize, Serialize};

/// Default public RPC endpoint, used when no endpoints are configured.
pub const DEFAULT_RPC_ENDPOINT: &str = "https://rpc.mainnet.lukso.network";

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// RPC transport configuration.
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Challenge lifecycle configuration.
    #[serde(default)]
    pub challenge: ChallengeConfig,
}

/// RPC transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Ordered fallback list of JSON-RPC endpoint URLs. The first
    /// responsive endpoint wins; order expresses preference.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Per-request timeout in seconds. A timed-out endpoint counts as
    /// failed and the next one is tried.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Challenge lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Challenge validity window in seconds.
    #[serde(default = "default_challenge_ttl")]
    pub ttl_secs: i64,

    /// Interval between nonce-store eviction sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            challenge: ChallengeConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_challenge_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_endpoints() -> Vec<String> {
    vec![DEFAULT_RPC_ENDPOINT.to_string()]
}

const fn default_request_timeout() -> u64 {
    5
}

const fn default_challenge_ttl() -> i64 {
    300 // 5 minutes
}

const fn default_sweep_interval() -> u64 {
    60
}

impl GateConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate invariants the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint list is empty or the challenge
    /// TTL is not positive.
    pub fn validate(&self) -> crate::Result<()> {
        if self.rpc.endpoints.is_empty() {
            return Err(crate::Error::Config(
                "at least one RPC endpoint is required".to_string(),
            ));
        }
        if self.challenge.ttl_secs <= 0 {
            return Err(crate::Error::Config(
                "challenge TTL must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
