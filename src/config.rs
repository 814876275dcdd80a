use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub node: NodeConfig,
    pub mining: MiningConfig,
    pub network: NetworkConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    /// HTTP port; also names this node's ledger and wallet files.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MiningConfig {
    pub reward: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub peer_timeout_secs: u64,
    pub bootstrap_peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub cors_origins: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_home().join(".blocklink"),
            port: 5000,
        }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self { reward: 10.0 }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            peer_timeout_secs: 3,
            bootstrap_peers: vec![],
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    /// Reads `path`, or the default location when `None`. A missing file is
    /// created with defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let reward = self.mining.reward;
        if !reward.is_finite() || reward <= 0.0 {
            anyhow::bail!("mining.reward must be a positive number, got {}", reward);
        }

        Ok(())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn node_id(&self) -> String {
        self.node.port.to_string()
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.network.peer_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.bind_address, self.node.port)
    }

    fn config_path() -> PathBuf {
        default_home().join(".blocklink").join("config.json")
    }
}

fn default_home() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(config.node_id(), "5000");
        assert_eq!(config.peer_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"node": {"port": 5001}, "mining": {"reward": 2.5}}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.node.port, 5001);
        assert_eq!(config.mining.reward, 2.5);
        assert_eq!(config.network.peer_timeout_secs, 3);
        assert_eq!(config.bind_address(), "0.0.0.0:5001");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{oops").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_non_positive_reward_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        for reward in ["-1.0", "0"] {
            std::fs::write(&path, format!(r#"{{"mining": {{"reward": {}}}}}"#, reward)).unwrap();
            assert!(Config::load(Some(&path)).is_err());
        }

        let mut config = Config::default();
        config.mining.reward = f64::NAN;
        assert!(config.validate().is_err());
    }
}
