//! Node settings, layered: defaults, then an optional config file, then
//! environment variables prefixed `CARBON_NODE_`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the REST facade binds to.
    pub bind_address: String,
    /// Port the REST facade listens on.
    pub port: u16,
    /// Directory the three snapshot documents are read from at startup
    /// and written to on shutdown.
    pub snapshot_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 7878,
            snapshot_dir: PathBuf::from("./carbon-snapshot"),
        }
    }
}

impl NodeConfig {
    /// Loads defaults, then `carbon-node.toml` in the current directory if
    /// present, then `CARBON_NODE_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = NodeConfig::default();
        let builder = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", defaults.port as i64)?
            .set_default("snapshot_dir", defaults.snapshot_dir.to_string_lossy().to_string())?
            .add_source(File::with_name("carbon-node").required(false))
            .add_source(Environment::with_prefix("CARBON_NODE"));

        builder.build()?.try_deserialize()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
