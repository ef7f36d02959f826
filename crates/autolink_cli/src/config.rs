use std::fs;
use std::path::Path;

use anyhow::Context;
use binding::MonitorConfig;
use linking::AutoLinkConfig;
use tracing::{info, Level};

use crate::opts::LinkArgs;

#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    pub(crate) auto_link: AutoLinkConfig,
    pub(crate) monitor: MonitorConfig,
}

impl CliConfig {
    #[tracing::instrument(level = Level::DEBUG)]
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        info!("Loading config. path: {}", path.display());

        let content = fs::read_to_string(path).with_context(|| format!("Reading config. path: {}", path.display()))?;
        let config =
            serde_json::from_str(&content).with_context(|| format!("Parsing config. path: {}", path.display()))?;

        Ok(config)
    }

    /// Command line values override the file.
    pub(crate) fn auto_link_for(&self, args: &LinkArgs) -> AutoLinkConfig {
        let mut config = self.auto_link.clone();
        if let Some(batch_size) = args.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(max_products) = args.max_products {
            config.max_products_per_shipment = max_products;
        }
        match args.no_delays {
            true => config.without_delays(),
            false => config,
        }
    }
}
