use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::repository::ConfigRepository;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigData {
    log_level: String,
    working_time: f64,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            working_time: 8.0,
        }
    }
}

/// Configuration read once at startup. A missing file is replaced with the
/// defaults, anything else unreadable is fatal.
pub struct FileConfigRepository {
    data: ConfigData,
}

impl FileConfigRepository {
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);

        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).context("config file is corrupt")?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let data = ConfigData::default();
                tokio::fs::write(&path, serde_json::to_vec_pretty(&data)?)
                    .await
                    .context("writing default config")?;
                info!("created default config at {path:?}");
                data
            }
            Err(e) => return Err(e).context("reading config"),
        };

        Ok(Self { data })
    }
}

impl ConfigRepository for FileConfigRepository {
    fn work_time(&self) -> f64 {
        self.data.working_time
    }

    fn log_level(&self) -> String {
        self.data.log_level.clone()
    }
}
