use anyhow::Context;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;
use tracing::info;

use crate::models::analysis_config::AnalysisConfig;

static CONFIG_CACHE: OnceLock<AnalysisConfig> = OnceLock::new();

pub async fn init_config(file_path: &Path) -> anyhow::Result<&'static AnalysisConfig> {
    let config = if fs::try_exists(file_path).await.unwrap_or(false) {
        let data = fs::read_to_string(file_path)
            .await
            .with_context(|| format!("File read Error: {}", file_path.display()))?;

        serde_json::from_str(&data)
            .with_context(|| format!("JSON Parse Error: {}", file_path.display()))?
    } else {
        info!("No config at {}, using defaults", file_path.display());
        AnalysisConfig::default()
    };

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow::anyhow!("Config already initialized"))?;

    let config = get_cached_config().context("Config not initialized")?;
    info!(
        "Config initialized: labeled_only={}, facet_on={:?}, {} locations",
        config.labeled_only,
        config.facet_on,
        config.locations.len()
    );

    Ok(config)
}

pub fn get_cached_config() -> Option<&'static AnalysisConfig> {
    CONFIG_CACHE.get()
}
