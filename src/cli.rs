//! CLI helper functions

use crate::{
    catalog::{Catalog, builtin_schemas, load_schemas},
    client::GoogleAnalyticsClient,
    config::TapConfig,
    storage::SingerWriter,
    sync::{SyncContext, SyncSummary, sync},
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::path::Path;

/// Load the tap configuration, letting `GA_*` environment variables override credentials
pub fn load_config(path: impl AsRef<Path>) -> Result<TapConfig> {
    let path = path.as_ref();
    log::debug!("Loading config from {}", path.display());
    let mut config = TapConfig::read(path)?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

/// Schema definitions from a directory, or the built-in ones
pub fn load_schema_definitions(
    schemas_dir: Option<&Path>,
) -> Result<BTreeMap<String, serde_json::Value>> {
    match schemas_dir {
        Some(dir) => {
            log::info!("Loading schemas from {}", dir.display().bright_black());
            load_schemas(dir)
        }
        None => builtin_schemas(),
    }
}

/// Build the catalog for discovery mode
pub fn discover(schemas_dir: Option<&Path>) -> Result<Catalog> {
    let catalog = Catalog::discover(load_schema_definitions(schemas_dir)?);
    log::info!("Discovered {} stream(s)", catalog.count());
    Ok(catalog)
}

/// Use the supplied catalog, or discover one
pub fn load_catalog(catalog_path: Option<&Path>, schemas_dir: Option<&Path>) -> Result<Catalog> {
    match catalog_path {
        Some(path) => {
            log::info!("Using catalog {}", path.display().bright_black());
            Catalog::read(path)
        }
        None => {
            log::info!("No catalog supplied, running discovery");
            discover(schemas_dir)
        }
    }
}

/// Sync the selected streams to stdout
///
/// Pipeline: GoogleAnalyticsClient → flatten → DateNormalizer → SchemaCoercer → SingerWriter
pub async fn run_sync(
    config: &TapConfig,
    catalog_path: Option<&Path>,
    schemas_dir: Option<&Path>,
) -> Result<SyncSummary> {
    let today = chrono::Local::now().date_naive();
    let window = config.window(today)?;
    log::info!(
        "Sync window: {} to {} ({} day(s))",
        window.start(),
        window.end(),
        window.day_count()
    );

    let catalog = load_catalog(catalog_path, schemas_dir)?;

    let credentials = config.credentials()?;
    let client = GoogleAnalyticsClient::try_new(credentials)
        .context("Failed to create Google Analytics client")?;
    log::debug!("Using client {}", client);

    let ctx = SyncContext::new(config, &client, &client, today)?;
    let mut writer = SingerWriter::stdout();
    let summary = sync(&ctx, &catalog, &mut writer).await?;
    log::debug!("Wrote {} message(s) to stdout", writer.written());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_builtin() {
        let catalog = discover(None).unwrap();
        assert_eq!(catalog.count(), 3);
        assert!(catalog.get("ga-basic-report").is_some());
    }

    #[test]
    fn test_load_catalog_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.json");
        discover(None).unwrap().write(&path).unwrap();

        let catalog = load_catalog(Some(&path), None).unwrap();
        assert_eq!(catalog.count(), 3);
    }

    #[tokio::test]
    async fn test_inverted_window_fails_before_io() {
        let config = TapConfig::from_json(
            r#"{"start_date": "2023-01-05", "end_date": "2023-01-01", "view_id": "1"}"#,
        )
        .unwrap();

        // No catalog file and no credentials: the window check must fail first.
        let err = run_sync(&config, Some(Path::new("/nonexistent/catalog.json")), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::TapError>(),
            Some(crate::error::TapError::Config(msg)) if msg.contains("before start_date")
        ));
    }
}
