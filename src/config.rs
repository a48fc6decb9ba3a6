//! Tap configuration
//!
//! Loaded from the Singer `--config` JSON file. Credential fields may also be
//! supplied through `GA_*` environment variables, which take precedence.

use crate::client::Credentials;
use crate::error::TapError;
use chrono::{DateTime, NaiveDate};
use eyre::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Default pause between days, in seconds
pub const DEFAULT_REQUEST_DELAY_SECS: u64 = 2;

const ENV_DEVELOPER_TOKEN: &str = "GA_DEVELOPER_TOKEN";
const ENV_OAUTH_CLIENT_ID: &str = "GA_OAUTH_CLIENT_ID";
const ENV_OAUTH_CLIENT_SECRET: &str = "GA_OAUTH_CLIENT_SECRET";
const ENV_REFRESH_TOKEN: &str = "GA_REFRESH_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct TapConfig {
    /// First day to extract (inclusive)
    #[serde(deserialize_with = "deserialize_day")]
    pub start_date: NaiveDate,

    /// Last day to extract (inclusive), defaults to today
    #[serde(default, deserialize_with = "deserialize_optional_day")]
    pub end_date: Option<NaiveDate>,

    /// Analytics view (profile) to report on
    pub view_id: String,

    /// Required for goal reports
    #[serde(default)]
    pub account_id: Option<String>,

    /// Required for goal reports
    #[serde(default)]
    pub web_property_id: Option<String>,

    #[serde(default)]
    pub developer_token: Option<String>,

    #[serde(default)]
    pub oauth_client_id: Option<String>,

    #[serde(default)]
    pub oauth_client_secret: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
}

fn default_request_delay_secs() -> u64 {
    DEFAULT_REQUEST_DELAY_SECS
}

/// Inclusive range of calendar days to sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl SyncWindow {
    /// Build a window, rejecting `end < start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(TapError::Config(format!(
                "end_date {} is before start_date {}",
                end, start
            ))
            .into());
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every day in the window, ascending
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Number of days covered, always at least one
    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

impl TapConfig {
    /// Read configuration from a JSON file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| TapError::Config(e.to_string()))?;
        if config.view_id.trim().is_empty() {
            return Err(TapError::Config("view_id must not be empty".to_string()).into());
        }
        Ok(config)
    }

    /// Override credential fields from a variable lookup (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (ENV_DEVELOPER_TOKEN, &mut self.developer_token),
            (ENV_OAUTH_CLIENT_ID, &mut self.oauth_client_id),
            (ENV_OAUTH_CLIENT_SECRET, &mut self.oauth_client_secret),
            (ENV_REFRESH_TOKEN, &mut self.refresh_token),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                log::debug!("Using {} from environment", key);
                *field = Some(value);
            }
        }
    }

    /// Resolve the sync window, defaulting `end_date` to `today`
    pub fn window(&self, today: NaiveDate) -> Result<SyncWindow> {
        SyncWindow::new(self.start_date, self.end_date.unwrap_or(today))
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    /// Collect the OAuth credentials needed in sync mode
    pub fn credentials(&self) -> Result<Credentials> {
        fn required(value: &Option<String>, key: &str) -> Result<String> {
            value
                .clone()
                .ok_or_else(|| TapError::Config(format!("missing required key '{}'", key)).into())
        }

        Ok(Credentials {
            developer_token: required(&self.developer_token, "developer_token")?,
            client_id: required(&self.oauth_client_id, "oauth_client_id")?,
            client_secret: required(&self.oauth_client_secret, "oauth_client_secret")?,
            refresh_token: required(&self.refresh_token, "refresh_token")?,
        })
    }
}

/// Parse a day given as `YYYY-MM-DD` or as an RFC 3339 timestamp
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| TapError::Config(format!("invalid date '{}'", value)).into())
}

fn deserialize_day<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_day<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_day(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_minimal_config() {
        let config = TapConfig::from_json(r#"{"start_date": "2023-01-01", "view_id": "123"}"#)
            .unwrap();
        assert_eq!(config.start_date, day(2023, 1, 1));
        assert!(config.end_date.is_none());
        assert_eq!(config.request_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_timestamp_start_date() {
        let config = TapConfig::from_json(
            r#"{"start_date": "2023-01-01T00:00:00Z", "end_date": "2023-01-03", "view_id": "1"}"#,
        )
        .unwrap();
        assert_eq!(config.start_date, day(2023, 1, 1));
        assert_eq!(config.end_date, Some(day(2023, 1, 3)));
    }

    #[test]
    fn test_invalid_date_is_config_error() {
        let err = TapConfig::from_json(r#"{"start_date": "yesterday", "view_id": "1"}"#)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<TapError>(), Some(TapError::Config(_))));
    }

    #[test]
    fn test_missing_view_id() {
        let err = TapConfig::from_json(r#"{"start_date": "2023-01-01"}"#).unwrap_err();
        assert!(err.to_string().contains("view_id"));
    }

    #[test]
    fn test_window_defaults_to_today() {
        let config = TapConfig::from_json(r#"{"start_date": "2023-01-01", "view_id": "1"}"#)
            .unwrap();
        let window = config.window(day(2023, 1, 3)).unwrap();
        assert_eq!(window.end(), day(2023, 1, 3));
        assert_eq!(window.day_count(), 3);
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![day(2023, 1, 1), day(2023, 1, 2), day(2023, 1, 3)]);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = SyncWindow::new(day(2023, 1, 5), day(2023, 1, 1)).unwrap_err();
        assert!(matches!(err.downcast_ref::<TapError>(), Some(TapError::Config(_))));
        assert!(err.to_string().contains("before start_date"));
    }

    #[test]
    fn test_single_day_window() {
        let window = SyncWindow::new(day(2023, 1, 5), day(2023, 1, 5)).unwrap();
        assert_eq!(window.days().count(), 1);
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = TapConfig::from_json(
            r#"{"start_date": "2023-01-01", "view_id": "1", "developer_token": "file-token",
                "oauth_client_id": "id", "oauth_client_secret": "secret"}"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("GA_DEVELOPER_TOKEN", "env-token"),
            ("GA_REFRESH_TOKEN", "refresh"),
            ("GA_OAUTH_CLIENT_ID", ""),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.developer_token, "env-token");
        assert_eq!(credentials.client_id, "id");
        assert_eq!(credentials.refresh_token, "refresh");
    }

    #[test]
    fn test_missing_credentials() {
        let config = TapConfig::from_json(r#"{"start_date": "2023-01-01", "view_id": "1"}"#)
            .unwrap();
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("developer_token"));
    }
}
