//! OAuth credentials for the Google APIs

use serde::Deserialize;
use std::time::{Duration, Instant};

/// Refresh a little before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth refresh-token credentials
///
/// `developer_token` is used as the initial access token; it is replaced by a
/// refreshed one once it expires or is rejected.
#[derive(Clone)]
pub struct Credentials {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Form body for the refresh-token grant
    pub fn refresh_form(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("refresh_token", &self.refresh_token)
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("developer_token", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Bearer token currently in use
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// Unknown for the initial developer token
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() + EXPIRY_MARGIN >= expires_at)
    }
}

impl std::fmt::Display for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.expires_at {
            Some(_) => write!(f, "Bearer (refreshed)"),
            None => write!(f, "Bearer (developer token)"),
        }
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            token: response.access_token,
            expires_at: response
                .expires_in
                .map(|secs| Instant::now() + Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            developer_token: "dev".to_string(),
            client_id: "client id".to_string(),
            client_secret: "s3cr&t".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[test]
    fn test_refresh_form_is_encoded() {
        let form = credentials().refresh_form();
        assert_eq!(
            form,
            "grant_type=refresh_token&client_id=client+id&client_secret=s3cr%26t&refresh_token=refresh"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("client id"));
        assert!(!debug.contains("s3cr&t"));
        assert!(!debug.contains("refresh\""));
    }

    #[test]
    fn test_token_expiry() {
        let initial = AccessToken::new("dev");
        assert!(!initial.is_expired());

        let short: AccessToken = TokenResponse {
            access_token: "a".to_string(),
            expires_in: Some(10),
        }
        .into();
        assert!(short.is_expired());

        let long: AccessToken = TokenResponse {
            access_token: "b".to_string(),
            expires_in: Some(3600),
        }
        .into();
        assert!(!long.is_expired());
        assert_eq!(long.to_string(), "Bearer (refreshed)");
    }
}
