//! Google Analytics HTTP client
//!
//! Implements both API seams against the Reporting API v4 and the Management
//! API v3, with an OAuth refresh-token flow in front of them.

use super::auth::{AccessToken, Credentials, TokenResponse};
use super::{ManagementApi, ReportingApi};
use crate::report::{Goal, GoalList, ReportRequest, ReportResponse};
use eyre::{Context, Result, eyre};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

pub const REPORTING_URL: &str = "https://analyticsreporting.googleapis.com/v4/";
pub const MANAGEMENT_URL: &str = "https://www.googleapis.com/analytics/v3/";
pub const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

/// Client for the Google Analytics reporting and management APIs
///
/// # Example
/// ```no_run
/// use tap_googleanalytics::client::{Credentials, GoogleAnalyticsClient, ManagementApi};
///
/// # async fn example() -> eyre::Result<()> {
/// let credentials = Credentials {
///     developer_token: "ya29...".to_string(),
///     client_id: "id.apps.googleusercontent.com".to_string(),
///     client_secret: "secret".to_string(),
///     refresh_token: "1//0g...".to_string(),
/// };
/// let client = GoogleAnalyticsClient::try_new(credentials)?;
/// let goals = client.list_goals("123", "UA-123-1", "456").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GoogleAnalyticsClient {
    client: Client,
    credentials: Credentials,
    token: Mutex<AccessToken>,
    reporting_url: Url,
    management_url: Url,
    token_url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetRequest<'a> {
    report_requests: [&'a ReportRequest; 1],
}

impl GoogleAnalyticsClient {
    /// Create a client against the public Google endpoints
    pub fn try_new(credentials: Credentials) -> Result<Self> {
        Self::with_endpoints(
            credentials,
            Url::parse(REPORTING_URL)?,
            Url::parse(MANAGEMENT_URL)?,
            Url::parse(TOKEN_URL)?,
        )
    }

    /// Create a client against custom endpoints
    ///
    /// Base URLs must end with a slash so relative paths join beneath them.
    pub fn with_endpoints(
        credentials: Credentials,
        reporting_url: Url,
        management_url: Url,
        token_url: Url,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tap-googleanalytics/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let token = Mutex::new(AccessToken::new(credentials.developer_token.clone()));

        Ok(Self {
            client,
            credentials,
            token,
            reporting_url,
            management_url,
            token_url,
        })
    }

    pub fn batch_get_url(&self) -> Result<Url> {
        // Without the leading `./`, `reports:` parses as a URL scheme
        self.reporting_url
            .join("./reports:batchGet")
            .with_context(|| "Invalid reporting URL")
    }

    pub fn goals_url(&self, account_id: &str, web_property_id: &str, view_id: &str) -> Result<Url> {
        let path = format!(
            "management/accounts/{}/webproperties/{}/profiles/{}/goals",
            account_id, web_property_id, view_id
        );
        self.management_url
            .join(&path)
            .with_context(|| "Invalid management URL")
    }

    /// Exchange the refresh token for a new access token
    async fn refresh_token(&self) -> Result<AccessToken> {
        log::debug!("Refreshing OAuth access token");
        let response = self
            .client
            .post(self.token_url.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(self.credentials.refresh_form())
            .send()
            .await
            .map_err(|e| eyre!("Failed to send token refresh request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Failed to refresh access token ({}): {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse token response")?;
        Ok(token.into())
    }

    async fn bearer(&self, force_refresh: bool) -> Result<String> {
        let mut token = self.token.lock().await;
        if force_refresh || token.is_expired() {
            *token = self.refresh_token().await?;
            log::debug!("Using {}", *token);
        }
        Ok(token.token.clone())
    }

    /// Send an authorized request, refreshing the token once on 401
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let bearer = self.bearer(false).await?;
        let response = build()
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        log::debug!("Access token rejected, retrying with a refreshed token");
        let bearer = self.bearer(true).await?;
        build()
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))
    }

    async fn request_json<T, F>(&self, method: &Method, url: &Url, build: F) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let response = self.send(build).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("{} {} failed ({}): {}", method, url, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

impl ReportingApi for GoogleAnalyticsClient {
    async fn batch_get(&self, request: &ReportRequest) -> Result<ReportResponse> {
        let url = self.batch_get_url()?;
        let body = BatchGetRequest {
            report_requests: [request],
        };
        log::trace!("POST {} {}", url, serde_json::to_string(&body)?);

        self.request_json(&Method::POST, &url, || {
            self.client.post(url.clone()).json(&body)
        })
        .await
    }
}

impl ManagementApi for GoogleAnalyticsClient {
    async fn list_goals(
        &self,
        account_id: &str,
        web_property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Goal>> {
        let url = self.goals_url(account_id, web_property_id, view_id)?;
        log::trace!("GET {}", url);

        let goals: GoalList = self
            .request_json(&Method::GET, &url, || self.client.get(url.clone()))
            .await?;
        Ok(goals.items)
    }
}

impl std::fmt::Display for GoogleAnalyticsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (client {})", self.reporting_url, self.credentials.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::build_request;
    use chrono::NaiveDate;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials {
            developer_token: "dev".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let client = GoogleAnalyticsClient::try_new(credentials()).unwrap();
        assert_eq!(
            client.batch_get_url().unwrap().as_str(),
            "https://analyticsreporting.googleapis.com/v4/reports:batchGet"
        );
        assert_eq!(
            client.goals_url("1", "UA-1-1", "99").unwrap().as_str(),
            "https://www.googleapis.com/analytics/v3/management/accounts/1/webproperties/UA-1-1/profiles/99/goals"
        );
    }

    #[test]
    fn test_custom_endpoints() {
        let client = GoogleAnalyticsClient::with_endpoints(
            credentials(),
            Url::parse("http://localhost:8080/reporting/").unwrap(),
            Url::parse("http://localhost:8080/mgmt/").unwrap(),
            Url::parse("http://localhost:8080/token").unwrap(),
        )
        .unwrap();
        assert_eq!(
            client.batch_get_url().unwrap().as_str(),
            "http://localhost:8080/reporting/reports:batchGet"
        );
        assert!(client.to_string().contains("localhost"));
    }

    #[test]
    fn test_batch_get_body() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        let request = build_request("123", day, &["ga:sessions"], &["ga:date"], None);
        let body = BatchGetRequest {
            report_requests: [&request],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["reportRequests"][0]["viewId"], json!("123"));
        assert_eq!(value["reportRequests"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_initial_token_is_developer_token() {
        let client = GoogleAnalyticsClient::try_new(credentials()).unwrap();
        assert_eq!(client.bearer(false).await.unwrap(), "dev");
    }
}
