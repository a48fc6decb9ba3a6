//! Remote API clients
//!
//! The sync engine talks to the Reporting and Management APIs through the
//! [`ReportingApi`] and [`ManagementApi`] traits. [`GoogleAnalyticsClient`]
//! implements both over HTTP.

mod auth;
mod google;

use crate::report::{Goal, ReportRequest, ReportResponse};
use eyre::Result;

pub use auth::{AccessToken, Credentials, TokenResponse};
pub use google::{GoogleAnalyticsClient, MANAGEMENT_URL, REPORTING_URL, TOKEN_URL};

/// Executes report requests
pub trait ReportingApi: Send + Sync {
    /// Run one report request and return its response
    ///
    /// # Errors
    /// Returns an error on network, authentication, quota or request failures
    fn batch_get(
        &self,
        request: &ReportRequest,
    ) -> impl std::future::Future<Output = Result<ReportResponse>> + Send;
}

/// Resolves account configuration
pub trait ManagementApi: Send + Sync {
    /// List the goals configured on a view, in API order
    fn list_goals(
        &self,
        account_id: &str,
        web_property_id: &str,
        view_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Goal>>> + Send;
}

impl<T: ReportingApi> ReportingApi for &T {
    async fn batch_get(&self, request: &ReportRequest) -> Result<ReportResponse> {
        (**self).batch_get(request).await
    }
}

impl<T: ManagementApi> ManagementApi for &T {
    async fn list_goals(
        &self,
        account_id: &str,
        web_property_id: &str,
        view_id: &str,
    ) -> Result<Vec<Goal>> {
        (**self)
            .list_goals(account_id, web_property_id, view_id)
            .await
    }
}
