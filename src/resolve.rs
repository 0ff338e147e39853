#![doc = "Repository resolution for the CLI: bridges the core's RepositoryResolver trait to the GitLab REST API."]
//
//! # Repository resolution (CLI <-> Core)
//!
//! The core compiler never performs network calls; it expects every scope's repository to
//! be resolved up front. This module provides the resolvers the CLI plugs in:
//!
//! - [`GitlabClient`] fetches `GET <endpoint>/projects/<id>` with the connection's token,
//!   honouring the connection's proxy.
//! - [`OfflineResolver`] refuses every lookup, for `--offline` runs where every scope must
//!   carry an inline repository.
//!
//! For the trait contract and the mock used in tests, see the core's `contract` module.

use async_trait::async_trait;
use blueprint_planner_core::contract::{
    ConnectionDescriptor, RepositoryDescriptor, RepositoryResolver, ResolveError,
};
use url::Url;

pub struct GitlabClient {
    http: reqwest::Client,
}

impl GitlabClient {
    /// Builds an HTTP client for `connection`, routed through its proxy when one is set.
    pub fn new(connection: &ConnectionDescriptor) -> Result<Self, ResolveError> {
        let mut builder = reqwest::Client::builder();
        if !connection.proxy.trim().is_empty() {
            let proxy = reqwest::Proxy::all(connection.proxy.trim()).map_err(|e| {
                tracing::error!(error = ?e, proxy = %connection.proxy, "Invalid proxy for connection");
                e
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build()?;
        tracing::info!(
            connection_id = connection.id,
            proxied = !connection.proxy.trim().is_empty(),
            "Initialized GitLab client"
        );
        Ok(Self { http })
    }
}

/// `<endpoint>/projects/<id>`, tolerating endpoints with or without a trailing slash.
pub fn project_url(endpoint: &str, project_id: u64) -> Result<Url, url::ParseError> {
    let base = if endpoint.ends_with('/') {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("{endpoint}/"))?
    };
    base.join(&format!("projects/{project_id}"))
}

#[async_trait]
impl RepositoryResolver for GitlabClient {
    async fn resolve(
        &self,
        connection: &ConnectionDescriptor,
        project_id: u64,
    ) -> Result<RepositoryDescriptor, ResolveError> {
        let url = project_url(&connection.endpoint, project_id)?;
        tracing::info!(url = %url, project_id, "Fetching GitLab project");

        let response = self
            .http
            .get(url)
            .bearer_auth(&connection.access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, project_id, "Request for GitLab project failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, project_id, "GitLab refused project lookup");
            return Err(format!("GitLab returned {status} for project {project_id}").into());
        }

        let repository: RepositoryDescriptor = response.json().await?;
        tracing::info!(
            project_id = repository.native_id,
            clone_url = %repository.clone_url,
            "Resolved GitLab project"
        );
        Ok(repository)
    }
}

/// Resolver for offline runs: every lookup fails.
pub struct OfflineResolver;

#[async_trait]
impl RepositoryResolver for OfflineResolver {
    async fn resolve(
        &self,
        _connection: &ConnectionDescriptor,
        project_id: u64,
    ) -> Result<RepositoryDescriptor, ResolveError> {
        tracing::warn!(project_id, "Offline mode: refusing remote repository lookup");
        Err(format!(
            "offline mode: project {project_id} needs an inline `repository` in the blueprint"
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_url_handles_trailing_slash() {
        for endpoint in ["https://gitlab.com/api/v4/", "https://gitlab.com/api/v4"] {
            assert_eq!(
                project_url(endpoint, 123).unwrap().as_str(),
                "https://gitlab.com/api/v4/projects/123"
            );
        }
    }

    #[test]
    fn project_url_rejects_relative_endpoints() {
        assert!(project_url("gitlab.com/api/v4", 1).is_err());
    }
}
