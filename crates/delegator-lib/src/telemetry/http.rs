//! HTTP client for cluster management endpoints

use super::{async_trait, ClusterApi};
use crate::error::{DelegationError, Result};
use crate::models::{Candidate, ClusterStatus, Credential, JobHistory, ServiceDescriptor};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// [`ClusterApi`] over HTTP with per-candidate basic or bearer authentication
#[derive(Debug, Clone)]
pub struct HttpClusterApi {
    client: Client,
    timeout: Duration,
}

impl HttpClusterApi {
    /// Create a client whose every request is bounded by `timeout`.
    ///
    /// `insecure_tls` accepts self-signed cluster certificates.
    pub fn new(timeout: Duration, insecure_tls: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure_tls)
            .build()
            .map_err(|e| DelegationError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Build `{url}/{path}` for a candidate
    pub fn endpoint(candidate: &Candidate, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", candidate.url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| DelegationError::Transport {
            endpoint: raw.clone(),
            message: format!("invalid URL: {e}"),
        })
    }

    fn authorize(request: RequestBuilder, candidate: &Candidate) -> Result<RequestBuilder> {
        match candidate.credential() {
            Some(Credential::Bearer { token }) => Ok(request.bearer_auth(token)),
            Some(Credential::Basic { user, password }) => Ok(request.basic_auth(user, Some(password))),
            None => Err(DelegationError::MissingCredential {
                endpoint: candidate.url.clone(),
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, candidate: &Candidate, path: &str) -> Result<T> {
        let url = Self::endpoint(candidate, path)?;
        let endpoint = url.to_string();
        let request = Self::authorize(self.client.get(url), candidate)?;

        debug!(endpoint = %endpoint, "GET");
        let response = request
            .send()
            .await
            .map_err(|e| DelegationError::from_reqwest(&endpoint, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DelegationError::Transport {
                endpoint,
                message: format!("unexpected status {}: {}", status, body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DelegationError::from_reqwest(&endpoint, self.timeout, e))?;

        serde_json::from_slice(&body).map_err(|e| DelegationError::MalformedResponse {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    async fn service(&self, candidate: &Candidate) -> Result<ServiceDescriptor> {
        self.get_json(candidate, &format!("system/services/{}", candidate.service))
            .await
    }

    async fn status(&self, candidate: &Candidate) -> Result<ClusterStatus> {
        self.get_json(candidate, "system/status").await
    }

    async fn job_history(&self, candidate: &Candidate) -> Result<JobHistory> {
        self.get_json(candidate, &format!("system/logs/{}", candidate.service))
            .await
    }

    async fn submit_job(&self, candidate: &Candidate, token: &str, payload: &[u8]) -> Result<u16> {
        let url = Self::endpoint(candidate, &format!("job/{}", candidate.service))?;
        let endpoint = url.to_string();

        debug!(endpoint = %endpoint, bytes = payload.len(), "POST");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| DelegationError::from_reqwest(&endpoint, self.timeout, e))?;

        Ok(response.status().as_u16())
    }
}
