use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::{MembershipError, MEMBERS_PATH};
use crate::types::{MemberList, ObservedMember};

/// Upper bound on how much of an error body is kept for logging.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Timeout settings for the members API client.
///
/// Every request carries a finite timeout; there is no way to construct a client that
/// waits indefinitely.
#[derive(Debug, Clone)]
pub struct MembersClientConfig {
    /// TCP connect timeout applied to every request
    pub connect_timeout: Duration,
    /// Total request timeout for membership probes (`GET /v2/members`)
    pub probe_timeout: Duration,
    /// Total request timeout for add/remove requests
    pub mutation_timeout: Duration,
}

impl Default for MembersClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(1000),
            probe_timeout: Duration::from_millis(2000),
            mutation_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Serialize)]
struct AddMemberRequest<'a> {
    name: &'a str,
    #[serde(rename = "peerURLs")]
    peer_urls: &'a [String],
}

/// HTTP client for the etcd v2 members API.
///
/// Mutating calls return the raw status code so callers decide which codes count as
/// success; only transport failures surface as errors.
#[derive(Debug, Clone)]
pub struct MembersClient {
    client: Client,
    config: MembersClientConfig,
}

impl MembersClient {
    /// Creates a new client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, MembershipError> {
        Self::with_config(MembersClientConfig::default())
    }

    /// Creates a new client with the provided timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: MembersClientConfig) -> Result<Self, MembershipError> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.mutation_timeout.max(config.probe_timeout))
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("etcd-bootstrap/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build members api client");
                MembershipError::ClientBuild(e.to_string())
            })?;

        Ok(Self { client, config })
    }

    /// Builds `{base}/v2/members` or `{base}/v2/members/{id}`.
    fn members_url(base: &str, member_id: Option<&str>) -> Result<Url, MembershipError> {
        let mut url = Url::parse(base).map_err(|e| MembershipError::InvalidUrl(format!("{base}: {e}")))?;
        let path = match member_id {
            Some(id) => format!("{MEMBERS_PATH}/{id}"),
            None => MEMBERS_PATH.to_string(),
        };
        url.set_path(&path);
        Ok(url)
    }

    /// Maps a transport-level failure without leaking request details.
    fn classify_network_error(error: &reqwest::Error) -> MembershipError {
        if error.is_timeout() {
            MembershipError::Timeout
        } else if error.is_connect() {
            MembershipError::ConnectionFailed("connection refused or unreachable".to_string())
        } else if error.is_body() || error.is_decode() {
            MembershipError::InvalidResponse("response body error".to_string())
        } else if error.is_redirect() {
            MembershipError::ConnectionFailed("unexpected redirect".to_string())
        } else {
            MembershipError::ConnectionFailed("network error".to_string())
        }
    }

    fn truncate_body(raw: String) -> String {
        if raw.len() > MAX_ERROR_BODY_LEN {
            let mut cut = MAX_ERROR_BODY_LEN;
            while !raw.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated)", &raw[..cut])
        } else {
            raw
        }
    }

    /// Fetches the member list from `base` using the probe timeout.
    ///
    /// # Errors
    ///
    /// - [`MembershipError::Timeout`] / [`MembershipError::ConnectionFailed`] if unreachable
    /// - [`MembershipError::HttpError`] for non-success HTTP status codes
    /// - [`MembershipError::InvalidResponse`] if the body is not a member list
    pub async fn list_members(&self, base: &str) -> Result<Vec<ObservedMember>, MembershipError> {
        let url = Self::members_url(base, None)?;

        let response = self
            .client
            .get(url)
            .timeout(self.config.probe_timeout)
            .send()
            .await
            .map_err(|e| Self::classify_network_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MembershipError::HttpError(status.as_u16(), Self::truncate_body(body)));
        }

        let bytes = response.bytes().await.map_err(|e| Self::classify_network_error(&e))?;
        let list: MemberList = serde_json::from_slice(&bytes)
            .map_err(|e| MembershipError::InvalidResponse(e.to_string()))?;

        Ok(list.members)
    }

    /// Issues `POST {base}/v2/members` and returns the response status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no HTTP response was received.
    pub async fn add_member(
        &self,
        base: &str,
        name: &str,
        peer_urls: &[String],
    ) -> Result<u16, MembershipError> {
        let url = Self::members_url(base, None)?;
        let body = AddMemberRequest { name, peer_urls };

        let response = self
            .client
            .post(url)
            .json(&body)
            .timeout(self.config.mutation_timeout)
            .send()
            .await
            .map_err(|e| Self::classify_network_error(&e))?;

        Ok(response.status().as_u16())
    }

    /// Issues `DELETE {base}/v2/members/{member_id}` and returns the response status.
    ///
    /// # Errors
    ///
    /// Returns an error only if no HTTP response was received.
    pub async fn remove_member(&self, base: &str, member_id: &str) -> Result<u16, MembershipError> {
        let url = Self::members_url(base, Some(member_id))?;

        let response = self
            .client
            .delete(url)
            .timeout(self.config.mutation_timeout)
            .send()
            .await
            .map_err(|e| Self::classify_network_error(&e))?;

        Ok(response.status().as_u16())
    }
}
