//! Mock of the Compute Engine metadata server and `instances.list` API.
//!
//! Both APIs are served from the same mockito server; point `metadata_url` and
//! `compute_url` at [`GceMockBuilder::url`].

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

pub const PROJECT: &str = "etcd-prod";
pub const ZONE: &str = "europe-west1-b";
pub const ACCESS_TOKEN: &str = "ya29.test-token";

/// Builder for a mock GCE environment.
pub struct GceMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl GceMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Serves a plain-text metadata value, requiring the `Metadata-Flavor` header.
    pub async fn mock_metadata(&mut self, path: &str, value: &str) -> &mut Self {
        let mock = self
            .server
            .mock("GET", format!("/computeMetadata/v1/{path}").as_str())
            .match_header("metadata-flavor", "Google")
            .with_status(200)
            .with_header("content-type", "application/text")
            .with_body(value)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Serves a metadata error for `path`.
    pub async fn mock_metadata_status(&mut self, path: &str, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock("GET", format!("/computeMetadata/v1/{path}").as_str())
            .with_status(status)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }

    /// Serves everything an instance needs before the inventory call: identity, project,
    /// zone and access token.
    pub async fn mock_instance(&mut self, id: &str, ip: &str) -> &mut Self {
        self.mock_metadata("instance/id", id).await;
        self.mock_metadata("instance/network-interfaces/0/ip", ip).await;
        self.mock_metadata("project/project-id", PROJECT).await;
        self.mock_metadata("instance/zone", &format!("projects/123456/zones/{ZONE}")).await;

        let token = json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })
        .to_string();
        self.mock_metadata("instance/service-accounts/default/token", &token).await;
        self
    }

    /// Serves one page of `instances.list`.
    ///
    /// `page_token` is the token the request must carry (`None` for the first page) and
    /// `next_page_token` is the token returned for the following page.
    pub async fn mock_instances_page(
        &mut self,
        page_token: Option<&str>,
        items: Vec<Value>,
        next_page_token: Option<&str>,
    ) -> Mock {
        let query = match page_token {
            Some(token) => Matcher::Regex(format!("pageToken={token}")),
            None => Matcher::Regex(r"^filter=[^&]*$".to_string()),
        };

        let mut body = json!({ "kind": "compute#instanceList", "items": items });
        if let Some(next) = next_page_token {
            body["nextPageToken"] = json!(next);
        }

        self.server
            .mock("GET", format!("/compute/v1/projects/{PROJECT}/zones/{ZONE}/instances").as_str())
            .match_query(query)
            .match_header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await
    }

    /// Serves `items` with the same `nextPageToken` on every page, so paging never ends.
    pub async fn mock_instances_endless(&mut self, items: Vec<Value>, expected_pages: usize) -> Mock {
        let body = json!({ "kind": "compute#instanceList", "items": items, "nextPageToken": "again" });

        self.server
            .mock("GET", format!("/compute/v1/projects/{PROJECT}/zones/{ZONE}/instances").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(expected_pages)
            .create_async()
            .await
    }

    /// Answers `instances.list` with an error status.
    pub async fn mock_instances_status(&mut self, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock("GET", format!("/compute/v1/projects/{PROJECT}/zones/{ZONE}/instances").as_str())
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(r#"{"error":{"code":403,"message":"Required 'compute.instances.list' permission"}}"#)
            .create_async()
            .await;

        self.mocks.push(mock);
        self
    }
}

/// Builds an `instances.list` item.
#[must_use]
pub fn gce_instance(id: &str, name: &str, status: &str, ip: Option<&str>) -> Value {
    let interfaces = match ip {
        Some(ip) => json!([{ "name": "nic0", "networkIP": ip }]),
        None => json!([]),
    };

    json!({
        "id": id,
        "name": name,
        "status": status,
        "labels": { "etcd-cluster": "main" },
        "networkInterfaces": interfaces
    })
}
