//! A client connection to QDS.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;
use url::Url;

use crate::errors::*;
use crate::resource::cluster::ClusterEnvelope;
use crate::resource::{Cluster, ClusterCommand, ClusterIdLabel, ClusterRequest, Outcome};

/// The base URL of the default QDS environment.
pub const DEFAULT_QDS_API_URL: &str = "https://us.qubole.com/api";

/// The cluster API version this client speaks.
const API_VERSION: &str = "v1.3";

/// QDS authenticates requests with a token header, never URL parameters.
const AUTH_TOKEN_HEADER: &str = "X-AUTH-TOKEN";

/// A client connection to QDS.
///
/// This owns the endpoint and the account's API token, so one invocation's
/// connection context never leaks into another. Construct it once and pass it
/// wherever a dispatch happens.
pub struct Client {
    api_url: Url,
    api_token: String,
}

impl Client {
    /// Create a new `Client` talking to the default QDS environment.
    pub fn new<S>(api_token: S) -> Result<Client>
    where
        S: Into<String>,
    {
        Client::new_with_endpoint(DEFAULT_QDS_API_URL, api_token)
    }

    /// Create a new `Client` talking to a custom endpoint, for accounts
    /// hosted outside the default environment.
    pub fn new_with_endpoint<S1, S2>(endpoint: S1, api_token: S2) -> Result<Client>
    where
        S1: AsRef<str>,
        S2: Into<String>,
    {
        let endpoint = endpoint.as_ref();
        let api_url = Url::parse(endpoint)
            .map_err(|e| Error::could_not_parse_endpoint(endpoint, e))?;
        Ok(Client {
            api_url,
            api_token: api_token.into(),
        })
    }

    /// Generate a URL for `path` under the versioned API root.
    fn url(&self, path: &str) -> Url {
        let mut url = self.api_url.clone();
        let base = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{}/{}/{}", base, API_VERSION, path));
        url
    }

    /// Run a single cluster lifecycle command, reporting whether it mutated
    /// remote state and the payload the service returned.
    ///
    /// `Get` never reports `changed`; the four mutating commands always do.
    /// There is no retry and no idempotency at this layer: running `Setup`
    /// twice creates two clusters.
    pub async fn dispatch(&self, command: &ClusterCommand) -> Result<Outcome> {
        let changed = command.changes_remote_state();
        let cluster = match command {
            ClusterCommand::Setup(request) => {
                serde_json::to_value(self.create_cluster(request).await?)?
            }
            ClusterCommand::Get(cluster) => {
                serde_json::to_value(self.show_cluster(cluster).await?)?
            }
            ClusterCommand::Start(cluster) => self.start_cluster(cluster).await?,
            ClusterCommand::Stop(cluster) => self.terminate_cluster(cluster).await?,
            ClusterCommand::Delete(cluster) => self.delete_cluster(cluster).await?,
        };
        Ok(Outcome { changed, cluster })
    }

    /// Create a new cluster from `request`.
    pub async fn create_cluster(&self, request: &ClusterRequest) -> Result<Cluster> {
        let url = self.url("clusters");
        debug!("POST {} {:?}", url, serde_json::to_string(request));
        let client = reqwest::Client::new();
        let res = client
            .post(url.clone())
            .header(AUTH_TOKEN_HEADER, self.api_token.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::could_not_access_url(&url, e))?;
        self.handle_response_and_deserialize(&url, res).await
    }

    /// Fetch an existing cluster by id or label.
    pub async fn show_cluster(&self, cluster: &ClusterIdLabel) -> Result<Cluster> {
        let url = self.url(&format!("clusters/{}", cluster));
        debug!("GET {}", url);
        let client = reqwest::Client::new();
        let res = client
            .get(url.clone())
            .header(AUTH_TOKEN_HEADER, self.api_token.as_str())
            .send()
            .await
            .map_err(|e| Error::could_not_access_url(&url, e))?;
        // The show endpoint wraps the descriptor in a one-key envelope.
        let envelope: ClusterEnvelope =
            self.handle_response_and_deserialize(&url, res).await?;
        Ok(envelope.cluster)
    }

    /// Start a stopped cluster by id or label.
    pub async fn start_cluster(&self, cluster: &ClusterIdLabel) -> Result<Value> {
        self.change_cluster_state(cluster, "start").await
    }

    /// Terminate a running cluster by id or label.
    pub async fn terminate_cluster(&self, cluster: &ClusterIdLabel) -> Result<Value> {
        self.change_cluster_state(cluster, "terminate").await
    }

    /// Start and terminate share a single state-transition endpoint.
    async fn change_cluster_state(
        &self,
        cluster: &ClusterIdLabel,
        state: &str,
    ) -> Result<Value> {
        let url = self.url(&format!("clusters/{}/state", cluster));
        debug!("PUT {} state={}", url, state);
        let client = reqwest::Client::new();
        let res = client
            .put(url.clone())
            .header(AUTH_TOKEN_HEADER, self.api_token.as_str())
            .json(&serde_json::json!({ "state": state }))
            .send()
            .await
            .map_err(|e| Error::could_not_access_url(&url, e))?;
        self.handle_response_and_deserialize(&url, res).await
    }

    /// Delete a cluster by id or label.
    pub async fn delete_cluster(&self, cluster: &ClusterIdLabel) -> Result<Value> {
        let url = self.url(&format!("clusters/{}", cluster));
        debug!("DELETE {}", url);
        let client = reqwest::Client::new();
        let res = client
            .request(reqwest::Method::DELETE, url.clone())
            .header(AUTH_TOKEN_HEADER, self.api_token.as_str())
            .send()
            .await
            .map_err(|e| Error::could_not_access_url(&url, e))?;
        self.handle_response_and_deserialize(&url, res).await
    }

    /// Handle a response from the server, deserializing it as the
    /// appropriate type.
    async fn handle_response_and_deserialize<T>(
        &self,
        url: &Url,
        res: reqwest::Response,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if res.status().is_success() {
            let body = res
                .text()
                .await
                .map_err(|e| Error::could_not_access_url(url, e))?;
            debug!("success body: {}", body);
            let value = serde_json::from_str(&body)
                .map_err(|e| Error::could_not_access_url(url, e))?;
            Ok(value)
        } else {
            self.response_to_err(url, res).await
        }
    }

    async fn response_to_err<T>(&self, url: &Url, res: reqwest::Response) -> Result<T> {
        let status = res.status();
        let body = res.text().await?;
        debug!("error status: {} body: {}", status, body);
        Err(Error::OperationFailed {
            url: url.to_owned(),
            status,
            message: error_message_from_body(&body),
        })
    }
}

// Manual impl so the API token can't leak into logs.
impl fmt::Debug for Client {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Client")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &"*****")
            .finish()
    }
}

/// Extract the human-readable message from a QDS error body. The service
/// usually sends `{"error": {"error_code": …, "error_message": …}}`, but
/// proxies in front of it may send anything.
fn error_message_from_body(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        error_message: String,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.error_message,
        Err(_) => body.trim().to_owned(),
    }
}

#[test]
fn urls_are_versioned_under_the_api_root() {
    let client = Client::new("secret").unwrap();
    assert_eq!(
        client.url("clusters").as_str(),
        "https://us.qubole.com/api/v1.3/clusters"
    );
    assert_eq!(
        client.url("clusters/42/state").as_str(),
        "https://us.qubole.com/api/v1.3/clusters/42/state"
    );
}

#[test]
fn custom_endpoints_keep_their_path_prefix() {
    let client = Client::new_with_endpoint("https://eu-central-1.qubole.com/api", "secret")
        .unwrap();
    assert_eq!(
        client.url("clusters").as_str(),
        "https://eu-central-1.qubole.com/api/v1.3/clusters"
    );
}

#[test]
fn client_debug_is_sanitizable() {
    let client = Client::new("secret").unwrap();
    let debugged = format!("{:?}", client);
    println!("debugged = {:?}", debugged);
    assert!(!debugged.contains("secret"));
}

#[test]
fn error_message_from_body_unwraps_the_qds_envelope() {
    let body = r#"{"error": {"error_code": 422, "error_message": "quota exceeded"}}"#;
    assert_eq!(error_message_from_body(body), "quota exceeded");
}

#[test]
fn error_message_from_body_passes_other_bodies_through() {
    assert_eq!(error_message_from_body("Bad Gateway\n"), "Bad Gateway");
}
