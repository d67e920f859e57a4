//! [`OpenApiTransport`]: the reqwest implementation of [`Transport`].

use std::time::Duration;

use apiclient::{
    Cluster, ErrorPayload, Namespace, NamespaceId, NamespaceSpec, Node, NodeId,
    SharedCredentials, Transport, TransportError, User, UserId, UserSpec, Version, Volume,
    VolumeId, VolumeSpec,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::codec::{self, decode_all};
use crate::model;

/// Connection settings for an [`OpenApiTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// `host:port` of the API endpoint.
    pub endpoint: String,
    /// URL scheme, `http` unless TLS terminates at the endpoint.
    pub scheme: String,
    pub user_agent: String,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            scheme: "http".to_string(),
            user_agent: concat!("storageos-cli/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    fn base_url(&self) -> String {
        format!("{}://{}/v2", self.scheme, self.endpoint.trim_end_matches('/'))
    }
}

/// Failure to construct an [`OpenApiTransport`].
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no API endpoint configured")]
    NoEndpoint,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Speaks the StorageOS v2 REST API.
///
/// Every request holds a read guard on the shared credential while in flight;
/// [`Transport::authenticate`] holds the write guard for the whole login
/// exchange.
#[derive(Debug, Clone)]
pub struct OpenApiTransport {
    http: reqwest::Client,
    base_url: String,
    credentials: SharedCredentials,
}

impl OpenApiTransport {
    pub fn new(config: &TransportConfig, credentials: SharedCredentials) -> Result<Self, SetupError> {
        if config.endpoint.trim().is_empty() {
            return Err(SetupError::NoEndpoint);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "api request");
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends `request` with the current credential and decodes a JSON body.
    async fn send<M: DeserializeOwned>(&self, request: RequestBuilder) -> Result<M, TransportError> {
        let response = self.execute(request).await?;
        let body = response.bytes().await.map_err(request_error)?;
        serde_json::from_slice(&body).map_err(|err| TransportError::Decode {
            message: err.to_string(),
        })
    }

    /// Sends `request` with the current credential, discarding the body.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), TransportError> {
        self.execute(request).await.map(drop)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let credentials = self.credentials.read().await;
        let request = match credentials.as_ref() {
            Some(token) => request.header(AUTHORIZATION, token.expose()),
            None => request,
        };

        let response = request.send().await.map_err(request_error)?;
        check_status(response).await
    }
}

fn request_error(err: reqwest::Error) -> TransportError {
    TransportError::Request {
        message: err.to_string(),
    }
}

/// Turns a non-2xx response into [`TransportError::Response`].
async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let payload = match serde_json::from_str::<model::ErrorBody>(&body) {
        Ok(parsed) => ErrorPayload::Structured {
            error: parsed.error,
        },
        Err(_) => ErrorPayload::Raw(body),
    };

    debug!(status = status.as_u16(), "api error response");
    Err(TransportError::Response {
        status: status.as_u16(),
        payload,
    })
}

// The API parses asyncMax with Go's duration syntax.
fn async_max_param(bound: Duration) -> String {
    format!("{}ms", bound.as_millis())
}

fn volume_path(namespace: &NamespaceId, id: &VolumeId) -> String {
    format!("/namespaces/{namespace}/volumes/{id}")
}

#[async_trait]
impl Transport for OpenApiTransport {
    #[instrument(skip_all, fields(username = %username))]
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, TransportError> {
        let mut credentials = self.credentials.write().await;

        let response = self
            .request(Method::POST, "/auth/login")
            .json(&model::AuthUserData { username, password })
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let token = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim_start_matches("Bearer ").to_string())
            .and_then(apiclient::BearerToken::new)
            .ok_or_else(|| TransportError::Decode {
                message: "login response carried no token".to_string(),
            })?;

        let body = response.bytes().await.map_err(request_error)?;
        let user: model::User =
            serde_json::from_slice(&body).map_err(|err| TransportError::Decode {
                message: err.to_string(),
            })?;

        *credentials = Some(token);
        codec::decode_user(user)
    }

    async fn get_cluster(&self) -> Result<Cluster, TransportError> {
        let model = self.send(self.request(Method::GET, "/cluster")).await?;
        codec::decode_cluster(model)
    }

    async fn get_node(&self, id: &NodeId) -> Result<Node, TransportError> {
        let model = self
            .send(self.request(Method::GET, &format!("/nodes/{id}")))
            .await?;
        codec::decode_node(model)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, TransportError> {
        let models = self.send(self.request(Method::GET, "/nodes")).await?;
        decode_all(models, codec::decode_node)
    }

    async fn get_namespace(&self, id: &NamespaceId) -> Result<Namespace, TransportError> {
        let model = self
            .send(self.request(Method::GET, &format!("/namespaces/{id}")))
            .await?;
        codec::decode_namespace(model)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, TransportError> {
        let models = self.send(self.request(Method::GET, "/namespaces")).await?;
        decode_all(models, codec::decode_namespace)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, TransportError> {
        let model = self
            .send(self.request(Method::GET, &format!("/users/{id}")))
            .await?;
        codec::decode_user(model)
    }

    async fn list_users(&self) -> Result<Vec<User>, TransportError> {
        let models = self.send(self.request(Method::GET, "/users")).await?;
        decode_all(models, codec::decode_user)
    }

    async fn get_volume(&self, ns: &NamespaceId, id: &VolumeId) -> Result<Volume, TransportError> {
        let model = self
            .send(self.request(Method::GET, &volume_path(ns, id)))
            .await?;
        codec::decode_volume(model)
    }

    async fn list_volumes(&self, ns: &NamespaceId) -> Result<Vec<Volume>, TransportError> {
        let models = self
            .send(self.request(Method::GET, &format!("/namespaces/{ns}/volumes")))
            .await?;
        decode_all(models, codec::decode_volume)
    }

    async fn create_volume(
        &self,
        ns: &NamespaceId,
        spec: &VolumeSpec,
        async_max: Option<Duration>,
    ) -> Result<Volume, TransportError> {
        let body = model::CreateVolumeData {
            namespace_id: ns.as_str(),
            name: &spec.name,
            description: &spec.description,
            fs_type: spec.filesystem.as_wire(),
            size_bytes: spec.size_bytes,
            labels: spec.labels.iter().collect(),
        };

        let mut request = self
            .request(Method::POST, &format!("/namespaces/{ns}/volumes"))
            .json(&body);
        if let Some(bound) = async_max {
            request = request.query(&[("asyncMax", async_max_param(bound))]);
        }

        codec::decode_volume(self.send(request).await?)
    }

    async fn create_namespace(&self, spec: &NamespaceSpec) -> Result<Namespace, TransportError> {
        let body = model::CreateNamespaceData {
            name: &spec.name,
            labels: spec.labels.iter().collect(),
        };
        let model = self
            .send(self.request(Method::POST, "/namespaces").json(&body))
            .await?;
        codec::decode_namespace(model)
    }

    async fn create_user(&self, spec: &UserSpec) -> Result<User, TransportError> {
        let body = model::CreateUserData {
            username: &spec.username,
            password: &spec.password,
            is_admin: spec.with_admin,
            groups: spec.groups.iter().map(|g| g.as_str()).collect(),
        };
        let model = self
            .send(self.request(Method::POST, "/users").json(&body))
            .await?;
        codec::decode_user(model)
    }

    async fn delete_volume(
        &self,
        ns: &NamespaceId,
        id: &VolumeId,
        version: &Version,
        async_max: Option<Duration>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .request(Method::DELETE, &volume_path(ns, id))
            .query(&[("version", version.as_str())]);
        if let Some(bound) = async_max {
            request = request.query(&[("asyncMax", async_max_param(bound))]);
        }
        self.send_empty(request).await
    }

    async fn detach_volume(
        &self,
        ns: &NamespaceId,
        id: &VolumeId,
        version: &Version,
    ) -> Result<(), TransportError> {
        let request = self
            .request(Method::DELETE, &format!("{}/attach", volume_path(ns, id)))
            .query(&[("version", version.as_str())]);
        self.send_empty(request).await
    }

    async fn set_replicas(
        &self,
        ns: &NamespaceId,
        id: &VolumeId,
        replicas: u64,
        version: &Version,
    ) -> Result<Volume, TransportError> {
        let body = model::SetReplicasData {
            replicas,
            version: version.as_str(),
        };
        let model = self
            .send(
                self.request(Method::PUT, &format!("{}/replicas", volume_path(ns, id)))
                    .json(&body),
            )
            .await?;
        codec::decode_volume(model)
    }

    async fn delete_namespace(&self, id: &NamespaceId, version: &Version) -> Result<(), TransportError> {
        let request = self
            .request(Method::DELETE, &format!("/namespaces/{id}"))
            .query(&[("version", version.as_str())]);
        self.send_empty(request).await
    }

    async fn delete_user(&self, id: &UserId, version: &Version) -> Result<(), TransportError> {
        let request = self
            .request(Method::DELETE, &format!("/users/{id}"))
            .query(&[("version", version.as_str())]);
        self.send_empty(request).await
    }
}
