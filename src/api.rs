use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5005";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct KubeconfigRequest {
    pub name: String,
    pub namespace: String,
    pub resources: Vec<String>,
    pub verbs: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RolePermission {
    pub resource: String,
    #[serde(rename = "apiGroup")]
    pub api_group: String,
    pub verbs: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    pub namespace: String,
    pub permissions: Vec<RolePermission>,
}

#[derive(Debug, Deserialize)]
struct NamespacesResponse {
    namespaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KubeconfigResponse {
    kubeconfig: String,
}

#[derive(Debug, Deserialize)]
struct RoleResponse {
    role: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Endpoint {
    Namespaces,
    GenerateKubeconfig,
    GenerateRole,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Namespaces => "/api/namespaces",
            Self::GenerateKubeconfig => "/api/generate-kubeconfig",
            Self::GenerateRole => "/api/generate-role",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::Namespaces => "Failed to fetch namespaces",
            Self::GenerateKubeconfig => "Failed to generate kubeconfig",
            Self::GenerateRole => "Failed to generate role",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx answer; the message is the endpoint's generic failure text.
    #[error("{message}")]
    Status { status: u16, message: &'static str },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
}

/// The backend that owns every cluster-side operation.
#[async_trait]
pub trait AccessApi: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>, ApiError>;
    async fn generate_kubeconfig(&self, request: &KubeconfigRequest) -> Result<String, ApiError>;
    async fn generate_role(&self, request: &RoleRequest) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpAccessApi {
    client: Client,
    base_url: String,
}

impl HttpAccessApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kubeaccess/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn check_status(
        endpoint: Endpoint,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            "{} answered {status}: {}",
            endpoint.path(),
            body.chars().take(240).collect::<String>()
        );
        Err(status_error(endpoint, status))
    }
}

#[async_trait]
impl AccessApi for HttpAccessApi {
    async fn list_namespaces(&self) -> Result<Vec<String>, ApiError> {
        let endpoint = Endpoint::Namespaces;
        debug!("GET {}", self.url(endpoint));
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check_status(endpoint, response).await?;
        let body = response
            .json::<NamespacesResponse>()
            .await
            .map_err(decode_error)?;
        Ok(body.namespaces)
    }

    async fn generate_kubeconfig(&self, request: &KubeconfigRequest) -> Result<String, ApiError> {
        let endpoint = Endpoint::GenerateKubeconfig;
        debug!(
            "POST {} name={} namespace={} resources={} verbs={}",
            self.url(endpoint),
            request.name,
            request.namespace,
            request.resources.len(),
            request.verbs.len()
        );
        let response = self
            .client
            .post(self.url(endpoint))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check_status(endpoint, response).await?;
        let body = response
            .json::<KubeconfigResponse>()
            .await
            .map_err(decode_error)?;
        Ok(body.kubeconfig)
    }

    async fn generate_role(&self, request: &RoleRequest) -> Result<String, ApiError> {
        let endpoint = Endpoint::GenerateRole;
        debug!(
            "POST {} name={} namespace={} permissions={}",
            self.url(endpoint),
            request.name,
            request.namespace,
            request.permissions.len()
        );
        let response = self
            .client
            .post(self.url(endpoint))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check_status(endpoint, response).await?;
        let body = response
            .json::<RoleResponse>()
            .await
            .map_err(decode_error)?;
        if let Some(message) = body.message {
            debug!("role endpoint: {message}");
        }
        Ok(body.role)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn status_error(endpoint: Endpoint, status: StatusCode) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        message: endpoint.failure_message(),
    }
}

fn transport_error(error: reqwest::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}

fn decode_error(error: reqwest::Error) -> ApiError {
    ApiError::Decode(error.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{
        AccessApi, ApiError, DEFAULT_API_BASE_URL, Endpoint, HttpAccessApi, KubeconfigRequest,
        RolePermission, RoleRequest, normalize_base_url,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers exactly one HTTP request with a canned response and hands back
    /// the raw request it received.
    pub(crate) async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..read]);
                if request_complete(&raw) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (base_url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    pub(crate) fn request_body(raw: &str) -> serde_json::Value {
        let (_, body) = raw.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(normalize_base_url("http://api:5005/"), "http://api:5005");
        assert_eq!(normalize_base_url("  "), DEFAULT_API_BASE_URL);
        let api = HttpAccessApi::new("http://localhost:5005//").unwrap();
        assert_eq!(
            api.url(Endpoint::GenerateKubeconfig),
            "http://localhost:5005/api/generate-kubeconfig"
        );
    }

    #[test]
    fn role_permission_uses_camel_case_group() {
        let request = RoleRequest {
            name: "reader".to_string(),
            namespace: "default".to_string(),
            permissions: vec![RolePermission {
                resource: "deployments".to_string(),
                api_group: "apps".to_string(),
                verbs: vec!["get".to_string()],
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["permissions"][0]["apiGroup"], "apps");
        assert_eq!(value["permissions"][0]["resource"], "deployments");
    }

    #[tokio::test]
    async fn namespaces_are_returned_in_server_order() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"namespaces":["kube-system","default","apps"]}"#).await;
        let api = HttpAccessApi::new(&base_url).unwrap();

        let namespaces = api.list_namespaces().await.unwrap();
        assert_eq!(namespaces, vec!["kube-system", "default", "apps"]);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/namespaces "));
    }

    #[tokio::test]
    async fn namespace_server_error_maps_to_generic_failure() {
        let (base_url, _server) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let api = HttpAccessApi::new(&base_url).unwrap();

        let error = api.list_namespaces().await.unwrap_err();
        assert_eq!(
            error,
            ApiError::Status {
                status: 500,
                message: "Failed to fetch namespaces"
            }
        );
        assert_eq!(error.to_string(), "Failed to fetch namespaces");
    }

    #[tokio::test]
    async fn malformed_namespace_body_is_a_decode_error() {
        let (base_url, _server) = serve_once("200 OK", r#"{"items":[]}"#).await;
        let api = HttpAccessApi::new(&base_url).unwrap();

        let error = api.list_namespaces().await.unwrap_err();
        assert!(matches!(error, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn kubeconfig_request_posts_exact_body() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"message":"ok","kubeconfig":"apiVersion: v1\n"}"#).await;
        let api = HttpAccessApi::new(&base_url).unwrap();
        let request = KubeconfigRequest {
            name: "svc1".to_string(),
            namespace: "default".to_string(),
            resources: vec!["pods".to_string()],
            verbs: vec!["get".to_string(), "list".to_string()],
        };

        let content = api.generate_kubeconfig(&request).await.unwrap();
        assert_eq!(content, "apiVersion: v1\n");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/generate-kubeconfig "));
        assert_eq!(
            request_body(&raw),
            serde_json::json!({
                "name": "svc1",
                "namespace": "default",
                "resources": ["pods"],
                "verbs": ["get", "list"],
            })
        );
    }

    #[tokio::test]
    async fn kubeconfig_rejection_uses_generic_message() {
        let (base_url, _server) =
            serve_once("400 Bad Request", r#"{"error":"Missing required fields"}"#).await;
        let api = HttpAccessApi::new(&base_url).unwrap();
        let request = KubeconfigRequest {
            name: "svc1".to_string(),
            namespace: "default".to_string(),
            resources: vec!["pods".to_string()],
            verbs: Vec::new(),
        };

        let error = api.generate_kubeconfig(&request).await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to generate kubeconfig");
    }

    #[tokio::test]
    async fn role_response_returns_manifest() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"message":"Role created successfully","role":"kind: Role\n"}"#,
        )
        .await;
        let api = HttpAccessApi::new(&base_url).unwrap();
        let request = RoleRequest {
            name: "reader".to_string(),
            namespace: "team-a".to_string(),
            permissions: vec![RolePermission {
                resource: "pods".to_string(),
                api_group: String::new(),
                verbs: vec!["get".to_string()],
            }],
        };

        assert_eq!(api.generate_role(&request).await.unwrap(), "kind: Role\n");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/generate-role "));
        assert_eq!(request_body(&raw)["permissions"][0]["apiGroup"], "");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let api = HttpAccessApi::new(&base_url).unwrap();

        let error = api.list_namespaces().await.unwrap_err();
        assert!(matches!(error, ApiError::Transport(_)));
    }
}
