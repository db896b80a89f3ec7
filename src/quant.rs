//! Minimal Quant Cloud API client.
//!
//! Only the read endpoints needed to validate a deployment target and fetch
//! registry credentials are implemented.

use std::fmt::{Debug, Formatter};
use log::debug;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://dashboard.quantcdn.io/api/v3";

/// Generic message returned by the API when a key has no access to an organization.
const GENERIC_FORBIDDEN: &str = "Forbidden";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{message}")]
    Unauthorized { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("unexpected response body (status {0})")]
    Deserialize(u16),

    #[error("invalid base URL '{0}'")]
    BaseUrl(String),

    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Short-lived container registry credentials.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub endpoint: String,
    pub username: String,
    pub password: String,
}

impl Debug for RegistryCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Application {
    #[serde(default, alias = "appName")]
    pub name: String,
}

/// List endpoints return either a bare array or an object wrapping `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum List<T> {
    Plain(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> From<List<T>> for Vec<T> {
    fn from(list: List<T>) -> Self {
        match list {
            List::Plain(items) | List::Wrapped { data: items } => items,
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| Error::BaseUrl(base_url.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("quant-init/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub async fn list_applications(&self, organization: &str) -> Result<Vec<Application>, Error> {
        self.get::<List<Application>>(&["organizations", organization, "applications"])
            .await
            .map(Vec::from)
    }

    pub async fn registry_credentials(&self, organization: &str) -> Result<RegistryCredentials, Error> {
        self.get(&["organizations", organization, "applications", "ecr-login"])
            .await
    }

    /// Succeeds if the application exists. The response body is not inspected.
    pub async fn get_application(&self, organization: &str, application: &str) -> Result<(), Error> {
        self.send(&["organizations", organization, "applications", application])
            .await
            .map(|_| ())
    }

    /// Succeeds if the environment exists. The response body is not inspected.
    pub async fn get_environment(
        &self,
        organization: &str,
        application: &str,
        environment: &str,
    ) -> Result<(), Error> {
        self.send(&[
            "organizations",
            organization,
            "applications",
            application,
            "environments",
            environment,
        ])
        .await
        .map(|_| ())
    }

    /// Each segment is percent-encoded on its own, so names containing
    /// `/`, `?` or `#` stay inside their segment.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let (status, bytes) = self.send(segments).await?;
        serde_json::from_slice(&bytes).map_err(|_| Error::Deserialize(status.as_u16()))
    }

    async fn send(&self, segments: &[&str]) -> Result<(StatusCode, Vec<u8>), Error> {
        let url = self.url(segments)?;
        debug!("GET {url}");

        let resp = self.http.get(url.clone())
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?.to_vec();
        debug!("GET {url}: {status}");

        if !status.is_success() {
            return Err(error_from_response(status, &bytes));
        }
        Ok((status, bytes))
    }
}

/// Map a failed response onto an error, surfacing the API's own message where it has one.
/// The body itself is never included, it may echo request data.
fn error_from_response(status: StatusCode, body: &[u8]) -> Error {
    let parsed = serde_json::from_slice::<ErrorBody>(body).unwrap_or_default();
    let message = parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty());

    match status {
        StatusCode::NOT_FOUND => {
            Error::NotFound(message.unwrap_or_else(|| "resource does not exist".into()))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized {
            status: status.as_u16(),
            message: match message.as_deref() {
                Some(GENERIC_FORBIDDEN) | None => {
                    "access denied: check that the API key is valid and has access to this organization".into()
                }
                Some(m) => m.to_string(),
            },
        },
        _ => Error::Status {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn client(server: &mockito::ServerGuard) -> Client {
        Client::new(&server.url(), "secret-key").unwrap()
    }

    #[tokio::test]
    async fn list_applications_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/acme/applications")
            .match_header("authorization", "Bearer secret-key")
            .with_status(200)
            .with_body(r#"[{"appName":"website"},{"name":"api"}]"#)
            .create_async()
            .await;

        let apps = client(&server).await.list_applications("acme").await.unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].name, "website");
        assert_eq!(apps[1].name, "api");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_applications_accepts_wrapped_data() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/applications")
            .with_status(200)
            .with_body(r#"{"data":[{"appName":"website"}]}"#)
            .create_async()
            .await;

        let apps = client(&server).await.list_applications("acme").await.unwrap();
        assert_eq!(apps, vec![Application { name: "website".into() }]);
    }

    #[tokio::test]
    async fn registry_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/applications/ecr-login")
            .with_status(200)
            .with_body(r#"{"endpoint":"https://123.dkr.ecr.amazonaws.com","username":"AWS","password":"hunter2"}"#)
            .create_async()
            .await;

        let creds = client(&server).await.registry_credentials("acme").await.unwrap();
        assert_eq!(creds.endpoint, "https://123.dkr.ecr.amazonaws.com");
        assert_eq!(creds.username, "AWS");
        assert_eq!(creds.password, "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn not_found_is_distinguishable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/applications/website/environments/pr-1")
            .with_status(404)
            .with_body(r#"{"message":"Environment not found"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .await
            .get_environment("acme", "website", "pr-1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: Environment not found");
    }

    #[tokio::test]
    async fn unauthorized_surfaces_api_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/applications/website")
            .with_status(401)
            .with_body(r#"{"message":"Invalid API token"}"#)
            .create_async()
            .await;

        let err = client(&server).await.get_application("acme", "website").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized { status: 401, .. }));
        assert_eq!(err.to_string(), "Invalid API token");
    }

    #[tokio::test]
    async fn deserialize_error_hides_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/applications/ecr-login")
            .with_status(200)
            .with_body(r#"{"password":"hunter2"}"#)
            .create_async()
            .await;

        let err = client(&server).await.registry_credentials("acme").await.unwrap_err();
        assert!(matches!(err, Error::Deserialize(200)));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn names_are_encoded_as_single_segments() {
        let mut server = mockito::Server::new_async().await;
        let encoded = server
            .mock("GET", "/organizations/acme/applications/website/environments/qa%231")
            .with_status(200)
            .create_async()
            .await;
        let truncated = server
            .mock("GET", "/organizations/acme/applications/website/environments/qa")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;
        let slashed = server
            .mock("GET", "/organizations/acme/applications/web%2Fsite")
            .with_status(200)
            .create_async()
            .await;

        let client = client(&server).await;
        client.get_environment("acme", "website", "qa#1").await.unwrap();
        client.get_application("acme", "web/site").await.unwrap();
        encoded.assert_async().await;
        truncated.assert_async().await;
        slashed.assert_async().await;
    }

    #[tokio::test]
    async fn base_url_path_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/organizations/acme/applications")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = Client::new(&format!("{}/api/v3/", server.url()), "key").unwrap();
        assert!(client.list_applications("acme").await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(Client::new("not a url", "key"), Err(Error::BaseUrl(_))));
        assert!(matches!(Client::new("mailto:ops@example.com", "key"), Err(Error::BaseUrl(_))));
    }

    #[tokio::test]
    async fn existence_checks_ignore_response_body() {
        let mut server = mockito::Server::new_async().await;
        let _app = server
            .mock("GET", "/organizations/acme/applications/website")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;
        let _env = server
            .mock("GET", "/organizations/acme/applications/website/environments/develop")
            .with_status(200)
            .with_body(r#"[{"name": 42}]"#)
            .create_async()
            .await;

        let client = client(&server).await;
        client.get_application("acme", "website").await.unwrap();
        client.get_environment("acme", "website", "develop").await.unwrap();
    }

    #[test]
    fn generic_forbidden_is_translated() {
        let err = error_from_response(StatusCode::FORBIDDEN, br#"{"message":"Forbidden"}"#);
        assert!(err.to_string().contains("has access to this organization"));

        let err = error_from_response(StatusCode::FORBIDDEN, b"");
        assert!(err.to_string().contains("has access to this organization"));
    }

    #[test]
    fn other_statuses_fall_back_to_reason() {
        let err = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(err.to_string(), "Internal Server Error (status 500)");

        let err = error_from_response(StatusCode::UNPROCESSABLE_ENTITY, br#"{"error":"bad org"}"#);
        assert_eq!(err.to_string(), "bad org (status 422)");
    }
}
