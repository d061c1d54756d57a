use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::{NewProject, Project, User};
use super::token::TokenStore;
use crate::errors::ApiError;

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Project endpoints answer `{"project": {...}}`; tolerate a bare project too.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectBody {
    Wrapped { project: Project },
    Bare(Project),
}

impl ProjectBody {
    fn into_project(self) -> Project {
        match self {
            ProjectBody::Wrapped { project } | ProjectBody::Bare(project) => project,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// ── Trait ─────────────────────────────────────────────────────────────

/// Contract of the remote REST backend.
///
/// Everything except `login`/`signup` is authenticated. Implementations
/// make a single attempt per call; retries are the caller's decision.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;

    async fn signup(&self, name: &str, email: &str, password: &str)
    -> Result<AuthResponse, ApiError>;

    async fn fetch_current_user(&self) -> Result<User, ApiError>;

    async fn fetch_user(&self, id: &str) -> Result<User, ApiError>;

    async fn fetch_users(&self) -> Result<Vec<User>, ApiError>;

    async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError>;

    async fn create_project(&self, project: NewProject) -> Result<Project, ApiError>;

    async fn update_project(&self, project: &Project) -> Result<Project, ApiError>;

    async fn delete_project(&self, id: &str) -> Result<(), ApiError>;
}

// ── HTTP implementation ───────────────────────────────────────────────

pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of one resource under `collection`. The id becomes a single
    /// percent-encoded path segment.
    fn resource_url(&self, collection: &str, id: &str) -> Result<String, ApiError> {
        if matches!(id.trim(), "" | "." | "..") {
            return Err(ApiError::InvalidResourceId(id.to_string()));
        }
        let mut url = reqwest::Url::parse(&self.url(collection))
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(id);
        Ok(url.into())
    }

    /// Attach the persisted bearer token, failing fast when there is none.
    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.tokens.load()?.ok_or(ApiError::MissingToken)?;
        Ok(req.bearer_auth(token))
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> Result<Response, ApiError> {
        tracing::debug!(url, "sending API request");
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        tracing::debug!(url, status = status.as_u16(), %message, "API request rejected");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        self.send(req, url)
            .await?
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })
    }

    fn project_form(project: NewProject) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new().text("name", project.name);
        if let Some(description) = project.description {
            form = form.text("description", description);
        }
        for member_id in project.member_ids {
            form = form.text("member_ids[]", member_id);
        }
        if let Some(image) = project.image {
            let mime = mime_guess::from_path(&image.file_name).first_or_octet_stream();
            if mime.type_() != mime_guess::mime::IMAGE {
                return Err(ApiError::InvalidUpload(format!(
                    "{} is not an image ({})",
                    image.file_name, mime
                )));
            }
            let part = reqwest::multipart::Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(mime.as_ref())
                .map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
            form = form.part("image", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl RemoteApi for HttpApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let url = self.url("/api/auth/login");
        let req = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password });
        self.send_json(req, &url).await
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let url = self.url("/api/auth/signup");
        let req = self.client.post(&url).json(&SignupRequest {
            name,
            email,
            password,
        });
        self.send_json(req, &url).await
    }

    async fn fetch_current_user(&self) -> Result<User, ApiError> {
        self.fetch_user("me").await
    }

    async fn fetch_user(&self, id: &str) -> Result<User, ApiError> {
        let url = self.resource_url("/api/users", id)?;
        let req = self.authorized(self.client.get(&url))?;
        self.send_json(req, &url).await
    }

    async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let url = self.url("/api/users");
        let req = self.authorized(self.client.get(&url))?;
        self.send_json(req, &url).await
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>, ApiError> {
        let url = self.url("/api/projects");
        let req = self.authorized(self.client.get(&url))?;
        self.send_json(req, &url).await
    }

    async fn create_project(&self, project: NewProject) -> Result<Project, ApiError> {
        let url = self.url("/api/projects");
        let req = self.authorized(self.client.post(&url))?;
        let form = Self::project_form(project)?;
        let body: ProjectBody = self.send_json(req.multipart(form), &url).await?;
        Ok(body.into_project())
    }

    async fn update_project(&self, project: &Project) -> Result<Project, ApiError> {
        let url = self.resource_url("/api/projects", &project.id)?;
        let req = self.authorized(self.client.put(&url))?.json(project);
        let body: ProjectBody = self.send_json(req, &url).await?;
        Ok(body.into_project())
    }

    async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        let url = self.resource_url("/api/projects", id)?;
        let req = self.authorized(self.client.delete(&url))?;
        self.send(req, &url).await?;
        Ok(())
    }
}
