//! HTTP implementation of [`OctopusApi`].
//!
//! All space-scoped collections live under `/api/{space}/...` and are
//! returned as pages of `{"Items": [...], "TotalResults": n}`. The client
//! walks `skip`/`take` pages until it has everything or the caller's limit.

use std::time::Duration;

use async_trait::async_trait;
use audit::{
    ApiError, DeploymentProcess, DeploymentProcessId, Environment, Event, Lifecycle, Machine,
    MachineId, OctopusApi, Project, Runbook, ServerCertificate, ServerTask, SpaceId, Tenant,
    TenantId,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{status_error, transport_error, ClientError};

const API_KEY_HEADER: &str = "x-octopus-apikey";
const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How the client authenticates. An API key wins when both are configured.
#[derive(Clone)]
pub enum Credentials {
    ApiKey(String),
    AccessToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(****)"),
            Self::AccessToken(_) => f.write_str("AccessToken(****)"),
        }
    }
}

impl Credentials {
    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let (name, value) = match self {
            Self::ApiKey(key) => (HeaderName::from_static(API_KEY_HEADER), key.clone()),
            Self::AccessToken(token) => (AUTHORIZATION, format!("Bearer {token}")),
        };

        let mut value =
            HeaderValue::from_str(&value).map_err(|_| ClientError::InvalidCredential)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        Ok(headers)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    total_results: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Space {
    id: String,
    name: String,
}

/// Validates `url` as an absolute http(s) server address.
///
/// # Errors
///
/// [`ClientError::InvalidUrl`] for relative URLs and other schemes.
pub fn parse_server_url(url: &str) -> Result<Url, ClientError> {
    let parsed = Url::parse(url.trim()).map_err(|e| ClientError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }

    Ok(parsed)
}

/// Authenticated, space-scoped Octopus client.
///
/// Cheap to share: the underlying connection pool is reference counted, so
/// checks hold it behind one `Arc<dyn OctopusApi>` without locking.
#[derive(Debug, Clone)]
pub struct OctopusClient {
    http: reqwest::Client,
    base_url: String,
    space: SpaceId,
}

impl OctopusClient {
    /// Connects to `server_url` and resolves `space` (a name or a
    /// `Spaces-` id) to the space every later call is scoped to.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]: bad URL or credential, HTTP client setup
    /// failure, or a space that cannot be found.
    pub async fn connect(
        server_url: &str,
        credentials: &Credentials,
        space: &str,
    ) -> Result<Self, ClientError> {
        let url = parse_server_url(server_url)?;
        let http = reqwest::Client::builder()
            .default_headers(credentials.headers()?)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = url.as_str().trim_end_matches('/').to_string();

        let space = resolve_space(&http, &base_url, space).await?;
        tracing::debug!(space = %space, "Resolved space");

        Ok(Self {
            http,
            base_url,
            space,
        })
    }

    pub fn space(&self) -> &SpaceId {
        &self.space
    }

    fn space_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.space, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        get_json(&self.http, url, query).await
    }

    /// Fetches `path` page by page. `limit == 0` fetches every item.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        limit: usize,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.space_url(path);
        let mut items = Vec::new();

        loop {
            let take = match limit {
                0 => PAGE_SIZE,
                limit => PAGE_SIZE.min(limit - items.len()),
            };
            let mut params = query.to_vec();
            params.push(("skip", items.len().to_string()));
            params.push(("take", take.to_string()));

            let page: Page<T> = self.get(&url, &params).await?;
            let received = page.items.len();
            items.extend(page.items);

            let reached_limit = limit != 0 && items.len() >= limit;
            if received == 0 || items.len() >= page.total_results || reached_limit {
                break;
            }
        }

        if limit != 0 {
            items.truncate(limit);
        }

        tracing::trace!(path, count = items.len(), "Fetched collection");
        Ok(items)
    }
}

async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, ApiError> {
    let response = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }

    response.json::<T>().await.map_err(transport_error)
}

/// Returns the id of the space named `name_or_id`.
///
/// Values starting with `Spaces-` are already ids and pass through
/// untouched. Names are looked up by partial name and matched exactly.
async fn resolve_space(
    http: &reqwest::Client,
    base_url: &str,
    name_or_id: &str,
) -> Result<SpaceId, ClientError> {
    let name = name_or_id.trim();
    let not_found = || ClientError::SpaceNotFound {
        name: name.to_string(),
    };

    if name.starts_with("Spaces-") {
        return SpaceId::new(name).ok_or_else(not_found);
    }
    if name.is_empty() {
        return Err(not_found());
    }

    let url = format!("{base_url}/api/Spaces");
    let query = [
        ("take", "1000".to_string()),
        ("partialName", name.to_string()),
    ];
    let page: Page<Space> = get_json(http, &url, &query).await?;

    page.items
        .into_iter()
        .find(|s| s.name == name)
        .and_then(|s| SpaceId::new(s.id))
        .ok_or_else(not_found)
}

#[async_trait]
impl OctopusApi for OctopusClient {
    async fn projects(&self, limit: usize) -> Result<Vec<Project>, ApiError> {
        self.get_all("projects", &[], limit).await
    }

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>, ApiError> {
        if name.is_empty() {
            return Ok(None);
        }
        let page: Page<Project> = self
            .get(
                &self.space_url("projects"),
                &[("partialName", name.to_string())],
            )
            .await?;
        Ok(page.items.into_iter().find(|p| p.name == name))
    }

    async fn deployment_process(
        &self,
        id: &DeploymentProcessId,
    ) -> Result<DeploymentProcess, ApiError> {
        self.get(&self.space_url(&format!("deploymentprocesses/{id}")), &[])
            .await
    }

    async fn runbooks(&self) -> Result<Vec<Runbook>, ApiError> {
        self.get_all("runbooks", &[], 0).await
    }

    async fn lifecycles(&self) -> Result<Vec<Lifecycle>, ApiError> {
        self.get_all("lifecycles", &[], 0).await
    }

    async fn environments(&self) -> Result<Vec<Environment>, ApiError> {
        self.get_all("environments", &[], 0).await
    }

    async fn machines(&self, limit: usize) -> Result<Vec<Machine>, ApiError> {
        self.get_all("machines", &[], limit).await
    }

    async fn workers(&self, limit: usize) -> Result<Vec<Machine>, ApiError> {
        self.get_all("workers", &[], limit).await
    }

    async fn tenants(&self, limit: usize) -> Result<Vec<Tenant>, ApiError> {
        self.get_all("tenants", &[], limit).await
    }

    async fn tenant_tasks(
        &self,
        tenant: &TenantId,
        take: usize,
    ) -> Result<Vec<ServerTask>, ApiError> {
        let page: Page<ServerTask> = self
            .get(
                &self.space_url("tasks"),
                &[
                    ("tenant", tenant.to_string()),
                    ("skip", "0".to_string()),
                    ("take", take.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn machine_events(&self, machine: &MachineId) -> Result<Vec<Event>, ApiError> {
        let page: Page<Event> = self
            .get(
                &self.space_url("events"),
                &[("regarding", machine.to_string())],
            )
            .await?;
        Ok(page.items)
    }

    async fn events_by_category(
        &self,
        categories: &[&str],
        take: usize,
    ) -> Result<Vec<Event>, ApiError> {
        self.get_all(
            "events",
            &[("eventCategories", categories.join(","))],
            take,
        )
        .await
    }

    async fn server_certificate(&self) -> Result<ServerCertificate, ApiError> {
        let url = format!(
            "{}/api/configuration/certificates/certificate-global",
            self.base_url
        );
        self.get(&url, &[]).await
    }
}
