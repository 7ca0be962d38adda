use async_trait::async_trait;
use geobridge_core::models::{ProjectTag, SystemDetail, SystemSummary};
use geobridge_core::ports::{ExternalDiagram, SourceConnector, SourceSystem};
use geobridge_core::{BridgeError, Result};
use geojson::FeatureCollection;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

const SERVICE: &str = "source system";

/// REST client for one source-system project
pub struct HttpSourceClient {
    /// Base URL of the API (e.g., "https://www.geodesignhub.com/api/v1/")
    base_url: String,

    project_id: String,

    token: String,

    client: reqwest::Client,
}

impl HttpSourceClient {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::with_client(base_url, project_id, token, reqwest::Client::new())
    }

    pub fn with_client(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        token: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
            token: token.into(),
            client,
        }
    }

    /// Project-scoped endpoint URL
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            path.trim_start_matches('/')
        )
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(unreachable)?;

        let response = check_status(response).await?;
        response.json::<T>().await.map_err(|e| BridgeError::Upstream {
            service: SERVICE.to_string(),
            status: 200,
            message: format!("Failed to parse response from {}: {}", url, e),
        })
    }
}

fn unreachable(err: reqwest::Error) -> BridgeError {
    BridgeError::Unreachable {
        service: SERVICE.to_string(),
        reason: err.to_string(),
    }
}

/// Anything other than HTTP 200 becomes a typed upstream error
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BridgeError::upstream(SERVICE, status.as_u16(), body))
}

#[derive(Debug, Deserialize)]
struct BoundsResponse {
    bounds: String,
}

#[derive(Debug, Deserialize)]
struct CenterResponse {
    center: String,
}

#[async_trait]
impl SourceSystem for HttpSourceClient {
    async fn get_all_systems(&self) -> Result<Vec<SystemSummary>> {
        self.get_json("systems/").await
    }

    async fn get_single_system(&self, system_id: i64) -> Result<SystemDetail> {
        self.get_json(&format!("systems/{}/", system_id)).await
    }

    async fn get_project_bounds(&self) -> Result<String> {
        let response: BoundsResponse = self.get_json("bounds/").await?;
        Ok(response.bounds)
    }

    async fn get_project_center(&self) -> Result<String> {
        let response: CenterResponse = self.get_json("center/").await?;
        Ok(response.center)
    }

    async fn get_project_tags(&self) -> Result<Vec<ProjectTag>> {
        self.get_json("tags/").await
    }

    async fn get_single_synthesis(
        &self,
        team_id: &str,
        synthesis_id: &str,
    ) -> Result<FeatureCollection> {
        self.get_json(&format!("cteams/{}/{}/", team_id, synthesis_id)).await
    }

    async fn get_single_synthesis_details(
        &self,
        team_id: &str,
        synthesis_id: &str,
    ) -> Result<serde_json::Value> {
        self.get_json(&format!("cteams/{}/{}/details/", team_id, synthesis_id)).await
    }

    async fn post_as_diagram_with_external_geometries(
        &self,
        diagram: &ExternalDiagram,
    ) -> Result<()> {
        let url = self.endpoint(&format!("systems/{}/add/external/", diagram.system_id));
        tracing::debug!(url = %url, layer_type = ?diagram.layer_type, "POST external diagram");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.auth_header())
            .json(diagram)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(BridgeError::upstream(SERVICE, status.as_u16(), body))
    }
}

/// Builds project-scoped clients that share one connection pool
#[derive(Clone)]
pub struct HttpSourceConnector {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSourceConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl SourceConnector for HttpSourceConnector {
    fn connect(&self, project_id: &str, token: &str) -> Result<Arc<dyn SourceSystem>> {
        if project_id.trim().is_empty() {
            return Err(BridgeError::ConfigMissing { key: "project_id".to_string() });
        }
        Ok(Arc::new(HttpSourceClient::with_client(
            self.base_url.clone(),
            project_id,
            token,
            self.client.clone(),
        )))
    }
}
