use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::{
    config::Config,
    error::AppError,
    model::service_node::{Edge, PluginEntry, ServiceEntry, ServicesResponse, VolumeEntry},
};

const SERVICES_QUERY: &str = r#"
query project($id: String!) {
  project(id: $id) {
    services { edges { node { id name } } }
    plugins { edges { node { id name friendlyName } } }
    volumes { edges { node { id name } } }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T>
{
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError
{
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProjectData
{
    project: Option<RailwayProject>,
}

#[derive(Debug, Deserialize)]
struct EdgeList<T>
{
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
}

impl<T> Default for EdgeList<T>
{
    fn default() -> Self
    {
        EdgeList { edges: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct RailwayProject
{
    #[serde(default)]
    services: EdgeList<ServiceEntry>,
    #[serde(default)]
    plugins: EdgeList<PluginEntry>,
    #[serde(default)]
    volumes: EdgeList<VolumeEntry>,
}

/// Asks the deployment platform for every service, plugin and volume of a project.
pub async fn fetch_project_services(
    http_client: &reqwest::Client,
    config: &Config,
    railway_project_id: &str,
) -> Result<ServicesResponse, AppError>
{
    debug!("Fetching services of platform project {}", railway_project_id);

    let response = http_client
        .post(&config.railway_api_url)
        .bearer_auth(&config.railway_api_token)
        .header("User-Agent", "Botway Dashboard")
        .json(&json!({ "query": SERVICES_QUERY, "variables": { "id": railway_project_id } }))
        .send()
        .await
        .map_err(|e|
        {
            error!("Deployment platform could not be reached: {}", e);
            AppError::ExternalApi("The deployment platform could not be reached.".to_string())
        })?;

    if !response.status().is_success()
    {
        let status = response.status();
        let error_body = response.text().await.unwrap_or_default();
        error!("Deployment platform answered {}: {}", status, error_body);
        return Err(AppError::ExternalApi(format!("The deployment platform answered with status {}.", status.as_u16())));
    }

    let body: GraphQlResponse<ProjectData> = response.json().await.map_err(|e|
    {
        error!("Deployment platform sent an unreadable body: {}", e);
        AppError::ExternalApi("The deployment platform sent an unreadable answer.".to_string())
    })?;

    if !body.errors.is_empty()
    {
        let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
        warn!("Deployment platform query failed: {}", messages.join("; "));
        return Err(AppError::ExternalApi(messages.join("; ")));
    }

    let project = body.data
        .and_then(|data| data.project)
        .ok_or_else(|| AppError::ExternalApi("Project not found on the deployment platform.".to_string()))?;

    Ok(ServicesResponse
    {
        services: project.services.edges,
        plugins: project.plugins.edges,
        volumes: project.volumes.edges,
    })
}
