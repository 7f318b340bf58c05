use mongodb::Database;
use serde::Serialize;
use tracing::warn;

use crate::{
    config::Config,
    error::AppError,
    model::{
        project::{Project, ProjectResponse, TokenStatus},
        service_node::{NodeKind, ServiceNode, ServicesResponse},
    },
    services::{crypto_service, jwt::Claims, project_service, railway_service},
    state::AppState,
};

/// One poll target as the view sees it.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum QueryState<T>
{
    Loading,
    Ready(T),
    Failed
    {
        error: String,
        retryable: bool,
    },
}

impl<T> QueryState<T>
{
    pub fn from_result(result: Result<T, AppError>) -> Self
    {
        match result
        {
            Ok(value) => QueryState::Ready(value),
            Err(e) => QueryState::Failed { error: e.public_message(), retryable: e.is_retryable() },
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNode
{
    #[serde(flatten)]
    pub node: ServiceNode,
    pub display_name: String,
    pub icon: String,
    pub open_url: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView
{
    pub project: ProjectResponse,
    pub token_status: TokenStatus,
    pub repo_url: Option<String>,
    pub services: QueryState<Vec<DisplayNode>>,
}

/// Flattens the three platform lists into one sequence: services, then plugins, then volumes.
pub fn normalize(response: &ServicesResponse) -> Vec<ServiceNode>
{
    let services = response.services.iter().map(|edge| ServiceNode::Service
    {
        id: edge.node.id.clone(),
        name: edge.node.name.clone(),
    });

    let plugins = response.plugins.iter().map(|edge| ServiceNode::Plugin
    {
        id: edge.node.id.clone(),
        name: edge.node.name.clone(),
        friendly_name: edge.node.friendly_name.clone(),
    });

    let volumes = response.volumes.iter().map(|edge| ServiceNode::Volume
    {
        id: edge.node.id.clone(),
        name: edge.node.name.clone(),
    });

    services.chain(plugins).chain(volumes).collect()
}

pub fn display_nodes(project_id: &str, nodes: Vec<ServiceNode>) -> Vec<DisplayNode>
{
    nodes.into_iter().map(|node| DisplayNode
    {
        display_name: node.display_name().to_string(),
        icon: node.icon(),
        open_url: format!(
            "/api/projects/{}/open/{}/{}",
            urlencoding::encode(project_id),
            node.kind().as_str(),
            urlencoding::encode(&node.id().to_string()),
        ),
        node,
    }).collect()
}

fn open_platform_id(config: &Config, sealed_platform_id: Option<&str>) -> Result<String, AppError>
{
    let sealed = sealed_platform_id
        .ok_or_else(|| AppError::NotFound("Project is not linked to a deployment-platform project.".to_string()))?;

    Ok(crypto_service::open(sealed, &config.token_key)?.data)
}

/// Builds the console deep link for one node. The stored platform id is
/// sealed; nothing is returned unless it opens cleanly.
pub fn console_url(config: &Config, sealed_platform_id: Option<&str>, kind: NodeKind, node_id: &str) -> Result<String, AppError>
{
    let platform_id = open_platform_id(config, sealed_platform_id)?;
    Ok(format!(
        "{}/project/{}/{}/{}",
        config.railway_console_url,
        urlencoding::encode(&platform_id),
        kind.as_str(),
        urlencoding::encode(node_id),
    ))
}

/// The services query for an already loaded project: its platform id is
/// opened server-side, then the platform is asked for its nodes.
pub async fn services_of(state: &AppState, project: &Project) -> Result<ServicesResponse, AppError>
{
    let platform_id = open_platform_id(&state.config, project.railway_project_id.as_deref())?;

    railway_service::fetch_project_services(&state.http_client, &state.config, &platform_id).await
}

pub async fn services_for_project(state: &AppState, db: &Database, project_id: &str, creator: &str) -> Result<ServicesResponse, AppError>
{
    let project = project_service::get_project_by_id_and_creator(db, project_id, creator).await?;
    services_of(state, &project).await
}

/// Project query first, then the services query from that same read.
pub async fn load_dashboard(state: &AppState, claims: &Claims, project_id: &str) -> Result<DashboardView, AppError>
{
    let db = state.db().await?;
    let project = project_service::get_project_by_id_and_creator(&db, project_id, &claims.sub).await?;

    let services = services_of(state, &project).await;
    if let Err(e) = &services
    {
        warn!("Services of project {} unavailable: {}", project_id, e);
    }

    let services = services.map(|response| display_nodes(project_id, normalize(&response)));

    Ok(DashboardView
    {
        token_status: project.token_status(),
        repo_url: project.repo_url(),
        project: ProjectResponse::from(&project),
        services: QueryState::from_result(services),
    })
}

/// A poll tick failed if the view could not be built or its table is blank.
pub fn tick_failed(result: &Result<DashboardView, AppError>) -> bool
{
    match result
    {
        Err(_) => true,
        Ok(view) => matches!(view.services, QueryState::Failed { .. }),
    }
}
