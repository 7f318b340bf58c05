use std::convert::Infallible;
use axum::
{
    extract::{Path, State},
    http::StatusCode,
    response::{sse::{Event, KeepAlive, Sse}, IntoResponse, Json, Redirect},
};
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::
{
    error::AppError,
    model::{project::ProjectResponse, service_node::NodeKind},
    services::{
        dashboard_service::{self, DashboardView, QueryState},
        jwt::Claims,
        poller,
        project_service::{self, CreateProjectPayload, UpdateTokensPayload},
    },
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesPayload
{
    project_id: String,
}

pub async fn create_project_handler(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let project = project_service::create_project(&db, &claims.sub, payload, &state.config.token_key).await?;

    Ok((StatusCode::CREATED, Json(json!({ "project": ProjectResponse::from(&project) }))))
}

pub async fn list_projects_handler(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let projects = project_service::get_projects_by_creator(&db, &claims.sub).await?;
    let projects: Vec<ProjectResponse> = projects.iter().map(ProjectResponse::from).collect();

    Ok(Json(json!({ "projects": projects })))
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    claims: Claims,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let project = project_service::get_project_by_id_and_creator(&db, &project_id, &claims.sub).await?;

    Ok(Json(json!({ "project": ProjectResponse::from(&project) })))
}

pub async fn update_tokens_handler(
    State(state): State<AppState>,
    claims: Claims,
    Path(project_id): Path<String>,
    Json(payload): Json<UpdateTokensPayload>,
) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let project = project_service::update_bot_tokens(&db, &project_id, &claims.sub, payload).await?;

    Ok(Json(json!({ "project": ProjectResponse::from(&project) })))
}

/// The raw three lists, as the deployment platform reports them.
pub async fn project_services_handler(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<ServicesPayload>,
) -> Result<impl IntoResponse, AppError>
{
    let db = state.db().await?;
    let services = dashboard_service::services_for_project(&state, &db, &payload.project_id, &claims.sub).await?;

    Ok(Json(services))
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    claims: Claims,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError>
{
    let view = dashboard_service::load_dashboard(&state, &claims, &project_id).await?;
    Ok(Json(view))
}

fn dashboard_event(frame: &QueryState<DashboardView>) -> Event
{
    let name = match frame
    {
        QueryState::Failed { .. } => "error",
        _ => "dashboard",
    };

    Event::default().event(name).json_data(frame).unwrap_or_else(|e|
    {
        error!("Failed to encode dashboard frame: {}", e);
        Event::default().event("error").data("encoding failed")
    })
}

/// Live dashboard: a `loading` frame, then one frame per poll tick. The poll
/// stops as soon as the client goes away.
pub async fn dashboard_events_handler(
    State(state): State<AppState>,
    claims: Claims,
    Path(project_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError>
{
    // 404 tout de suite plutôt qu'un flux d'erreurs.
    let db = state.db().await?;
    project_service::get_project_by_id_and_creator(&db, &project_id, &claims.sub).await?;

    info!("Dashboard stream opened for project {} by '{}'.", project_id, claims.username);

    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    let settings = state.poll_settings();

    let rx = poller::spawn_poller(settings, token, move ||
    {
        let state = state.clone();
        let claims = claims.clone();
        let project_id = project_id.clone();
        async move { dashboard_service::load_dashboard(&state, &claims, &project_id).await }
    }, dashboard_service::tick_failed);

    let first = stream::once(async { QueryState::<DashboardView>::Loading });
    let ticks = stream::unfold((rx, guard), |(mut rx, guard)| async move
    {
        let result = rx.recv().await?;
        Some((QueryState::from_result(result), (rx, guard)))
    });

    let events = first.chain(ticks).map(|frame| Ok::<Event, Infallible>(dashboard_event(&frame)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Redirects to the node in the hosting console. Nothing is followed unless
/// the stored platform id opens cleanly.
pub async fn open_external_handler(
    State(state): State<AppState>,
    claims: Claims,
    Path((project_id, variant, node_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError>
{
    let kind: NodeKind = variant.parse().map_err(AppError::BadRequest)?;

    let db = state.db().await?;
    let project = project_service::get_project_by_id_and_creator(&db, &project_id, &claims.sub).await?;

    let url = dashboard_service::console_url(&state.config, project.railway_project_id.as_deref(), kind, &node_id)?;

    Ok(Redirect::to(&url))
}
