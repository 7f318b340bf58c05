use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::AppError,
    model::{project::{Project, PROJECTS_COLLECTION}, validation::Entity},
    services::{crypto_service, validation_service},
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectPayload
{
    pub name: String,
    pub platform: String,
    pub lang: String,
    pub package_manager: String,
    pub host_service: String,
    #[serde(default)]
    pub repo: String,
    pub bot_token: Option<String>,
    pub bot_app_token: Option<String>,
    pub bot_secret_token: Option<String>,

    /// Clear id on the deployment platform; sealed before it is stored.
    #[serde(skip_serializing)]
    pub railway_project_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokensPayload
{
    pub bot_token: String,
    pub bot_app_token: String,
    pub bot_secret_token: String,
}

fn parse_id(raw: &str, what: &str) -> Result<ObjectId, AppError>
{
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} with id {} not found.", what, raw)))
}

pub async fn create_project(db: &Database, creator: &str, payload: CreateProjectPayload, token_key: &[u8; 32]) -> Result<Project, AppError>
{
    validation_service::validate_payload(Entity::Project, &payload)?;

    let creator_id = ObjectId::parse_str(creator).map_err(|_| AppError::Unauthorized("Invalid session subject".to_string()))?;

    let railway_project_id = match payload.railway_project_id.as_deref().map(str::trim)
    {
        Some(id) if !id.is_empty() => Some(crypto_service::seal(id, token_key)?),
        _ => None,
    };

    let mut project = Project
    {
        id: None,
        name: payload.name,
        platform: payload.platform,
        lang: payload.lang,
        package_manager: payload.package_manager,
        host_service: payload.host_service,
        bot_token: payload.bot_token.unwrap_or_default(),
        bot_app_token: payload.bot_app_token.unwrap_or_default(),
        bot_secret_token: payload.bot_secret_token.unwrap_or_default(),
        creator_id,
        repo: payload.repo.trim().trim_matches('/').to_string(),
        railway_project_id,
        created_at: DateTime::now(),
    };

    let result = db.collection::<Project>(PROJECTS_COLLECTION)
        .insert_one(&project, None)
        .await
        .map_err(|e|
        {
            error!("Failed to create project in DB: {}", e);
            AppError::Database(e)
        })?;

    project.id = result.inserted_id.as_object_id();
    info!("Project '{}' created by user '{}'.", project.name, creator);
    Ok(project)
}

pub async fn get_projects_by_creator(db: &Database, creator: &str) -> Result<Vec<Project>, AppError>
{
    let creator_id = ObjectId::parse_str(creator).map_err(|_| AppError::Unauthorized("Invalid session subject".to_string()))?;
    let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();

    let cursor = db.collection::<Project>(PROJECTS_COLLECTION)
        .find(doc! { "creatorId": creator_id }, options)
        .await
        .map_err(|e|
        {
            error!("Failed to fetch projects for creator '{}': {}", creator, e);
            AppError::Database(e)
        })?;

    Ok(cursor.try_collect().await?)
}

/// Point lookup scoped to the creator; anything else reads as not found.
pub async fn get_project_by_id_and_creator(db: &Database, project_id: &str, creator: &str) -> Result<Project, AppError>
{
    let oid = parse_id(project_id, "Project")?;
    let creator_id = ObjectId::parse_str(creator).map_err(|_| AppError::Unauthorized("Invalid session subject".to_string()))?;

    db.collection::<Project>(PROJECTS_COLLECTION)
        .find_one(doc! { "_id": oid, "creatorId": creator_id }, None)
        .await
        .map_err(|e|
        {
            error!("Failed to fetch project by id {} and creator '{}': {}", project_id, creator, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Project with id {} not found.", project_id)))
}

pub async fn update_bot_tokens(db: &Database, project_id: &str, creator: &str, payload: UpdateTokensPayload) -> Result<Project, AppError>
{
    validation_service::validate_payload(Entity::Project, &payload)?;

    let oid = parse_id(project_id, "Project")?;
    let creator_id = ObjectId::parse_str(creator).map_err(|_| AppError::Unauthorized("Invalid session subject".to_string()))?;

    let result = db.collection::<Project>(PROJECTS_COLLECTION)
        .update_one(
            doc! { "_id": oid, "creatorId": creator_id },
            doc! { "$set": {
                "botToken": payload.bot_token.as_str(),
                "botAppToken": payload.bot_app_token.as_str(),
                "botSecretToken": payload.bot_secret_token.as_str(),
            } },
            None,
        )
        .await?;

    if result.matched_count == 0
    {
        return Err(AppError::NotFound(format!("Project with id {} not found.", project_id)));
    }

    info!("Bot tokens of project {} updated.", project_id);
    get_project_by_id_and_creator(db, project_id, creator).await
}

#[cfg(test)]
mod tests
{
    use super::*;
    use serde_json::json;

    #[test]
    fn create_payload_never_exposes_the_clear_platform_id()
    {
        let payload: CreateProjectPayload = serde_json::from_value(json!({
            "name": "my-bot",
            "platform": "discord",
            "lang": "rust",
            "packageManager": "cargo",
            "hostService": "railway",
            "railwayProjectId": "1234-abcd",
        })).unwrap();

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("railwayProjectId").is_none());
        assert!(validation_service::validate_document(Entity::Project, &value).is_ok());
    }

    #[test]
    fn too_long_token_is_rejected()
    {
        let payload = UpdateTokensPayload
        {
            bot_token: "a".repeat(101),
            bot_app_token: String::new(),
            bot_secret_token: String::new(),
        };
        assert!(matches!(validation_service::validate_payload(Entity::Project, &payload), Err(AppError::Validation(_))));
    }

    #[test]
    fn malformed_id_reads_as_not_found()
    {
        assert!(matches!(parse_id("not-an-object-id", "Project"), Err(AppError::NotFound(_))));
    }
}
