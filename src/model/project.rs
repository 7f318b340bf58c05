use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

pub const PROJECTS_COLLECTION: &str = "projects";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Project
{
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub platform: String,
    pub lang: String,
    pub package_manager: String,
    pub host_service: String,

    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub bot_app_token: String,
    #[serde(default)]
    pub bot_secret_token: String,

    pub creator_id: ObjectId,

    /// `owner/name` on GitHub.
    #[serde(default)]
    pub repo: String,

    /// Sealed with the token codec, see `crypto_service`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub railway_project_id: Option<String>,

    pub created_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus
{
    Ok,
    Error,
}

impl Project
{
    pub fn token_status(&self) -> TokenStatus
    {
        let all_present = [&self.bot_token, &self.bot_app_token, &self.bot_secret_token]
            .iter()
            .all(|token| !token.is_empty());

        if all_present { TokenStatus::Ok } else { TokenStatus::Error }
    }

    pub fn repo_url(&self) -> Option<String>
    {
        if self.repo.is_empty()
        {
            None
        }
        else
        {
            Some(format!("https://github.com/{}", self.repo))
        }
    }
}

/// What the API exposes of a project. Bot tokens never leave the server.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse
{
    pub id: String,
    pub name: String,
    pub platform: String,
    pub lang: String,
    pub package_manager: String,
    pub host_service: String,
    pub repo: String,
    pub repo_url: Option<String>,
    pub token_status: TokenStatus,
    pub linked_to_platform: bool,
    pub created_at: Option<String>,
}

impl From<&Project> for ProjectResponse
{
    fn from(project: &Project) -> Self
    {
        ProjectResponse
        {
            id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: project.name.clone(),
            platform: project.platform.clone(),
            lang: project.lang.clone(),
            package_manager: project.package_manager.clone(),
            host_service: project.host_service.clone(),
            repo: project.repo.clone(),
            repo_url: project.repo_url(),
            token_status: project.token_status(),
            linked_to_platform: project.railway_project_id.is_some(),
            created_at: project.created_at.try_to_rfc3339_string().ok(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_project() -> Project
{
    Project
    {
        id: Some(ObjectId::new()),
        name: "my-bot".to_string(),
        platform: "discord".to_string(),
        lang: "rust".to_string(),
        package_manager: "cargo".to_string(),
        host_service: "railway".to_string(),
        bot_token: "bot".to_string(),
        bot_app_token: "app".to_string(),
        bot_secret_token: "secret".to_string(),
        creator_id: ObjectId::new(),
        repo: "abdfnx/my-bot".to_string(),
        railway_project_id: None,
        created_at: DateTime::now(),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn token_status_requires_all_three_tokens()
    {
        let project = sample_project();
        assert_eq!(project.token_status(), TokenStatus::Ok);

        for clear in [0, 1, 2]
        {
            let mut project = sample_project();
            match clear
            {
                0 => project.bot_token.clear(),
                1 => project.bot_app_token.clear(),
                _ => project.bot_secret_token.clear(),
            }
            assert_eq!(project.token_status(), TokenStatus::Error);
        }
    }

    #[test]
    fn missing_tokens_deserialize_as_empty()
    {
        let raw = mongodb::bson::doc!
        {
            "name": "bot",
            "platform": "slack",
            "lang": "go",
            "packageManager": "go mod",
            "hostService": "railway",
            "creatorId": ObjectId::new(),
            "createdAt": DateTime::now(),
        };

        let project: Project = mongodb::bson::from_document(raw).unwrap();
        assert_eq!(project.token_status(), TokenStatus::Error);
        assert!(project.repo_url().is_none());
    }

    #[test]
    fn response_hides_tokens()
    {
        let json = serde_json::to_value(ProjectResponse::from(&sample_project())).unwrap();
        assert_eq!(json["tokenStatus"], "ok");
        assert_eq!(json["repoUrl"], "https://github.com/abdfnx/my-bot");
        assert!(json.get("botToken").is_none());
        assert_eq!(json["linkedToPlatform"], false);
    }
}
