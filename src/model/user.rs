use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User
{
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub name: String,
    pub email: String,

    /// bcrypt hash, never the clear password.
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,

    pub created_at: DateTime,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse
{
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for UserResponse
{
    fn from(user: &User) -> Self
    {
        UserResponse
        {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}
