use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Database;
use tracing::error;

use crate::{error::AppError, model::user::{User, USERS_COLLECTION}};

const DUPLICATE_KEY: i32 = 11000;

pub fn is_duplicate_key(e: &mongodb::error::Error) -> bool
{
    match e.kind.as_ref()
    {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

pub async fn insert_user(db: &Database, mut user: User) -> Result<User, AppError>
{
    let result = db.collection::<User>(USERS_COLLECTION)
        .insert_one(&user, None)
        .await
        .map_err(|e|
        {
            if is_duplicate_key(&e)
            {
                return AppError::Conflict("Username or email already exists.".to_string());
            }
            error!("Failed to insert user '{}': {}", user.username, e);
            AppError::Database(e)
        })?;

    user.id = result.inserted_id.as_object_id();
    Ok(user)
}

pub async fn get_user_by_username(db: &Database, username: &str) -> Result<Option<User>, AppError>
{
    db.collection::<User>(USERS_COLLECTION)
        .find_one(doc! { "username": username }, None)
        .await
        .map_err(|e|
        {
            error!("Failed to fetch user '{}': {}", username, e);
            AppError::Database(e)
        })
}

pub async fn get_user_by_id(db: &Database, user_id: &str) -> Result<Option<User>, AppError>
{
    let Ok(oid) = ObjectId::parse_str(user_id) else
    {
        return Ok(None);
    };

    Ok(db.collection::<User>(USERS_COLLECTION)
        .find_one(doc! { "_id": oid }, None)
        .await?)
}
