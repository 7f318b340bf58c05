use serde_json::Value;
use crate::error::AppError;
use crate::model::validation::{rule, Entity, FieldRule, FieldType};

fn check_length(entity: Entity, rule: &FieldRule, value: &str) -> Result<(), AppError>
{
    let length = value.chars().count();

    if let Some(min) = rule.min_length && length < min
    {
        return Err(AppError::Validation(format!(
            "{}.{} must be at least {} characters long.", entity.name(), rule.field, min
        )));
    }

    if let Some(max) = rule.max_length && length > max
    {
        return Err(AppError::Validation(format!(
            "{}.{} cannot exceed {} characters.", entity.name(), rule.field, max
        )));
    }

    Ok(())
}

/// Checks one value against the declared rule. Fields without a rule pass.
pub fn validate_field(entity: Entity, field: &str, value: &Value) -> Result<(), AppError>
{
    let Some(rule) = rule(entity, field) else
    {
        return Ok(());
    };

    match (rule.kind, value)
    {
        (FieldType::String, Value::String(s)) => check_length(entity, rule, s),
        (FieldType::Boolean, Value::Bool(_)) => Ok(()),
        (FieldType::String, _) => Err(AppError::Validation(format!("{}.{} must be a string.", entity.name(), field))),
        (FieldType::Boolean, _) => Err(AppError::Validation(format!("{}.{} must be a boolean.", entity.name(), field))),
    }
}

/// Validates every ruled field present in a JSON object. `null` counts as absent.
pub fn validate_document(entity: Entity, document: &Value) -> Result<(), AppError>
{
    let Value::Object(fields) = document else
    {
        return Err(AppError::Validation(format!("{} must be a JSON object.", entity.name())));
    };

    for (field, value) in fields
    {
        if value.is_null()
        {
            continue;
        }
        validate_field(entity, field, value)?;
    }

    Ok(())
}

pub fn validate_payload<T: serde::Serialize>(entity: Entity, payload: &T) -> Result<(), AppError>
{
    let document = serde_json::to_value(payload).map_err(|e|
    {
        tracing::error!("Failed to serialize {} payload for validation: {}", entity.name(), e);
        AppError::InternalServerError
    })?;
    validate_document(entity, &document)
}
