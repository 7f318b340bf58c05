#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity
{
    User,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType
{
    String,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule
{
    pub field: &'static str,
    pub kind: FieldType,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

const fn string(field: &'static str, min_length: Option<usize>, max_length: Option<usize>) -> FieldRule
{
    FieldRule { field, kind: FieldType::String, min_length, max_length }
}

const fn boolean(field: &'static str) -> FieldRule
{
    FieldRule { field, kind: FieldType::Boolean, min_length: None, max_length: None }
}

const USER_RULES: &[FieldRule] = &[
    string("username", Some(4), Some(20)),
    string("name", Some(1), Some(50)),
    string("password", Some(8), None),
    string("email", Some(1), None),
    boolean("isAdmin"),
];

const PROJECT_RULES: &[FieldRule] = &[
    string("name", Some(1), Some(350)),
    string("platform", Some(5), Some(8)),
    string("lang", Some(1), Some(50)),
    string("packageManager", Some(1), Some(50)),
    string("hostService", Some(1), Some(50)),
    string("botToken", Some(0), Some(100)),
    string("botAppToken", Some(0), Some(100)),
    string("botSecretToken", Some(0), Some(100)),
];

impl Entity
{
    pub fn name(self) -> &'static str
    {
        match self
        {
            Entity::User => "user",
            Entity::Project => "project",
        }
    }

    pub fn rules(self) -> &'static [FieldRule]
    {
        match self
        {
            Entity::User => USER_RULES,
            Entity::Project => PROJECT_RULES,
        }
    }
}

pub fn rule(entity: Entity, field: &str) -> Option<&'static FieldRule>
{
    entity.rules().iter().find(|rule| rule.field == field)
}
