pub mod auth_handler;
pub mod health;
pub mod page_handler;
pub mod project_handler;
