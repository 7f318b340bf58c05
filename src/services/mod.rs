pub mod auth_service;
pub mod connection;
pub mod crypto_service;
pub mod dashboard_service;
pub mod jwt;
pub mod poller;
pub mod project_service;
pub mod railway_service;
pub mod render_service;
pub mod session;
pub mod user_service;
pub mod validation_service;
