pub mod project;
pub mod service_node;
pub mod token;
pub mod user;
pub mod validation;
