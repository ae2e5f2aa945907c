//! API routes.

pub mod health;
pub mod openapi;
pub mod secondary;

pub use health::health_routes;
pub use openapi::{ApiDoc, openapi_json};
pub use secondary::{download_handler, launch_handler, list_handler};
