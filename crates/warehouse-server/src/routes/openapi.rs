//! OpenAPI documentation.

use axum::Json;
use utoipa::OpenApi;

use super::{health, secondary};
use crate::secondary::{LaunchRequest, SecondaryOutput};
use crate::storage::DirEntry;

/// OpenAPI documentation for the warehouse API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse Secondary API",
        description = "Secondary-output listing, download and group-analysis launches",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    paths(
        health::health,
        secondary::list_handler,
        secondary::download_handler,
        secondary::launch_handler,
    ),
    components(
        schemas(
            health::HealthResponse,
            SecondaryOutput,
            LaunchRequest,
            DirEntry,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check"),
        (name = "secondary", description = "Secondary outputs"),
    )
)]
pub struct ApiDoc;

/// Add the bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
            components.add_security_scheme(
                "query_token",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Query(
                        utoipa::openapi::security::ApiKeyValue::new("at"),
                    ),
                ),
            );
        }
    }
}

/// Serve the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
