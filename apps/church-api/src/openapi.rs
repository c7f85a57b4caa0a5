//! OpenAPI documentation configuration

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Church API",
        version = "0.1.0",
        description = "Members, device registrations and push notifications",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/users", api = domain_users::handlers::ApiDoc),
        (path = "/api/notifications", api = domain_notifications::handlers::ApiDoc)
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Church members and their device registrations"),
        (name = "Notifications", description = "Push dispatch and the per-user notification inbox")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_nested_under_api() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/notifications/send"));
        assert!(doc.paths.paths.contains_key("/api/users/{id}/push-token"));
    }

    #[test]
    fn test_api_key_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
