use axum::Json;
use utoipa::openapi::path::{OperationBuilder, PathItem, PathItemType};
use utoipa::openapi::ResponseBuilder;
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Top-level collections: list, create, get, update, delete.
const COLLECTIONS: [(&str, &str); 4] = [
    ("/api/brands", "brands"),
    ("/api/clients", "clients"),
    ("/api/services", "services"),
    ("/api/achievements", "achievements"),
];

/// Nested collections: create on the collection, update/delete on items.
const NESTED: [(&str, &str, &str); 3] = [
    ("/api/services/{id}/features", "/api/services/{id}/features/{feature_id}", "features"),
    (
        "/api/services/{id}/sub-services",
        "/api/services/{id}/sub-services/{sub_service_id}",
        "sub-services",
    ),
    ("/api/sub-services/{id}/works", "/api/sub-services/{id}/works/{work_id}", "works"),
];

const LIST_SUMMARY: &str = "Search, sort and paginate (q, sort, order, page, page_size)";

fn add_operation(
    openapi: &mut utoipa::openapi::OpenApi,
    path: &str,
    method: PathItemType,
    tag: &str,
    summary: &str,
) {
    let operation = OperationBuilder::new()
        .tag(tag)
        .summary(Some(summary))
        .response("200", ResponseBuilder::new().description("OK").build())
        .response("400", ResponseBuilder::new().description("Validation Error").build())
        .response(
            "401",
            ResponseBuilder::new().description("Missing or expired credentials").build(),
        )
        .response("502", ResponseBuilder::new().description("Upstream Unavailable").build())
        .build();
    match openapi.paths.paths.get_mut(path) {
        Some(item) => {
            item.operations.insert(method, operation);
        }
        None => {
            openapi.paths.paths.insert(path.to_string(), PathItem::new(method, operation));
        }
    }
}

/// Resource routes are served by generic handlers, so they are documented
/// here instead of through `#[utoipa::path]`.
struct ResourcePaths;

impl Modify for ResourcePaths {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for (path, tag) in COLLECTIONS {
            let item = format!("{path}/{{id}}");
            add_operation(openapi, path, PathItemType::Get, tag, LIST_SUMMARY);
            add_operation(openapi, path, PathItemType::Post, tag, "Create from multipart form");
            add_operation(openapi, &item, PathItemType::Get, tag, "Fetch one with image_src");
            add_operation(openapi, &item, PathItemType::Put, tag, "Update from multipart form");
            add_operation(openapi, &item, PathItemType::Delete, tag, "Delete (bearer required)");
        }
        let (contact, one, tag) =
            ("/api/contact-messages", "/api/contact-messages/{id}", "contact-messages");
        add_operation(openapi, contact, PathItemType::Get, tag, LIST_SUMMARY);
        add_operation(openapi, one, PathItemType::Get, tag, "Fetch one");
        add_operation(openapi, one, PathItemType::Delete, tag, "Delete (bearer required)");
        for (collection, item, tag) in NESTED {
            let summary = "Create from multipart form";
            add_operation(openapi, collection, PathItemType::Post, tag, summary);
            add_operation(openapi, item, PathItemType::Put, tag, "Update from multipart form");
            add_operation(openapi, item, PathItemType::Delete, tag, "Delete (bearer required)");
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::session_status,
        crate::routes::resources::submit_contact_message,
    ),
    components(
        schemas(
            HealthResponse,
            crate::routes::auth::LoginRequest,
        )
    ),
    modifiers(&ResourcePaths),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "public")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
