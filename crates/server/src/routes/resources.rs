//! Generic CRUD handlers shared by every back-office resource.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use models::forms::{ContactForm, FeatureForm, FormSchema, SubServiceForm, WorkForm};
use models::EntityId;
use serde::Serialize;
use serde_json::Value;
use service::forms::{FormFailure, FormFlow, FormMode};
use service::image::resolve_image_src;
use service::observability::LIST_DEGRADED_TOTAL;
use service::{ListParams, Listable, Page, ProxyError, Resource};
use tracing::{info, warn};

use super::auth::BearerToken;
use super::multipart::read_form;
use crate::errors::JsonApiError;
use crate::state::ServerState;

/// An entity with its image reference resolved to something renderable.
#[derive(Debug, Serialize)]
pub struct WithImage<T> {
    #[serde(flatten)]
    pub entity: T,
    pub image_src: Option<String>,
}

fn with_image<T: Listable>(entity: T, asset_origin: &str) -> WithImage<T> {
    let image_src = resolve_image_src(entity.image_ref(), asset_origin);
    WithImage { entity, image_src }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    #[serde(flatten)]
    pub page: Page<WithImage<T>>,
    /// True when the upstream could not be read and an empty page was served.
    pub degraded: bool,
}

pub async fn list<T: Listable>(
    State(state): State<ServerState>,
    token: BearerToken,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<T>>, JsonApiError> {
    let (items, degraded) = match state.upstream.list::<T>(T::RESOURCE, token.as_deref()).await {
        Ok(items) => (items, false),
        Err(e) if e.forces_logout() => return Err(JsonApiError::from_proxy(e, state.login_path())),
        Err(e) => {
            warn!(resource = %T::RESOURCE, error = %e, "list degraded to empty page");
            LIST_DEGRADED_TOTAL.inc();
            (Vec::new(), true)
        }
    };
    let origin = state.upstream.asset_origin();
    let page = params.apply(items).map(|e| with_image(e, origin));
    Ok(Json(ListResponse { page, degraded }))
}

pub async fn get_one<T: Listable>(
    State(state): State<ServerState>,
    token: BearerToken,
    Path(id): Path<EntityId>,
) -> Result<Json<WithImage<T>>, JsonApiError> {
    let entity: T = state
        .upstream
        .get(T::RESOURCE, id, token.as_deref())
        .await
        .map_err(|e| JsonApiError::from_proxy(e, state.login_path()))?;
    Ok(Json(with_image(entity, state.upstream.asset_origin())))
}

fn failure_to_error(failure: FormFailure, login_path: &str) -> JsonApiError {
    match failure {
        FormFailure::Validation(msg) => JsonApiError::bad_request(msg),
        FormFailure::Upstream(e) => JsonApiError::from_proxy(e, login_path),
        FormFailure::SessionExpired => JsonApiError::session_expired(login_path),
        FormFailure::Cancelled => JsonApiError::from_proxy(ProxyError::Cancelled, login_path),
    }
}

async fn submit_form<S: FormSchema>(
    state: &ServerState,
    resource: Resource,
    mode: FormMode,
    token: BearerToken,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    let anonymous = mode == FormMode::Create && !resource.create_requires_auth();
    let token = if anonymous { None } else { token.0 };
    if !anonymous && token.is_none() {
        return Err(JsonApiError::from_proxy(ProxyError::MissingCredentials, state.login_path()));
    }

    let parsed = read_form(multipart).await?;
    let flow = FormFlow::<S>::new(resource, mode, state.upstream.clone(), token);
    flow.set_fields(&parsed.fields)
        .map_err(|f| failure_to_error(f, state.login_path()))?;
    if let Some(file) = parsed.file {
        flow.select_image(file);
    }
    let body = flow
        .submit()
        .await
        .map_err(|f| failure_to_error(f, state.login_path()))?;

    info!(resource = %resource, mode = ?mode, "resource_saved");
    let status = match mode {
        FormMode::Create => StatusCode::CREATED,
        FormMode::Edit(_) => StatusCode::OK,
    };
    Ok((status, Json(body)))
}

pub async fn create<S>(
    State(state): State<ServerState>,
    token: BearerToken,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError>
where
    S: FormSchema,
    S::Entity: Listable,
{
    let resource = <S::Entity as Listable>::RESOURCE;
    submit_form::<S>(&state, resource, FormMode::Create, token, multipart).await
}

pub async fn update<S>(
    State(state): State<ServerState>,
    token: BearerToken,
    Path(id): Path<EntityId>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError>
where
    S: FormSchema,
    S::Entity: Listable,
{
    let resource = <S::Entity as Listable>::RESOURCE;
    submit_form::<S>(&state, resource, FormMode::Edit(id), token, multipart).await
}

pub async fn remove<T: Listable>(
    State(state): State<ServerState>,
    token: BearerToken,
    Path(id): Path<EntityId>,
) -> Result<Json<Value>, JsonApiError> {
    delete_resource(&state, T::RESOURCE, id, token).await
}

async fn delete_resource(
    state: &ServerState,
    resource: Resource,
    id: EntityId,
    token: BearerToken,
) -> Result<Json<Value>, JsonApiError> {
    let body = state
        .upstream
        .delete(resource, id, token.as_deref())
        .await
        .map_err(|e| JsonApiError::from_proxy(e, state.login_path()))?;
    info!(resource = %resource, id, "resource_deleted");
    Ok(Json(body))
}

/// Contact form posted from the public site.
#[utoipa::path(
    post, path = "/api/contact-messages", tag = "public",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "fullName, email, phoneNumber, companyName, interestedIn, message"
    ),
    responses(
        (status = 201, description = "Forwarded"),
        (status = 400, description = "Validation Error"),
        (status = 502, description = "Upstream Unavailable")
    )
)]
pub async fn submit_contact_message(
    state: State<ServerState>,
    token: BearerToken,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    create::<ContactForm>(state, token, multipart).await
}

/// Schemas for collections that live under a parent entity.
pub trait NestedForm: FormSchema {
    fn resource(parent: EntityId) -> Resource;
}

impl NestedForm for FeatureForm {
    fn resource(service_id: EntityId) -> Resource { Resource::Features { service_id } }
}

impl NestedForm for SubServiceForm {
    fn resource(service_id: EntityId) -> Resource { Resource::SubServices { service_id } }
}

impl NestedForm for WorkForm {
    fn resource(sub_service_id: EntityId) -> Resource { Resource::Works { sub_service_id } }
}

pub async fn create_nested<S: NestedForm>(
    State(state): State<ServerState>,
    token: BearerToken,
    Path(parent): Path<EntityId>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    submit_form::<S>(&state, S::resource(parent), FormMode::Create, token, multipart).await
}

pub async fn update_nested<S: NestedForm>(
    State(state): State<ServerState>,
    token: BearerToken,
    Path((parent, id)): Path<(EntityId, EntityId)>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), JsonApiError> {
    submit_form::<S>(&state, S::resource(parent), FormMode::Edit(id), token, multipart).await
}

pub async fn remove_nested<S: NestedForm>(
    State(state): State<ServerState>,
    token: BearerToken,
    Path((parent, id)): Path<(EntityId, EntityId)>,
) -> Result<Json<Value>, JsonApiError> {
    delete_resource(&state, S::resource(parent), id, token).await
}
