use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use models::forms::{AchievementForm, BrandForm};
use models::Brand;
use serde_json::json;
use tokio::net::TcpListener;

use service::forms::{FormFlow, FormMode, FormPhase};
use service::upstream::UploadedFile;
use service::{ProxyError, Resource, UpstreamClient};

#[derive(Clone, Default)]
struct Backend {
    deletes: Arc<AtomicUsize>,
    achievement_reads: Arc<AtomicUsize>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn list_brands(headers: HeaderMap) -> impl IntoResponse {
    assert_eq!(headers.get("cache-control").and_then(|v| v.to_str().ok()), Some("no-store"));
    Json(json!({ "data": [
        { "id": 1, "name": "Schneider", "logoUrl": "/uploads/se.png" },
        { "id": 2, "name": "ABB" }
    ]}))
}

async fn list_clients(headers: HeaderMap) -> impl IntoResponse {
    match bearer(&headers).as_deref() {
        Some("expired") => {
            (StatusCode::UNAUTHORIZED, Json(json!({ "message": "jwt expired" }))).into_response()
        }
        _ => Json(json!([{ "id": 5, "name": "PLN" }])).into_response(),
    }
}

async fn delete_brand(
    State(b): State<Backend>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> StatusCode {
    b.deletes.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers).is_some() { StatusCode::NO_CONTENT } else { StatusCode::UNAUTHORIZED }
}

async fn get_achievement(State(b): State<Backend>, Path(id): Path<i64>) -> impl IntoResponse {
    b.achievement_reads.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "id": id, "title": "ISO 9001", "imageUrl": "/uploads/iso.png" }))
}

async fn update_achievement(Path(id): Path<i64>, mut multipart: Multipart) -> impl IntoResponse {
    let mut names = Vec::new();
    let mut title = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "title" {
            title = field.text().await.unwrap_or_default();
        }
        names.push(name);
    }
    Json(json!({ "id": id, "title": title, "parts": names }))
}

async fn update_client() -> impl IntoResponse {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "name taken" })))
}

async fn create_brand() -> impl IntoResponse {
    (StatusCode::CREATED, "created")
}

async fn start_backend() -> anyhow::Result<(UpstreamClient, Backend)> {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/brands", get(list_brands).post(create_brand))
        .route("/api/brands/:id", delete(delete_brand))
        .route("/api/clients", get(list_clients))
        .route("/api/clients/:id", put(update_client))
        .route("/api/achievements/:id", get(get_achievement).put(update_achievement))
        .route("/api/contact-messages", post(|| async { StatusCode::NO_CONTENT }))
        .with_state(backend.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("mock backend error: {}", e); }
    });
    let origin = format!("http://{}", addr);
    let client = UpstreamClient::new(
        format!("{origin}/api"),
        origin,
        Duration::from_secs(2),
        Duration::from_secs(5),
    )?;
    Ok((client, backend))
}

#[tokio::test]
async fn delete_without_token_makes_no_call() -> anyhow::Result<()> {
    let (client, backend) = start_backend().await?;
    let err = client.delete(Resource::Brands, 1, None).await.unwrap_err();
    assert_eq!(err, ProxyError::MissingCredentials);
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn delete_no_content_is_success() -> anyhow::Result<()> {
    let (client, backend) = start_backend().await?;
    let body = client.delete(Resource::Brands, 1, Some("tok")).await?;
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn wrapped_list_is_unwrapped() -> anyhow::Result<()> {
    let (client, _) = start_backend().await?;
    let brands: Vec<Brand> = client.list(Resource::Brands, None).await?;
    assert_eq!(brands.len(), 2);
    assert_eq!(brands[0].logo_url.as_deref(), Some("/uploads/se.png"));
    Ok(())
}

#[tokio::test]
async fn unauthorized_with_token_means_expired_session() -> anyhow::Result<()> {
    let (client, _) = start_backend().await?;
    let err = client.list::<models::Client>(Resource::Clients, Some("expired")).await.unwrap_err();
    assert_eq!(err, ProxyError::SessionExpired);
    assert!(err.forces_logout());
    Ok(())
}

#[tokio::test]
async fn upstream_error_keeps_status_and_message() -> anyhow::Result<()> {
    let (client, _) = start_backend().await?;
    let form = service::upstream::OutboundForm { fields: vec![("name", "PLN".into())], file: None };
    let err = client.update(Resource::Clients, 5, form, Some("tok")).await.unwrap_err();
    assert_eq!(err, ProxyError::upstream(422, "name taken"));
    Ok(())
}

#[tokio::test]
async fn text_mutation_body_is_wrapped() -> anyhow::Result<()> {
    let (client, _) = start_backend().await?;
    let schema = BrandForm { name: "Omron".into() };
    let form = service::upstream::OutboundForm::from_schema(&schema, None);
    let body = client.create(Resource::Brands, form, Some("tok")).await?;
    assert_eq!(body, json!({ "success": true, "message": "created" }));
    Ok(())
}

#[tokio::test]
async fn edit_flow_loads_once_and_submits_multipart() -> anyhow::Result<()> {
    let (client, backend) = start_backend().await?;
    let origin = client.asset_origin().to_string();
    let flow = Arc::new(FormFlow::<AchievementForm>::new(
        Resource::Achievements,
        FormMode::Edit(7),
        client,
        Some("tok".into()),
    ));

    let (a, b) = tokio::join!(flow.load_existing(), flow.load_existing());
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(backend.achievement_reads.load(Ordering::SeqCst), 1);
    assert_eq!(flow.phase(), FormPhase::Ready);
    assert_eq!(flow.form().title, "ISO 9001");
    assert_eq!(flow.preview_src(), Some(format!("{origin}/uploads/iso.png")));

    flow.update_form(|f| f.title = "ISO 14001".into());
    let png = vec![0x89, b'P', b'N', b'G'];
    flow.select_image(UploadedFile::new("cert.png", Some("image/png".into()), png));
    let body = flow.submit().await.map_err(|e| anyhow::anyhow!("{e:?}"))?;
    assert_eq!(body["title"], "ISO 14001");
    assert_eq!(body["parts"], json!(["title", "image"]));
    assert!(matches!(flow.phase(), FormPhase::Success(_)));
    assert_eq!(flow.acknowledge().as_deref(), Some("/admin/achievements"));
    Ok(())
}

#[tokio::test]
async fn contact_form_posts_without_credentials() -> anyhow::Result<()> {
    let (client, _) = start_backend().await?;
    let form = service::upstream::OutboundForm {
        fields: vec![("fullName", "Budi".into())],
        file: None,
    };
    let body = client.create(Resource::ContactMessages, form, None).await?;
    assert_eq!(body, json!({ "success": true }));
    Ok(())
}
