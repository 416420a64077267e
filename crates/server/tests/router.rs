use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use configs::AppConfig;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use service::ViewScope;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Backend {
    deletes: Arc<AtomicUsize>,
    creates: Arc<AtomicUsize>,
    contact_had_auth: Arc<Mutex<Option<bool>>>,
}

async fn brands() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Schneider Electric", "logoUrl": "/uploads/se.png" },
        { "id": 2, "name": "ABB", "logoUrl": "abb.png" },
        { "id": 3, "name": "Siemens", "logoUrl": "https://cdn.example.com/siemens.svg" },
        { "id": 4, "name": "Legrand" }
    ]))
}

async fn broken() -> StatusCode { StatusCode::INTERNAL_SERVER_ERROR }

// backend revoked the token even though its exp is still ahead
async fn revoked() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token revoked" })))
}

async fn achievement(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({ "data": { "id": id, "title": "SNI", "imageUrl": "iVBORw0KGgoAAAANSUhEUg" } }))
}

async fn remove(State(b): State<Backend>) -> StatusCode {
    b.deletes.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn create(State(b): State<Backend>, mut multipart: Multipart) -> impl IntoResponse {
    b.creates.fetch_add(1, Ordering::SeqCst);
    let mut fields = serde_json::Map::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = if field.file_name().is_some() {
            json!(field.bytes().await.map(|b| b.len()).unwrap_or(0))
        } else {
            json!(field.text().await.unwrap_or_default())
        };
        fields.insert(name, value);
    }
    (StatusCode::CREATED, Json(Value::Object(fields)))
}

async fn contact(State(b): State<Backend>, headers: HeaderMap) -> StatusCode {
    if let Ok(mut seen) = b.contact_had_auth.lock() {
        *seen = Some(headers.contains_key(header::AUTHORIZATION));
    }
    StatusCode::CREATED
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "secret" {
        let user = json!({ "name": "Admin", "email": body["email"] });
        Json(json!({ "token": live_token(), "user": user })).into_response()
    } else {
        let body = Json(json!({ "message": "invalid credentials" }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

fn token_with_exp(exp: i64) -> String {
    let claims = json!({ "sub": 1, "exp": exp });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend")).unwrap()
}

fn live_token() -> String { token_with_exp(chrono::Utc::now().timestamp() + 3600) }

fn expired_token() -> String { token_with_exp(chrono::Utc::now().timestamp() - 10) }

struct TestApp {
    app: Router,
    backend: Backend,
    static_dir: std::path::PathBuf,
}

async fn start() -> anyhow::Result<TestApp> {
    let backend = Backend::default();
    let upstream = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/brands", get(brands).post(create))
        .route("/api/brands/:id", delete(remove))
        .route("/api/clients", get(broken))
        .route("/api/services", get(revoked).post(create))
        .route("/api/services/:id", get(revoked))
        .route("/api/achievements/:id", get(achievement))
        .route("/api/services/:id/features", post(create))
        .route("/api/contact-messages", post(contact))
        .with_state(backend.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, upstream).await {
            eprintln!("mock upstream error: {}", e);
        }
    });

    let root = std::env::temp_dir().join(format!("dge_router_{}", uuid::Uuid::new_v4()));
    let static_dir = root.join("public");
    tokio::fs::create_dir_all(&static_dir).await?;
    tokio::fs::write(static_dir.join("index.html"), "<h1>PT Dian Graha Elektrika</h1>").await?;

    let mut cfg = AppConfig::default();
    cfg.upstream.base_url = format!("http://{}", addr);
    cfg.server.static_dir = static_dir.to_string_lossy().into_owned();
    cfg.session.store_path = root.join("data/session.json").to_string_lossy().into_owned();
    cfg.normalize_and_validate()?;

    let app = server::startup::build_app(cfg, &ViewScope::new()).await?;
    Ok(TestApp { app, backend, static_dir })
}

async fn call(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, HeaderMap, Value)> {
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), 1024 * 1024).await?;
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Ok((status, headers, body))
}

fn get_req(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "dge-test-boundary";

fn multipart_req(
    method: &str,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        let part = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        );
        body.extend_from_slice(part.as_bytes());
    }
    if let Some((name, bytes)) = file {
        let head = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"; filename=\"upload.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        );
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut b = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::from(body)).unwrap()
}

fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, _, body) = call(&t.app, get_req("/health", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    Ok(())
}

#[tokio::test]
async fn brand_list_is_filtered_paged_and_resolves_images() -> anyhow::Result<()> {
    let t = start().await?;
    let uri = "/api/brands?q=e&sort=name&order=asc&page=1&page_size=2";
    let (status, _, body) = call(&t.app, get_req(uri, None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], false);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_pages"], 2);
    let items = body["items"].as_array().cloned().unwrap_or_default();
    let names: Vec<_> = items.iter().map(|i| i["name"].as_str().unwrap_or_default()).collect();
    assert_eq!(names, vec!["Legrand", "Schneider Electric"]);
    assert_eq!(items[0]["image_src"], Value::Null);
    let origin = body_origin(&items[1]);
    assert!(origin.ends_with("/uploads/se.png"));
    Ok(())
}

fn body_origin(item: &Value) -> String {
    item["image_src"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn page_past_the_end_shows_last_page() -> anyhow::Result<()> {
    let t = start().await?;
    let (_, _, body) = call(&t.app, get_req("/api/brands?page=9&page_size=3", None)).await?;
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["start_index"], 3);
    Ok(())
}

#[tokio::test]
async fn failing_upstream_degrades_to_empty_page() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, _, body) = call(&t.app, get_req("/api/clients", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_pages"], 1);
    Ok(())
}

#[tokio::test]
async fn expired_bearer_forces_logout() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, headers, body) =
        call(&t.app, get_req("/api/brands", Some(&expired_token()))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "session_expired");
    assert_eq!(body["redirect"], "/login");
    assert!(set_cookies(&headers).iter().any(|c| c.starts_with("token=")));
    Ok(())
}

#[tokio::test]
async fn delete_requires_credentials() -> anyhow::Result<()> {
    let t = start().await?;
    let req = Request::builder().method("DELETE").uri("/api/brands/1").body(Body::empty())?;
    let (status, _, body) = call(&t.app, req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_credentials");
    assert_eq!(t.backend.deletes.load(Ordering::SeqCst), 0);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/brands/1")
        .header(header::AUTHORIZATION, format!("Bearer {}", live_token()))
        .body(Body::empty())?;
    let (status, _, body) = call(&t.app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(t.backend.deletes.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn service_create_needs_an_image() -> anyhow::Result<()> {
    let t = start().await?;
    let token = live_token();
    let fields = [("name", "Panel Distribution"), ("shortDesc", "LV/MV panels")];
    let req = multipart_req("POST", "/api/services", Some(&token), &fields, None);
    let (status, _, body) = call(&t.app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "image is required");
    assert_eq!(t.backend.creates.load(Ordering::SeqCst), 0);

    let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    let req = multipart_req("POST", "/api/services", Some(&token), &fields, Some(("image", &png)));
    let (status, _, body) = call(&t.app, req).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["shortDesc"], "LV/MV panels");
    assert_eq!(body["image"], 6);
    Ok(())
}

#[tokio::test]
async fn nested_feature_create_hits_parent_path() -> anyhow::Result<()> {
    let t = start().await?;
    let req = multipart_req(
        "POST",
        "/api/services/4/features",
        Some(&live_token()),
        &[("featureName", "Testing"), ("featureDesc", "Routine tests")],
        None,
    );
    let (status, _, body) = call(&t.app, req).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["featureName"], "Testing");
    Ok(())
}

#[tokio::test]
async fn contact_form_is_forwarded_without_authorization() -> anyhow::Result<()> {
    let t = start().await?;
    let req = multipart_req(
        "POST",
        "/api/contact-messages",
        Some(&expired_token()),
        &[("fullName", "Budi"), ("email", "budi@example.com"), ("message", "Quote please")],
        None,
    );
    let (status, _, body) = call(&t.app, req).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(*t.backend.contact_had_auth.lock().unwrap(), Some(false));

    let fields = [("fullName", "Budi"), ("email", "nope")];
    let bad = multipart_req("POST", "/api/contact-messages", None, &fields, None);
    let (status, _, _) = call(&t.app, bad).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn achievement_detail_decodes_raw_base64_image() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, _, body) = call(&t.app, get_req("/api/achievements/2", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "SNI");
    assert_eq!(body["image_src"], "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg");
    Ok(())
}

fn login_req(password: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::from(json!({ "email": "admin@dge.co.id", "password": password }).to_string()))
        .unwrap()
}

fn logout_req(token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("POST").uri("/api/auth/logout");
    if let Some(t) = token {
        b = b.header(header::COOKIE, format!("token={t}"));
    }
    b.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn login_sets_cookies_and_logout_redirects() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, headers, body) = call(&t.app, login_req("secret", None)).await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());
    let cookies = set_cookies(&headers);
    assert!(cookies.iter().any(|c| c.starts_with("token=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("user=")));

    let (_, _, status_body) = call(&t.app, get_req("/api/auth/session", Some(&token))).await?;
    assert_eq!(status_body["authenticated"], true);
    assert_eq!(status_body["user"]["name"], "Admin");

    let (status, headers, _) = call(&t.app, logout_req(Some(&token))).await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/login"));
    assert!(set_cookies(&headers).iter().any(|c| c.starts_with("token=")));

    // the server-side mirror for this token is gone
    let (_, _, status_body) = call(&t.app, get_req("/api/auth/session", Some(&token))).await?;
    assert_eq!(status_body["user"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn session_status_belongs_to_the_caller() -> anyhow::Result<()> {
    let t = start().await?;
    let (_, _, body) = call(&t.app, login_req("secret", None)).await?;
    let admin = body["token"].as_str().unwrap_or_default().to_string();

    let (status, _, anon) = call(&t.app, get_req("/api/auth/session", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(anon["authenticated"], false);
    assert_eq!(anon["user"], Value::Null);

    // an anonymous logout must not end someone else's session
    let (status, _, _) = call(&t.app, logout_req(None)).await?;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let (_, _, still) = call(&t.app, get_req("/api/auth/session", Some(&admin))).await?;
    assert_eq!(still["authenticated"], true);
    assert_eq!(still["user"]["name"], "Admin");

    let (_, headers, stale) =
        call(&t.app, get_req("/api/auth/session", Some(&expired_token()))).await?;
    assert_eq!(stale["expired"], true);
    assert_eq!(stale["authenticated"], false);
    assert!(set_cookies(&headers).iter().any(|c| c.starts_with("token=")));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, headers, body) = call(&t.app, login_req("guess", None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
    assert_eq!(body["redirect"], Value::Null);
    assert!(set_cookies(&headers).is_empty());
    Ok(())
}

#[tokio::test]
async fn upstream_rejecting_a_live_token_forces_logout() -> anyhow::Result<()> {
    let t = start().await?;
    let token = live_token();
    for uri in ["/api/services/5", "/api/services"] {
        let (status, headers, body) = call(&t.app, get_req(uri, Some(&token))).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "session_expired", "{uri}");
        assert_eq!(body["redirect"], "/login", "{uri}");
        let cookies = set_cookies(&headers);
        assert!(cookies.iter().any(|c| c.starts_with("token=")), "{uri}");
        assert!(cookies.iter().any(|c| c.starts_with("user=")), "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn static_pages_fall_back_to_index() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, _, body) = call(&t.app, get_req("/about", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap_or_default().contains("Dian Graha"));
    assert!(t.static_dir.join("index.html").exists());
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> anyhow::Result<()> {
    let t = start().await?;
    let (status, _, body) = call(&t.app, get_req("/api-docs/openapi.json", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/brands"].is_object());
    Ok(())
}
