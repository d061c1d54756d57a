//! In-process mock of the task board REST backend.
//!
//! The server runs on its own thread and runtime so it serves both
//! `#[tokio::test]` tests and synchronous CLI tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

pub const TOKEN: &str = "tok-1";
pub const PASSWORD: &str = "secret";

/// One multipart field as received by `POST /api/projects`.
#[derive(Debug, Clone)]
pub struct ReceivedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub text: String,
}

#[derive(Default)]
pub struct BackendState {
    pub projects: Vec<Value>,
    pub users: Vec<Value>,
    pub requests: Vec<String>,
    pub last_form: Vec<ReceivedField>,
    next_id: u64,
}

type Shared = Arc<Mutex<BackendState>>;

pub struct MockBackend {
    pub url: String,
    pub state: Shared,
}

impl MockBackend {
    pub fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            users: vec![
                json!({"id": 1, "name": "Alice", "email": "alice@example.com", "role": "admin"}),
                json!({"id": 2, "name": "Bob", "email": "bob@example.com", "suspended": true}),
            ],
            next_id: 100,
            ..BackendState::default()
        }));
        let app = router(state.clone());

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        let addr = rx.recv().unwrap();

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn seed_project(&self, project: Value) {
        self.state.lock().unwrap().projects.push(project);
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_form(&self) -> Vec<ReceivedField> {
        self.state.lock().unwrap().last_form.clone()
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user))
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/projects/{id}", put(update_project).delete(delete_project))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn record(state: &Shared, request: String) {
    state.lock().unwrap().requests.push(request);
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/auth/login".into());
    let email = body["email"].as_str().unwrap_or_default();
    let guard = state.lock().unwrap();
    let user = guard.users.iter().find(|u| u["email"] == email).cloned();
    match user {
        Some(user) if body["password"] == PASSWORD => {
            Json(json!({ "user": user, "token": TOKEN })).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn signup(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/auth/signup".into());
    let mut guard = state.lock().unwrap();
    if guard.users.iter().any(|u| u["email"] == body["email"]) {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    guard.next_id += 1;
    let user = json!({"id": guard.next_id, "name": body["name"], "email": body["email"]});
    guard.users.push(user.clone());
    (StatusCode::CREATED, Json(json!({ "user": user, "token": TOKEN }))).into_response()
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /api/users".into());
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }
    Json(state.lock().unwrap().users.clone()).into_response()
}

async fn get_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("GET /api/users/{}", id));
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }
    let guard = state.lock().unwrap();
    let wanted = if id == "me" { "1".to_string() } else { id };
    match guard.users.iter().find(|u| u["id"].to_string() == wanted) {
        Some(user) => Json(user.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn list_projects(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET /api/projects".into());
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }
    Json(state.lock().unwrap().projects.clone()).into_response()
}

async fn create_project(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    record(&state, "POST /api/projects".into());
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }

    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        fields.push(ReceivedField {
            name,
            file_name,
            content_type,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    let field = |name: &str| fields.iter().find(|f| f.name == name).map(|f| f.text.clone());
    let project_name = field("name").unwrap_or_default();
    if project_name == "boom" {
        state.lock().unwrap().last_form = fields;
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database down");
    }

    let mut guard = state.lock().unwrap();
    guard.next_id += 1;
    let members: Vec<Value> = fields
        .iter()
        .filter(|f| f.name == "member_ids[]")
        .filter_map(|f| guard.users.iter().find(|u| u["id"].to_string() == f.text))
        .map(|u| json!({ "user": u, "access_role": "member" }))
        .collect();
    let image = fields
        .iter()
        .find(|f| f.name == "image")
        .and_then(|f| f.file_name.clone())
        .map(|name| format!("/uploads/{}", name));
    let project = json!({
        "id": guard.next_id,
        "name": project_name,
        "description": field("description"),
        "createdAt": "2024-03-01T12:00:00Z",
        "tasks": [],
        "project_members": members,
        "image": image,
    });
    guard.projects.push(project.clone());
    guard.last_form = fields;
    (StatusCode::CREATED, Json(json!({ "project": project }))).into_response()
}

async fn update_project(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, format!("PUT /api/projects/{}", id));
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }
    let mut guard = state.lock().unwrap();
    match guard
        .projects
        .iter_mut()
        .find(|p| p["id"].to_string().trim_matches('"') == id)
    {
        Some(slot) => {
            *slot = body.clone();
            Json(json!({ "project": body })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Project not found"),
    }
}

async fn delete_project(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&state, format!("DELETE /api/projects/{}", id));
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }
    let mut guard = state.lock().unwrap();
    let before = guard.projects.len();
    guard
        .projects
        .retain(|p| p["id"].to_string().trim_matches('"') != id);
    if guard.projects.len() == before {
        return error(StatusCode::NOT_FOUND, "Project not found");
    }
    StatusCode::NO_CONTENT.into_response()
}
