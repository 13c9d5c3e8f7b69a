use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub email: String,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct Store {
    posts: BTreeMap<u64, Post>,
    comments: Vec<Comment>,
    next_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

/// Three posts by two users, with two comments on post 2.
pub fn seed() -> Store {
    let posts = [
        (1, 1, "sunt aut facere", "quia et suscipit"),
        (2, 1, "qui est esse", "est rerum tempore"),
        (3, 2, "ea molestias quasi", "et iusto sed quo"),
    ]
    .into_iter()
    .map(|(id, user_id, title, body)| {
        (
            id,
            Post {
                id,
                user_id,
                title: title.to_string(),
                body: body.to_string(),
            },
        )
    })
    .collect();
    let comments = vec![
        Comment {
            id: 6,
            post_id: 2,
            email: "Presley.Mueller@myrl.com".to_string(),
            body: "doloribus at sed quis culpa".to_string(),
        },
        Comment {
            id: 7,
            post_id: 2,
            email: "Dallas@ole.me".to_string(),
            body: "maiores sed dolores similique".to_string(),
        },
    ];
    Store {
        posts,
        comments,
        next_id: 4,
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/posts/", get(list_posts).post(create_post))
        .route(
            "/posts/{id}/",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/{id}/comments", get(list_comments))
        .route("/echo", get(echo).post(echo).put(echo).delete(echo))
        .route("/echo/{*rest}", get(echo).post(echo).put(echo).delete(echo))
        .route("/error", get(fail))
        .route("/slow", get(slow))
        .route("/text", get(text))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn list_posts(
    State(db): State<Db>,
    Query(filter): Query<BTreeMap<String, String>>,
) -> Json<Vec<Post>> {
    let user_id = filter.get("userId").and_then(|v| v.parse::<u64>().ok());
    let store = db.read().await;
    let posts = store
        .posts
        .values()
        .filter(|post| user_id.map_or(true, |id| post.user_id == id))
        .cloned()
        .collect();
    Json(posts)
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<NewPost>,
) -> (StatusCode, Json<Post>) {
    let mut store = db.write().await;
    let id = store.next_id;
    store.next_id += 1;
    let post = Post {
        id,
        user_id: input.user_id,
        title: input.title,
        body: input.body,
    };
    store.posts.insert(id, post.clone());
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, StatusCode> {
    let store = db.read().await;
    store.posts.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<PostChanges>,
) -> Result<Json<Post>, StatusCode> {
    let mut store = db.write().await;
    let post = store.posts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(body) = input.body {
        post.body = body;
    }
    Ok(Json(post.clone()))
}

async fn delete_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let mut store = db.write().await;
    store
        .posts
        .remove(&id)
        .map(|_| Json(json!({})))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_comments(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Comment>>, StatusCode> {
    let store = db.read().await;
    if !store.posts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let comments = store
        .comments
        .iter()
        .filter(|comment| comment.post_id == id)
        .cloned()
        .collect();
    Ok(Json(comments))
}

/// Reflects the request back so clients can check what they sent.
async fn echo(
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "raw_query": uri.query(),
        "query": query,
        "content_type": header(header::CONTENT_TYPE),
        "authorization": header(header::AUTHORIZATION),
        "body": body,
    }))
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong")
}

async fn slow(Query(query): Query<BTreeMap<String, String>>) -> Json<Value> {
    let ms = query
        .get("ms")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(100);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept": ms }))
}

async fn text() -> &'static str {
    "plain text, not json"
}
