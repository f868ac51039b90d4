use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use models::{TodoPayload, TodoRecord};
use serde::Deserialize;

use crate::{
    auth::Caller,
    errors::ApiError,
    extract::{AppJson, AppQuery},
    metrics,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(default)]
    pub tag: String,
    pub start: u64,
    pub end: u64,
}

pub async fn list_owned(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
) -> Json<Vec<TodoRecord>> {
    let list = state.todos.list_owned(&caller).await;
    metrics::OPERATIONS_TOTAL.with_label_values(&["list_owned", "ok"]).inc();
    Json(list)
}

pub async fn list_by_tag(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    AppQuery(q): AppQuery<TagQuery>,
) -> Result<Json<Vec<TodoRecord>>, ApiError> {
    let res = state.todos.list_by_tag_paged(&caller, &q.tag, q.start, q.end).await;
    metrics::observe("list_by_tag_paged", &res);
    Ok(Json(res?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<TodoRecord>, ApiError> {
    let res = state.todos.get(&caller, &id).await;
    metrics::observe("get", &res);
    Ok(Json(res?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    AppJson(payload): AppJson<TodoPayload>,
) -> Result<(StatusCode, Json<TodoRecord>), ApiError> {
    let res = state.todos.create(&caller, payload).await;
    metrics::observe("create", &res);
    Ok((StatusCode::CREATED, Json(res?)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<TodoPayload>,
) -> Result<Json<TodoRecord>, ApiError> {
    let res = state.todos.update(&caller, &id, payload).await;
    metrics::observe("update", &res);
    Ok(Json(res?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<TodoRecord>, ApiError> {
    let res = state.todos.delete(&caller, &id).await;
    metrics::observe("delete", &res);
    Ok(Json(res?))
}

pub async fn complete(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<TodoRecord>, ApiError> {
    let res = state.todos.complete(&caller, &id).await;
    metrics::observe("complete", &res);
    Ok(Json(res?))
}
