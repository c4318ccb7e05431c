//! HTTP bindings for the book resource.
//!
//! Every handler validates its arguments, then runs the permission check,
//! then the operation.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRef, Path, Query, State},
    http::{header::LOCATION, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use folio_authz::PrincipalDirectory;
use folio_db::EntityId;
use folio_http::{auth::CurrentPrincipal, error::AppError, router::no_route};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use super::controller::BooksController;
use super::models::{CreateArgs, DeleteArgs, ListArgs, UpdateArgs};
use super::schema::{self, WriteMethod};
use super::NAMESPACE;

pub const TOTAL_HEADER: HeaderName = HeaderName::from_static("x-wp-total");
pub const TOTAL_PAGES_HEADER: HeaderName = HeaderName::from_static("x-wp-totalpages");

#[derive(Clone)]
pub struct BooksState {
    pub controller: Arc<BooksController>,
    pub principals: Arc<PrincipalDirectory>,
}

impl FromRef<BooksState> for Arc<PrincipalDirectory> {
    fn from_ref(state: &BooksState) -> Self {
        state.principals.clone()
    }
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route(
            "/books",
            get(list_books).post(create_book).options(describe_collection),
        )
        .route(
            "/books/{id}",
            get(get_book)
                .put(update_book)
                .patch(update_book)
                .delete(delete_book)
                .options(describe_item),
        )
        .fallback(no_route)
        .method_not_allowed_fallback(no_route)
        .with_state(state)
}

/// Ids are positive integers; anything else does not match the item route.
fn parse_id(raw: &str) -> Result<EntityId, AppError> {
    match raw.parse::<EntityId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::no_route()),
    }
}

fn query_map(params: HashMap<String, String>) -> Map<String, Value> {
    params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

/// Request body as a JSON object. An empty body is an empty object.
fn body_map(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid_json("Request body must be a JSON object.")),
        Err(err) => Err(invalid_json(&err.to_string())),
    }
}

fn invalid_json(reason: &str) -> AppError {
    AppError::validation(
        vec![json!({ "field": "body", "error": reason })],
        "Invalid JSON body passed.",
    )
    .with_code("rest_invalid_json")
}

fn parse_args<T: DeserializeOwned>(specs: &[schema::ArgSpec], input: &Map<String, Value>) -> Result<T, AppError> {
    let validated = schema::validate(specs, input)?;
    serde_json::from_value(Value::Object(validated))
        .map_err(|err| AppError::Internal(anyhow::anyhow!("validated arguments did not bind: {err}")))
}

fn count_header(value: u64) -> HeaderValue {
    HeaderValue::from(value)
}

async fn list_books(
    State(state): State<BooksState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let args: ListArgs = parse_args(&schema::collection_params(), &query_map(params))?;
    state.controller.list_permission_check(&principal)?;

    let page = state.controller.list(&args).await?;
    let headers = [
        (TOTAL_HEADER, count_header(page.total)),
        (TOTAL_PAGES_HEADER, count_header(page.total_pages)),
    ];
    Ok((headers, Json(page.items)).into_response())
}

async fn create_book(
    State(state): State<BooksState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Bytes,
) -> Result<Response, AppError> {
    let input = body_map(&body)?;
    let args: CreateArgs = parse_args(&schema::endpoint_args(WriteMethod::Create), &input)?;
    state.controller.create_permission_check(&principal)?;

    let (book, location) = state.controller.create(&principal, args).await?;
    let location = HeaderValue::from_str(&location)
        .map_err(|err| AppError::Internal(anyhow::anyhow!("invalid location header: {err}")))?;
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(book)).into_response())
}

async fn get_book(
    State(state): State<BooksState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    state.controller.get_permission_check(&principal, id).await?;

    let book = state.controller.get(id).await?;
    Ok(Json(book).into_response())
}

async fn update_book(
    State(state): State<BooksState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let input = body_map(&body)?;
    let args: UpdateArgs = parse_args(&schema::endpoint_args(WriteMethod::Edit), &input)?;
    state.controller.update_permission_check(&principal, id).await?;

    let book = state.controller.update(id, args).await?;
    Ok(Json(book).into_response())
}

async fn delete_book(
    State(state): State<BooksState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    // Body parameters take precedence over the query string.
    let mut input = query_map(params);
    input.extend(body_map(&body)?);
    let args: DeleteArgs = parse_args(&schema::delete_params(), &input)?;
    state.controller.delete_permission_check(&principal, id).await?;

    let deleted = state.controller.delete(id, args.force).await?;
    Ok(Json(deleted).into_response())
}

async fn describe_collection() -> Json<Value> {
    Json(schema::describe_collection(NAMESPACE))
}

async fn describe_item(Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    parse_id(&id)?;
    Ok(Json(schema::describe_item(NAMESPACE)))
}
