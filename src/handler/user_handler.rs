use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use crate::dto::user_dto::{LoginNameFilter, UserDto};
use crate::model::user::User;
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::error::{HandlerError, HandlerErrorKind};
use std::sync::Arc;
use tracing::{debug, instrument};
use validator::Validate;

fn parse_id(raw: &str) -> Result<i64, HandlerError> {
    raw.parse::<i64>()
        .map_err(|_| HandlerError::bad_request(format!("Invalid user id: {}", raw)))
}

/// Malformed JSON is reported as 400 like any other invalid input.
fn read_body(body: Result<Json<UserDto>, JsonRejection>) -> Result<UserDto, HandlerError> {
    let Json(payload) = body.map_err(|e| HandlerError::bad_request(e.body_text()))?;
    payload.validate().map_err(|e| HandlerError::validation(&e))?;
    Ok(payload)
}

async fn upsert(service: &UserServiceImpl, payload: UserDto) -> Result<UserDto, HandlerError> {
    let user = service.upsert(User::from(payload)).await?;
    Ok(UserDto::from(user))
}

// GET /api/users
#[instrument(skip(service))]
pub async fn list_users_handler(
    State(service): State<Arc<UserServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    let users: Vec<UserDto> = service
        .get_all()
        .await?
        .into_iter()
        .map(UserDto::from)
        .collect();
    debug!("Returning {} users", users.len());
    Ok(Json(users))
}

// GET /api/users/{id}
#[instrument(skip(service))]
pub async fn get_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;
    let user = service.get_by_id(id).await?;
    Ok(Json(UserDto::from(user)))
}

// GET /api/users/filter?loginName=
#[instrument(skip(service))]
pub async fn filter_users_handler(
    State(service): State<Arc<UserServiceImpl>>,
    query: Result<Query<LoginNameFilter>, QueryRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Query(filter) = query.map_err(|e| HandlerError::bad_request(e.body_text()))?;
    let user = service.get_by_login_name(&filter.login_name).await?;
    Ok(Json(UserDto::from(user)))
}

// POST /api/users
#[instrument(skip(service, body))]
pub async fn create_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    body: Result<Json<UserDto>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let payload = read_body(body)?;
    if payload.id.is_some() {
        return Err(HandlerError::bad_request("User ID must not be set when creating a user."));
    }
    let created = upsert(&service, payload).await?;
    let id = created
        .id
        .ok_or_else(|| HandlerError::new(HandlerErrorKind::Internal, "Created user has no ID"))?;
    let location = format!("/api/users/{}", id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

// PUT /api/users/{id}
#[instrument(skip(service, body))]
pub async fn update_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
    body: Result<Json<UserDto>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;
    let payload = read_body(body)?;
    if payload.id != Some(id) {
        return Err(HandlerError::bad_request("User ID in path and body do not match."));
    }
    let updated = upsert(&service, payload).await?;
    Ok(Json(updated))
}

// DELETE /api/users/{id}
#[instrument(skip(service))]
pub async fn delete_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id)?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
