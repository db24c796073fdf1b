/// Task endpoints
///
/// All routes require a bearer token. USER callers see and modify only their
/// own tasks; ADMIN callers see and modify every task.
///
/// # Endpoints
///
/// - `POST /api/v1/tasks` - Create a task owned by the caller
/// - `GET /api/v1/tasks` - List tasks (`status`, `priority`, `page`, `limit`)
/// - `GET /api/v1/tasks/:id` - Fetch one task
/// - `PUT /api/v1/tasks/:id` - Partially update a task
/// - `DELETE /api/v1/tasks/:id` - Delete a task

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    response::ApiResponse,
};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::task::{NewTask, Task, TaskPriority, TaskStatus, UpdateTask},
    services::tasks::{self, ListParams, TaskPage, DEFAULT_LIMIT, DEFAULT_PAGE},
};
use uuid::Uuid;

/// Query string for listing
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    /// 1-based page number (default: 1)
    pub page: Option<i64>,

    /// Page size (default: 10, max: 100)
    #[serde(alias = "pageSize")]
    pub limit: Option<i64>,
}

impl From<ListQuery> for ListParams {
    fn from(query: ListQuery) -> Self {
        ListParams {
            status: query.status,
            priority: query.priority,
            page: query.page.unwrap_or(DEFAULT_PAGE),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: Uuid,
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/tasks
/// Authorization: Bearer <token>
///
/// {
///   "title": "Write report",
///   "description": "Quarterly numbers",
///   "status": "TODO",
///   "priority": "HIGH"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Missing or invalid token
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<NewTask>,
) -> ApiResult<ApiResponse<TaskResponse>> {
    let task = tasks::create(state.store.as_ref(), &auth, req).await?;

    Ok(ApiResponse::created(TaskResponse { task }).with_message("Task created successfully"))
}

/// List tasks visible to the caller, newest first
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "tasks": [...],
///     "pagination": { "page": 1, "limit": 10, "total": 42, "pages": 5 }
///   }
/// }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<ApiResponse<TaskPage>> {
    let page = tasks::list(state.store.as_ref(), &auth, query.into()).await?;

    Ok(ApiResponse::ok(page))
}

/// Fetch one task
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id
/// - `403 Forbidden`: Task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<TaskResponse>> {
    let task = tasks::get_by_id(state.store.as_ref(), &auth, id).await?;

    Ok(ApiResponse::ok(TaskResponse { task }))
}

/// Update a task
///
/// Only fields present in the body change.
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTask>,
) -> ApiResult<ApiResponse<TaskResponse>> {
    let task = tasks::update(state.store.as_ref(), &auth, id, req).await?;

    Ok(ApiResponse::ok(TaskResponse { task }).with_message("Task updated successfully"))
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<DeletedResponse>> {
    tasks::delete(state.store.as_ref(), &auth, id).await?;

    Ok(ApiResponse::ok(DeletedResponse { id }).with_message("Task deleted successfully"))
}
