use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use mixdown_core::{UserIdentity, WorkspaceId};
use mixdown_domain::TaskType;

use crate::dto::{
    AddCommentRequest, CreateTaskRequest, TaskEventResponse, TaskResponse, UpdateTaskRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state
        .task_service
        .list_tasks(&user, WorkspaceId::from_uuid(workspace_id), release_id)
        .await?
        .into_iter()
        .map(TaskResponse::from)
        .collect();

    Ok(Json(tasks))
}

pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .task_service
        .create_task(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            payload.try_into()?,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

pub async fn get_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id, task_type)): Path<(Uuid, Uuid, String)>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .task_service
        .get_task(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            TaskType::parse(&task_type)?,
        )
        .await?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn update_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id, task_type)): Path<(Uuid, Uuid, String)>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .task_service
        .update_task(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            TaskType::parse(&task_type)?,
            payload.try_into()?,
        )
        .await?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id, task_type)): Path<(Uuid, Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .task_service
        .delete_task(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            TaskType::parse(&task_type)?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_task_events_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id, task_type)): Path<(Uuid, Uuid, String)>,
) -> ApiResult<Json<Vec<TaskEventResponse>>> {
    let events = state
        .task_service
        .list_events(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            TaskType::parse(&task_type)?,
        )
        .await?
        .into_iter()
        .map(TaskEventResponse::from)
        .collect();

    Ok(Json(events))
}

pub async fn add_task_comment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, release_id, task_type)): Path<(Uuid, Uuid, String)>,
    Json(payload): Json<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<TaskEventResponse>)> {
    let event = state
        .task_service
        .add_comment(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            release_id,
            TaskType::parse(&task_type)?,
            payload.body.as_str(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TaskEventResponse::from(event))))
}
