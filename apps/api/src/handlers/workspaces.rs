use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use mixdown_core::{UserIdentity, WorkspaceId};

use crate::dto::{
    CreateInviteRequest, InviteResponse, MemberResponse, RoleResponse, SetMemberRolesRequest,
    SubscriptionResponse, UpdateWorkspaceRequest, WorkspaceOverviewResponse, WorkspaceResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_workspace_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<WorkspaceOverviewResponse>> {
    let overview = state
        .workspace_service
        .overview(&user, WorkspaceId::from_uuid(workspace_id))
        .await?;

    Ok(Json(WorkspaceOverviewResponse::from(overview)))
}

pub async fn update_workspace_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<UpdateWorkspaceRequest>,
) -> ApiResult<Json<WorkspaceResponse>> {
    let workspace = state
        .workspace_service
        .update_workspace(&user, WorkspaceId::from_uuid(workspace_id), payload.into())
        .await?;

    Ok(Json(WorkspaceResponse::from(workspace)))
}

pub async fn delete_workspace_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .workspace_service
        .delete_workspace(&user, WorkspaceId::from_uuid(workspace_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let members = state
        .workspace_service
        .list_members(&user, WorkspaceId::from_uuid(workspace_id))
        .await?
        .into_iter()
        .map(MemberResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .workspace_service
        .list_roles(&user, WorkspaceId::from_uuid(workspace_id))
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn set_member_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, subject)): Path<(Uuid, String)>,
    Json(payload): Json<SetMemberRolesRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let member = state
        .workspace_service
        .set_member_roles(
            &user,
            WorkspaceId::from_uuid(workspace_id),
            subject.as_str(),
            &payload.role_names,
        )
        .await?;

    Ok(Json(MemberResponse::from(member)))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, subject)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .workspace_service
        .remove_member(&user, WorkspaceId::from_uuid(workspace_id), subject.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<CreateInviteRequest>,
) -> ApiResult<(StatusCode, Json<InviteResponse>)> {
    let invite = state
        .workspace_service
        .create_invite(&user, WorkspaceId::from_uuid(workspace_id), payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}

pub async fn delete_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((workspace_id, invite_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .workspace_service
        .delete_invite(&user, WorkspaceId::from_uuid(workspace_id), invite_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_subscription_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workspace_id): Path<Uuid>,
) -> ApiResult<Json<Option<SubscriptionResponse>>> {
    let subscription = state
        .workspace_service
        .subscription(&user, WorkspaceId::from_uuid(workspace_id))
        .await?;

    Ok(Json(subscription.map(SubscriptionResponse::from)))
}
