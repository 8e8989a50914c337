use axum::Json;
use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use mixdown_core::UserIdentity;

use crate::dto::{InviteResponse, MemberResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_my_invites_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<InviteResponse>>> {
    let invites = state
        .workspace_service
        .invites_for_caller(&user)
        .await?
        .into_iter()
        .map(InviteResponse::from)
        .collect();

    Ok(Json(invites))
}

pub async fn accept_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<Json<MemberResponse>> {
    let member = state
        .workspace_service
        .accept_invite(&user, invite_id)
        .await?;

    Ok(Json(MemberResponse::from(member)))
}
