mod artists;
mod common;
mod releases;
mod tasks;
mod workspaces;

pub use artists::{ArtistResponse, SaveArtistRequest};
pub use common::{HealthResponse, UserIdentityResponse};
pub use releases::{ReleaseDetailResponse, ReleaseResponse, SaveReleaseRequest};
pub use tasks::{
    AddCommentRequest, CreateTaskRequest, TaskEventResponse, TaskResponse, UpdateTaskRequest,
};
pub use workspaces::{
    CreateInviteRequest, InviteResponse, MemberResponse, RoleResponse, SetMemberRolesRequest,
    SubscriptionResponse, UpdateWorkspaceRequest, WorkspaceOverviewResponse, WorkspaceResponse,
};
