//! Application services and ports.

#![forbid(unsafe_code)]

mod access;
mod artist_service;
mod email;
mod release_service;
mod task_service;
mod workspace_service;

pub use access::{AccessService, MembershipRepository};
pub use artist_service::{ArtistInput, ArtistRepository, ArtistService};
pub use email::EmailService;
pub use release_service::{ReleaseDetail, ReleaseInput, ReleaseRepository, ReleaseService};
pub use task_service::{
    CreateTaskInput, ReleaseTaskRepository, TaskService, UpdateTaskInput,
};
pub use workspace_service::{
    CreateInviteInput, InviteRepository, UpdateWorkspaceInput, WorkspaceOverview,
    WorkspaceRepository, WorkspaceService,
};
