//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod artist;
mod release;
mod task;
mod user;
mod workspace;

pub use access::{
    Permission, Role, WorkspaceMember, effective_permissions, has_required_permissions,
    seeded_role_catalog,
};
pub use artist::Artist;
pub use release::{Release, ReleaseQuery, ReleaseSortField, ReleaseType, SortDirection};
pub use task::{ReleaseTask, TaskEvent, TaskEventType, TaskStatus, TaskType};
pub use user::{EmailAddress, UserProfile};
pub use workspace::{
    Invite, Plan, Subscription, Workspace, artist_limit_for, can_add_another_artist,
};
