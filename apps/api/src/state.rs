use std::sync::Arc;

use mixdown_application::{
    ArtistService, ReleaseService, TaskService, WorkspaceRepository, WorkspaceService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub workspace_service: WorkspaceService,
    pub artist_service: ArtistService,
    pub release_service: ReleaseService,
    pub task_service: TaskService,
    pub workspace_repository: Arc<dyn WorkspaceRepository>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
