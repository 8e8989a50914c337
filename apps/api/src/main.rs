//! Mixdown API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use mixdown_application::{
    AccessService, ArtistService, EmailService, ReleaseService, TaskService, WorkspaceRepository,
    WorkspaceService,
};
use mixdown_core::AppError;
use mixdown_infrastructure::{
    ConsoleEmailService, PostgresArtistRepository, PostgresInviteRepository,
    PostgresMembershipRepository, PostgresReleaseRepository, PostgresTaskRepository,
    PostgresWorkspaceRepository, SmtpEmailConfig, SmtpEmailService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    Url::parse(&frontend_url)
        .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?;
    let bootstrap_token = required_env("AUTH_BOOTSTRAP_TOKEN")?;

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let membership_repository = Arc::new(PostgresMembershipRepository::new(pool.clone()));
    let access_service = AccessService::new(membership_repository.clone());
    let workspace_repository: Arc<dyn WorkspaceRepository> =
        Arc::new(PostgresWorkspaceRepository::new(pool.clone()));
    let invite_repository = Arc::new(PostgresInviteRepository::new(pool.clone()));
    let artist_repository = Arc::new(PostgresArtistRepository::new(pool.clone()));
    let release_repository = Arc::new(PostgresReleaseRepository::new(pool.clone()));
    let task_repository = Arc::new(PostgresTaskRepository::new(pool.clone()));

    let email_service: Arc<dyn EmailService> = match email_provider.as_str() {
        "smtp" => {
            let smtp_port = required_non_empty_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;

            let smtp_config = SmtpEmailConfig {
                host: required_non_empty_env("SMTP_HOST")?,
                port: smtp_port,
                username: required_non_empty_env("SMTP_USERNAME")?,
                password: required_non_empty_env("SMTP_PASSWORD")?,
                from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
            };
            Arc::new(SmtpEmailService::new(smtp_config))
        }
        "console" => Arc::new(ConsoleEmailService::new()),
        _ => {
            return Err(AppError::Validation(format!(
                "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{email_provider}'"
            )));
        }
    };

    let app_state = AppState {
        workspace_service: WorkspaceService::new(
            access_service.clone(),
            workspace_repository.clone(),
            membership_repository.clone(),
            invite_repository,
            email_service,
        ),
        artist_service: ArtistService::new(
            access_service.clone(),
            artist_repository.clone(),
            workspace_repository.clone(),
        ),
        release_service: ReleaseService::new(
            access_service.clone(),
            release_repository.clone(),
            artist_repository,
            task_repository.clone(),
        ),
        task_service: TaskService::new(access_service, release_repository, task_repository),
        workspace_repository,
        frontend_url: frontend_url.clone(),
        bootstrap_token,
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/api/invites", get(handlers::invites::list_my_invites_handler))
        .route(
            "/api/invites/{invite_id}/accept",
            post(handlers::invites::accept_invite_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}",
            get(handlers::workspaces::get_workspace_handler)
                .put(handlers::workspaces::update_workspace_handler)
                .delete(handlers::workspaces::delete_workspace_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/members",
            get(handlers::workspaces::list_members_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/roles",
            get(handlers::workspaces::list_roles_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/members/{subject}",
            put(handlers::workspaces::set_member_roles_handler)
                .delete(handlers::workspaces::remove_member_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/invites",
            post(handlers::workspaces::create_invite_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/invites/{invite_id}",
            delete(handlers::workspaces::delete_invite_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/subscription",
            get(handlers::workspaces::get_subscription_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/artists",
            get(handlers::artists::list_artists_handler)
                .post(handlers::artists::create_artist_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/artists/{artist_id}",
            get(handlers::artists::get_artist_handler)
                .put(handlers::artists::update_artist_handler)
                .delete(handlers::artists::delete_artist_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/releases",
            get(handlers::releases::list_releases_handler)
                .post(handlers::releases::create_release_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/releases/{release_id}",
            get(handlers::releases::get_release_handler)
                .put(handlers::releases::update_release_handler)
                .delete(handlers::releases::delete_release_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/releases/{release_id}/tasks",
            get(handlers::tasks::list_tasks_handler).post(handlers::tasks::create_task_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/releases/{release_id}/tasks/{task_type}",
            get(handlers::tasks::get_task_handler)
                .put(handlers::tasks::update_task_handler)
                .delete(handlers::tasks::delete_task_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/releases/{release_id}/tasks/{task_type}/events",
            get(handlers::tasks::list_task_events_handler),
        )
        .route(
            "/api/workspaces/{workspace_id}/releases/{release_id}/tasks/{task_type}/comments",
            post(handlers::tasks::add_task_comment_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "mixdown-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
