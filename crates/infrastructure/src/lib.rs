//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod in_memory_membership_repository;
mod postgres_artist_repository;
mod postgres_invite_repository;
mod postgres_membership_repository;
mod postgres_release_repository;
mod postgres_task_repository;
mod postgres_workspace_repository;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use in_memory_membership_repository::InMemoryMembershipRepository;
pub use postgres_artist_repository::PostgresArtistRepository;
pub use postgres_invite_repository::PostgresInviteRepository;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_release_repository::PostgresReleaseRepository;
pub use postgres_task_repository::PostgresTaskRepository;
pub use postgres_workspace_repository::PostgresWorkspaceRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
