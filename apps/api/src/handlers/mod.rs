pub mod artists;
pub mod health;
pub mod invites;
pub mod releases;
pub mod tasks;
pub mod workspaces;
