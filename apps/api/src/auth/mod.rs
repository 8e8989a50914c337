mod bootstrap;
mod session;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler, session_identity};

pub const SESSION_USER_KEY: &str = "user_identity";
