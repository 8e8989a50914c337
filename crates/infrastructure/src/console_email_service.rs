//! Development email sink that writes outgoing mail to the log instead of
//! delivering it.

use async_trait::async_trait;
use mixdown_application::EmailService;
use mixdown_core::AppResult;
use tracing::info;

/// Email service used when no SMTP provider is configured. Messages are
/// rendered to the application log so invite flows stay testable locally.
#[derive(Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates the logging email sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(
            to,
            subject,
            has_html = html_body.is_some(),
            body = text_body,
            "outgoing email (console provider)"
        );

        Ok(())
    }
}
