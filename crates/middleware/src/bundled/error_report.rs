//! `error-reporter` recovery middleware.

use {async_trait::async_trait, tracing::warn};

use crate::{
    event::Event,
    handler::{ErrorMiddleware, Recovery},
};

/// Logs the failure with a summary of the event at warn level and resolves
/// it, so nothing reaches the unhandled-error fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorReportMiddleware;

impl ErrorReportMiddleware {
    pub const NAME: &'static str = "error-reporter";
}

#[async_trait]
impl ErrorMiddleware for ErrorReportMiddleware {
    async fn recover(&self, error: anyhow::Error, event: &mut Event) -> Recovery {
        warn!(
            event_type = %event.kind,
            platform = %event.platform,
            error = %error,
            "middleware error reported"
        );
        Recovery::Resolved
    }
}
