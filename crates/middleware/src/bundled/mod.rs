//! Middleware shipped with the pipeline.

use std::{path::PathBuf, sync::Arc};

use crate::{
    handler::{ChainHandler, MiddlewareDefinition},
    manager::PipelineManager,
};

pub mod error_report;
pub mod event_log;

pub use {error_report::ErrorReportMiddleware, event_log::EventLogMiddleware};

/// Register the bundled middleware on `manager`:
/// `event-logger` on incoming (ordered first), and an `error-reporter`
/// recovery handler on each channel (ordered last).
///
/// Returns how many definitions were accepted.
pub fn register_bundled(manager: &PipelineManager, event_log_path: PathBuf) -> usize {
    let definitions = [
        MiddlewareDefinition::incoming(
            EventLogMiddleware::NAME,
            ChainHandler::Main(Arc::new(EventLogMiddleware::new(event_log_path))),
        )
        .with_order(i32::MIN)
        .with_description("Append every incoming event to a JSONL log"),
        MiddlewareDefinition::incoming(
            format!("{}:incoming", ErrorReportMiddleware::NAME),
            ChainHandler::Recovery(Arc::new(ErrorReportMiddleware)),
        )
        .with_order(i32::MAX)
        .with_description("Report and resolve incoming middleware failures"),
        MiddlewareDefinition::outgoing(
            format!("{}:outgoing", ErrorReportMiddleware::NAME),
            ChainHandler::Recovery(Arc::new(ErrorReportMiddleware)),
        )
        .with_order(i32::MAX)
        .with_description("Report and resolve outgoing middleware failures"),
    ];

    definitions
        .into_iter()
        .map(|def| manager.register(def))
        .filter(|accepted| *accepted)
        .count()
}
