//! Log capture for asserting on emitted tracing events.

use std::{
    fmt::Write as _,
    sync::{Arc, Mutex},
};

use {
    tracing::{
        Level, Subscriber,
        field::{Field, Visit},
        subscriber::DefaultGuard,
    },
    tracing_subscriber::{Layer, layer::Context, prelude::*},
};

#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    entries: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturedLogs {
    /// Rendered lines (message followed by `key=value` fields) at `level`.
    pub(crate) fn at_level(&self, level: Level) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

struct CaptureLayer {
    logs: CapturedLogs,
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.logs
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((
                *event.metadata().level(),
                format!("{}{}", visitor.message, visitor.fields),
            ));
    }
}

/// Capture every tracing event emitted on this thread until the guard drops.
pub(crate) fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer { logs: logs.clone() });
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
