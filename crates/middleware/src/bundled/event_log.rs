//! `event-logger` middleware: appends every event to a JSONL file.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use {async_trait::async_trait, tracing::warn};

use crate::{event::Event, handler::Middleware};

/// Appends one JSONL entry per event. Write failures are logged and the
/// event continues down the chain.
pub struct EventLogMiddleware {
    log_path: PathBuf,
    file: Mutex<Option<std::fs::File>>,
}

impl EventLogMiddleware {
    pub const NAME: &'static str = "event-logger";

    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            file: Mutex::new(None),
        }
    }

    /// Default log path: `<data_dir>/logs/events.log`.
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("logs").join("events.log")
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            if let Some(parent) = self.log_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            *guard = Some(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.log_path)?,
            );
        }
        match guard.as_mut() {
            Some(file) => writeln!(file, "{line}"),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Middleware for EventLogMiddleware {
    async fn handle(&self, event: &mut Event) -> anyhow::Result<()> {
        let entry = serde_json::json!({
            "ts": std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            "type": event.kind,
            "platform": event.platform,
            "text": event.text,
        });
        if let Err(e) = self.append(&entry.to_string()) {
            warn!(path = %self.log_path.display(), error = %e, "event-logger: failed to write log entry");
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logs_each_event() {
        let tmp = tempfile::tempdir().unwrap();
        let log_path = tmp.path().join("logs/events.log");
        let logger = EventLogMiddleware::new(log_path.clone());

        let mut event = Event::new("text", "web", "hi");
        logger.handle(&mut event).await.unwrap();
        let mut event = Event::new("typing", "telegram", "");
        logger.handle(&mut event).await.unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);

        let entry: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(entry["type"], "typing");
        assert_eq!(entry["platform"], "telegram");
    }

    #[tokio::test]
    async fn write_failure_does_not_fail_the_event() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the open fail.
        let log_path = tmp.path().join("events.log");
        std::fs::create_dir_all(&log_path).unwrap();
        let logger = EventLogMiddleware::new(log_path);

        let mut event = Event::new("text", "web", "hi");
        assert!(logger.handle(&mut event).await.is_ok());
    }
}
