use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use super::domain::NotificationRecord;
use super::error::{LookupError, NotificationError};

static EMAIL_SHAPE: OnceLock<Regex> = OnceLock::new();

fn email_shape() -> &'static Regex {
    EMAIL_SHAPE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"))
}

/// Append-only sink for notification requests. Records are never read back.
pub trait NotificationLog: Send + Sync {
    fn append(&self, record: &NotificationRecord) -> Result<(), NotificationError>;
}

/// Validates the email shape and stamps the record. Nothing is written here.
pub fn build_notification(
    email: &str,
    tract: Option<&str>,
    now: DateTime<Utc>,
) -> Result<NotificationRecord, LookupError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(LookupError::client("Missing email"));
    }
    if !email_shape().is_match(email) {
        return Err(LookupError::client("Invalid email format"));
    }

    Ok(NotificationRecord {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        tract: tract.map(str::trim).unwrap_or_default().to_string(),
        email: email.to_string(),
    })
}

/// CSV file log with `timestamp,tract,email` rows and no header.
#[derive(Debug)]
pub struct CsvNotificationLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvNotificationLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NotificationLog for CsvNotificationLog {
    fn append(&self, record: &NotificationRecord) -> Result<(), NotificationError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([
            record.timestamp.as_str(),
            record.tract.as_str(),
            record.email.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
