// src/services/settings_store.rs
use crate::errors::ShelfScanError;
use crate::models::ReminderSettings;
use chrono::{DateTime, TimeZone};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const REMINDER_TITLE: &str = "Inventory Check";
pub const REMINDER_BODY: &str = "It's time for your scheduled stock take.";

/// Reminder settings persisted as a JSON file on this machine.
pub struct SettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Missing or unreadable settings fall back to the defaults.
    pub async fn load(&self) -> ReminderSettings {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ReminderSettings::default(),
            Err(e) => {
                warn!("Could not read {}: {}", self.path.display(), e);
                return ReminderSettings::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt reminder settings in {}: {}", self.path.display(), e);
            ReminderSettings::default()
        })
    }

    pub async fn save(&self, settings: &ReminderSettings) -> Result<(), ShelfScanError> {
        settings.validate()?;
        let value = serde_json::to_string_pretty(settings)?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, value).await?;
        Ok(())
    }

    /// Records a trigger at `now` when the reminder is due. Returns whether it fired.
    pub async fn fire_if_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<bool, ShelfScanError> {
        let mut settings = self.load().await;
        if !settings.is_due(now) {
            return Ok(false);
        }

        info!("{}: {}", REMINDER_TITLE, REMINDER_BODY);
        settings.last_triggered = now.timestamp_millis();
        self.save(&settings).await?;
        Ok(true)
    }
}

/// Checks the reminder every `period` against local time.
pub async fn run_reminder_ticker(store: Arc<SettingsStore>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(e) = store.fire_if_due(&chrono::Local::now()).await {
            warn!("Reminder check failed: {}", e);
        }
    }
}
