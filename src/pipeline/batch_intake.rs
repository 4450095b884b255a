// src/pipeline/batch_intake.rs
use log::{info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, MutexGuard};

use crate::errors::ShelfScanError;
use crate::models::{BatchOutcome, BatchProgress, CapturedImage, InventoryEntry, NewInventoryEntry};
use crate::services::{EntryStore, ProductAnalyzer};

/// Events emitted while a stock batch runs.
#[derive(Debug, Clone)]
pub enum IntakeEvent {
    ItemStarted {
        progress: BatchProgress,
        filename: String,
    },
    ItemAdded {
        progress: BatchProgress,
        entry: InventoryEntry,
    },
    ItemFailed {
        progress: BatchProgress,
        filename: String,
        reason: String,
    },
    Finished(BatchOutcome),
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &IntakeEvent);
}

/// Default sink: progress goes to the log.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_event(&self, event: &IntakeEvent) {
        match event {
            IntakeEvent::ItemStarted { progress, filename } => {
                info!("Item {} of {}: analyzing {}", progress.current, progress.total, filename)
            }
            IntakeEvent::ItemAdded { entry, .. } => info!("Added: {}", entry.product_name),
            IntakeEvent::ItemFailed { .. } => {}
            IntakeEvent::Finished(outcome) => info!(
                "Batch finished: {} of {} items processed, {} failed",
                outcome.processed_count,
                outcome.total_count,
                outcome.failed_count()
            ),
        }
    }
}

/// What a client polls while a batch runs.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchStatus {
    pub progress: BatchProgress,
    pub filename: String,
    pub preview: String,
}

pub fn limit_reached(max_images: usize) -> ShelfScanError {
    ShelfScanError::Validation(format!(
        "Limit reached: Please select up to {} photos at a time.",
        max_images
    ))
}

fn lock_status(status: &StdMutex<Option<BatchStatus>>) -> std::sync::MutexGuard<'_, Option<BatchStatus>> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Held for the life of one batch. Dropping it clears the published status
/// before the batch lock is released, including when the batch is cancelled.
struct ActiveBatch<'a> {
    _running: MutexGuard<'a, ()>,
    status: &'a StdMutex<Option<BatchStatus>>,
}

impl ActiveBatch<'_> {
    fn publish(&self, status: BatchStatus) {
        *lock_status(self.status) = Some(status);
    }
}

impl Drop for ActiveBatch<'_> {
    fn drop(&mut self) {
        *lock_status(self.status) = None;
    }
}

/// Analyzes captured images one at a time and logs each recognised product
/// as an inventory entry.
pub struct BatchIntakeOrchestrator {
    analyzer: Arc<dyn ProductAnalyzer>,
    store: Arc<dyn EntryStore>,
    sink: Arc<dyn ProgressSink>,
    max_images: usize,
    running: Mutex<()>,
    status: StdMutex<Option<BatchStatus>>,
}

impl BatchIntakeOrchestrator {
    pub fn new(
        analyzer: Arc<dyn ProductAnalyzer>,
        store: Arc<dyn EntryStore>,
        max_images: usize,
    ) -> Self {
        Self {
            analyzer,
            store,
            sink: Arc::new(LogProgress),
            max_images,
            running: Mutex::new(()),
            status: StdMutex::new(None),
        }
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    /// Progress of the running batch, `None` when idle.
    pub fn status(&self) -> Option<BatchStatus> {
        lock_status(&self.status).clone()
    }

    /// Single stock scan: analysis and store failures both reach the caller.
    pub async fn scan_one(&self, image: &CapturedImage) -> Result<InventoryEntry, ShelfScanError> {
        let analysis = self.analyzer.analyze(image).await?;
        let entry = self
            .store
            .insert(NewInventoryEntry::from_analysis(&analysis, &image.preview))
            .await?;
        info!("Added: {}", entry.product_name);
        Ok(entry)
    }

    /// Runs the batch in input order. A failed analysis skips its image; a
    /// store failure ends the batch, keeping the entries already added.
    pub async fn run_batch(&self, images: Vec<CapturedImage>) -> Result<BatchOutcome, ShelfScanError> {
        if images.is_empty() {
            return Ok(BatchOutcome {
                processed_count: 0,
                total_count: 0,
            });
        }
        if images.len() > self.max_images {
            return Err(limit_reached(self.max_images));
        }

        let running = self
            .running
            .try_lock()
            .map_err(|_| ShelfScanError::Busy("a stock batch is already running".to_string()))?;
        let batch = ActiveBatch {
            _running: running,
            status: &self.status,
        };

        info!("Processing batch of {} images", images.len());
        let result = self.process_in_order(&batch, &images).await;
        drop(batch);

        let outcome = BatchOutcome {
            processed_count: result?,
            total_count: images.len(),
        };
        self.sink.on_event(&IntakeEvent::Finished(outcome));
        Ok(outcome)
    }

    async fn process_in_order(
        &self,
        batch: &ActiveBatch<'_>,
        images: &[CapturedImage],
    ) -> Result<usize, ShelfScanError> {
        let total = images.len();
        let mut processed = 0;

        for (index, image) in images.iter().enumerate() {
            let progress = BatchProgress {
                current: index + 1,
                total,
            };
            batch.publish(BatchStatus {
                progress,
                filename: image.filename.clone(),
                preview: image.preview.clone(),
            });
            self.sink.on_event(&IntakeEvent::ItemStarted {
                progress,
                filename: image.filename.clone(),
            });

            match self.analyzer.analyze(image).await {
                Ok(analysis) => {
                    let entry = self
                        .store
                        .insert(NewInventoryEntry::from_analysis(&analysis, &image.preview))
                        .await?;
                    processed += 1;
                    self.sink.on_event(&IntakeEvent::ItemAdded { progress, entry });
                }
                Err(e) => {
                    warn!("Error analyzing image index {} ({}): {}", index, image.filename, e);
                    self.sink.on_event(&IntakeEvent::ItemFailed {
                        progress,
                        filename: image.filename.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(processed)
    }
}
