// src/testing.rs
//! Fakes for the external services, shared by the unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, oneshot};
use uuid::Uuid;

use crate::errors::ShelfScanError;
use crate::models::*;
use crate::pipeline::batch_intake::{IntakeEvent, ProgressSink};
use crate::services::{DownloadSink, EntryStore, ImageEnhancer, ProductAnalyzer};

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

pub fn captured(name: &str) -> CapturedImage {
    CapturedImage {
        filename: name.to_string(),
        mime_type: "image/jpeg".to_string(),
        data: Bytes::from(name.as_bytes().to_vec()),
        preview: format!("preview:{name}"),
    }
}

pub fn sample_analysis(product_name: &str, price: &str) -> AnalysisResult {
    AnalysisResult {
        product_name: product_name.to_string(),
        specs: ProductSpecs {
            kind: "Spirit".to_string(),
            abv: "40%".to_string(),
            volume: "700ml".to_string(),
            origin: "Scotland".to_string(),
        },
        barcode: None,
        fill: FillAnalysis {
            percentage: 80,
            description: "Mostly full".to_string(),
        },
        description: "A well-loved bottle.".to_string(),
        average_price: price.to_string(),
        tasting_notes: TastingNotes {
            nose: "Juniper".to_string(),
            palate: "Dry".to_string(),
            finish: "Long".to_string(),
        },
        suggestions: vec![Suggestion {
            name: "Negroni".to_string(),
            ingredients: vec!["gin".to_string(), "vermouth".to_string(), "Campari".to_string()],
            instructions: "Stir over ice.".to_string(),
            visual_prompt: "Negroni in a rocks glass".to_string(),
        }],
    }
}

/// Analyzer answering per filename. Unknown files fail.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    results: HashMap<String, Option<AnalysisResult>>,
    gated: Option<String>,
    gate: Notify,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, filename: &str, analysis: AnalysisResult) -> Self {
        self.results.insert(filename.to_string(), Some(analysis));
        self
    }

    pub fn fail(mut self, filename: &str) -> Self {
        self.results.insert(filename.to_string(), None);
        self
    }

    /// Holds the analysis of `filename` until [`Self::open_gate`].
    pub fn with_gate(mut self, filename: &str) -> Self {
        self.gated = Some(filename.to_string());
        self
    }

    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    pub async fn wait_until_called(&self, filename: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.calls().iter().any(|c| c == filename) {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("analyzer was never called");
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, ShelfScanError> {
        self.calls.lock().unwrap().push(image.filename.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.gated.as_deref() == Some(image.filename.as_str()) {
            self.gate.notified().await;
        }
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.results
            .get(&image.filename)
            .cloned()
            .flatten()
            .ok_or_else(|| ShelfScanError::LLM(format!("could not read {}", image.filename)))
    }
}

/// Enhancer that answers at once, echoing the instruction as image bytes.
#[derive(Default)]
pub struct ScriptedEnhancer {
    failing: Vec<String>,
    failing_once: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every instruction containing `marker` fails.
    pub fn failing(mut self, marker: &str) -> Self {
        self.failing.push(marker.to_string());
        self
    }

    /// The first instruction containing `marker` fails.
    pub fn failing_once(self, marker: &str) -> Self {
        self.failing_once.lock().unwrap().push(marker.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEnhancer for ScriptedEnhancer {
    async fn enhance(&self, _image: &CapturedImage, instruction: &str) -> Result<Bytes, ShelfScanError> {
        self.calls.lock().unwrap().push(instruction.to_string());

        let mut once = self.failing_once.lock().unwrap();
        if let Some(pos) = once.iter().position(|m| instruction.contains(m.as_str())) {
            once.remove(pos);
            return Err(ShelfScanError::LLM("model busy".to_string()));
        }
        if self.failing.iter().any(|m| instruction.contains(m.as_str())) {
            return Err(ShelfScanError::LLM("No image data found in response".to_string()));
        }
        Ok(Bytes::from(instruction.as_bytes().to_vec()))
    }
}

/// Enhancer whose calls stay unresolved until the test releases them.
#[derive(Default)]
pub struct GatedEnhancer {
    waiting: Mutex<HashMap<String, oneshot::Sender<Result<Bytes, ()>>>>,
}

impl GatedEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.waiting.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("enhancer calls did not arrive");
    }

    pub fn release(&self, instruction: &str, outcome: Result<Bytes, ()>) {
        let tx = self
            .waiting
            .lock()
            .unwrap()
            .remove(instruction)
            .expect("no call waiting for this instruction");
        tx.send(outcome).unwrap();
    }
}

#[async_trait]
impl ImageEnhancer for GatedEnhancer {
    async fn enhance(&self, _image: &CapturedImage, instruction: &str) -> Result<Bytes, ShelfScanError> {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().unwrap().insert(instruction.to_string(), tx);
        match rx.await {
            Ok(Ok(image)) => Ok(image),
            _ => Err(ShelfScanError::LLM("generation failed".to_string())),
        }
    }
}

/// In-memory store, newest entry first.
#[derive(Default)]
pub struct MemoryEntryStore {
    entries: tokio::sync::Mutex<Vec<InventoryEntry>>,
    inserts_allowed: Option<usize>,
    inserts: AtomicUsize,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts after the first `n` fail with a store error.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.inserts_allowed = Some(n);
        self
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn list(&self) -> Result<Vec<InventoryEntry>, ShelfScanError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn insert(&self, entry: NewInventoryEntry) -> Result<InventoryEntry, ShelfScanError> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.inserts_allowed.is_some_and(|allowed| n >= allowed) {
            return Err(ShelfScanError::Redis("connection refused".to_string()));
        }
        let entry = entry.into_entry(Uuid::new_v4(), chrono::Utc::now());
        self.entries.lock().await.insert(0, entry.clone());
        Ok(entry)
    }

    async fn update(&self, id: Uuid, update: &EntryUpdate) -> Result<InventoryEntry, ShelfScanError> {
        update.validate()?;
        let mut entries = self.entries.lock().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ShelfScanError::NotFound(format!("stock entry {}", id)))?;
        update.apply_to(entry);
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ShelfScanError> {
        self.entries.lock().await.retain(|e| e.id != id);
        Ok(())
    }

    async fn clear(&self) -> Result<(), ShelfScanError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<IntakeEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<IntakeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Progress reported once each item has been attempted.
    pub fn finished_progress(&self) -> Vec<BatchProgress> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                IntakeEvent::ItemAdded { progress, .. } | IntakeEvent::ItemFailed { progress, .. } => {
                    Some(progress)
                }
                _ => None,
            })
            .collect()
    }

    pub fn all_progress(&self) -> Vec<BatchProgress> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                IntakeEvent::ItemStarted { progress, .. }
                | IntakeEvent::ItemAdded { progress, .. }
                | IntakeEvent::ItemFailed { progress, .. } => Some(progress),
                IntakeEvent::Finished(_) => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn on_event(&self, event: &IntakeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingDownloads {
    saved: Mutex<Vec<(String, Instant)>>,
}

impl RecordingDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.saved.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn gaps(&self) -> Vec<Duration> {
        let saved = self.saved.lock().unwrap();
        saved.windows(2).map(|w| w[1].1.duration_since(w[0].1)).collect()
    }
}

#[async_trait]
impl DownloadSink for RecordingDownloads {
    async fn save(&self, filename: &str, _data: &[u8]) -> Result<(), ShelfScanError> {
        self.saved.lock().unwrap().push((filename.to_string(), Instant::now()));
        Ok(())
    }
}
