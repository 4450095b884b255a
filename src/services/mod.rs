// src/services/mod.rs
pub mod download;
pub mod image_processor;
pub mod llm_service;
pub mod redis_service;
pub mod settings_store;

pub use download::FileDownloadSink;
pub use image_processor::ImageProcessor;
pub use llm_service::GeminiService;
pub use redis_service::RedisEntryStore;
pub use settings_store::SettingsStore;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::ShelfScanError;
use crate::models::{AnalysisResult, CapturedImage, EntryUpdate, InventoryEntry, NewInventoryEntry};

/// Turns a product photo into a structured record.
#[async_trait]
pub trait ProductAnalyzer: Send + Sync {
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, ShelfScanError>;
}

/// Restyles a photo according to a free-text instruction.
#[async_trait]
pub trait ImageEnhancer: Send + Sync {
    async fn enhance(&self, image: &CapturedImage, instruction: &str)
    -> Result<Bytes, ShelfScanError>;
}

/// Durable inventory entries, listed most-recent-first.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<InventoryEntry>, ShelfScanError>;
    async fn insert(&self, entry: NewInventoryEntry) -> Result<InventoryEntry, ShelfScanError>;
    async fn update(&self, id: Uuid, update: &EntryUpdate) -> Result<InventoryEntry, ShelfScanError>;
    async fn delete(&self, id: Uuid) -> Result<(), ShelfScanError>;
    async fn clear(&self) -> Result<(), ShelfScanError>;
}

/// Destination for gallery downloads.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, filename: &str, data: &[u8]) -> Result<(), ShelfScanError>;
}
