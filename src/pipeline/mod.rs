// src/pipeline/mod.rs
pub mod batch_intake;
pub mod job;
pub mod styles;
pub mod variants;

pub use batch_intake::BatchIntakeOrchestrator;
pub use styles::StyleCatalog;
pub use variants::{SessionRegistry, VariantOrchestrator};
