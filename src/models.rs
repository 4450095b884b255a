// src/models.rs
use bytes::Bytes;
use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::errors::ShelfScanError;

/// Maximum number of usage/recipe suggestions kept from one analysis.
pub const MAX_SUGGESTIONS: usize = 3;

static PRICE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(\.\d+)?").expect("price token pattern is valid")
});

/// Structured record returned by the analysis model for one image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub product_name: String,
    pub specs: ProductSpecs,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(rename = "liquidAnalysis")]
    pub fill: FillAnalysis,
    pub description: String,
    pub average_price: String,
    pub tasting_notes: TastingNotes,
    #[serde(rename = "cocktails", default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSpecs {
    #[serde(rename = "type")]
    pub kind: String,
    pub abv: String,
    pub volume: String,
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillAnalysis {
    #[serde(deserialize_with = "clamped_percentage")]
    pub percentage: u8,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TastingNotes {
    pub nose: String,
    pub palate: String,
    pub finish: String,
}

/// A cocktail, recipe or use case suggested for the product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub visual_prompt: String,
}

fn clamped_percentage<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_percentage(raw))
}

pub fn clamp_percentage(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

impl AnalysisResult {
    /// Label substituted into style prompts.
    pub fn subject_label(&self) -> String {
        [self.product_name.trim(), self.specs.kind.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("this item")
            .to_string()
    }
}

/// Averages every numeric token in a free-text price range, rounded to pence.
///
/// `"£30 - £40"` gives `35.0`, text without digits gives `0.0`.
pub fn estimate_unit_cost(price_range: &str) -> f64 {
    let tokens: Vec<f64> = PRICE_TOKEN
        .find_iter(price_range)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    if tokens.is_empty() {
        return 0.0;
    }

    let average = tokens.iter().sum::<f64>() / tokens.len() as f64;
    (average * 100.0).round() / 100.0
}

/// An image handed to the pipeline by the capture surface.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
    /// Preview reference shown while the item is processed and kept as the thumbnail.
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: Uuid,
    pub product_name: String,
    pub volume: String,
    pub percentage: u8,
    pub created_at: DateTime<Utc>,
    pub barcode: Option<String>,
    pub image: String,
    pub quantity: u32,
    pub cost: f64,
}

/// Entry fields known before the store assigns identity and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryEntry {
    pub product_name: String,
    pub volume: String,
    pub percentage: u8,
    pub barcode: Option<String>,
    pub image: String,
    pub quantity: u32,
    pub cost: f64,
}

impl NewInventoryEntry {
    pub fn from_analysis(analysis: &AnalysisResult, thumbnail: &str) -> Self {
        Self {
            product_name: analysis.product_name.clone(),
            volume: analysis.specs.volume.clone(),
            percentage: analysis.fill.percentage.min(100),
            barcode: analysis.barcode.clone(),
            image: thumbnail.to_string(),
            quantity: 1,
            cost: estimate_unit_cost(&analysis.average_price),
        }
    }

    pub fn into_entry(self, id: Uuid, created_at: DateTime<Utc>) -> InventoryEntry {
        InventoryEntry {
            id,
            product_name: self.product_name,
            volume: self.volume,
            percentage: self.percentage,
            created_at,
            barcode: self.barcode,
            image: self.image,
            quantity: self.quantity,
            cost: self.cost,
        }
    }
}

/// User edits to an existing entry. Only quantity and cost are editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryUpdate {
    pub quantity: Option<u32>,
    pub cost: Option<f64>,
}

impl EntryUpdate {
    pub fn validate(&self) -> Result<(), ShelfScanError> {
        if let Some(cost) = self.cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(ShelfScanError::Validation(format!(
                    "cost must be a non-negative amount, got {cost}"
                )));
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, entry: &mut InventoryEntry) {
        if let Some(quantity) = self.quantity {
            entry.quantity = quantity;
        }
        if let Some(cost) = self.cost {
            entry.cost = cost;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub items: usize,
    pub average_fill: u8,
    pub total_value: f64,
}

impl StockSummary {
    pub fn from_entries(entries: &[InventoryEntry]) -> Self {
        let average_fill = if entries.is_empty() {
            0
        } else {
            let total: u32 = entries.iter().map(|e| e.percentage as u32).sum();
            clamp_percentage(total as f64 / entries.len() as f64)
        };
        let total_value: f64 = entries.iter().map(|e| e.cost * e.quantity as f64).sum();

        Self {
            items: entries.len(),
            average_fill,
            total_value: (total_value * 100.0).round() / 100.0,
        }
    }
}

/// Position of the running batch; `current` is the 1-based item being handled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub processed_count: usize,
    pub total_count: usize,
}

impl BatchOutcome {
    pub fn failed_count(&self) -> usize {
        self.total_count - self.processed_count
    }

    /// User-facing notice for a finished batch. Empty batches have none.
    pub fn notice(&self) -> Option<Notice> {
        match (self.total_count, self.processed_count) {
            (0, _) => None,
            (_, 0) => Some(Notice::Failure(
                "Failed to analyze images. Please try fewer images or clearer photos.".to_string(),
            )),
            (_, n) => Some(Notice::Success(format!("{n} items processed"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    pub frequency: ReminderFrequency,
    pub time: String,
    pub last_triggered: i64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: ReminderFrequency::Daily,
            time: "09:00".to_string(),
            last_triggered: 0,
        }
    }
}

impl ReminderSettings {
    pub fn target_time(&self) -> Result<NaiveTime, ShelfScanError> {
        NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|e| {
            ShelfScanError::Validation(format!("reminder time '{}' is not HH:MM: {e}", self.time))
        })
    }

    pub fn validate(&self) -> Result<(), ShelfScanError> {
        self.target_time().map(|_| ())
    }

    /// True during the first minute after today's target time, unless the
    /// reminder already fired in the current period.
    pub fn is_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        if !self.enabled {
            return false;
        }
        let Ok(target) = self.target_time() else {
            return false;
        };

        let elapsed = now.time().signed_duration_since(target);
        if elapsed < chrono::Duration::zero() || elapsed >= chrono::Duration::minutes(1) {
            return false;
        }

        let Some(last) = now
            .timezone()
            .timestamp_millis_opt(self.last_triggered)
            .single()
        else {
            return true;
        };
        let today = now.date_naive();
        let last_day = last.date_naive();

        match self.frequency {
            ReminderFrequency::Daily => last_day != today,
            ReminderFrequency::Weekly => {
                last_day.num_days_from_ce() + 7 <= today.num_days_from_ce()
            }
        }
    }
}
