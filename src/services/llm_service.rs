// src/services/llm_service.rs
use crate::errors::ShelfScanError;
use crate::models::*;
use crate::services::{ImageEnhancer, ProductAnalyzer};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use log::{debug, error};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Instant;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const ANALYSIS_PROMPT: &str = r#"
      Analyze this image. It is either a Spirit Bottle, a specific Barcode, or a General Product.

      1. **Identify**: Read the Barcode if visible. Identify Product Name, Type, Weight/Volume, Origin.
      2. **Analyze Content (High Precision)**: Look closely at the transparency and bottle geometry to estimate the remaining % (0-100).
         - Be precise (e.g. 98% if near full, 45% if half).
         - If it is a solid object or opaque container, estimate 100% unless clearly used/opened.
      3. **Knowledge Retrieval**:
         - Provide a short, engaging "Story" about the brand.
         - Estimate the "Average Price" in GBP (£).
         - Provide "Tasting Notes" (Nose, Palate, Finish). *If non-food, map these to 'Scent/Material', 'Features', 'Quality/Finish'*.
         - Suggest 3 "Cocktails" (or Recipes/Use-Cases if not alcohol).
           *Important*: For each item, provide a 'visualPrompt' describing exactly how it looks.
      4. **Scan**: Prioritize reading the barcode numbers.

      Return strictly valid JSON matching the schema.
    "#;

/// Client for the Gemini multimodal models used for analysis and restyling.
pub struct GeminiService {
    api_key: String,
    analysis_model: String,
    enhance_model: String,
    client: Client,
}

impl GeminiService {
    pub fn new(api_key: String, analysis_model: String, enhance_model: String) -> Self {
        Self {
            api_key,
            analysis_model,
            enhance_model,
            client: Client::new(),
        }
    }

    pub async fn analyze_image(&self, image: &CapturedImage) -> Result<AnalysisResult, ShelfScanError> {
        let start = Instant::now();

        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": image.mime_type, "data": encode(&image.data) } },
                    { "text": ANALYSIS_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": analysis_schema(),
                "temperature": 0.4
            }
        });

        let result = self.generate_content(&self.analysis_model, &body).await?;
        let analysis = parse_analysis_response(&result)?;

        debug!(
            "Analyzed '{}' as '{}' in {} ms",
            image.filename,
            analysis.product_name,
            start.elapsed().as_millis()
        );

        Ok(analysis)
    }

    pub async fn enhance_image(
        &self,
        image: &CapturedImage,
        instruction: &str,
    ) -> Result<Bytes, ShelfScanError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": image.mime_type, "data": encode(&image.data) } },
                    { "text": instruction }
                ]
            }]
        });

        let result = self.generate_content(&self.enhance_model, &body).await?;
        extract_inline_image(&result)
    }

    async fn generate_content(&self, model: &str, body: &Value) -> Result<Value, ShelfScanError> {
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", GEMINI_BASE_URL, model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ShelfScanError::LLM(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini {} returned {}: {}", model, status, error_text);
            return Err(ShelfScanError::LLM(format!("Gemini error ({}): {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| ShelfScanError::LLM(format!("Failed to parse Gemini response: {}", e)))
    }
}

#[async_trait]
impl ProductAnalyzer for GeminiService {
    async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, ShelfScanError> {
        self.analyze_image(image).await
    }
}

#[async_trait]
impl ImageEnhancer for GeminiService {
    async fn enhance(&self, image: &CapturedImage, instruction: &str) -> Result<Bytes, ShelfScanError> {
        self.enhance_image(image, instruction).await
    }
}

fn encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

fn response_parts(result: &Value) -> Result<&Vec<Value>, ShelfScanError> {
    result["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ShelfScanError::LLM("No content in Gemini response".to_string()))
}

pub(crate) fn parse_analysis_response(result: &Value) -> Result<AnalysisResult, ShelfScanError> {
    let text = response_parts(result)?
        .iter()
        .find_map(|part| part["text"].as_str())
        .ok_or_else(|| ShelfScanError::LLM("No response text received from Gemini".to_string()))?;

    let mut analysis: AnalysisResult = serde_json::from_str(text)
        .map_err(|e| ShelfScanError::LLM(format!("Failed to parse analysis JSON: {}", e)))?;
    analysis.suggestions.truncate(MAX_SUGGESTIONS);

    Ok(analysis)
}

pub(crate) fn extract_inline_image(result: &Value) -> Result<Bytes, ShelfScanError> {
    let data = response_parts(result)?
        .iter()
        .find_map(|part| part["inlineData"]["data"].as_str())
        .ok_or_else(|| ShelfScanError::LLM("No image data found in response".to_string()))?;

    general_purpose::STANDARD
        .decode(data)
        .map(Bytes::from)
        .map_err(|e| ShelfScanError::LLM(format!("Failed to decode image: {}", e)))
}

/// Response schema constraining the analysis model to an `AnalysisResult`.
pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "productName": {
                "type": "STRING",
                "description": "The full commercial name of the product (e.g., 'Grey Goose Vodka' or 'Heinz Baked Beans')."
            },
            "description": {
                "type": "STRING",
                "description": "A 2-3 sentence engaging story, history, or heritage about the brand or product."
            },
            "averagePrice": {
                "type": "STRING",
                "description": "Estimated retail price range in GBP (£) based on general market knowledge (e.g., '£30 - £40')."
            },
            "specs": {
                "type": "OBJECT",
                "properties": {
                    "type": { "type": "STRING", "description": "Type of product (Vodka, Sauce, Snack, Electronic, etc.)" },
                    "abv": { "type": "STRING", "description": "Alcohol by volume percentage if applicable, or 'N/A'" },
                    "volume": { "type": "STRING", "description": "Net weight or volume (e.g., '750ml', '400g')" },
                    "origin": { "type": "STRING", "description": "Country or region of origin" }
                },
                "required": ["type", "abv", "volume", "origin"]
            },
            "tastingNotes": {
                "type": "OBJECT",
                "properties": {
                    "nose": { "type": "STRING", "description": "Aroma or Scent profile (or 'N/A' if non-consumable)." },
                    "palate": { "type": "STRING", "description": "Flavor profile or Key Features (if non-food)." },
                    "finish": { "type": "STRING", "description": "Aftertaste or Build Quality/Finish (if non-food)." }
                },
                "required": ["nose", "palate", "finish"]
            },
            "cocktails": {
                "type": "ARRAY",
                "description": "List of 3 distinct items. If alcohol: Cocktails. If food: Recipes. If object: Usage cases.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "Name of the cocktail, recipe, or use case." },
                        "ingredients": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" },
                            "description": "List of ingredients or required tools."
                        },
                        "instructions": { "type": "STRING", "description": "Brief instructions." },
                        "visualPrompt": {
                            "type": "STRING",
                            "description": "A short, vivid comma-separated visual description to generate a photorealistic image of this result."
                        }
                    },
                    "required": ["name", "ingredients", "instructions", "visualPrompt"]
                }
            },
            "barcode": {
                "type": "STRING",
                "description": "The numeric barcode value if visible in the image, otherwise null.",
                "nullable": true
            },
            "liquidAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "percentage": {
                        "type": "INTEGER",
                        "description": "Precise estimated remaining content percentage (0-100)."
                    },
                    "description": {
                        "type": "STRING",
                        "description": "A brief visual description of the content level."
                    }
                },
                "required": ["percentage", "description"]
            }
        },
        "required": ["productName", "description", "averagePrice", "specs", "tastingNotes", "cocktails", "liquidAnalysis"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_analysis;

    fn wrap_text(text: String) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn schema_requires_every_card_section() {
        let schema = analysis_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        for key in ["productName", "averagePrice", "specs", "cocktails", "liquidAnalysis"] {
            assert!(required.contains(&key), "{key} missing");
        }
        assert_eq!(schema["properties"]["barcode"]["nullable"], json!(true));
        assert_eq!(
            schema["properties"]["liquidAnalysis"]["properties"]["percentage"]["type"],
            json!("INTEGER")
        );
    }

    #[test]
    fn analysis_fields_match_schema_properties() {
        let schema = analysis_schema();
        let mut expected: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        expected.sort();

        let serialized = serde_json::to_value(sample_analysis("Chartreuse", "£45")).unwrap();
        let mut actual: Vec<&String> = serialized.as_object().unwrap().keys().collect();
        actual.sort();

        assert_eq!(actual, expected);
    }

    #[test]
    fn parses_text_part_into_analysis() {
        let mut analysis = sample_analysis("Hendrick's Gin", "£28 - £34");
        let extra = analysis.suggestions[0].clone();
        analysis.suggestions = vec![extra.clone(), extra.clone(), extra.clone(), extra];
        let response = wrap_text(serde_json::to_string(&analysis).unwrap());

        let parsed = parse_analysis_response(&response).unwrap();
        assert_eq!(parsed.product_name, "Hendrick's Gin");
        assert_eq!(parsed.suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn malformed_analysis_is_a_service_error() {
        let err = parse_analysis_response(&wrap_text("not json".into())).unwrap_err();
        assert!(matches!(err, ShelfScanError::LLM(_)));

        let err = parse_analysis_response(&json!({ "candidates": [] })).unwrap_err();
        assert!(matches!(err, ShelfScanError::LLM(_)));
    }

    #[test]
    fn extracts_first_inline_image_part() {
        let response = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your image" },
                { "inlineData": { "mimeType": "image/png", "data": encode(b"pixels") } }
            ] } }]
        });
        assert_eq!(extract_inline_image(&response).unwrap(), Bytes::from_static(b"pixels"));
    }

    #[test]
    fn text_only_enhancement_is_a_failure() {
        let err = extract_inline_image(&wrap_text("I cannot edit this".into())).unwrap_err();
        assert_eq!(err.to_string(), "AI service error: No image data found in response");
    }
}
