//! Google Cloud Vision `images:annotate` client

use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use digifolder_core::constants::HANDWRITING_CONFIDENCE_THRESHOLD;
use digifolder_core::models::{OcrOptions, OcrResult};

use crate::error::{OcrClientResult, OcrError};

pub const DEFAULT_VISION_API_URL: &str = "https://vision.googleapis.com";

/// Thin HTTP client for text detection requests.
pub struct VisionClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Debug for VisionClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VisionClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl VisionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> OcrClientResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(OcrError::Config("GOOGLE_CLOUD_API_KEY must be set".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OcrError::Request)?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Run TEXT_DETECTION on one image and return the first response.
    pub async fn annotate(&self, image_data: &[u8]) -> OcrClientResult<AnnotateImageResponse> {
        let url = format!("{}/v1/images:annotate", self.base_url);
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request_body = json!({
            "requests": [{
                "image": {
                    "content": image_base64
                },
                "features": [{
                    "type": "TEXT_DETECTION",
                    "maxResults": 1
                }]
            }]
        });

        let start = std::time::Instant::now();
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Failed to perform OCR".to_string());
            tracing::warn!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Vision API request failed"
            );
            return Err(OcrError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let vision_response: VisionResponse = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

        let first = vision_response
            .responses
            .into_iter()
            .next()
            .unwrap_or_default();

        if let Some(error) = &first.error {
            return Err(OcrError::Api {
                status: status.as_u16(),
                message: error
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Vision error code {:?}", error.code)),
            });
        }

        tracing::debug!(
            image_bytes = image_data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Vision API annotate completed"
        );

        Ok(first)
    }
}

/// Build an `OcrResult` from an annotate response.
pub fn to_ocr_result(response: &AnnotateImageResponse, options: &OcrOptions) -> OcrResult {
    let text = response
        .full_text_annotation
        .as_ref()
        .and_then(|a| a.text.clone())
        .unwrap_or_default();

    let first_annotation = response
        .text_annotations
        .as_ref()
        .and_then(|annotations| annotations.first());

    let confidence = first_annotation
        .and_then(|a| a.confidence)
        .unwrap_or(0.0);

    let language = first_annotation
        .and_then(|a| a.locale.as_deref())
        .and_then(|locale| locale.split('-').next())
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| options.language.clone());

    OcrResult {
        text,
        confidence,
        is_handwritten: options
            .detect_handwriting
            .then(|| is_handwritten(confidence)),
        has_table: options
            .detect_tables
            .then(|| has_table_structure(response.full_text_annotation.as_ref())),
        language,
    }
}

pub fn is_handwritten(confidence: f64) -> bool {
    confidence < HANDWRITING_CONFIDENCE_THRESHOLD
}

/// A block whose paragraphs start at a few shared left edges looks like
/// columns: more than one distinct x, but fewer than one per paragraph.
pub fn has_table_structure(annotation: Option<&FullTextAnnotation>) -> bool {
    let Some(page) = annotation.and_then(|a| a.pages.first()) else {
        return false;
    };

    page.blocks.iter().any(|block| {
        let paragraphs = &block.paragraphs;
        if paragraphs.len() <= 1 {
            return false;
        }
        let left_edges: HashSet<Option<i32>> = paragraphs
            .iter()
            .map(|p| {
                p.bounding_box
                    .as_ref()
                    .and_then(|b| b.vertices.first())
                    .and_then(|v| v.x)
            })
            .collect();
        left_edges.len() > 1 && left_edges.len() < paragraphs.len()
    })
}

// Google Cloud Vision API response types
#[derive(Debug, Deserialize)]
struct VisionResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    pub full_text_annotation: Option<FullTextAnnotation>,
    pub text_annotations: Option<Vec<EntityAnnotation>>,
    pub error: Option<VisionStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FullTextAnnotation {
    pub text: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub bounding_box: Option<BoundingPoly>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Vertex {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntityAnnotation {
    pub description: Option<String>,
    pub locale: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VisionStatus {
    pub code: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<VisionStatus>,
}
