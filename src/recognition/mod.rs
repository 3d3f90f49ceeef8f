use std::sync::OnceLock;

use base64::{
    engine::general_purpose::STANDARD as BASE64,
    Engine as _,
};
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;

use crate::core::{
    BoundingBox,
    ManabiError,
    RecognizedItem,
};

pub const MIN_TEXT_CONFIDENCE: f32 = 0.5;

/// OCR gateway seam. Adapters are expected to apply the gateway
/// contract themselves: results below the confidence threshold or with
/// empty trimmed text never leave the adapter.
pub trait TextRecognizer {
    fn recognize(
        &self,
        image: &[u8],
    ) -> impl std::future::Future<Output = Result<Vec<RecognizedItem>, ManabiError>> + Send;
}

/// Runs OCR over a batch of images: per-image results concatenated in
/// input order, deduplicated by case-insensitive trimmed text (first
/// occurrence wins), then sorted top-to-bottom.
pub async fn recognize_images<R: TextRecognizer>(
    recognizer: &R,
    images: &[Vec<u8>],
) -> Vec<RecognizedItem> {
    let futures: Vec<_> = images.iter().map(|image| recognizer.recognize(image)).collect();

    let mut all_items = Vec::new();
    for result in join_all(futures).await {
        match result {
            Ok(items) => all_items.extend(items),
            Err(e) => eprintln!("OCR failed for image: {}", e),
        }
    }

    let mut unique = dedupe_by_text(all_items);
    sort_top_to_bottom(&mut unique);
    unique
}

pub fn retain_confident(items: Vec<RecognizedItem>, threshold: f32) -> Vec<RecognizedItem> {
    items
        .into_iter()
        .filter(|item| item.confidence > threshold && !item.text.trim().is_empty())
        .collect()
}

pub fn dedupe_by_text(items: Vec<RecognizedItem>) -> Vec<RecognizedItem> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();

    for item in items {
        let normalized = item.text.trim().to_lowercase();
        if seen.insert(normalized) {
            unique.push(item);
        }
    }

    unique
}

pub fn sort_top_to_bottom(items: &mut [RecognizedItem]) {
    items.sort_by(|a, b| {
        a.bounding_box
            .y
            .partial_cmp(&b.bounding_box.y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Vocabulary,
    Grammar,
    Mixed,
}

/// Rough split between single vocabulary entries and full sentences.
pub fn classify_content(text: &str) -> ContentType {
    let text = text.trim();

    if text.contains('。')
        || text.contains('？')
        || text.contains('！')
        || text.contains("です")
        || text.contains("ます")
        || text.contains('だ')
    {
        return ContentType::Grammar;
    }

    if text.chars().count() <= 10 && !text.contains(' ') {
        return ContentType::Vocabulary;
    }

    ContentType::Mixed
}

fn japanese_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{Hiragana}\p{Katakana}\p{Han}]").unwrap())
}

pub fn contains_japanese(text: &str) -> bool {
    japanese_regex().is_match(text)
}

pub fn filter_japanese_text(items: Vec<RecognizedItem>) -> Vec<RecognizedItem> {
    items.into_iter().filter(|item| contains_japanese(&item.text)).collect()
}

#[derive(Debug, Deserialize)]
struct Vertex {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityAnnotation {
    description: String,
    #[serde(default)]
    confidence: Option<f32>,
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
}

#[derive(Debug, Deserialize)]
struct AnnotateEnvelope {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

/// Google Vision REST adapter, configured for Japanese text with
/// language correction hints and accurate (document) detection.
pub struct GoogleVisionRecognizer {
    client: reqwest::Client,
    api_key: String,
    min_confidence: f32,
}

impl GoogleVisionRecognizer {
    const ENDPOINT: &'static str = "https://vision.googleapis.com/v1/images:annotate";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            min_confidence: MIN_TEXT_CONFIDENCE,
        }
    }

    pub fn from_config(config: &crate::AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.vision_api_key.clone(),
            min_confidence: config.min_text_confidence,
        }
    }

    fn parse_response(&self, envelope: AnnotateEnvelope) -> Vec<RecognizedItem> {
        let Some(response) = envelope.responses.into_iter().next() else {
            return Vec::new();
        };

        // The first annotation spans the whole detected region; its
        // extent normalizes the per-word pixel boxes.
        let full_extent = response
            .text_annotations
            .first()
            .and_then(|a| a.bounding_poly.as_ref())
            .map(|poly| {
                poly.vertices.iter().fold((1.0f32, 1.0f32), |(w, h), v| {
                    (w.max(v.x), h.max(v.y))
                })
            })
            .unwrap_or((1.0, 1.0));

        let items: Vec<RecognizedItem> = response
            .text_annotations
            .into_iter()
            .skip(1)
            .map(|annotation| {
                let bbox = annotation
                    .bounding_poly
                    .map(|poly| normalize_poly(&poly, full_extent))
                    .unwrap_or_default();
                let confidence = annotation.confidence.unwrap_or(1.0);
                RecognizedItem::new(annotation.description, confidence, bbox)
            })
            .collect();

        retain_confident(items, self.min_confidence)
    }
}

fn normalize_poly(poly: &BoundingPoly, (full_width, full_height): (f32, f32)) -> BoundingBox {
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (0.0f32, 0.0f32);

    for v in &poly.vertices {
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
    }

    if poly.vertices.is_empty() {
        return BoundingBox::default();
    }

    BoundingBox::new(
        min_x / full_width,
        min_y / full_height,
        (max_x - min_x) / full_width,
        (max_y - min_y) / full_height,
    )
}

impl TextRecognizer for GoogleVisionRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<Vec<RecognizedItem>, ManabiError> {
        if self.api_key.is_empty() {
            return Err(ManabiError::MissingApiKey("vision"));
        }

        let body = serde_json::json!({
            "requests": [{
                "image": { "content": BASE64.encode(image) },
                "features": [{ "type": "DOCUMENT_TEXT_DETECTION" }],
                "imageContext": { "languageHints": ["ja", "en"] },
            }]
        });

        let response = self
            .client
            .post(Self::ENDPOINT)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ManabiError::GatewayStatus(response.status().as_u16()));
        }

        let envelope: AnnotateEnvelope = response.json().await?;
        Ok(self.parse_response(envelope))
    }
}
