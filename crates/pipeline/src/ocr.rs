//! OCR extraction flow: base64 page photograph in, text out.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::client::{parse_json_payload, GenerativeClient, Part, PipelineError};

/// Input for the OCR pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrRequest {
    /// Base64-encoded image bytes (JPEG assumed).
    pub image_data: String,
    /// Optional free-text instruction from the user.
    pub prompt: Option<String>,
}

/// Result of an OCR extraction.
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    pub extracted_text: String,
    /// Model's self-reported confidence, clamped to `[0, 1]`.
    pub confidence: f64,
    pub processing_time_ms: u64,
}

/// JSON shape the model is instructed to return.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelOcrPayload {
    extracted_text: String,
    confidence: f64,
}

/// Build the extraction prompt, folding in the user's instruction when
/// one was given.
pub fn build_ocr_prompt(instruction: Option<&str>) -> String {
    let instruction_block = match instruction.filter(|p| !p.trim().is_empty()) {
        Some(p) => format!(
            "The user has provided specific instructions. Follow them carefully:\n\"{p}\""
        ),
        None => "If no specific instructions are given, just return the plain extracted text."
            .to_string(),
    };

    format!(
        "Extract all visible text from this image as accurately as possible. By default:\n\
         - Preserve line breaks and paragraph structure\n\
         - Maintain proper spacing between words\n\
         - Include all legible text, even if partially obscured\n\
         - Correct clear OCR errors where appropriate\n\
         \n\
         {instruction_block}\n\
         \n\
         Also provide a confidence score between 0 and 1 indicating how confident you are \
         in the accuracy of the extracted text.\n\
         \n\
         Respond with a JSON object of the form \
         {{\"extractedText\": string, \"confidence\": number}} and nothing else."
    )
}

/// Run the OCR flow against the hosted model.
///
/// Fails fast with a validation error on empty image data; everything
/// else surfaces as a single normalized [`PipelineError`].
pub async fn extract_text(
    client: &GenerativeClient,
    request: &OcrRequest,
) -> Result<OcrResult, PipelineError> {
    if request.image_data.trim().is_empty() {
        return Err(PipelineError::Validation(
            "Image data is required".to_string(),
        ));
    }

    let started = Instant::now();
    let parts = [
        Part::Text(build_ocr_prompt(request.prompt.as_deref())),
        Part::InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: request.image_data.clone(),
        },
    ];

    let text = client.generate(&parts).await?;
    let payload: ModelOcrPayload = parse_json_payload(&text)?;

    let result = OcrResult {
        extracted_text: payload.extracted_text,
        confidence: payload.confidence.clamp(0.0, 1.0),
        processing_time_ms: started.elapsed().as_millis() as u64,
    };

    tracing::info!(
        confidence = result.confidence,
        processing_time_ms = result.processing_time_ms,
        chars = result.extracted_text.len(),
        "OCR extraction complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_instruction_uses_default_clause() {
        let prompt = build_ocr_prompt(None);
        assert!(prompt.contains("just return the plain extracted text"));
        assert!(prompt.contains("extractedText"));
    }

    #[test]
    fn prompt_embeds_user_instruction() {
        let prompt = build_ocr_prompt(Some("ignore footnotes"));
        assert!(prompt.contains("ignore footnotes"));
        assert!(prompt.contains("Follow them carefully"));
    }

    #[test]
    fn blank_instruction_treated_as_absent() {
        let prompt = build_ocr_prompt(Some("   "));
        assert!(prompt.contains("just return the plain extracted text"));
    }

    #[test]
    fn model_payload_parses_camel_case() {
        let payload: ModelOcrPayload =
            serde_json::from_str(r#"{"extractedText": "page one", "confidence": 0.87}"#).unwrap();
        assert_eq!(payload.extracted_text, "page one");
        assert!((payload.confidence - 0.87).abs() < f64::EPSILON);
    }
}
