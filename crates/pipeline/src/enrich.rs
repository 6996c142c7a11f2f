//! Note enrichment flow: content in, suggested metadata out.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::client::{parse_json_payload, GenerativeClient, Part, PipelineError};

/// Longest slice of note content sent to the model. Longer notes are
/// truncated with a trailing ellipsis marker.
const MAX_PROMPT_CONTENT_CHARS: usize = 2000;

/// Input for the enrichment pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichRequest {
    /// Raw note content, possibly containing markup.
    pub content: String,
    /// Title the note currently has, if any.
    pub current_title: Option<String>,
    /// Tags already assigned to the note.
    #[serde(default)]
    pub current_tags: Vec<String>,
    /// Categories already assigned to the note.
    #[serde(default)]
    pub current_categories: Vec<String>,
}

/// Metadata suggestions produced by the model for one note.
#[derive(Debug, Clone, Serialize)]
pub struct NoteEnrichment {
    pub title: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    /// Model's self-reported confidence, clamped to `[0, 1]`.
    pub confidence: f64,
    pub summary: String,
    pub processing_time_ms: u64,
}

/// JSON shape the model is instructed to return.
#[derive(Debug, Deserialize)]
struct ModelEnrichPayload {
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    confidence: f64,
    summary: String,
}

/// Truncate content to the prompt budget, counting characters rather
/// than bytes so multibyte text is never split mid-codepoint.
pub fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_PROMPT_CONTENT_CHARS {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(MAX_PROMPT_CONTENT_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// Build the enrichment prompt, folding in the note's existing metadata
/// so the model refines rather than restarts.
pub fn build_enrichment_prompt(request: &EnrichRequest, content: &str) -> String {
    let mut context = String::new();
    if let Some(title) = request.current_title.as_deref().filter(|t| !t.is_empty()) {
        context.push_str(&format!("Current title: \"{title}\"\n"));
    }
    if !request.current_tags.is_empty() {
        context.push_str(&format!(
            "Current tags: {}\n",
            request.current_tags.join(", ")
        ));
    }
    if !request.current_categories.is_empty() {
        context.push_str(&format!(
            "Current categories: {}\n",
            request.current_categories.join(", ")
        ));
    }

    format!(
        "Analyze the following note content and provide:\n\
         1. A concise, descriptive title (maximum 60 characters)\n\
         2. Between 3 and 8 relevant tags, lowercase, hyphenated where multi-word\n\
         3. Between 1 and 3 broad categories the note belongs to\n\
         4. A summary of 1-2 sentences\n\
         5. A confidence score between 0 and 1 for the quality of these suggestions\n\
         \n\
         {context}\n\
         Note content:\n\
         \"\"\"\n\
         {content}\n\
         \"\"\"\n\
         \n\
         Respond with a JSON object of the form \
         {{\"title\": string, \"tags\": [string], \"categories\": [string], \
         \"confidence\": number, \"summary\": string}} and nothing else."
    )
}

/// Run the enrichment flow for one note's content.
pub async fn enrich_note(
    client: &GenerativeClient,
    request: &EnrichRequest,
) -> Result<NoteEnrichment, PipelineError> {
    if request.content.trim().is_empty() {
        return Err(PipelineError::Validation(
            "Note content is required".to_string(),
        ));
    }

    let started = Instant::now();
    let prompt = build_enrichment_prompt(request, &truncate_content(&request.content));
    let text = client.generate(&[Part::Text(prompt)]).await?;
    let payload: ModelEnrichPayload = parse_json_payload(&text)?;

    let enrichment = NoteEnrichment {
        title: payload.title,
        tags: payload.tags,
        categories: payload.categories,
        confidence: payload.confidence.clamp(0.0, 1.0),
        summary: payload.summary,
        processing_time_ms: started.elapsed().as_millis() as u64,
    };

    tracing::info!(
        confidence = enrichment.confidence,
        tags = enrichment.tags.len(),
        categories = enrichment.categories.len(),
        processing_time_ms = enrichment.processing_time_ms,
        "note enrichment complete"
    );

    Ok(enrichment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_content("a short note"), "a short note");
    }

    #[test]
    fn long_content_is_truncated_with_marker() {
        let long = "x".repeat(MAX_PROMPT_CONTENT_CHARS + 500);
        let truncated = truncate_content(&long);
        assert_eq!(truncated.chars().count(), MAX_PROMPT_CONTENT_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let long = "é".repeat(MAX_PROMPT_CONTENT_CHARS + 1);
        let truncated = truncate_content(&long);
        assert_eq!(truncated.chars().count(), MAX_PROMPT_CONTENT_CHARS + 3);
    }

    #[test]
    fn prompt_embeds_content_and_shape() {
        let request = EnrichRequest {
            content: "chapter three summary".to_string(),
            ..Default::default()
        };
        let prompt = build_enrichment_prompt(&request, &request.content);
        assert!(prompt.contains("chapter three summary"));
        assert!(prompt.contains("\"title\""));
        assert!(prompt.contains("\"summary\""));
        assert!(!prompt.contains("Current title"));
    }

    #[test]
    fn prompt_includes_existing_metadata() {
        let request = EnrichRequest {
            content: "body".to_string(),
            current_title: Some("Old Title".to_string()),
            current_tags: vec!["rome".to_string(), "history".to_string()],
            current_categories: vec!["Reading".to_string()],
        };
        let prompt = build_enrichment_prompt(&request, "body");
        assert!(prompt.contains("Current title: \"Old Title\""));
        assert!(prompt.contains("Current tags: rome, history"));
        assert!(prompt.contains("Current categories: Reading"));
    }

    #[test]
    fn model_payload_tolerates_missing_lists() {
        let payload: ModelEnrichPayload = serde_json::from_str(
            r#"{"title": "T", "confidence": 0.5, "summary": "S"}"#,
        )
        .unwrap();
        assert!(payload.tags.is_empty());
        assert!(payload.categories.is_empty());
    }

    #[test]
    fn model_payload_parses_full_shape() {
        let raw = r#"{
            "title": "Chapter Three",
            "tags": ["history", "rome"],
            "categories": ["Reading"],
            "confidence": 0.92,
            "summary": "Notes on the fall of the republic."
        }"#;
        let payload: ModelEnrichPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.title, "Chapter Three");
        assert_eq!(payload.tags, vec!["history", "rome"]);
        assert_eq!(payload.categories, vec!["Reading"]);
    }
}
