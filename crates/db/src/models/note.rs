//! Note entity model and DTOs.

use noteally_core::search::contains_ci;
use noteally_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `notes` table.
///
/// `tags` and `categories` store tag/category names, not ids; there is no
/// referential integrity to the `tags`/`categories` tables.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Note {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub extracted_text: Option<String>,
    pub original_image: Option<String>,
    pub ocr_confidence: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Note {
    /// Case-insensitive substring match across the searchable fields:
    /// title, content, excerpt, extracted OCR text, tag names, and
    /// category names.
    pub fn matches_term(&self, term: &str) -> bool {
        contains_ci(&self.title, term)
            || contains_ci(&self.content, term)
            || contains_ci(&self.excerpt, term)
            || self
                .extracted_text
                .as_deref()
                .is_some_and(|t| contains_ci(t, term))
            || self.tags.iter().any(|t| contains_ci(t, term))
            || self.categories.iter().any(|c| contains_ci(c, term))
    }
}

/// DTO for creating a new note.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub extracted_text: Option<String>,
    pub original_image: Option<String>,
    pub ocr_confidence: Option<f64>,
}

/// DTO for updating a note. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub extracted_text: Option<String>,
    pub original_image: Option<String>,
    pub ocr_confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_note() -> Note {
        Note {
            id: 1,
            user_id: 7,
            title: "Chapter Three".to_string(),
            content: "<p>The quick brown fox</p>".to_string(),
            excerpt: "The quick brown fox".to_string(),
            tags: vec!["reading-notes".to_string()],
            categories: vec!["literature".to_string()],
            extracted_text: Some("scanned page text".to_string()),
            original_image: None,
            ocr_confidence: Some(0.92),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn matches_title_case_insensitive() {
        assert!(sample_note().matches_term("chapter"));
        assert!(sample_note().matches_term("THREE"));
    }

    #[test]
    fn matches_content_and_excerpt() {
        assert!(sample_note().matches_term("quick brown"));
    }

    #[test]
    fn matches_extracted_text() {
        assert!(sample_note().matches_term("scanned"));
    }

    #[test]
    fn matches_tag_and_category_names() {
        assert!(sample_note().matches_term("reading"));
        assert!(sample_note().matches_term("literature"));
    }

    #[test]
    fn no_match_returns_false() {
        assert!(!sample_note().matches_term("astronomy"));
    }
}
